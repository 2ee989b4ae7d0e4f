//! Wheel server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod config;
pub mod history;
pub mod options;
pub mod planner;
pub mod scheduler;
pub mod spin_loop;
pub mod state;
pub mod storage;
pub mod ws;
