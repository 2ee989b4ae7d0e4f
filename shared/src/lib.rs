//! Types and math shared between the wheel server and its web client.

pub mod angle;
pub mod config;
pub mod document;
pub mod protocol;
