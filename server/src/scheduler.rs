//! Shuffle-bag winner selection.
//!
//! Every run of `n` consecutive picks after a reset returns each index in
//! `0..n` exactly once. When a fresh bag is drawn, its head is swapped away
//! from the previous winner so the same option rarely wins twice in a row.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

/// Number of recent winners remembered
pub const RECENT_CAPACITY: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct FairnessScheduler {
    bag: VecDeque<usize>,
    /// Most recent first
    recent: VecDeque<usize>,
    /// Option count the current bag was drawn for
    drawn_for: Option<usize>,
}

impl FairnessScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the next winner index in `0..option_count`.
    /// Returns None only when `option_count` is zero.
    pub fn next(&mut self, option_count: usize, rng: &mut impl Rng) -> Option<usize> {
        if option_count == 0 {
            return None;
        }

        if self.drawn_for.is_some_and(|n| n != option_count) {
            tracing::debug!(
                "Option count changed to {} without a reset; discarding bag",
                option_count
            );
            self.reset();
        }

        if self.bag.is_empty() {
            self.refill(option_count, rng);
        }

        let winner = self.bag.pop_front()?;
        self.recent.push_front(winner);
        self.recent.truncate(RECENT_CAPACITY);
        Some(winner)
    }

    fn refill(&mut self, option_count: usize, rng: &mut impl Rng) {
        // Fisher-Yates: for i in (1..n).rev(), swap i with j drawn from 0..=i
        let mut order: Vec<usize> = (0..option_count).collect();
        order.shuffle(rng);

        if option_count > 2 {
            if let Some(&last) = self.recent.front() {
                if order[0] == last {
                    let j = rng.gen_range(1..option_count);
                    order.swap(0, j);
                }
            }
        }

        self.bag = order.into();
        self.drawn_for = Some(option_count);
    }

    /// Drop the bag (even if partially consumed) and the recent winners.
    pub fn reset(&mut self) {
        self.bag.clear();
        self.recent.clear();
        self.drawn_for = None;
    }

    /// Indices still waiting in the current bag, in draw order
    pub fn remaining(&self) -> impl Iterator<Item = usize> + '_ {
        self.bag.iter().copied()
    }

    pub fn remaining_count(&self) -> usize {
        self.bag.len()
    }

    /// Recent winners, most recent first
    pub fn recent_winners(&self) -> impl Iterator<Item = usize> + '_ {
        self.recent.iter().copied()
    }

    pub fn is_fresh(&self) -> bool {
        self.bag.is_empty() && self.recent.is_empty()
    }
}
