//! Spin planning: where the wheel must stop for a chosen winner, and how it gets there.

use rand::Rng;
use std::f64::consts::TAU;
use std::time::Duration;
use wheel_shared::angle::{centered_rotation, normalize, sector_width};
use wheel_shared::protocol::{EasingWire, SpinStartedMsg};

/// Extra full turns per spin, inclusive range
pub const MIN_TURNS: u32 = 5;
pub const MAX_TURNS: u32 = 10;

/// Landing offset from the sector center, as a fraction of the sector width
const JITTER_FRACTION: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EasingKind {
    /// `1 - (1 - p)^3`: fast start, smooth stop
    CubicOut,
}

impl EasingKind {
    pub fn apply(&self, p: f64) -> f64 {
        let p = p.clamp(0.0, 1.0);
        match self {
            EasingKind::CubicOut => 1.0 - (1.0 - p).powi(3),
        }
    }
}

impl From<EasingKind> for EasingWire {
    fn from(kind: EasingKind) -> Self {
        match kind {
            EasingKind::CubicOut => EasingWire::CubicOut,
        }
    }
}

/// One planned spin. Sampled by elapsed wall-clock time, never by tick count.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinTrajectory {
    pub start_angle: f64,
    pub total_delta: f64,
    pub duration: Duration,
    pub easing: EasingKind,
}

impl SpinTrajectory {
    /// Fraction of the animation done after `elapsed`, in `[0, 1]`.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Wheel rotation after `elapsed`
    pub fn sample(&self, elapsed: Duration) -> f64 {
        let eased = self.easing.apply(self.progress(elapsed));
        self.start_angle + self.total_delta * eased
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }

    /// Absolute (un-normalized) rotation at the end of the spin
    pub fn final_angle(&self) -> f64 {
        self.start_angle + self.total_delta
    }

    pub fn to_wire(&self) -> SpinStartedMsg {
        SpinStartedMsg {
            start_angle: self.start_angle,
            total_delta: self.total_delta,
            duration_ms: self.duration.as_millis().min(u32::MAX as u128) as u32,
            easing: self.easing.into(),
        }
    }
}

/// Resting rotation that puts `winner` under the pointer, offset by `jitter` radians.
pub fn target_rotation(winner: usize, option_count: usize, jitter: f64) -> f64 {
    normalize(centered_rotation(winner, option_count) + jitter)
}

/// Plan a spin from `current_rotation` that comes to rest on `winner`.
///
/// Returns None if `winner` is not a valid index.
pub fn plan(
    winner: usize,
    current_rotation: f64,
    option_count: usize,
    duration: Duration,
    rng: &mut impl Rng,
) -> Option<SpinTrajectory> {
    if winner >= option_count {
        return None;
    }

    let max_jitter = JITTER_FRACTION * sector_width(option_count);
    let jitter = rng.gen_range(-max_jitter..=max_jitter);
    let target = target_rotation(winner, option_count, jitter);

    let turns = rng.gen_range(MIN_TURNS..=MAX_TURNS) as f64 * TAU;
    let mut spin_amount = turns + target - current_rotation.rem_euclid(TAU);
    if spin_amount < turns {
        spin_amount += TAU;
    }

    Some(SpinTrajectory {
        start_angle: current_rotation,
        total_delta: spin_amount,
        duration,
        easing: EasingKind::CubicOut,
    })
}
