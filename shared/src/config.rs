use std::time::Duration;

pub const DEFAULT_WHEEL_SIZE: u32 = 400;
pub const DEFAULT_SPIN_DURATION_MS: u32 = 4000;

/// User-facing wheel settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WheelSettings {
    /// Canvas edge length in pixels
    pub wheel_size: u32,
    /// Spin animation length (milliseconds)
    pub spin_duration: u32,
    pub sound_enabled: bool,
    pub dark_mode: bool,
}

impl Default for WheelSettings {
    fn default() -> Self {
        Self {
            wheel_size: DEFAULT_WHEEL_SIZE,
            spin_duration: DEFAULT_SPIN_DURATION_MS,
            sound_enabled: true,
            dark_mode: false,
        }
    }
}

impl WheelSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.wheel_size == 0 {
            return Err("wheel_size must be > 0".to_string());
        }
        if self.spin_duration == 0 {
            return Err("spin_duration must be > 0".to_string());
        }
        Ok(())
    }

    pub fn spin_duration(&self) -> Duration {
        Duration::from_millis(self.spin_duration as u64)
    }
}
