use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Animation sampling rate while a spin is running
    pub tick_rate_hz: u32,
    /// Fixed RNG seed for reproducible runs. None draws from OS entropy.
    pub rng_seed: Option<u64>,
    /// Where the wheel document is persisted. None keeps everything in memory.
    pub data_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9002".to_string(),
            tick_rate_hz: 60,
            rng_seed: None,
            data_path: Some(PathBuf::from("wheel-data.json")),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `WHEEL_LISTEN_ADDR`, `WHEEL_TICK_HZ` and
    /// `WHEEL_DATA_PATH` (empty disables persistence).
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("WHEEL_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Ok(hz) = std::env::var("WHEEL_TICK_HZ") {
            config.tick_rate_hz = hz
                .parse()
                .map_err(|_| format!("WHEEL_TICK_HZ must be an integer, got {:?}", hz))?;
        }
        if let Ok(path) = std::env::var("WHEEL_DATA_PATH") {
            config.data_path = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if self.tick_rate_hz == 0 || self.tick_rate_hz > 1000 {
            return Err("tick_rate_hz must be in 1..=1000".to_string());
        }
        Ok(())
    }
}
