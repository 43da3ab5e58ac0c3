use std::env;
use std::time::Duration;

pub use multicam_shared::config::SceneConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// How often coalesced events are flushed to clients
    pub frame_rate_hz: u32,
    /// Seed for every random draw in the scene (body colors and velocities)
    pub rng_seed: u64,
    pub scene: SceneConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9002".to_string(),
            frame_rate_hz: 30,
            rng_seed: 42,
            scene: SceneConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `MULTICAM_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = env::var("MULTICAM_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(hz) = parse_var("MULTICAM_FRAME_RATE_HZ") {
            config.frame_rate_hz = hz;
        }
        if let Some(seed) = parse_var("MULTICAM_RNG_SEED") {
            config.rng_seed = seed;
        }
        if let Some(n) = parse_var("MULTICAM_NUM_BODIES") {
            config.scene.num_bodies = n;
        }
        config
    }

    pub fn step_duration(&self) -> Duration {
        Duration::from_millis(self.scene.step_ms)
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate_hz as f64)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if self.frame_rate_hz == 0 || self.frame_rate_hz > 240 {
            return Err("frame_rate_hz must be in 1..=240".to_string());
        }
        self.scene.validate()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_frame_rate_invalid() {
        let config = ServerConfig {
            frame_rate_hz: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_scene_fails_server_validation() {
        let mut config = ServerConfig::default();
        config.scene.container_size = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn step_duration_follows_scene() {
        let config = ServerConfig::default();
        assert_eq!(config.step_duration(), Duration::from_millis(50));
    }
}
