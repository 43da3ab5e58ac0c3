use crate::vec3::Vec3;

/// Scene configuration shared by the server and every client.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    /// Number of bouncing bodies, fixed for the lifetime of a session
    pub num_bodies: u32,
    pub body_radius: f64,
    /// Radius of the draggable obstacle sphere
    pub obstacle_radius: f64,
    /// Obstacle color before any body strikes it (0xRRGGBB)
    pub obstacle_neutral_color: u32,
    /// Edge length of the invisible containing cube
    pub container_size: f64,
    /// Logical step length (milliseconds)
    pub step_ms: u64,
    /// Max speed on a single axis (units per second)
    pub speed: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            num_bodies: 12,
            body_radius: 0.25,
            obstacle_radius: 2.5,
            obstacle_neutral_color: 0xaaaaaa,
            container_size: 8.0,
            step_ms: 50, // 20 Hz
            speed: 1.5,
        }
    }
}

impl SceneConfig {
    pub fn container_half_size(&self) -> f64 {
        self.container_size / 2.0
    }

    /// Max per-axis displacement in a single step.
    pub fn max_step_speed(&self) -> f64 {
        self.speed * self.step_ms as f64 / 1000.0
    }

    /// Obstacle start position, embedded half-way into the back wall.
    pub fn obstacle_home(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, -self.container_half_size())
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.container_size.is_finite() || self.container_size <= 0.0 {
            return Err("container_size must be finite and > 0".to_string());
        }
        if !self.body_radius.is_finite() || self.body_radius <= 0.0 {
            return Err("body_radius must be finite and > 0".to_string());
        }
        if self.body_radius >= self.container_half_size() {
            return Err("body_radius must be smaller than half the container size".to_string());
        }
        if !self.obstacle_radius.is_finite() || self.obstacle_radius <= 0.0 {
            return Err("obstacle_radius must be finite and > 0".to_string());
        }
        if self.obstacle_neutral_color > 0xFFFFFF {
            return Err("obstacle_neutral_color must be a 24-bit RGB value".to_string());
        }
        if self.step_ms == 0 {
            return Err("step_ms must be > 0".to_string());
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err("speed must be finite and >= 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_config_is_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_step_speed_matches_20hz() {
        let config = SceneConfig::default();
        assert!((config.max_step_speed() - 0.075).abs() < 1e-12);
        assert_eq!(config.container_half_size(), 4.0);
        assert_eq!(config.obstacle_home(), Vec3::new(0.0, 0.0, -4.0));
    }

    #[test]
    fn zero_step_invalid() {
        let mut config = SceneConfig::default();
        config.step_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn body_larger_than_container_invalid() {
        let mut config = SceneConfig::default();
        config.body_radius = 4.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_speed_invalid() {
        let mut config = SceneConfig::default();
        config.speed = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&SceneConfig::default()).unwrap();
        assert!(json.contains("\"numBodies\":12"));
        assert!(json.contains("\"stepMs\":50"));
    }
}
