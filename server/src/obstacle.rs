use crate::event_bus::{Event, EventBus, Origin};
use multicam_shared::vec3::Vec3;

/// The draggable sphere bodies bounce off.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Obstacle {
    pub pos: Vec3,
    pub radius: f64,
    pub neutral_color: u32,
}

impl Obstacle {
    pub fn new(pos: Vec3, radius: f64, neutral_color: u32) -> Self {
        Self {
            pos,
            radius,
            neutral_color,
        }
    }

    /// Move to `pos` as given. Clamping is the drag handler's job.
    pub fn drag(&mut self, pos: Vec3, bus: &mut EventBus) {
        self.pos = pos;
        bus.publish(Origin::Scene, Event::ObstacleMoved { pos });
    }

    /// Announce the neutral color. Position is unchanged.
    pub fn reset(&self, bus: &mut EventBus) {
        bus.publish(
            Origin::Scene,
            Event::ObstacleRecolored {
                color: self.neutral_color,
            },
        );
    }

    /// A body crossed into the obstacle this tick.
    pub fn struck_by(&self, color: u32, bus: &mut EventBus) {
        bus.publish(Origin::Scene, Event::ObstacleRecolored { color });
    }
}

/// Clamp a drag target to the container on x and y. z is left alone since
/// drags happen in a plane facing the camera.
pub fn clamp_drag_target(pos: Vec3, half_size: f64) -> Vec3 {
    let mut clamped = pos;
    for axis in 0..2 {
        if clamped[axis].abs() > half_size {
            clamped[axis] = half_size * clamped[axis].signum();
        }
    }
    clamped
}
