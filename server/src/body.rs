use crate::color::random_body_color;
use crate::config::SceneConfig;
use crate::event_bus::{Event, EventBus, Origin};
use crate::obstacle::Obstacle;
use multicam_shared::vec3::{add, distance, reflect, scale, sub, Vec3};
use rand::Rng;

/// A body bouncing inside the container.
/// Velocity is in units per step.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub id: u32,
    pub radius: f64,
    pub color: u32,
    pub pos: Vec3,
    pub vel: Vec3,
}

impl Body {
    /// New body with a random color, placed at `home` with a random velocity.
    pub fn spawn(id: u32, config: &SceneConfig, home: Vec3, rng: &mut impl Rng) -> Self {
        let color = random_body_color(rng);
        let mut body = Self {
            id,
            radius: config.body_radius,
            color,
            pos: home,
            vel: Vec3::ZERO,
        };
        body.reset(home, config.max_step_speed(), rng);
        body
    }

    /// Back to `home` with each velocity axis drawn from [-max_step, max_step].
    pub fn reset(&mut self, home: Vec3, max_step: f64, rng: &mut impl Rng) {
        let mut srand = || max_step * 2.0 * (rng.gen::<f64>() - 0.5);
        self.pos = home;
        self.vel = Vec3::new(srand(), srand(), srand());
    }

    /// Reflect inward on every axis where the body is past the wall.
    pub fn bounce_off_container(&mut self, half_size: f64) {
        let limit = half_size - self.radius;
        for axis in 0..3 {
            let p = self.pos[axis];
            if p.abs() > limit {
                self.vel[axis] = self.vel[axis].abs() * -p.signum();
            }
        }
    }

    /// Elastic reflection off the obstacle if this step would cross its
    /// surface. Checked once per step, no sweep. Returns true on a hit.
    pub fn bounce_off_obstacle(&mut self, obstacle: &Obstacle) -> bool {
        let threshold = obstacle.radius + self.radius;
        let dist_before = distance(obstacle.pos, self.pos);
        let dist_after = distance(obstacle.pos, add(self.pos, self.vel));

        if dist_before >= threshold && dist_after < threshold {
            let unit_to_center = scale(sub(obstacle.pos, self.pos), 1.0 / dist_before);
            self.vel = reflect(self.vel, unit_to_center);
            return true;
        }
        false
    }

    pub fn integrate(&mut self) {
        self.pos = add(self.pos, self.vel);
    }

    /// One step: container bounce, obstacle bounce, integrate, publish.
    /// Returns the body color if it struck the obstacle.
    pub fn tick(&mut self, half_size: f64, obstacle: &Obstacle, bus: &mut EventBus) -> Option<u32> {
        self.bounce_off_container(half_size);

        let struck = self.bounce_off_obstacle(obstacle);
        if struck {
            obstacle.struck_by(self.color, bus);
        }

        self.integrate();
        bus.publish(Origin::Body(self.id), Event::BodyMoved { pos: self.pos });

        struck.then_some(self.color)
    }
}
