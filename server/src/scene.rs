use crate::body::Body;
use crate::clock::{Scheduler, Task};
use crate::config::SceneConfig;
use crate::directory::{JoinOutcome, LeaveReport, SessionDirectory};
use crate::event_bus::{Delivery, Envelope, Event, EventBus, Origin, SubscriptionId, TopicFilter};
use crate::obstacle::Obstacle;
use crate::viewport::Axis;
use multicam_shared::vec3::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One ordered step fed into the scene. Replicas that apply the same commands
/// at the same logical times end up identical.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Join {
        participant_id: u32,
    },
    Leave {
        participant_id: u32,
    },
    /// Position is expected to be clamped already
    DragObstacle {
        pos: Vec3,
    },
    Reset,
    SetCellOffset {
        participant_id: u32,
        axis: String,
        value: u32,
    },
    SetPixelDelta {
        participant_id: u32,
        axis: String,
        value: f64,
    },
}

/// Whole replicated scene, owned by the session loop task.
pub struct SceneModel {
    pub config: SceneConfig,
    pub bodies: Vec<Body>,
    pub obstacle: Obstacle,
    /// Last color the obstacle was painted (by a strike or a reset)
    pub obstacle_color: u32,
    pub directory: SessionDirectory,
    scheduler: Scheduler,
    bus: EventBus,
    rng: ChaCha8Rng,
}

impl SceneModel {
    pub fn new(config: &SceneConfig, rng_seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(rng_seed);
        let obstacle = Obstacle::new(
            config.obstacle_home(),
            config.obstacle_radius,
            config.obstacle_neutral_color,
        );
        let bodies: Vec<Body> = (0..config.num_bodies)
            .map(|id| Body::spawn(id, config, obstacle.pos, &mut rng))
            .collect();

        let mut scheduler = Scheduler::new();
        for body in &bodies {
            scheduler.schedule_periodic(Task::StepBody(body.id), config.step_ms);
        }

        Self {
            config: *config,
            bodies,
            obstacle_color: obstacle.neutral_color,
            obstacle,
            directory: SessionDirectory::new(),
            scheduler,
            bus: EventBus::new(),
            rng,
        }
    }

    /// Current logical time (ms)
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn subscribe(&mut self, filter: TopicFilter, delivery: Delivery) -> SubscriptionId {
        self.bus.subscribe(filter, delivery)
    }

    pub fn drain(&mut self, id: SubscriptionId) -> Vec<Envelope> {
        self.bus.drain(id)
    }

    /// Render-frame boundary for coalesced subscriptions.
    pub fn end_frame(&mut self) {
        self.bus.end_frame();
    }

    /// Run every task due up to `until_ms` in order.
    pub fn advance_to(&mut self, until_ms: u64) {
        let half = self.config.container_half_size();
        while let Some((_, task)) = self.scheduler.pop_due(until_ms) {
            match task {
                Task::StepBody(id) => {
                    let Some(body) = self.bodies.get_mut(id as usize) else {
                        continue;
                    };
                    if let Some(color) = body.tick(half, &self.obstacle, &mut self.bus) {
                        self.obstacle_color = color;
                    }
                }
            }
        }
        self.scheduler.settle(until_ms);
    }

    pub fn apply(&mut self, command: &Command) {
        match command {
            Command::Join { participant_id } => {
                self.join(*participant_id);
            }
            Command::Leave { participant_id } => {
                self.leave(*participant_id);
            }
            Command::DragObstacle { pos } => self.drag_obstacle(*pos),
            Command::Reset => self.reset(),
            Command::SetCellOffset {
                participant_id,
                axis,
                value,
            } => {
                self.set_cell_offset(*participant_id, axis, *value);
            }
            Command::SetPixelDelta {
                participant_id,
                axis,
                value,
            } => {
                self.set_pixel_delta(*participant_id, axis, *value);
            }
        }
    }

    /// Returns the participant's viewport id. A repeated join keeps the
    /// existing viewport.
    pub fn join(&mut self, participant_id: u32) -> u32 {
        let now = self.now_ms();
        match self.directory.on_join(participant_id, now, &mut self.bus) {
            JoinOutcome::Joined(viewport_id) => viewport_id,
            JoinOutcome::AlreadyJoined(viewport_id) => {
                tracing::warn!(participant_id, viewport_id, "duplicate join ignored");
                viewport_id
            }
        }
    }

    pub fn leave(&mut self, participant_id: u32) -> Option<LeaveReport> {
        let now = self.now_ms();
        self.directory.on_leave(participant_id, now, &mut self.bus)
    }

    pub fn drag_obstacle(&mut self, pos: Vec3) {
        self.obstacle.drag(pos, &mut self.bus);
    }

    /// Neutral obstacle color, and every body back to the obstacle center
    /// with a fresh velocity.
    pub fn reset(&mut self) {
        let home = self.obstacle.pos;
        let max_step = self.config.max_step_speed();
        for body in &mut self.bodies {
            body.reset(home, max_step, &mut self.rng);
            self.bus
                .publish(Origin::Body(body.id), Event::BodyMoved { pos: body.pos });
        }
        self.obstacle.reset(&mut self.bus);
        self.obstacle_color = self.obstacle.neutral_color;
        tracing::info!(bodies = self.bodies.len(), "scene reset");
    }

    /// Returns true if the offset was applied.
    pub fn set_cell_offset(&mut self, participant_id: u32, axis: &str, value: u32) -> bool {
        let axis: Axis = match axis.parse() {
            Ok(axis) => axis,
            Err(e) => {
                tracing::warn!(participant_id, %e, "ignoring set_cell_offset");
                return false;
            }
        };
        match self
            .directory
            .set_cell_offset(participant_id, axis, value, &mut self.bus)
        {
            Ok(shape) => {
                tracing::debug!(
                    participant_id,
                    width = shape.width,
                    height = shape.height,
                    "grid shape recomputed"
                );
                true
            }
            Err(e) => {
                tracing::debug!(%e, "ignoring set_cell_offset");
                false
            }
        }
    }

    /// Returns true if the delta was applied.
    pub fn set_pixel_delta(&mut self, participant_id: u32, axis: &str, value: f64) -> bool {
        let axis: Axis = match axis.parse() {
            Ok(axis) => axis,
            Err(e) => {
                tracing::warn!(participant_id, %e, "ignoring set_pixel_delta");
                return false;
            }
        };
        match self
            .directory
            .set_pixel_delta(participant_id, axis, value, &mut self.bus)
        {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(%e, "ignoring set_pixel_delta");
                false
            }
        }
    }

    /// Stop all body tasks. The scene no longer moves after this.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        tracing::info!(now_ms = self.now_ms(), "scene stopped");
    }

    pub fn active_task_count(&self) -> usize {
        self.scheduler.active_count()
    }
}
