//! Session directory: who is connected and which viewport each one owns.
//!
//! The directory owns the shared grid shape. Viewports never recompute it
//! themselves; every change that can affect it goes through here and ends in
//! a broadcast of the new shape to all live viewports.

use crate::event_bus::{Event, EventBus, Origin};
use crate::viewport::{Axis, Viewport};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub width: u32,
    pub height: u32,
}

impl Default for GridShape {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    UnknownParticipant(u32),
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryError::UnknownParticipant(id) => write!(f, "unknown participant {id}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Result of a join. Either way the participant ends up owning the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(u32),
    /// Participant was already active; nothing changed.
    AlreadyJoined(u32),
}

impl JoinOutcome {
    pub fn viewport_id(self) -> u32 {
        match self {
            JoinOutcome::Joined(id) | JoinOutcome::AlreadyJoined(id) => id,
        }
    }
}

/// What a leave tore down.
#[derive(Debug, Clone)]
pub struct LeaveReport {
    pub participant_id: u32,
    pub viewport: Option<Viewport>,
    /// None when no join time was recorded
    pub session_ms: Option<u64>,
}

#[derive(Debug, Default)]
pub struct SessionDirectory {
    /// participant id -> join time (ms)
    join_times: BTreeMap<u32, u64>,
    /// participant id -> owned viewport
    viewports: BTreeMap<u32, Viewport>,
    grid: GridShape,
    next_viewport_id: u32,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self {
            next_viewport_id: 1,
            ..Default::default()
        }
    }

    /// Record the participant, give it a fresh viewport and rebroadcast the grid.
    pub fn on_join(&mut self, participant_id: u32, now_ms: u64, bus: &mut EventBus) -> JoinOutcome {
        if let Some(existing) = self.viewports.get(&participant_id) {
            return JoinOutcome::AlreadyJoined(existing.id);
        }

        self.join_times.insert(participant_id, now_ms);
        let viewport_id = self.next_viewport_id;
        self.next_viewport_id = self.next_viewport_id.wrapping_add(1);
        let viewport = Viewport::create(viewport_id, participant_id);

        bus.publish(Origin::Scene, Event::ParticipantJoined { participant_id });
        bus.publish(
            Origin::Viewport(viewport_id),
            Event::ViewportCreated {
                owner_id: participant_id,
                layout: viewport.layout(),
                participant_count: self.join_times.len() as u32,
            },
        );
        self.viewports.insert(participant_id, viewport);
        tracing::info!(participant_id, viewport_id, "participant joined");

        let shape = self.grown_shape();
        self.broadcast_grid_shape(shape, bus);
        JoinOutcome::Joined(viewport_id)
    }

    /// Tear down a participant. Unknown or already-removed ids are a no-op.
    pub fn on_leave(
        &mut self,
        participant_id: u32,
        now_ms: u64,
        bus: &mut EventBus,
    ) -> Option<LeaveReport> {
        let joined_at = self.join_times.remove(&participant_id);
        let viewport = self.viewports.remove(&participant_id);
        if joined_at.is_none() && viewport.is_none() {
            tracing::debug!(participant_id, "leave for unknown participant ignored");
            return None;
        }

        let session_ms = joined_at.map(|t| now_ms.saturating_sub(t));
        match session_ms {
            Some(ms) => tracing::info!(
                participant_id,
                session_secs = ms as f64 / 1000.0,
                "participant left"
            ),
            None => tracing::info!(participant_id, "participant left (no join time recorded)"),
        }

        bus.publish(
            Origin::Scene,
            Event::ParticipantLeft {
                participant_id,
                session_ms,
            },
        );

        let viewport = viewport.map(|mut vp| {
            vp.remove();
            bus.publish(
                Origin::Viewport(vp.id),
                Event::ViewportRemoved {
                    owner_id: participant_id,
                },
            );
            vp
        });
        bus.publish(Origin::Scene, Event::SelectorEntryRemoved);

        // Leaving never shrinks the grid, even if this viewport held the max offset.
        let shape = self.grown_shape();
        self.broadcast_grid_shape(shape, bus);

        Some(LeaveReport {
            participant_id,
            viewport,
            session_ms,
        })
    }

    /// Move a participant's viewport to another grid cell and rebroadcast the grid.
    pub fn set_cell_offset(
        &mut self,
        participant_id: u32,
        axis: Axis,
        value: u32,
        bus: &mut EventBus,
    ) -> Result<GridShape, DirectoryError> {
        let viewport = self
            .viewports
            .get_mut(&participant_id)
            .ok_or(DirectoryError::UnknownParticipant(participant_id))?;
        viewport.set_cell_offset(axis, value);
        Ok(self.recompute_grid_shape(bus))
    }

    pub fn set_pixel_delta(
        &mut self,
        participant_id: u32,
        axis: Axis,
        value: f64,
        bus: &mut EventBus,
    ) -> Result<(), DirectoryError> {
        let viewport = self
            .viewports
            .get_mut(&participant_id)
            .ok_or(DirectoryError::UnknownParticipant(participant_id))?;
        viewport.set_pixel_delta(axis, value, bus);
        Ok(())
    }

    /// `1 + max offset` on each axis over live viewports, sent to all of them.
    pub fn recompute_grid_shape(&mut self, bus: &mut EventBus) -> GridShape {
        let shape = self.live_shape();
        self.broadcast_grid_shape(shape, bus);
        shape
    }

    pub fn grid_shape(&self) -> GridShape {
        self.grid
    }

    pub fn viewport(&self, participant_id: u32) -> Option<&Viewport> {
        self.viewports.get(&participant_id)
    }

    /// Live viewports ordered by owner id.
    pub fn viewports(&self) -> impl Iterator<Item = &Viewport> {
        self.viewports.values()
    }

    pub fn participant_ids(&self) -> Vec<u32> {
        self.join_times.keys().copied().collect()
    }

    pub fn joined_at(&self, participant_id: u32) -> Option<u64> {
        self.join_times.get(&participant_id).copied()
    }

    pub fn len(&self) -> usize {
        self.join_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.join_times.is_empty()
    }

    fn live_shape(&self) -> GridShape {
        let max_x = self.viewports.values().map(|v| v.cell_offset().0).max();
        let max_y = self.viewports.values().map(|v| v.cell_offset().1).max();
        GridShape {
            width: max_x.unwrap_or(0).saturating_add(1),
            height: max_y.unwrap_or(0).saturating_add(1),
        }
    }

    /// Live shape, but never smaller than the current one.
    fn grown_shape(&self) -> GridShape {
        let live = self.live_shape();
        GridShape {
            width: live.width.max(self.grid.width),
            height: live.height.max(self.grid.height),
        }
    }

    fn broadcast_grid_shape(&mut self, shape: GridShape, bus: &mut EventBus) {
        self.grid = shape;
        for viewport in self.viewports.values_mut() {
            viewport.apply_grid_shape(shape.width, shape.height, bus);
        }
    }
}
