//! Per-participant camera tile.

use crate::event_bus::{Event, EventBus, Origin};
use multicam_shared::tile::{Projection, TileLayout};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// An axis tag other than "X" or "Y".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAxis(pub String);

impl fmt::Display for InvalidAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid axis tag {:?} (expected \"X\" or \"Y\")", self.0)
    }
}

impl std::error::Error for InvalidAxis {}

impl FromStr for Axis {
    type Err = InvalidAxis;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" | "x" => Ok(Axis::X),
            "Y" | "y" => Ok(Axis::Y),
            other => Err(InvalidAxis(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportState {
    /// Allocated, no grid broadcast received yet
    Created,
    Active,
    /// Terminal
    Removed,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    pub id: u32,
    pub owner_id: u32,
    layout: TileLayout,
    state: ViewportState,
}

impl Viewport {
    /// Fresh viewport on a 1x1 grid at cell 0/0 with no pixel delta.
    pub fn create(id: u32, owner_id: u32) -> Self {
        Self {
            id,
            owner_id,
            layout: TileLayout::default(),
            state: ViewportState::Created,
        }
    }

    pub fn layout(&self) -> TileLayout {
        self.layout
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn cell_offset(&self) -> (u32, u32) {
        (self.layout.cell_offset_x, self.layout.cell_offset_y)
    }

    /// Claim a grid column or row. The grid shape is shared, so the caller is
    /// expected to ask the directory for a recompute when this returns true.
    pub fn set_cell_offset(&mut self, axis: Axis, value: u32) -> bool {
        if self.state == ViewportState::Removed {
            return false;
        }
        match axis {
            Axis::X => self.layout.cell_offset_x = value,
            Axis::Y => self.layout.cell_offset_y = value,
        }
        true
    }

    /// Local fine adjustment; does not touch the grid shape.
    pub fn set_pixel_delta(&mut self, axis: Axis, value: f64, bus: &mut EventBus) -> bool {
        if self.state == ViewportState::Removed {
            return false;
        }
        match axis {
            Axis::X => self.layout.pixel_delta_x = value,
            Axis::Y => self.layout.pixel_delta_y = value,
        }
        self.publish_projection(bus);
        true
    }

    /// Grid shape broadcast from the directory.
    pub fn apply_grid_shape(&mut self, width: u32, height: u32, bus: &mut EventBus) {
        if self.state == ViewportState::Removed {
            return;
        }
        self.layout.grid_full_width = width;
        self.layout.grid_full_height = height;
        self.state = ViewportState::Active;
        self.publish_projection(bus);
    }

    pub fn remove(&mut self) {
        self.state = ViewportState::Removed;
    }

    pub fn projection(&self, window_width: f64, window_height: f64) -> Projection {
        self.layout.projection(window_width, window_height)
    }

    fn publish_projection(&self, bus: &mut EventBus) {
        bus.publish(
            Origin::Viewport(self.id),
            Event::ProjectionChanged {
                owner_id: self.owner_id,
                layout: self.layout,
            },
        );
    }
}
