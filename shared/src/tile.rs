//! Camera tile layout and the projection derived from it.
//!
//! Every participant's window shows one tile of a virtual frame built from a
//! grid of equally sized windows:
//!
//! ```text
//!  +-----+-----+-----+
//!  | 0/0 | 1/0 | 2/0 | ..
//!  +-----+-----+-----+
//!  | 0/1 | 1/1 | 2/1 | ..
//!  +-----+-----+-----+
//! ```
//!
//! The layout is the replicated part; the projection depends on the local
//! window size and is computed by whoever renders.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Replicated tile state of one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct TileLayout {
    /// Grid width in tiles, shared by every viewport
    pub grid_full_width: u32,
    /// Grid height in tiles, shared by every viewport
    pub grid_full_height: u32,
    /// Column this viewport occupies
    pub cell_offset_x: u32,
    /// Row this viewport occupies
    pub cell_offset_y: u32,
    /// Local fine adjustment in pixels
    pub pixel_delta_x: f64,
    pub pixel_delta_y: f64,
}

impl Default for TileLayout {
    fn default() -> Self {
        Self {
            grid_full_width: 1,
            grid_full_height: 1,
            cell_offset_x: 0,
            cell_offset_y: 0,
            pixel_delta_x: 0.0,
            pixel_delta_y: 0.0,
        }
    }
}

/// Sub-rectangle of a virtual frame, in the shape a perspective camera's
/// view-offset call expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub full_width: f64,
    pub full_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

impl TileLayout {
    /// Projection for a local window of `window_width` x `window_height` pixels.
    pub fn projection(&self, window_width: f64, window_height: f64) -> Projection {
        Projection {
            full_width: window_width * self.grid_full_width as f64,
            full_height: window_height * self.grid_full_height as f64,
            offset_x: window_width * self.cell_offset_x as f64 + self.pixel_delta_x,
            offset_y: window_height * self.cell_offset_y as f64 + self.pixel_delta_y,
            width: window_width,
            height: window_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_single_tile() {
        let p = TileLayout::default().projection(1920.0, 1080.0);
        assert_eq!(p.full_width, 1920.0);
        assert_eq!(p.full_height, 1080.0);
        assert_eq!(p.offset_x, 0.0);
        assert_eq!(p.offset_y, 0.0);
        assert_eq!(p.width, 1920.0);
        assert_eq!(p.height, 1080.0);
    }

    #[test]
    fn tile_in_second_column_second_row() {
        let layout = TileLayout {
            grid_full_width: 3,
            grid_full_height: 2,
            cell_offset_x: 1,
            cell_offset_y: 1,
            ..Default::default()
        };
        let p = layout.projection(800.0, 600.0);
        assert_eq!(p.full_width, 2400.0);
        assert_eq!(p.full_height, 1200.0);
        assert_eq!(p.offset_x, 800.0);
        assert_eq!(p.offset_y, 600.0);
    }

    #[test]
    fn pixel_delta_shifts_offset_only() {
        let layout = TileLayout {
            grid_full_width: 2,
            cell_offset_x: 1,
            pixel_delta_x: -12.5,
            pixel_delta_y: 7.0,
            ..Default::default()
        };
        let p = layout.projection(1000.0, 500.0);
        assert_eq!(p.full_width, 2000.0);
        assert_eq!(p.offset_x, 987.5);
        assert_eq!(p.offset_y, 7.0);
        assert_eq!(p.width, 1000.0);
    }
}
