use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::SceneConfig;
use crate::tile::TileLayout;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "frame")]
    Frame(FrameMsg),
}

/// Full scene snapshot sent once to a newly joined participant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub server_version: String,
    pub self_id: u32,
    pub viewport_id: u32,
    pub config: SceneConfig,
    pub bodies: Vec<BodyWire>,
    pub obstacle: ObstacleWire,
    pub viewports: Vec<ViewportWire>,
    /// Logical scene time (ms)
    pub now: u64,
}

/// Everything published since the previous frame boundary, in publish order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct FrameMsg {
    pub now: u64,
    pub events: Vec<EventWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct BodyWire {
    pub id: u32,
    pub radius: f64,
    pub color: u32,
    pub pos: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ObstacleWire {
    pub pos: [f64; 3],
    pub radius: f64,
    pub color: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ViewportWire {
    pub id: u32,
    pub owner_id: u32,
    pub layout: TileLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "kind")]
pub enum EventWire {
    #[serde(rename = "body_moved")]
    BodyMoved(BodyMovedEvent),
    #[serde(rename = "obstacle_moved")]
    ObstacleMoved(ObstacleMovedEvent),
    #[serde(rename = "obstacle_recolored")]
    ObstacleRecolored(ObstacleRecoloredEvent),
    #[serde(rename = "projection_changed")]
    ProjectionChanged(ViewportWire),
    #[serde(rename = "viewport_created")]
    ViewportCreated(ViewportCreatedEvent),
    #[serde(rename = "viewport_removed")]
    ViewportRemoved(ViewportRemovedEvent),
    /// UI hint: drop the last entry of the tile selector lists.
    #[serde(rename = "selector_entry_removed")]
    SelectorEntryRemoved,
    #[serde(rename = "participant_joined")]
    ParticipantJoined(ParticipantJoinedEvent),
    #[serde(rename = "participant_left")]
    ParticipantLeft(ParticipantLeftEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct BodyMovedEvent {
    pub body_id: u32,
    pub pos: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct ObstacleMovedEvent {
    pub pos: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct ObstacleRecoloredEvent {
    pub color: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ViewportCreatedEvent {
    pub viewport: ViewportWire,
    /// Participants in the session after this join
    pub participant_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ViewportRemovedEvent {
    pub viewport_id: u32,
    pub owner_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ParticipantJoinedEvent {
    pub participant_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ParticipantLeftEvent {
    pub participant_id: u32,
    /// Time between join and leave (ms), if a join was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_ms: Option<u64>,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    /// Claim a grid column ("X") or row ("Y") for this participant's viewport
    #[serde(rename = "set_cell_offset")]
    SetCellOffset { axis: String, value: u32 },
    /// Fine-tune this participant's viewport along "X" or "Y" (pixels)
    #[serde(rename = "set_pixel_delta")]
    SetPixelDelta { axis: String, value: f64 },
    #[serde(rename = "drag_obstacle")]
    DragObstacle { pos: [f64; 3] },
    #[serde(rename = "reset")]
    Reset,
}

// === Conversion helpers ===

/// Round to 4 decimal places (plenty for scene units, keeps JSON small)
#[inline]
pub fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}
