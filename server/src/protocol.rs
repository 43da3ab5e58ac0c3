//! Conversions from scene state to the wire types in `multicam_shared::protocol`.

pub use multicam_shared::protocol::*;

use crate::body::Body;
use crate::event_bus::{Envelope, Event, Origin};
use crate::scene::SceneModel;
use crate::viewport::Viewport;
use multicam_shared::tile::TileLayout;
use multicam_shared::vec3::Vec3;

fn pos_wire(p: Vec3) -> [f64; 3] {
    [round4(p.x), round4(p.y), round4(p.z)]
}

pub fn body_wire(body: &Body) -> BodyWire {
    BodyWire {
        id: body.id,
        radius: body.radius,
        color: body.color,
        pos: pos_wire(body.pos),
    }
}

pub fn viewport_wire(viewport: &Viewport) -> ViewportWire {
    ViewportWire {
        id: viewport.id,
        owner_id: viewport.owner_id,
        layout: viewport.layout(),
    }
}

/// Full snapshot for a participant that just joined.
pub fn welcome_msg(scene: &SceneModel, self_id: u32, viewport_id: u32) -> WelcomeMsg {
    WelcomeMsg {
        protocol_version: PROTOCOL_VERSION,
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        self_id,
        viewport_id,
        config: scene.config,
        bodies: scene.bodies.iter().map(body_wire).collect(),
        obstacle: ObstacleWire {
            pos: pos_wire(scene.obstacle.pos),
            radius: scene.obstacle.radius,
            color: scene.obstacle_color,
        },
        viewports: scene.directory.viewports().map(viewport_wire).collect(),
        now: scene.now_ms(),
    }
}

/// Wire form of a bus envelope. None if the origin does not fit the event kind.
pub fn event_wire(envelope: &Envelope) -> Option<EventWire> {
    let origin = envelope.topic.origin;
    let wire = match &envelope.event {
        Event::BodyMoved { pos } => {
            let Origin::Body(body_id) = origin else {
                return None;
            };
            EventWire::BodyMoved(BodyMovedEvent {
                body_id,
                pos: pos_wire(*pos),
            })
        }
        Event::ObstacleMoved { pos } => EventWire::ObstacleMoved(ObstacleMovedEvent {
            pos: pos_wire(*pos),
        }),
        Event::ObstacleRecolored { color } => {
            EventWire::ObstacleRecolored(ObstacleRecoloredEvent { color: *color })
        }
        Event::ProjectionChanged { owner_id, layout } => {
            EventWire::ProjectionChanged(viewport_from_origin(origin, *owner_id, *layout)?)
        }
        Event::ViewportCreated {
            owner_id,
            layout,
            participant_count,
        } => EventWire::ViewportCreated(ViewportCreatedEvent {
            viewport: viewport_from_origin(origin, *owner_id, *layout)?,
            participant_count: *participant_count,
        }),
        Event::ViewportRemoved { owner_id } => {
            let Origin::Viewport(viewport_id) = origin else {
                return None;
            };
            EventWire::ViewportRemoved(ViewportRemovedEvent {
                viewport_id,
                owner_id: *owner_id,
            })
        }
        Event::SelectorEntryRemoved => EventWire::SelectorEntryRemoved,
        Event::ParticipantJoined { participant_id } => {
            EventWire::ParticipantJoined(ParticipantJoinedEvent {
                participant_id: *participant_id,
            })
        }
        Event::ParticipantLeft {
            participant_id,
            session_ms,
        } => EventWire::ParticipantLeft(ParticipantLeftEvent {
            participant_id: *participant_id,
            session_ms: *session_ms,
        }),
    };
    Some(wire)
}

fn viewport_from_origin(origin: Origin, owner_id: u32, layout: TileLayout) -> Option<ViewportWire> {
    match origin {
        Origin::Viewport(id) => Some(ViewportWire {
            id,
            owner_id,
            layout,
        }),
        _ => None,
    }
}
