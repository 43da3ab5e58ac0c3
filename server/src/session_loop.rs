use crate::config::ServerConfig;
use crate::event_bus::{Delivery, Envelope, TopicFilter, TopicKind};
use crate::protocol::{event_wire, welcome_msg, ClientMsg, FrameMsg, WelcomeMsg};
use crate::scene::{Command, SceneModel};
use multicam_shared::vec3::Vec3;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Commands from client connections to the session loop
pub enum SessionCommand {
    Join {
        response: oneshot::Sender<(u32, WelcomeMsg)>,
    },
    Leave {
        id: u32,
    },
    Client {
        id: u32,
        msg: ClientMsg,
    },
}

/// Broadcasts from the session loop to all clients
#[derive(Debug, Clone)]
pub enum SessionBroadcast {
    Frame(FrameMsg),
}

/// Topics every client needs every publish of.
const EVERY_KINDS: &[TopicKind] = &[
    TopicKind::ObstacleRecolored,
    TopicKind::ViewportCreated,
    TopicKind::ViewportRemoved,
    TopicKind::SelectorEntryRemoved,
    TopicKind::ParticipantJoined,
    TopicKind::ParticipantLeft,
];

/// Topics where only the latest value per frame matters.
const COALESCED_KINDS: &[TopicKind] = &[
    TopicKind::BodyMoved,
    TopicKind::ObstacleMoved,
    TopicKind::ProjectionChanged,
];

/// Map a client message onto a scene command for participant `id`.
pub fn command_for(id: u32, msg: ClientMsg) -> Command {
    match msg {
        ClientMsg::SetCellOffset { axis, value } => Command::SetCellOffset {
            participant_id: id,
            axis,
            value,
        },
        ClientMsg::SetPixelDelta { axis, value } => Command::SetPixelDelta {
            participant_id: id,
            axis,
            value,
        },
        ClientMsg::DragObstacle { pos } => Command::DragObstacle {
            pos: Vec3::from_array(pos),
        },
        ClientMsg::Reset => Command::Reset,
    }
}

/// Run the session loop. Owns the scene.
pub async fn run_session_loop(
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    broadcast_tx: broadcast::Sender<SessionBroadcast>,
    config: ServerConfig,
) {
    let mut scene = SceneModel::new(&config.scene, config.rng_seed);
    let every = scene.subscribe(TopicFilter::kinds(EVERY_KINDS), Delivery::Every);
    let coalesced = scene.subscribe(
        TopicFilter::kinds(COALESCED_KINDS),
        Delivery::OncePerFrame,
    );

    let step_ms = config.scene.step_ms;
    let mut next_participant_id: u32 = 1;

    let mut step_interval = tokio::time::interval(config.step_duration());
    step_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut frame_interval = tokio::time::interval(config.frame_duration());
    frame_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(
        bodies = scene.bodies.len(),
        step_ms,
        frame_rate_hz = config.frame_rate_hz,
        "session loop started"
    );

    loop {
        tokio::select! {
            _ = step_interval.tick() => {
                let until = scene.now_ms() + step_ms;
                scene.advance_to(until);
            }

            _ = frame_interval.tick() => {
                scene.end_frame();
                let mut envelopes: Vec<Envelope> = scene.drain(every);
                envelopes.extend(scene.drain(coalesced));
                if envelopes.is_empty() {
                    continue;
                }
                envelopes.sort_by_key(|e| e.seq);
                let msg = FrameMsg {
                    now: scene.now_ms(),
                    events: envelopes.iter().filter_map(event_wire).collect(),
                };
                // No receivers is fine; nobody is connected.
                let _ = broadcast_tx.send(SessionBroadcast::Frame(msg));
            }

            Some(cmd) = cmd_rx.recv() => {
                match cmd {
                    SessionCommand::Join { response } => {
                        let participant_id = next_participant_id;
                        next_participant_id = next_participant_id.wrapping_add(1);
                        let viewport_id = scene.join(participant_id);
                        let welcome = welcome_msg(&scene, participant_id, viewport_id);
                        if response.send((participant_id, welcome)).is_err() {
                            tracing::debug!(participant_id, "connection gone before welcome");
                            scene.leave(participant_id);
                        }
                    }
                    SessionCommand::Leave { id } => {
                        scene.leave(id);
                    }
                    SessionCommand::Client { id, msg } => {
                        scene.apply(&command_for(id, msg));
                    }
                }
            }

            else => break,
        }
    }

    scene.shutdown();
    tracing::info!("Session loop ended");
}
