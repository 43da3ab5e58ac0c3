//! Typed publish/subscribe bus for scene events.
//!
//! Topics are keyed by `(TopicKind, Origin)`. Each subscription picks a
//! delivery mode:
//! - `Delivery::Every`: every publish is queued, in publish order.
//! - `Delivery::OncePerFrame`: publishes of the same topic between two frame
//!   boundaries collapse into one envelope carrying the latest payload. It
//!   becomes visible when `end_frame()` is called.

use multicam_shared::tile::TileLayout;
use multicam_shared::vec3::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    BodyMoved,
    ObstacleMoved,
    ObstacleRecolored,
    ProjectionChanged,
    ViewportCreated,
    ViewportRemoved,
    SelectorEntryRemoved,
    ParticipantJoined,
    ParticipantLeft,
}

/// Entity a topic is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    Scene,
    Body(u32),
    Viewport(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Topic {
    pub kind: TopicKind,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BodyMoved {
        pos: Vec3,
    },
    ObstacleMoved {
        pos: Vec3,
    },
    /// A body struck the obstacle (body color) or the obstacle was reset (neutral color)
    ObstacleRecolored {
        color: u32,
    },
    ProjectionChanged {
        owner_id: u32,
        layout: TileLayout,
    },
    ViewportCreated {
        owner_id: u32,
        layout: TileLayout,
        participant_count: u32,
    },
    ViewportRemoved {
        owner_id: u32,
    },
    SelectorEntryRemoved,
    ParticipantJoined {
        participant_id: u32,
    },
    ParticipantLeft {
        participant_id: u32,
        session_ms: Option<u64>,
    },
}

impl Event {
    pub fn kind(&self) -> TopicKind {
        match self {
            Event::BodyMoved { .. } => TopicKind::BodyMoved,
            Event::ObstacleMoved { .. } => TopicKind::ObstacleMoved,
            Event::ObstacleRecolored { .. } => TopicKind::ObstacleRecolored,
            Event::ProjectionChanged { .. } => TopicKind::ProjectionChanged,
            Event::ViewportCreated { .. } => TopicKind::ViewportCreated,
            Event::ViewportRemoved { .. } => TopicKind::ViewportRemoved,
            Event::SelectorEntryRemoved => TopicKind::SelectorEntryRemoved,
            Event::ParticipantJoined { .. } => TopicKind::ParticipantJoined,
            Event::ParticipantLeft { .. } => TopicKind::ParticipantLeft,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Bus-wide publish sequence number
    pub seq: u64,
    pub topic: Topic,
    pub event: Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Every,
    OncePerFrame,
}

/// Which topics a subscription receives. An empty `kinds` list matches any kind.
#[derive(Debug, Clone, Default)]
pub struct TopicFilter {
    pub kinds: Vec<TopicKind>,
    pub origin: Option<Origin>,
}

impl TopicFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn kinds(kinds: &[TopicKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            origin: None,
        }
    }

    pub fn topic(kind: TopicKind, origin: Origin) -> Self {
        Self {
            kinds: vec![kind],
            origin: Some(origin),
        }
    }

    fn matches(&self, topic: &Topic) -> bool {
        (self.kinds.is_empty() || self.kinds.contains(&topic.kind))
            && self.origin.map_or(true, |o| o == topic.origin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug)]
struct Subscription {
    id: SubscriptionId,
    filter: TopicFilter,
    delivery: Delivery,
    /// Envelopes ready to be drained
    ready: Vec<Envelope>,
    /// Coalesced envelopes waiting for the next frame boundary
    pending: Vec<Envelope>,
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_subscription_id: u64,
    next_seq: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, filter: TopicFilter, delivery: Delivery) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription_id);
        self.next_subscription_id += 1;
        self.subscriptions.push(Subscription {
            id,
            filter,
            delivery,
            ready: Vec::new(),
            pending: Vec::new(),
        });
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn publish(&mut self, origin: Origin, event: Event) {
        let topic = Topic {
            kind: event.kind(),
            origin,
        };
        let seq = self.next_seq;
        self.next_seq += 1;

        for sub in self
            .subscriptions
            .iter_mut()
            .filter(|s| s.filter.matches(&topic))
        {
            let envelope = Envelope {
                seq,
                topic,
                event: event.clone(),
            };
            match sub.delivery {
                Delivery::Every => sub.ready.push(envelope),
                Delivery::OncePerFrame => {
                    match sub.pending.iter_mut().find(|e| e.topic == topic) {
                        Some(slot) => *slot = envelope,
                        None => sub.pending.push(envelope),
                    }
                }
            }
        }
    }

    /// Frame boundary: release coalesced envelopes, ordered by their latest publish.
    pub fn end_frame(&mut self) {
        for sub in &mut self.subscriptions {
            sub.pending.sort_by_key(|e| e.seq);
            sub.ready.append(&mut sub.pending);
        }
    }

    /// Take everything deliverable for a subscription. Unknown ids yield nothing.
    pub fn drain(&mut self, id: SubscriptionId) -> Vec<Envelope> {
        self.subscriptions
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| std::mem::take(&mut s.ready))
            .unwrap_or_default()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_with_delta(dx: f64) -> TileLayout {
        TileLayout {
            pixel_delta_x: dx,
            ..Default::default()
        }
    }

    fn projection(dx: f64) -> Event {
        Event::ProjectionChanged {
            owner_id: 1,
            layout: layout_with_delta(dx),
        }
    }

    #[test]
    fn three_publishes_before_frame_collapse_to_last() {
        let mut bus = EventBus::new();
        let view = bus.subscribe(
            TopicFilter::topic(TopicKind::ProjectionChanged, Origin::Viewport(7)),
            Delivery::OncePerFrame,
        );

        bus.publish(Origin::Viewport(7), projection(1.0));
        bus.publish(Origin::Viewport(7), projection(2.0));
        bus.publish(Origin::Viewport(7), projection(3.0));

        // Nothing is visible until the frame boundary
        assert!(bus.drain(view).is_empty());

        bus.end_frame();
        let delivered = bus.drain(view);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].event, projection(3.0));

        bus.end_frame();
        assert!(bus.drain(view).is_empty());
    }

    #[test]
    fn every_delivery_keeps_all_publishes_in_order() {
        let mut bus = EventBus::new();
        let log = bus.subscribe(TopicFilter::any(), Delivery::Every);

        bus.publish(Origin::Viewport(7), projection(1.0));
        bus.publish(Origin::Viewport(7), projection(2.0));
        bus.publish(Origin::Scene, Event::SelectorEntryRemoved);

        let delivered = bus.drain(log);
        assert_eq!(delivered.len(), 3);
        assert!(delivered.windows(2).all(|w| w[0].seq < w[1].seq));
        assert_eq!(delivered[1].event, projection(2.0));
    }

    #[test]
    fn coalescing_is_per_origin() {
        let mut bus = EventBus::new();
        let sub = bus.subscribe(
            TopicFilter::kinds(&[TopicKind::BodyMoved]),
            Delivery::OncePerFrame,
        );

        for i in 0..5 {
            let pos = Vec3::new(i as f64, 0.0, 0.0);
            bus.publish(Origin::Body(1), Event::BodyMoved { pos });
            bus.publish(Origin::Body(2), Event::BodyMoved { pos });
        }
        bus.end_frame();

        let delivered = bus.drain(sub);
        assert_eq!(delivered.len(), 2);
        for env in &delivered {
            assert_eq!(
                env.event,
                Event::BodyMoved {
                    pos: Vec3::new(4.0, 0.0, 0.0)
                }
            );
        }
    }

    #[test]
    fn filter_excludes_other_kinds_and_origins() {
        let mut bus = EventBus::new();
        let sub = bus.subscribe(
            TopicFilter::topic(TopicKind::ProjectionChanged, Origin::Viewport(1)),
            Delivery::Every,
        );

        bus.publish(Origin::Viewport(2), projection(1.0));
        bus.publish(Origin::Scene, Event::SelectorEntryRemoved);
        bus.publish(Origin::Viewport(1), projection(5.0));

        let delivered = bus.drain(sub);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].topic.origin, Origin::Viewport(1));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let sub = bus.subscribe(TopicFilter::any(), Delivery::Every);
        assert!(bus.unsubscribe(sub));
        assert!(!bus.unsubscribe(sub));

        bus.publish(Origin::Scene, Event::SelectorEntryRemoved);
        assert!(bus.drain(sub).is_empty());
        assert_eq!(bus.subscription_count(), 0);
    }

    #[test]
    fn coalesced_envelopes_ordered_by_latest_publish() {
        let mut bus = EventBus::new();
        let sub = bus.subscribe(TopicFilter::any(), Delivery::OncePerFrame);

        bus.publish(Origin::Body(1), Event::BodyMoved { pos: Vec3::ZERO });
        bus.publish(Origin::Body(2), Event::BodyMoved { pos: Vec3::ZERO });
        bus.publish(Origin::Body(1), Event::BodyMoved { pos: Vec3::ZERO });
        bus.end_frame();

        let origins: Vec<Origin> = bus.drain(sub).iter().map(|e| e.topic.origin).collect();
        assert_eq!(origins, vec![Origin::Body(2), Origin::Body(1)]);
    }
}
