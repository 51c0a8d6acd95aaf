use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Change feed: one channel for every ledger event plus one per room.
pub struct NotifyHub {
    all: broadcast::Sender<Event>,
    rooms: DashMap<String, broadcast::Sender<Event>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            all: broadcast::channel(CHANNEL_CAPACITY).0,
            rooms: DashMap::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.all.subscribe()
    }

    /// Subscribe to one room. Creates the channel if needed.
    pub fn subscribe_room(&self, room_id: &str) -> broadcast::Receiver<Event> {
        let sender = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Publish an event. A move between rooms reaches both rooms' listeners.
    /// No-op if nobody is listening.
    pub fn send(&self, event: &Event) {
        let _ = self.all.send(event.clone());
        self.send_room(event.room_id(), event);
        if let Event::BookingUpdated { previous_room, booking } = event
            && previous_room != &booking.room_id
        {
            self.send_room(previous_room, event);
        }
    }

    fn send_room(&self, room_id: &str, event: &Event) {
        if let Some(sender) = self.rooms.get(room_id) {
            let _ = sender.send(event.clone());
        }
    }
}
