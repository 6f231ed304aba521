//! The "session boundary API" (spec §6): the narrow observable surface the
//! excluded web layer consumes. Modeled as a trait plus a `tokio::sync::
//! broadcast`-backed default, matching this pack's preference for channels
//! over shared, lockable state.

use std::collections::VecDeque;

use mc_protocol::chat::ChatComponent;
use mc_world_mirror::mirror::Queue;
use tokio::sync::broadcast;

/// One profile's `{id, connected, queue, playing, player, dimension,
/// reconnectIn}` snapshot (spec §6).
#[derive(Clone, Debug, PartialEq)]
pub struct SessionStatus {
    pub profile_id: String,
    pub connected: bool,
    pub queue: Option<Queue>,
    pub playing: bool,
    pub player: Option<PlayerSnapshot>,
    pub dimension: Option<i32>,
    /// Milliseconds until the next auto-reconnect attempt, if one is
    /// scheduled.
    pub reconnect_in: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatEvent {
    pub profile_id: String,
    pub message: ChatComponent,
}

/// Fired when the mirror sees another player join the world (spec §3's
/// `notifyPlayers` setting): the narrow event the excluded notification
/// layer would actually act on.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSpawnEvent {
    pub profile_id: String,
    pub player_name: String,
}

/// A sink for status snapshots and chat lines, narrow enough that the core
/// never has to know who (if anyone) is actually subscribed (spec §1's
/// external collaborator list).
pub trait SessionObserver: Send + Sync {
    fn status_changed(&self, status: SessionStatus);
    fn chat(&self, event: ChatEvent);
    fn player_spawned(&self, event: PlayerSpawnEvent);
}

/// Default implementation: two broadcast channels, one per event kind, plus
/// a replay buffer so a late subscriber still gets the last 100 chat
/// messages (spec §6: "on subscribe the last 100 chat messages are
/// replayed").
pub struct BroadcastObserver {
    status_tx: broadcast::Sender<SessionStatus>,
    chat_tx: broadcast::Sender<ChatEvent>,
    spawn_tx: broadcast::Sender<PlayerSpawnEvent>,
    recent_chat: std::sync::Mutex<VecDeque<ChatEvent>>,
}

impl BroadcastObserver {
    pub const CHAT_REPLAY_CAP: usize = 100;

    pub fn new() -> Self {
        let (status_tx, _) = broadcast::channel(256);
        let (chat_tx, _) = broadcast::channel(256);
        let (spawn_tx, _) = broadcast::channel(256);
        Self { status_tx, chat_tx, spawn_tx, recent_chat: std::sync::Mutex::new(VecDeque::new()) }
    }

    pub fn subscribe_status(&self) -> broadcast::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Subscribes to live chat and replays the last 100 buffered messages
    /// immediately, oldest first.
    pub fn subscribe_chat(&self) -> (Vec<ChatEvent>, broadcast::Receiver<ChatEvent>) {
        let backlog = self.recent_chat.lock().unwrap().iter().cloned().collect();
        (backlog, self.chat_tx.subscribe())
    }

    pub fn subscribe_player_spawns(&self) -> broadcast::Receiver<PlayerSpawnEvent> {
        self.spawn_tx.subscribe()
    }
}

impl Default for BroadcastObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionObserver for BroadcastObserver {
    fn status_changed(&self, status: SessionStatus) {
        let _ = self.status_tx.send(status);
    }

    fn chat(&self, event: ChatEvent) {
        {
            let mut recent = self.recent_chat.lock().unwrap();
            recent.push_back(event.clone());
            if recent.len() > Self::CHAT_REPLAY_CAP {
                recent.pop_front();
            }
        }
        let _ = self.chat_tx.send(event);
    }

    fn player_spawned(&self, event: PlayerSpawnEvent) {
        let _ = self.spawn_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_subscriber_replays_buffered_chat() {
        let observer = BroadcastObserver::new();
        for i in 0..5 {
            observer.chat(ChatEvent { profile_id: "p".to_owned(), message: ChatComponent::text(format!("{i}")) });
        }

        let (backlog, _rx) = observer.subscribe_chat();
        assert_eq!(backlog.len(), 5);
        assert_eq!(backlog[0].message.plain_text(), "0");
    }

    #[test]
    fn player_spawn_events_reach_a_live_subscriber() {
        let observer = BroadcastObserver::new();
        let mut rx = observer.subscribe_player_spawns();
        observer.player_spawned(PlayerSpawnEvent { profile_id: "p".to_owned(), player_name: "Dinnerbone".to_owned() });
        assert_eq!(rx.try_recv().unwrap().player_name, "Dinnerbone");
    }

    #[test]
    fn replay_buffer_caps_at_one_hundred() {
        let observer = BroadcastObserver::new();
        for i in 0..150 {
            observer.chat(ChatEvent { profile_id: "p".to_owned(), message: ChatComponent::text(format!("{i}")) });
        }
        let (backlog, _rx) = observer.subscribe_chat();
        assert_eq!(backlog.len(), BroadcastObserver::CHAT_REPLAY_CAP);
        assert_eq!(backlog[0].message.plain_text(), "50");
    }
}
