//! A user profile and its per-session behavior knobs (spec §3). Owned
//! externally (persistence, token refresh); this crate only reads them.

use std::collections::HashSet;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    /// 32-hex-digit identifier, hyphenated or bare — normalized on use.
    pub id: String,
    pub name: String,
    pub access_token: String,
    /// The Mojang username that owns this profile (spec §6's ownership
    /// check, and the identity a downstream login is matched against).
    pub owner: String,
    pub settings: ProfileSettings,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProfileSettings {
    pub auto_reconnect: AutoReconnect,
    pub auto_disconnect: AutoDisconnect,
    pub notify_players: NotifyPlayers,
    pub enable_packet_dumps: bool,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            auto_reconnect: AutoReconnect::default(),
            auto_disconnect: AutoDisconnect::default(),
            notify_players: NotifyPlayers::default(),
            enable_packet_dumps: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutoReconnect {
    pub enabled: bool,
    pub delay: Duration,
}

impl Default for AutoReconnect {
    fn default() -> Self {
        Self { enabled: true, delay: Duration::from_millis(5_000) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutoDisconnect {
    pub enabled: bool,
    pub disable_while_playing: bool,
    pub health: f32,
}

impl Default for AutoDisconnect {
    fn default() -> Self {
        Self { enabled: false, disable_while_playing: true, health: 5.0 }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotifyPlayers {
    pub enabled: bool,
    pub disable_while_playing: bool,
    pub ignore: HashSet<String>,
}

/// Reads the set of profiles a connecting user owns and refreshes a stale
/// access token; the core only ever sees this narrow interface (spec §1, §6
/// names the actual persistence/auth layers as excluded external
/// collaborators). A real token-refresh implementation would make this
/// trait async; the static, config-file-backed store this binary ships
/// with needs no I/O to answer either question.
pub trait ProfileStore: Send + Sync {
    fn profiles_for_owner(&self, owner: &str) -> Vec<Profile>;
    fn refresh_token(&self, profile: &mut Profile) -> anyhow::Result<bool>;
    fn owns_profile(&self, owner: &str, profile_id: &str) -> bool;

    /// Finds the profile an owner logs in as directly, i.e. the one with
    /// `name == username` (spec §4.6's login match). The default walks
    /// `profiles_for_owner`; a real persistence layer would likely index
    /// this directly.
    fn profile_named(&self, owner: &str, name: &str) -> Option<Profile> {
        self.profiles_for_owner(owner).into_iter().find(|p| p.name == name)
    }

    /// Total number of profiles this store knows about, across every owner
    /// (spec §4.6's status-response "player max").
    fn profile_count(&self) -> usize;
}
