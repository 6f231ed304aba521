//! Command-line entry point and the `proxy.toml` config file it loads, plus
//! the static, config-file-backed [`ProfileStore`] this binary ships with.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::profile::{AutoDisconnect, AutoReconnect, NotifyPlayers, Profile, ProfileSettings, ProfileStore};

#[derive(Parser, Clone, Debug)]
#[clap(author, version, about = "A session-multiplexing proxy for Minecraft 1.12.2 servers.")]
pub struct Cli {
    /// Path to the TOML config file.
    #[clap(long, default_value = "proxy.toml")]
    pub config: PathBuf,

    /// Overrides `listen_addr` from the config file.
    #[clap(long)]
    pub listen: Option<String>,

    /// Overrides `upstream_addr` from the config file.
    #[clap(long)]
    pub upstream: Option<String>,

    /// Overrides `dump_dir` from the config file.
    #[clap(long)]
    pub dump_dir: Option<PathBuf>,
}

fn default_status_motd() -> String {
    "2b2t Proxy".to_owned()
}

fn default_compression_threshold() -> i32 {
    256
}

fn default_dump_dir() -> PathBuf {
    PathBuf::from("dumps/")
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProxyConfig {
    /// Address this proxy binds its downstream listener to.
    pub listen_addr: String,
    /// Address of the remote Minecraft server every profile's upstream
    /// session connects to.
    pub upstream_addr: String,
    #[serde(default = "default_status_motd")]
    pub status_motd: String,
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: i32,
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,
}

impl ProxyConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Applies the CLI's overrides on top of whatever the file had.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(listen) = &cli.listen {
            self.listen_addr = listen.clone();
        }
        if let Some(upstream) = &cli.upstream {
            self.upstream_addr = upstream.clone();
        }
        if let Some(dump_dir) = &cli.dump_dir {
            self.dump_dir = dump_dir.clone();
        }
        self
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProfileConfig {
    /// Owning player's username; only this owner may `/connect` to the
    /// profile (spec §6's ownership check).
    pub owner: String,
    pub id: String,
    pub name: String,
    pub access_token: String,
    #[serde(default)]
    pub auto_reconnect: AutoReconnectConfig,
    #[serde(default)]
    pub auto_disconnect: AutoDisconnectConfig,
    #[serde(default)]
    pub notify_players: NotifyPlayersConfig,
    #[serde(default)]
    pub enable_packet_dumps: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AutoReconnectConfig {
    pub enabled: bool,
    pub delay_ms: u64,
}

impl Default for AutoReconnectConfig {
    fn default() -> Self {
        let defaults = AutoReconnect::default();
        Self { enabled: defaults.enabled, delay_ms: defaults.delay.as_millis() as u64 }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AutoDisconnectConfig {
    pub enabled: bool,
    pub disable_while_playing: bool,
    pub health: f32,
}

impl Default for AutoDisconnectConfig {
    fn default() -> Self {
        let defaults = AutoDisconnect::default();
        Self {
            enabled: defaults.enabled,
            disable_while_playing: defaults.disable_while_playing,
            health: defaults.health,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NotifyPlayersConfig {
    pub enabled: bool,
    pub disable_while_playing: bool,
    pub ignore: Vec<String>,
}

impl ProfileConfig {
    pub fn to_profile(&self) -> Profile {
        Profile {
            id: self.id.clone(),
            name: self.name.clone(),
            access_token: self.access_token.clone(),
            owner: self.owner.clone(),
            settings: ProfileSettings {
                auto_reconnect: AutoReconnect {
                    enabled: self.auto_reconnect.enabled,
                    delay: Duration::from_millis(self.auto_reconnect.delay_ms),
                },
                auto_disconnect: AutoDisconnect {
                    enabled: self.auto_disconnect.enabled,
                    disable_while_playing: self.auto_disconnect.disable_while_playing,
                    health: self.auto_disconnect.health,
                },
                notify_players: NotifyPlayers {
                    enabled: self.notify_players.enabled,
                    disable_while_playing: self.notify_players.disable_while_playing,
                    ignore: self.notify_players.ignore.iter().cloned().collect(),
                },
                enable_packet_dumps: self.enable_packet_dumps,
            },
        }
    }
}

/// A `ProfileStore` backed entirely by the config file read at startup: no
/// token refresh is actually possible without a persistence layer behind
/// it, so `refresh_token` always reports nothing changed.
pub struct StaticProfileStore {
    by_owner: HashMap<String, Vec<Profile>>,
    owner_of: HashMap<String, String>,
    total: usize,
}

impl StaticProfileStore {
    pub fn from_config(config: &ProxyConfig) -> Self {
        let mut by_owner: HashMap<String, Vec<Profile>> = HashMap::new();
        let mut owner_of = HashMap::new();

        for entry in &config.profiles {
            owner_of.insert(entry.id.clone(), entry.owner.clone());
            by_owner.entry(entry.owner.clone()).or_default().push(entry.to_profile());
        }

        Self { by_owner, owner_of, total: config.profiles.len() }
    }
}

impl ProfileStore for StaticProfileStore {
    fn profiles_for_owner(&self, owner: &str) -> Vec<Profile> {
        self.by_owner.get(owner).cloned().unwrap_or_default()
    }

    fn refresh_token(&self, _profile: &mut Profile) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn owns_profile(&self, owner: &str, profile_id: &str) -> bool {
        self.owner_of.get(profile_id).is_some_and(|o| o == owner)
    }

    fn profile_count(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> ProxyConfig {
        toml::from_str(
            r#"
            listen_addr = "0.0.0.0:25565"
            upstream_addr = "connect.2b2t.org:25565"

            [[profiles]]
            owner = "alice"
            id = "11111111-1111-1111-1111-111111111111"
            name = "alice"
            access_token = "token"

            [[profiles]]
            owner = "alice"
            id = "22222222-2222-2222-2222-222222222222"
            name = "alice_alt"
            access_token = "token2"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_fill_in_when_absent() {
        let config = sample_config();
        assert_eq!(config.status_motd, "2b2t Proxy");
        assert_eq!(config.compression_threshold, 256);
        assert_eq!(config.dump_dir, PathBuf::from("dumps/"));
    }

    #[test]
    fn ownership_check_matches_only_the_configured_owner() {
        let config = sample_config();
        let store = StaticProfileStore::from_config(&config);
        assert!(store.owns_profile("alice", "11111111-1111-1111-1111-111111111111"));
        assert!(!store.owns_profile("mallory", "11111111-1111-1111-1111-111111111111"));
        assert_eq!(store.profiles_for_owner("alice").len(), 2);
    }

    #[test]
    fn profile_named_matches_the_owners_login_profile() {
        let config = sample_config();
        let store = StaticProfileStore::from_config(&config);
        let home = store.profile_named("alice", "alice").unwrap();
        assert_eq!(home.id, "11111111-1111-1111-1111-111111111111");
        assert!(store.profile_named("alice", "nobody").is_none());
    }

    #[test]
    fn profile_count_spans_every_owner() {
        let config = sample_config();
        let store = StaticProfileStore::from_config(&config);
        assert_eq!(store.profile_count(), 2);
    }
}
