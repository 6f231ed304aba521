//! One durable upstream connection and the downstream client (if any)
//! attached to it (spec §3, §4.7). Both halves — the upstream reader that
//! feeds the `WorldMirror`, and the downstream reader/writer the bridge
//! rewrites through — are driven from a single task so the mirror never
//! needs a lock (spec §5).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mc_protocol::chat::ChatComponent;
use mc_protocol::codec::{PacketDecoder, PacketEncoder, RawPacket};
use mc_protocol::packets::play_clientbound::ChatMessage;
use mc_protocol::packets::play_serverbound::ChatMessageServerbound;
use mc_protocol::Encode;
use mc_world_mirror::entity::Entity;
use mc_world_mirror::mirror::WorldMirror;
use mc_world_mirror::replay;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};

use crate::bridge::{self, ServerboundAction, CLIENT_EID};
use crate::dump::{Direction, DumpSink, GzFileDumpSink};
use crate::error::{ProxyError, Result};
use crate::io::{flush, read_packet, send_packet, RawBody};
use crate::management::{self, ManagementCommand};
use crate::observer::{BroadcastObserver, ChatEvent, PlayerSnapshot, PlayerSpawnEvent, SessionObserver, SessionStatus};
use crate::profile::{Profile, ProfileStore};
use crate::upstream::{self, DispatchOutcome, UpstreamConnection};

/// How long [`SessionManager::connect`] waits for the upstream handshake
/// before giving up (spec §5: "no explicit timeout... should apply a bound
/// around 30 seconds").
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// The status-changed notification is debounced to this interval (spec §9
/// design note: "a narrow state-changed notification with debounce").
const STATUS_DEBOUNCE: Duration = Duration::from_millis(100);

/// Cross-task instructions for a running [`UpstreamSession`], delivered
/// over its `mpsc` channel — the only way anything outside the session's
/// own task touches its state.
pub enum SessionCommand {
    /// A downstream client completed login and is handing off its split
    /// socket halves to be driven by this session from now on.
    Attach {
        read: OwnedReadHalf,
        write: OwnedWriteHalf,
        decoder: PacketDecoder,
        encoder: PacketEncoder,
        respond: oneshot::Sender<anyhow::Result<()>>,
    },
    /// Detaches the current downstream client, if any, without ending the
    /// upstream connection.
    Detach,
    /// Sends a chat message upstream as this profile (spec §6's
    /// `sendChat`).
    SendChat(String),
    /// Marks the session user-initiated-ended; no auto-reconnect follows
    /// (spec §4.7's `disconnect`).
    Shutdown,
}

/// A lightweight, cloneable reference to a running session's command
/// channel — what [`SessionManager`] and the downstream listener actually
/// hold.
#[derive(Clone)]
pub struct SessionHandle {
    pub profile_id: String,
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn attach(
        &self,
        read: OwnedReadHalf,
        write: OwnedWriteHalf,
        decoder: PacketDecoder,
        encoder: PacketEncoder,
    ) -> anyhow::Result<()> {
        let (respond, rx) = oneshot::channel();
        self.cmd_tx
            .send(SessionCommand::Attach { read, write, decoder, encoder, respond })
            .await
            .map_err(|_| anyhow::anyhow!("session task is gone"))?;
        rx.await.map_err(|_| anyhow::anyhow!("session task dropped the attach response"))?
    }

    pub async fn detach(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Detach).await;
    }

    pub async fn send_chat(&self, message: String) {
        let _ = self.cmd_tx.send(SessionCommand::SendChat(message)).await;
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown).await;
    }
}

struct DownstreamAttachment {
    read: OwnedReadHalf,
    write: OwnedWriteHalf,
    decoder: PacketDecoder,
    encoder: PacketEncoder,
}

/// The running actor: owns the upstream connection, the `WorldMirror`
/// accumulated from it, and (optionally) the attached downstream client.
struct UpstreamSession {
    profile: Profile,
    mirror: WorldMirror,
    upstream: UpstreamConnection,
    downstream: Option<DownstreamAttachment>,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    observer: Arc<BroadcastObserver>,
    statuses: Arc<Mutex<HashMap<String, SessionStatus>>>,
    manager: Arc<SessionManager>,
    dump: Option<Box<dyn DumpSink>>,
    last_gamemode: u8,
    last_status_emit: Instant,
    user_has_disconnected: bool,
    reconnect_at: Option<Instant>,
}

/// Tracks every live session by profile id and drives `connect`/`disconnect`
/// per spec §4.7.
pub struct SessionManager {
    addr: String,
    http: reqwest::Client,
    dump_dir: PathBuf,
    observer: Arc<BroadcastObserver>,
    profiles: Arc<dyn ProfileStore>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
    statuses: Arc<Mutex<HashMap<String, SessionStatus>>>,
}

impl SessionManager {
    pub fn new(
        addr: String,
        http: reqwest::Client,
        dump_dir: PathBuf,
        observer: Arc<BroadcastObserver>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            addr,
            http,
            dump_dir,
            observer,
            profiles,
            sessions: Mutex::new(HashMap::new()),
            statuses: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn observer(&self) -> &Arc<BroadcastObserver> {
        &self.observer
    }

    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    pub fn handle(&self, profile_id: &str) -> Option<SessionHandle> {
        self.sessions.lock().unwrap().get(profile_id).cloned()
    }

    pub fn status(&self, profile_id: &str) -> Option<SessionStatus> {
        self.statuses.lock().unwrap().get(profile_id).cloned()
    }

    pub fn open_session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Resolves a `/connect`/`/disconnect` argument against one owner's
    /// profiles (spec §4.6).
    pub fn resolve_profile(&self, owner: &str, id_or_name: &str) -> Option<Profile> {
        let candidates = self.profiles.profiles_for_owner(owner);
        management::resolve(&candidates, id_or_name).cloned()
    }

    /// Returns the running handle for `profile`, connecting it first if no
    /// session is open yet — the `/connect` path to a profile that isn't
    /// already attached to anything.
    pub async fn ensure_connected(self: &Arc<Self>, profile: Profile) -> Result<SessionHandle> {
        if let Some(handle) = self.handle(&profile.id) {
            return Ok(handle);
        }
        self.connect(profile.clone()).await?;
        self.handle(&profile.id)
            .ok_or_else(|| ProxyError::Internal(anyhow::anyhow!("session vanished immediately after connecting")))
    }

    /// Connects a profile's upstream session (spec §4.7): the handle is
    /// inserted before the network round-trip completes, and removed again
    /// if that round-trip fails.
    pub async fn connect(self: &Arc<Self>, profile: Profile) -> Result<()> {
        {
            let sessions = self.sessions.lock().unwrap();
            if sessions.contains_key(&profile.id) {
                return Err(ProxyError::Validation(format!("profile {} is already connected", profile.id)));
            }
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let handle = SessionHandle { profile_id: profile.id.clone(), cmd_tx };
        self.sessions.lock().unwrap().insert(profile.id.clone(), handle);

        let (ready_tx, ready_rx) = oneshot::channel();
        let manager = Arc::clone(self);
        let profile_for_task = profile.clone();
        tokio::spawn(async move {
            manager.run_session(profile_for_task, cmd_rx, ready_tx).await;
        });

        match tokio::time::timeout(CONNECT_TIMEOUT, ready_rx).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => {
                self.sessions.lock().unwrap().remove(&profile.id);
                Err(ProxyError::Internal(e))
            }
            Ok(Err(_)) => {
                self.sessions.lock().unwrap().remove(&profile.id);
                Err(ProxyError::Internal(anyhow::anyhow!("session task dropped before reporting readiness")))
            }
            Err(_) => {
                self.sessions.lock().unwrap().remove(&profile.id);
                Err(ProxyError::Internal(anyhow::anyhow!("upstream connect to {} timed out", self.addr)))
            }
        }
    }

    /// Ends a profile's session without scheduling a reconnect (spec §4.7's
    /// `disconnect`: "no auto-reconnect").
    pub async fn disconnect(&self, profile_id: &str) {
        if let Some(handle) = self.handle(profile_id) {
            handle.shutdown().await;
        }
    }

    async fn run_session(self: Arc<Self>, profile: Profile, cmd_rx: mpsc::Receiver<SessionCommand>, ready_tx: oneshot::Sender<anyhow::Result<()>>) {
        let upstream = match upstream::connect(&self.addr, &profile, &self.http).await {
            Ok(conn) => conn,
            Err(e) => {
                let _ = ready_tx.send(Err(e.into()));
                return;
            }
        };

        let dump: Option<Box<dyn DumpSink>> = if profile.settings.enable_packet_dumps {
            let started_at = started_at_iso8601();
            match GzFileDumpSink::create(&self.dump_dir, &profile.id, &started_at) {
                Ok(sink) => Some(Box::new(sink)),
                Err(e) => {
                    tracing::warn!(profile = %profile.id, error = %e, "failed to open packet dump sink");
                    None
                }
            }
        } else {
            None
        };

        let _ = ready_tx.send(Ok(()));

        let mut session = UpstreamSession {
            profile: profile.clone(),
            mirror: WorldMirror::new(),
            upstream,
            downstream: None,
            cmd_rx,
            observer: Arc::clone(&self.observer),
            statuses: Arc::clone(&self.statuses),
            manager: Arc::clone(&self),
            dump,
            last_gamemode: 0,
            last_status_emit: Instant::now() - STATUS_DEBOUNCE,
            user_has_disconnected: false,
            reconnect_at: None,
        };

        let should_reconnect = session.run().await;

        self.sessions.lock().unwrap().remove(&profile.id);
        self.statuses.lock().unwrap().remove(&profile.id);

        if should_reconnect && profile.settings.auto_reconnect.enabled {
            let manager = Arc::clone(&self);
            let delay = profile.settings.auto_reconnect.delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(e) = manager.connect(profile.clone()).await {
                    tracing::warn!(profile = %profile.id, error = %e, "auto-reconnect attempt failed");
                }
            });
        }
    }
}

impl UpstreamSession {
    /// Drives the session until its upstream connection ends or it's shut
    /// down by the manager. Returns whether the caller should schedule an
    /// auto-reconnect.
    async fn run(&mut self) -> bool {
        self.emit_status();

        loop {
            tokio::select! {
                biased;

                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Attach { read, write, decoder, encoder, respond }) => {
                            let result = self.handle_attach(read, write, decoder, encoder).await;
                            let _ = respond.send(result);
                        }
                        Some(SessionCommand::Detach) => self.detach().await,
                        Some(SessionCommand::SendChat(message)) => {
                            if let Err(e) = send_packet(&mut self.upstream.write, &mut self.upstream.encoder, upstream::CHAT_MESSAGE_SERVERBOUND_ID, &ChatMessageServerbound { message }).await {
                                tracing::warn!(profile = %self.profile.id, error = %e, "failed to send chat upstream");
                            }
                        }
                        Some(SessionCommand::Shutdown) | None => {
                            self.user_has_disconnected = true;
                            return false;
                        }
                    }
                }

                downstream_read = Self::read_downstream(&mut self.downstream), if self.downstream.is_some() => {
                    match downstream_read {
                        Ok(Some(packet)) => self.handle_downstream_packet(packet).await,
                        Ok(None) | Err(_) => self.detach().await,
                    }
                }

                upstream_read = read_packet(&mut self.upstream.read, &mut self.upstream.decoder) => {
                    match upstream_read {
                        Ok(Some(packet)) => {
                            if !self.handle_upstream_packet(packet).await {
                                return !self.user_has_disconnected;
                            }
                        }
                        Ok(None) => return !self.user_has_disconnected,
                        Err(e) => {
                            tracing::warn!(profile = %self.profile.id, error = %e, "upstream read failed");
                            return !self.user_has_disconnected;
                        }
                    }
                }
            }
        }
    }

    /// Reads one packet off the attached downstream socket, if any. A
    /// `select!` branch guarded on `downstream.is_some()` never actually
    /// polls this when the `Option` is `None`, so the panic path below is
    /// unreachable in practice.
    async fn read_downstream(downstream: &mut Option<DownstreamAttachment>) -> anyhow::Result<Option<RawPacket>> {
        let attachment = downstream.as_mut().expect("guarded by select!'s `if`");
        read_packet(&mut attachment.read, &mut attachment.decoder).await
    }

    /// Replays the mirror's current snapshot to a freshly attached client,
    /// then starts forwarding live traffic (spec §4.4, §5). Any upstream
    /// packets that arrive while the replay is being written simply stay
    /// buffered on the socket: this task isn't polling the upstream read
    /// future again until replay finishes, so ordering falls out for free.
    async fn handle_attach(
        &mut self,
        read: OwnedReadHalf,
        mut write: OwnedWriteHalf,
        decoder: PacketDecoder,
        mut encoder: PacketEncoder,
    ) -> anyhow::Result<()> {
        let respawn = self.downstream.is_some();
        let packets = replay::emit(&self.mirror, CLIENT_EID, respawn)?;
        for packet in &packets {
            send_packet(&mut write, &mut encoder, packet.id, &RawBody(&packet.body)).await?;
        }
        flush(&mut write, &mut encoder).await?;

        self.downstream = Some(DownstreamAttachment { read, write, decoder, encoder });
        self.last_gamemode = self.mirror.gamemode;
        self.emit_status();
        Ok(())
    }

    async fn detach(&mut self) {
        self.downstream = None;
        self.emit_status();
    }

    /// Applies the bridge's clientbound rewrite and forwards to the
    /// attached downstream client, if any; always dispatches into the
    /// mirror and the dump sink regardless of attachment (spec §4.3, §6).
    /// Returns `false` once the upstream connection has ended.
    async fn handle_upstream_packet(&mut self, packet: RawPacket) -> bool {
        if let Some(sink) = &mut self.dump {
            if packet.id != upstream::KEEP_ALIVE_ID {
                if let Err(e) = sink.record(Direction::Inbound, unix_millis(), &packet.body) {
                    tracing::warn!(profile = %self.profile.id, error = %e, "dump sink write failed");
                }
            }
        }

        if packet.id == upstream::KEEP_ALIVE_ID {
            if let Ok(keep_alive) = packet.decode_body::<mc_protocol::packets::play_clientbound::KeepAliveClientbound>() {
                let _ = send_packet(&mut self.upstream.write, &mut self.upstream.encoder, upstream::KEEP_ALIVE_ID, &mc_protocol::packets::play_serverbound::KeepAliveServerbound { id: keep_alive.id }).await;
            }
            return true;
        }

        let outcome = match upstream::dispatch_to_mirror(&mut self.mirror, &packet) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(profile = %self.profile.id, id = format!("0x{:02x}", packet.id), error = %e, "failed to dispatch upstream packet into mirror");
                DispatchOutcome::Handled
            }
        };

        self.check_health_gate().await;
        self.check_gamemode_change().await;
        self.forward_chat_if_any(&packet).await;
        if packet.id == mc_protocol::packets::play_clientbound::SpawnPlayer::ID {
            self.notify_player_spawn(&packet);
        }

        match outcome {
            DispatchOutcome::TeleportConfirm(teleport_id) => {
                let confirm = mc_protocol::packets::play_serverbound::TeleportConfirm { teleport_id: mc_protocol::var_int::VarInt(teleport_id) };
                let _ = send_packet(&mut self.upstream.write, &mut self.upstream.encoder, mc_protocol::packets::play_serverbound::TeleportConfirm::ID, &confirm).await;
            }
            DispatchOutcome::Disconnected(reason) => {
                self.disconnect_downstream_with(reason).await;
                return false;
            }
            DispatchOutcome::Handled => {}
        }

        if self.downstream.is_some() {
            let rewritten = match bridge::rewrite_clientbound(&self.mirror, self.mirror.eid, &packet) {
                Ok(rewritten) => rewritten,
                Err(e) => {
                    tracing::warn!(profile = %self.profile.id, id = format!("0x{:02x}", packet.id), error = %e, "clientbound rewrite failed, forwarding unmodified");
                    packet
                }
            };
            self.forward_to_downstream(rewritten).await;
        }

        self.emit_status_debounced();
        true
    }

    async fn forward_chat_if_any(&mut self, packet: &RawPacket) {
        if packet.id != ChatMessage::ID {
            return;
        }
        if let Ok(chat) = packet.decode_body::<ChatMessage>() {
            self.observer.chat(ChatEvent { profile_id: self.profile.id.clone(), message: chat.message });
        }
    }

    async fn disconnect_downstream_with(&mut self, reason: ChatComponent) {
        if let Some(attachment) = &mut self.downstream {
            let disconnect = mc_protocol::packets::play_clientbound::PlayDisconnect { reason };
            let _ = send_packet(&mut attachment.write, &mut attachment.encoder, mc_protocol::packets::play_clientbound::PlayDisconnect::ID, &disconnect).await;
        }
        self.downstream = None;
    }

    async fn forward_to_downstream(&mut self, packet: RawPacket) {
        if let Some(attachment) = &mut self.downstream {
            if send_packet(&mut attachment.write, &mut attachment.encoder, packet.id, &RawBody(&packet.body)).await.is_err() {
                self.downstream = None;
            }
        }
    }

    /// Applies the bridge's serverbound rewrite table and either mutates
    /// `mirror`, forwards upstream, or drops the packet (spec §4.5).
    async fn handle_downstream_packet(&mut self, packet: RawPacket) {
        if packet.id == upstream::CHAT_MESSAGE_SERVERBOUND_ID {
            if let Ok(chat) = packet.decode_body::<ChatMessageServerbound>() {
                if self.handle_management_chat(&chat.message).await {
                    return;
                }
            }
        }

        match bridge::rewrite_serverbound(&mut self.mirror, self.mirror.eid, packet) {
            Ok(ServerboundAction::Drop) => {}
            Ok(ServerboundAction::Forward(packet)) => {
                let _ = send_packet(&mut self.upstream.write, &mut self.upstream.encoder, packet.id, &RawBody(&packet.body)).await;
            }
            Err(e) => {
                tracing::warn!(profile = %self.profile.id, error = %e, "serverbound rewrite failed, dropping packet");
            }
        }
    }

    /// `/connect <id-or-name>` and `/disconnect <id-or-name>` (spec §4.6):
    /// handled entirely within the session so a downstream client can
    /// switch profiles without reconnecting its socket. Returns `true` if
    /// `text` was a management command (and should not reach upstream).
    async fn handle_management_chat(&mut self, text: &str) -> bool {
        let Some(command) = management::parse(text) else { return false };
        match command {
            ManagementCommand::Connect(arg) => self.do_connect(&arg).await,
            ManagementCommand::Disconnect(arg) => self.do_disconnect(&arg).await,
        }
        true
    }

    /// Moves the attached downstream socket to another of this owner's
    /// sessions without closing it: the session itself stays idle (no
    /// downstream) while `target`'s task takes the halves over via its own
    /// `Attach` command.
    async fn do_connect(&mut self, id_or_name: &str) {
        let Some(target) = self.manager.resolve_profile(&self.profile.owner, id_or_name) else {
            self.send_system_chat(format!("No profile matching '{id_or_name}'")).await;
            return;
        };
        if target.id == self.profile.id {
            self.send_system_chat("Already connected to that profile").await;
            return;
        }

        let target_handle = match self.manager.ensure_connected(target.clone()).await {
            Ok(handle) => handle,
            Err(e) => {
                self.send_system_chat(format!("Failed to connect to {}: {e}", target.name)).await;
                return;
            }
        };

        let Some(attachment) = self.downstream.take() else { return };
        self.emit_status();
        if let Err(e) = target_handle.attach(attachment.read, attachment.write, attachment.decoder, attachment.encoder).await {
            tracing::warn!(profile = %self.profile.id, target = %target.id, error = %e, "failed to hand downstream off to another session");
        }
    }

    /// Ends a named session (spec §4.6). Ending this session's own upstream
    /// connection first hands the downstream socket to an idle listener
    /// loop, so the client keeps its connection and can `/connect`
    /// elsewhere, the same way an ordinary `/connect` never drops the
    /// socket.
    async fn do_disconnect(&mut self, id_or_name: &str) {
        let Some(target) = self.manager.resolve_profile(&self.profile.owner, id_or_name) else {
            self.send_system_chat(format!("No profile matching '{id_or_name}'")).await;
            return;
        };

        if target.id != self.profile.id {
            self.manager.disconnect(&target.id).await;
            self.send_system_chat(format!("Disconnected {}", target.name)).await;
            return;
        }

        if let Some(attachment) = self.downstream.take() {
            let manager = Arc::clone(&self.manager);
            let owner = self.profile.owner.clone();
            tokio::spawn(crate::listener::serve_unattached(
                attachment.read,
                attachment.write,
                attachment.decoder,
                attachment.encoder,
                owner,
                manager,
            ));
        }
        self.user_has_disconnected = true;
        let _ = self.upstream.write.shutdown().await;
    }

    async fn send_system_chat(&mut self, text: impl Into<String>) {
        let Some(attachment) = &mut self.downstream else { return };
        let message = ChatMessage { message: ChatComponent::text(text.into()), position: 1 };
        let _ = send_packet(&mut attachment.write, &mut attachment.encoder, ChatMessage::ID, &message).await;
    }

    /// Spec §3's `notifyPlayers`: when enabled, every newly spawned player
    /// not on the `ignore` list raises a [`PlayerSpawnEvent`], unless a
    /// client is actively attached and `disableWhilePlaying` is set.
    fn notify_player_spawn(&self, packet: &RawPacket) {
        let settings = &self.profile.settings.notify_players;
        if !settings.enabled {
            return;
        }
        if settings.disable_while_playing && self.downstream.is_some() {
            return;
        }
        let Ok(spawn) = packet.decode_body::<mc_protocol::packets::play_clientbound::SpawnPlayer>() else { return };
        let Some(entry) = self.mirror.players.get(&spawn.player_uuid) else { return };
        if settings.ignore.contains(&entry.name) {
            return;
        }
        self.observer.player_spawned(PlayerSpawnEvent { profile_id: self.profile.id.clone(), player_name: entry.name.clone() });
    }

    /// Evaluates the health-based auto-disconnect gate (spec §3, §8): once
    /// the mirror's health has been initialized by an `UpdateHealth`
    /// packet, a value at or below the configured threshold ends the
    /// session, unless the client is mid-play and `disableWhilePlaying` is
    /// set.
    async fn check_health_gate(&mut self) {
        let settings = &self.profile.settings.auto_disconnect;
        if !settings.enabled || !self.mirror.health_initialized {
            return;
        }
        if settings.disable_while_playing && self.downstream.is_some() {
            return;
        }
        if self.mirror.health < settings.health {
            tracing::info!(profile = %self.profile.id, health = self.mirror.health, "auto-disconnect health gate triggered");
            self.user_has_disconnected = true;
            let _ = self.upstream.write.shutdown().await;
        }
    }

    /// Live gamemode-change notification (spec §4.5): whenever the
    /// mirror's gamemode changes, push a `PlayerListItem` update-gamemode
    /// row for the local player to the attached downstream client.
    async fn check_gamemode_change(&mut self) {
        if self.mirror.gamemode == self.last_gamemode {
            return;
        }
        self.last_gamemode = self.mirror.gamemode;

        let Some(local) = self.mirror.local_player() else { return };
        let uuid = match local {
            Entity::Player { uuid, .. } => *uuid,
            _ => return,
        };

        let packet = mc_protocol::packets::play_clientbound::PlayerListItemUpdateGamemode {
            uuid,
            gamemode: (self.mirror.gamemode & 0x07) as i32,
        };
        if let Some(attachment) = &mut self.downstream {
            let _ = send_packet(&mut attachment.write, &mut attachment.encoder, mc_protocol::packets::play_clientbound::PlayerListItemUpdateGamemode::ID, &packet).await;
        }
    }

    fn emit_status(&mut self) {
        self.last_status_emit = Instant::now();
        let status = self.build_status();
        self.observer.status_changed(status.clone());
        self.statuses.lock().unwrap().insert(self.profile.id.clone(), status);
    }

    fn emit_status_debounced(&mut self) {
        if self.last_status_emit.elapsed() >= STATUS_DEBOUNCE {
            self.emit_status();
        }
    }

    fn build_status(&self) -> SessionStatus {
        SessionStatus {
            profile_id: self.profile.id.clone(),
            connected: true,
            queue: self.mirror.queue.clone(),
            playing: self.downstream.is_some(),
            player: Some(PlayerSnapshot {
                x: self.mirror.player.x,
                y: self.mirror.player.y,
                z: self.mirror.player.z,
                yaw: self.mirror.player.yaw,
                pitch: self.mirror.player.pitch,
            }),
            dimension: Some(self.mirror.dimension),
            reconnect_in: self.reconnect_at.map(|at| at.saturating_duration_since(Instant::now()).as_millis() as u64),
        }
    }
}

fn started_at_iso8601() -> String {
    let now = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs();
    let (days, time_of_day) = (secs / 86_400, secs % 86_400);
    let (hour, rem) = (time_of_day / 3600, time_of_day % 3600);
    let (minute, second) = (rem / 60, rem % 60);
    // Days-since-epoch to a y/m/d triple, proleptic Gregorian (civil_from_days).
    let z = days as i64 + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    format!("{y:04}-{m:02}-{d:02}T{hour:02}-{minute:02}-{second:02}")
}

fn unix_millis() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso8601_timestamp_has_the_expected_shape() {
        let stamp = started_at_iso8601();
        assert_eq!(stamp.len(), "2024-01-01T00-00-00".len());
        assert!(stamp.chars().nth(4) == Some('-'));
        assert!(stamp.chars().nth(11) == Some('T'));
    }
}
