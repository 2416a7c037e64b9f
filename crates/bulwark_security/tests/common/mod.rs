//! Shared fixtures: an in-memory host, a recording session, and helpers
//! that write a `security.toml` with every check in one mode.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use bulwark_protocol::{
    AdminPowers, MessageBuffer, MessageReader, MessageWriter, ProtocolError, ProtocolResult,
    WireFormat,
};
use bulwark_security::{
    AccessLevel, AuditConfig, ConfigFile, DeathReport, FieldValue, FireStart, GridCell, Host,
    PacketChecker, PlayerId, PlayerSnapshot, SecurityLogger, ServerOptions, Services, Session,
    TextFilter, Treatment, TreatmentKind, Vec3, REGISTRY,
};
use parking_lot::Mutex;

/// Online player at a position, with no powers and empty hands.
pub fn player(id: PlayerId, username: &str, x: f32, y: f32, z: f32) -> PlayerSnapshot {
    PlayerSnapshot {
        id,
        username: username.to_owned(),
        position: Vec3::new(x, y, z),
        powers: AdminPowers::default(),
        primary_hand_item: None,
    }
}

fn short(reader: &MessageReader<'_>) -> ProtocolError {
    ProtocolError::UnexpectedEnd {
        position: reader.position(),
        needed: 1,
        remaining: reader.remaining(),
    }
}

/// In-memory game server.
#[derive(Default)]
pub struct MockHost {
    pub players: Mutex<HashMap<PlayerId, PlayerSnapshot>>,
    pub cells: Mutex<HashMap<(i32, i32, i32), GridCell>>,
    pub options: Mutex<ServerOptions>,
    pub staff_messages: Mutex<Vec<(String, Vec<String>)>>,
    pub treatment: Mutex<Option<Treatment>>,
    pub fire: Mutex<Option<FireStart>>,
    pub death: Mutex<Option<DeathReport>>,
    pub query_args: Mutex<Option<Vec<FieldValue>>>,
    pub decoded: Mutex<Vec<TreatmentKind>>,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_player(&self, snapshot: PlayerSnapshot) {
        self.players.lock().insert(snapshot.id, snapshot);
    }

    pub fn add_cell(&self, x: i32, y: i32, z: i32, object_count: usize) {
        self.cells.lock().insert((x, y, z), GridCell { object_count });
    }

    pub fn staff_lines(&self) -> Vec<String> {
        self.staff_messages
            .lock()
            .iter()
            .flat_map(|(_, lines)| lines.clone())
            .collect()
    }
}

impl Host for MockHost {
    fn player(&self, id: PlayerId) -> Option<PlayerSnapshot> {
        self.players.lock().get(&id).cloned()
    }

    fn player_for(&self, session: &dyn Session) -> Option<PlayerSnapshot> {
        self.players
            .lock()
            .values()
            .find(|p| p.username == session.username())
            .cloned()
    }

    fn grid_cell(&self, x: i32, y: i32, z: i32) -> Option<GridCell> {
        self.cells.lock().get(&(x, y, z)).copied()
    }

    fn options(&self) -> ServerOptions {
        *self.options.lock()
    }

    fn message_staff(&self, sender: &str, lines: &[String]) {
        self.staff_messages
            .lock()
            .push((sender.to_owned(), lines.to_vec()));
    }

    fn decode_treatment(
        &self,
        kind: TreatmentKind,
        _session: &dyn Session,
        reader: &mut MessageReader<'_>,
    ) -> ProtocolResult<Treatment> {
        self.decoded.lock().push(kind);
        self.treatment.lock().clone().ok_or_else(|| short(reader))
    }

    fn decode_fire(
        &self,
        _session: &dyn Session,
        reader: &mut MessageReader<'_>,
    ) -> ProtocolResult<FireStart> {
        (*self.fire.lock()).ok_or_else(|| short(reader))
    }

    fn decode_death(
        &self,
        _session: &dyn Session,
        reader: &mut MessageReader<'_>,
    ) -> ProtocolResult<DeathReport> {
        (*self.death.lock()).ok_or_else(|| short(reader))
    }

    fn decode_query_args(&self, reader: &mut MessageReader<'_>) -> ProtocolResult<Vec<FieldValue>> {
        self.query_args.lock().clone().ok_or_else(|| short(reader))
    }
}

/// Connection that records disconnects.
pub struct MockSession {
    pub id: u64,
    pub username: String,
    pub access: AccessLevel,
    pub disconnects: Mutex<Vec<String>>,
}

impl MockSession {
    pub fn new(username: &str, access: AccessLevel) -> Self {
        Self {
            id: 1,
            username: username.to_owned(),
            access,
            disconnects: Mutex::new(Vec::new()),
        }
    }

    pub fn player(username: &str) -> Self {
        Self::new(username, AccessLevel::PLAYER)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.lock().len()
    }
}

impl Session for MockSession {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn access_level(&self) -> AccessLevel {
        self.access
    }

    fn disconnect(&self, reason: &str) {
        self.disconnects.lock().push(reason.to_owned());
    }
}

/// Encodes a body into a buffer positioned at 0.
pub fn encode<T: WireFormat>(body: &T) -> MessageBuffer {
    let mut writer = MessageWriter::new();
    body.encode(&mut writer).unwrap();
    writer.finish()
}

/// `security.toml` with every check in `mode`. Log lines are
/// `<id> %action% %player_username%`.
pub fn document(mode: &str, distance: f32) -> String {
    let mut out = format!(
        "[__meta]\nversion = 2\n\n[security_checks.default]\nmode = \"{mode}\"\n\
         log_message_in_server_chat = true\n\
         kick_message = \"Kicked: %player_username%\"\ndistance = {distance:?}\n"
    );
    let mut seen = HashSet::new();
    for spec in &REGISTRY {
        if seen.insert(spec.id) {
            out.push_str(&format!(
                "\n[security_checks.{}]\nlog_message = \"{} %action% %player_username%\"\n",
                spec.id, spec.id
            ));
        }
    }
    out
}

/// Replaces the log template of one check in a [`document`].
pub fn with_template(document: &str, id: &str, template: &str) -> String {
    document.replace(
        &format!("log_message = \"{id} %action% %player_username%\""),
        &format!("log_message = \"{template}\""),
    )
}

/// Services over `host`, with a stopped audit logger under `dir`.
pub fn services(host: &Arc<MockHost>, dir: &Path) -> Services {
    Services {
        host: Arc::clone(host) as Arc<dyn Host>,
        audit: Arc::new(SecurityLogger::new(dir.join("security.log"), AuditConfig::default())),
    }
}

/// A loaded checker with every check in `mode` and the given distance.
pub fn checker(host: &Arc<MockHost>, dir: &Path, mode: &str, distance: f32) -> PacketChecker {
    checker_from(host, dir, &document(mode, distance))
}

/// A loaded checker over an explicit document.
pub fn checker_from(host: &Arc<MockHost>, dir: &Path, source: &str) -> PacketChecker {
    let config = dir.join("security.toml");
    std::fs::write(&config, source).unwrap();
    let checker = PacketChecker::new(
        ConfigFile::new(config),
        services(host, dir),
        Arc::new(TextFilter::new(dir.join("filters.txt"))),
    );
    checker.load().unwrap();
    checker
}
