//! # Host Collaborators
//!
//! The game server side of the contract. The security layer never owns
//! players, sessions or the world; it asks for snapshots through these
//! traits and hands back verdicts.
//!
//! ```text
//!   ┌──────────────┐  Session (per connection)   ┌──────────────────┐
//!   │ game server  │ ──────────────────────────► │  PacketChecker   │
//!   │              │  Host (shared, Send + Sync) │  checks / filter │
//!   │              │ ◄────────────────────────── │                  │
//!   └──────────────┘  disconnect, staff chat     └──────────────────┘
//! ```

use std::fmt;

use bulwark_protocol::{AdminPowers, BodyPart, MessageReader, ProtocolResult};

use crate::geometry::Vec3;
use crate::template::FieldValue;

/// Online player id as sent on the wire.
pub type PlayerId = i16;

/// Privilege level of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccessLevel(pub u8);

impl AccessLevel {
    /// Regular player.
    pub const PLAYER: Self = Self(1);
    /// Observer.
    pub const OBSERVER: Self = Self(2);
    /// Game master.
    pub const GM: Self = Self(4);
    /// Overseer.
    pub const OVERSEER: Self = Self(8);
    /// Moderator.
    pub const MODERATOR: Self = Self(16);
    /// Administrator.
    pub const ADMIN: Self = Self(32);

    /// Anything above a regular player.
    #[inline]
    #[must_use]
    pub const fn is_staff(self) -> bool {
        self.0 > Self::PLAYER.0
    }

    /// Exactly administrator.
    #[inline]
    #[must_use]
    pub const fn is_admin(self) -> bool {
        self.0 == Self::ADMIN.0
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::PLAYER => "player",
            Self::OBSERVER => "observer",
            Self::GM => "gm",
            Self::OVERSEER => "overseer",
            Self::MODERATOR => "moderator",
            Self::ADMIN => "admin",
            _ => return write!(f, "level {}", self.0),
        };
        f.write_str(name)
    }
}

/// A network connection that sent the message being checked.
pub trait Session {
    /// Stable identity: platform id when available, otherwise the address.
    fn id(&self) -> String;

    /// Username the connection logged in with.
    fn username(&self) -> &str;

    /// Current privilege level.
    fn access_level(&self) -> AccessLevel;

    /// Forcibly closes the connection with a reason shown to the client.
    fn disconnect(&self, reason: &str);

    /// Staff bypass test.
    fn is_staff(&self) -> bool {
        self.access_level().is_staff()
    }
}

/// Snapshot of one online player.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Online id.
    pub id: PlayerId,
    /// Username.
    pub username: String,
    /// World position.
    pub position: Vec3,
    /// Powers the server granted.
    pub powers: AdminPowers,
    /// Script name of the primary-hand item, if any.
    pub primary_hand_item: Option<String>,
}

/// A world cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridCell {
    /// Objects currently on the cell.
    pub object_count: usize,
}

/// Server-wide switches consulted by capability checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerOptions {
    /// Player-versus-player combat allowed.
    pub pvp: bool,
    /// Fire disabled.
    pub no_fire: bool,
    /// Sledgehammer destruction allowed.
    pub allow_sledgehammer_destruction: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            pvp: true,
            no_fire: false,
            allow_sledgehammer_destruction: true,
        }
    }
}

/// Compound medical actions the host decodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreatmentKind {
    /// Disinfect a wound.
    Disinfect,
    /// Clean a burn.
    CleanBurn,
    /// Remove glass.
    RemoveGlass,
    /// Remove a bullet.
    RemoveBullet,
}

/// Decoded compound medical action.
#[derive(Clone, Debug, PartialEq)]
pub struct Treatment {
    /// The action passed the game's own validation and consistency tests.
    pub valid: bool,
    /// Player performing the action.
    pub wielder: Option<PlayerId>,
    /// Patient; `None` when the id does not resolve.
    pub target: Option<PlayerId>,
    /// Treated body part.
    pub body_part: BodyPart,
    /// Alcohol power added (disinfect only).
    pub alcohol: Option<f32>,
}

/// Decoded fire start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FireStart {
    /// The action passed the game's own validation and consistency tests.
    pub valid: bool,
    /// Fire cell.
    pub position: Vec3,
    /// Fire energy.
    pub energy: i32,
    /// Fire life.
    pub life: i32,
    /// Smoke-only fire.
    pub smoke: bool,
}

/// Decoded death report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeathReport {
    /// Player reported dead; `None` when the id does not resolve.
    pub player: Option<PlayerId>,
}

/// Game-side services consumed by the checks.
pub trait Host: Send + Sync {
    /// Online player by id.
    fn player(&self, id: PlayerId) -> Option<PlayerSnapshot>;

    /// Player entity driven by a connection.
    fn player_for(&self, session: &dyn Session) -> Option<PlayerSnapshot>;

    /// World cell by coordinate.
    fn grid_cell(&self, x: i32, y: i32, z: i32) -> Option<GridCell>;

    /// Current server options.
    fn options(&self) -> ServerOptions;

    /// Sends lines to every connected staff member.
    fn message_staff(&self, sender: &str, lines: &[String]);

    /// Decodes a compound medical action.
    ///
    /// # Errors
    ///
    /// Any decode failure.
    fn decode_treatment(
        &self,
        kind: TreatmentKind,
        session: &dyn Session,
        reader: &mut MessageReader<'_>,
    ) -> ProtocolResult<Treatment>;

    /// Decodes a fire start.
    ///
    /// # Errors
    ///
    /// Any decode failure.
    fn decode_fire(
        &self,
        session: &dyn Session,
        reader: &mut MessageReader<'_>,
    ) -> ProtocolResult<FireStart>;

    /// Decodes a death report.
    ///
    /// # Errors
    ///
    /// Any decode failure.
    fn decode_death(
        &self,
        session: &dyn Session,
        reader: &mut MessageReader<'_>,
    ) -> ProtocolResult<DeathReport>;

    /// Decodes the argument table trailing a database query.
    ///
    /// # Errors
    ///
    /// Any decode failure; the query is then logged as having invalid args.
    fn decode_query_args(&self, reader: &mut MessageReader<'_>) -> ProtocolResult<Vec<FieldValue>>;
}
