//! # World Queries
//!
//! Distance math and the lookups distance-based checks need, wrapped
//! around the [`Host`].

use crate::error::{SecurityError, SecurityResult};
use crate::host::{GridCell, Host, PlayerId, PlayerSnapshot, Session};

/// World position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X.
    pub x: f32,
    /// Y.
    pub y: f32,
    /// Z.
    pub z: f32,
}

impl Vec3 {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Distance between two players. A player is always 0 from itself.
#[must_use]
pub fn distance_between(a: &PlayerSnapshot, b: &PlayerSnapshot) -> f32 {
    if a.id == b.id {
        return 0.0;
    }
    a.position.distance(b.position)
}

/// Distance from a player to a coordinate.
#[must_use]
pub fn distance_to(player: &PlayerSnapshot, point: Vec3) -> f32 {
    player.position.distance(point)
}

/// Borrowed lookup surface handed to predicates.
#[derive(Clone, Copy)]
pub struct World<'a> {
    host: &'a dyn Host,
}

impl<'a> World<'a> {
    /// Wraps a host.
    #[must_use]
    pub const fn new(host: &'a dyn Host) -> Self {
        Self { host }
    }

    /// Underlying host.
    #[must_use]
    pub const fn host(&self) -> &'a dyn Host {
        self.host
    }

    /// Online player, if any.
    #[must_use]
    pub fn online(&self, id: PlayerId) -> Option<PlayerSnapshot> {
        self.host.player(id)
    }

    /// Online player, or an error for predicates that cannot go on without it.
    ///
    /// # Errors
    ///
    /// [`SecurityError::UnknownPlayer`].
    pub fn require(&self, id: PlayerId) -> SecurityResult<PlayerSnapshot> {
        self.host.player(id).ok_or(SecurityError::UnknownPlayer(id))
    }

    /// Player entity of the sending connection.
    ///
    /// # Errors
    ///
    /// [`SecurityError::NoPlayerEntity`].
    pub fn sender(&self, session: &dyn Session) -> SecurityResult<PlayerSnapshot> {
        self.host
            .player_for(session)
            .ok_or_else(|| SecurityError::NoPlayerEntity(session.username().to_owned()))
    }

    /// World cell at a coordinate.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32, z: i32) -> Option<GridCell> {
        self.host.grid_cell(x, y, z)
    }
}
