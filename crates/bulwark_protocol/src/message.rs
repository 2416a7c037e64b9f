//! # Message Types
//!
//! The client messages the security layer is wired for. Everything else
//! passes through the host untouched.

use std::fmt;

/// Client message kinds that carry a security check chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    /// Admin power flags broadcast by a client.
    ExtraInfo,
    /// Teleport request.
    Teleport,
    /// Edit another player's stats.
    ChangePlayerStats,
    /// Take an item out of another player's inventory.
    InvMngGetItem,
    /// Request an item from another player's inventory.
    InvMngReqItem,
    /// Remove an item from another player's inventory.
    InvMngRemoveItem,
    /// Open another player's inventory.
    RequestInventory,
    /// Change sandbox options.
    SandboxOptions,
    /// Edit non-PvP zones.
    SyncNonPvpZone,
    /// Chat line sent by a player.
    ChatMessageFromPlayer,
    /// Apply or remove a bandage.
    Bandage,
    /// Stitch a wound.
    Stitch,
    /// Toggle a wound infection.
    WoundInfection,
    /// Disinfect a wound.
    Disinfect,
    /// Apply a splint.
    Splint,
    /// Add pain to a body part.
    AdditionalPain,
    /// Remove glass from a wound.
    RemoveGlass,
    /// Remove a bullet from a wound.
    RemoveBullet,
    /// Clean a burn.
    CleanBurn,
    /// Melee or ranged hit.
    HitCharacter,
    /// Player death report.
    PlayerDeath,
    /// Damage applied to another player.
    PlayerDamage,
    /// Start a fire.
    StartFire,
    /// Pick up an object from a world cell.
    RemoveItemFromSquare,
    /// Destroy an object with a sledgehammer.
    SledgehammerDestroy,
    /// Read the database schema.
    GetDbSchema,
    /// Read a database table.
    GetTableResult,
    /// Run a database query.
    ExecuteQuery,
    /// Change the weather.
    ClimateManager,
}

impl MessageType {
    /// Every wired message type, in routing-table order.
    pub const ALL: [Self; 29] = [
        Self::ExtraInfo,
        Self::Teleport,
        Self::ChangePlayerStats,
        Self::InvMngGetItem,
        Self::InvMngReqItem,
        Self::InvMngRemoveItem,
        Self::RequestInventory,
        Self::SandboxOptions,
        Self::SyncNonPvpZone,
        Self::ChatMessageFromPlayer,
        Self::Bandage,
        Self::Stitch,
        Self::WoundInfection,
        Self::Disinfect,
        Self::Splint,
        Self::AdditionalPain,
        Self::RemoveGlass,
        Self::RemoveBullet,
        Self::CleanBurn,
        Self::HitCharacter,
        Self::PlayerDeath,
        Self::PlayerDamage,
        Self::StartFire,
        Self::RemoveItemFromSquare,
        Self::SledgehammerDestroy,
        Self::GetDbSchema,
        Self::GetTableResult,
        Self::ExecuteQuery,
        Self::ClimateManager,
    ];

    /// Name as it appears in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ExtraInfo => "ExtraInfo",
            Self::Teleport => "Teleport",
            Self::ChangePlayerStats => "ChangePlayerStats",
            Self::InvMngGetItem => "InvMngGetItem",
            Self::InvMngReqItem => "InvMngReqItem",
            Self::InvMngRemoveItem => "InvMngRemoveItem",
            Self::RequestInventory => "RequestInventory",
            Self::SandboxOptions => "SandboxOptions",
            Self::SyncNonPvpZone => "SyncNonPvpZone",
            Self::ChatMessageFromPlayer => "ChatMessageFromPlayer",
            Self::Bandage => "Bandage",
            Self::Stitch => "Stitch",
            Self::WoundInfection => "WoundInfection",
            Self::Disinfect => "Disinfect",
            Self::Splint => "Splint",
            Self::AdditionalPain => "AdditionalPain",
            Self::RemoveGlass => "RemoveGlass",
            Self::RemoveBullet => "RemoveBullet",
            Self::CleanBurn => "CleanBurn",
            Self::HitCharacter => "HitCharacter",
            Self::PlayerDeath => "PlayerDeath",
            Self::PlayerDamage => "PlayerDamage",
            Self::StartFire => "StartFire",
            Self::RemoveItemFromSquare => "RemoveItemFromSquare",
            Self::SledgehammerDestroy => "SledgehammerDestroy",
            Self::GetDbSchema => "GetDBSchema",
            Self::GetTableResult => "GetTableResult",
            Self::ExecuteQuery => "ExecuteQuery",
            Self::ClimateManager => "ClimateManager",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
