//! # Check Catalog
//!
//! The static registry of every check, and the loaded [`Catalog`] built
//! from it and a [`SecurityDocument`].
//!
//! ## Chains
//!
//! Checks for one message type run in registry order; the first failure
//! short-circuits the rest.
//!
//! ```text
//!   Bandage ──► bandage.offline_player ──► bandage.distance
//!   StartFire ► start_fire.disabled ─────► start_fire.grid_square ─► start_fire.distance
//! ```
//!
//! Both database read messages share `database.read_not_admin`, so the
//! registry holds 51 entries over 48 configuration sections.

use std::collections::HashMap;

use bulwark_protocol::MessageType;
use tracing::info;

use crate::check::{Check, Predicate, Services};
use crate::checks::special::{
    granted_powers, object_index_in_range, pvp_respected, wields_sledgehammer,
};
use crate::checks::{
    observe, AdminOnly, CellExists, OfflineTarget, SameIdentity, ServerToggle, StaffOnly,
    WithinReach,
};
use crate::config::{CheckSettings, DefaultSettings, SecurityDocument};
use crate::error::SecurityResult;

/// One registry entry.
#[derive(Clone, Copy)]
pub struct CheckSpec {
    /// Dotted id; also the configuration section name.
    pub id: &'static str,
    /// Message type whose chain the check joins.
    pub message: MessageType,
    /// Builds the predicate.
    pub build: fn() -> Box<dyn Predicate>,
}

impl std::fmt::Debug for CheckSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckSpec")
            .field("id", &self.id)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

macro_rules! spec {
    ($id:literal, $message:ident, $predicate:expr) => {
        CheckSpec {
            id: $id,
            message: MessageType::$message,
            build: || Box::new($predicate),
        }
    };
}

/// Every check, in chain order.
pub static REGISTRY: [CheckSpec; 51] = [
    spec!("extra_info.offline_player", ExtraInfo, OfflineTarget(observe::extra_info)),
    spec!("extra_info.check_vars", ExtraInfo, granted_powers),
    spec!("teleport.not_staff", Teleport, StaffOnly(Some(observe::teleport))),
    spec!("change_player_stats.offline_player", ChangePlayerStats, OfflineTarget(observe::target)),
    spec!("change_player_stats.not_staff", ChangePlayerStats, StaffOnly(Some(observe::target))),
    spec!("inv_mng_get_item.offline_player", InvMngGetItem, OfflineTarget(observe::target)),
    spec!("inv_mng_get_item.not_staff", InvMngGetItem, StaffOnly(Some(observe::target))),
    spec!("inv_mng_req_item.offline_player", InvMngReqItem, OfflineTarget(observe::inventory_request)),
    spec!("inv_mng_req_item.not_staff", InvMngReqItem, StaffOnly(Some(observe::inventory_request))),
    spec!("inv_mng_remove_item.offline_player", InvMngRemoveItem, OfflineTarget(observe::inventory_removal)),
    spec!("inv_mng_remove_item.not_staff", InvMngRemoveItem, StaffOnly(Some(observe::inventory_removal))),
    spec!("request_inventory.offline_player", RequestInventory, OfflineTarget(observe::target)),
    spec!("request_inventory.not_staff", RequestInventory, StaffOnly(Some(observe::target))),
    spec!("sandbox_options.not_staff", SandboxOptions, StaffOnly(None)),
    spec!("sync_non_pvp_zone.not_staff", SyncNonPvpZone, StaffOnly(None)),
    spec!("chat_message_from_player.other_player", ChatMessageFromPlayer, SameIdentity(observe::chat_author)),
    spec!("bandage.offline_player", Bandage, OfflineTarget(observe::bandage)),
    spec!("bandage.distance", Bandage, WithinReach(observe::bandage)),
    spec!("stitch.offline_player", Stitch, OfflineTarget(observe::treatment)),
    spec!("stitch.distance", Stitch, WithinReach(observe::treatment)),
    spec!("wound_infection.offline_player", WoundInfection, OfflineTarget(observe::treatment)),
    spec!("wound_infection.distance", WoundInfection, WithinReach(observe::treatment)),
    spec!("disinfect.offline_player", Disinfect, OfflineTarget(observe::disinfect)),
    spec!("disinfect.distance", Disinfect, WithinReach(observe::disinfect)),
    spec!("splint.offline_player", Splint, OfflineTarget(observe::treatment)),
    spec!("splint.distance", Splint, WithinReach(observe::treatment)),
    spec!("additional_pain.offline_player", AdditionalPain, OfflineTarget(observe::treatment)),
    spec!("additional_pain.distance", AdditionalPain, WithinReach(observe::treatment)),
    spec!("remove_glass.offline_player", RemoveGlass, OfflineTarget(observe::remove_glass)),
    spec!("remove_glass.distance", RemoveGlass, WithinReach(observe::remove_glass)),
    spec!("remove_bullet.offline_player", RemoveBullet, OfflineTarget(observe::remove_bullet)),
    spec!("remove_bullet.distance", RemoveBullet, WithinReach(observe::remove_bullet)),
    spec!("clean_burn.offline_player", CleanBurn, OfflineTarget(observe::clean_burn)),
    spec!("clean_burn.distance", CleanBurn, WithinReach(observe::clean_burn)),
    spec!("hit_character.pvp_disabled", HitCharacter, pvp_respected),
    spec!("player_death.offline_player", PlayerDeath, OfflineTarget(observe::player_death)),
    spec!("player_death.self", PlayerDeath, SameIdentity(observe::dead_player)),
    spec!("player_damage.offline_player", PlayerDamage, OfflineTarget(observe::player_damage)),
    spec!("player_damage.distance", PlayerDamage, WithinReach(observe::player_damage)),
    spec!(
        "start_fire.disabled",
        StartFire,
        ServerToggle {
            allowed: |options| !options.no_fire,
            observe: observe::start_fire,
        }
    ),
    spec!("start_fire.grid_square", StartFire, CellExists(observe::start_fire)),
    spec!("start_fire.distance", StartFire, WithinReach(observe::start_fire)),
    spec!("remove_item_from_square.invalid_square", RemoveItemFromSquare, CellExists(observe::square_object)),
    spec!("remove_item_from_square.object_index", RemoveItemFromSquare, object_index_in_range),
    spec!("remove_item_from_square.distance", RemoveItemFromSquare, WithinReach(observe::square_object)),
    spec!(
        "sledgehammer_destroy.disabled",
        SledgehammerDestroy,
        ServerToggle {
            allowed: |options| options.allow_sledgehammer_destruction,
            observe: observe::square_object,
        }
    ),
    spec!("sledgehammer_destroy.weapon", SledgehammerDestroy, wields_sledgehammer),
    spec!("database.read_not_admin", GetDbSchema, AdminOnly(None)),
    spec!("database.read_not_admin", GetTableResult, AdminOnly(None)),
    spec!("database.modify_not_admin", ExecuteQuery, AdminOnly(Some(observe::database_query))),
    spec!("climate_manager.not_staff", ClimateManager, StaffOnly(None)),
];

/// A registry entry with its resolved settings.
#[derive(Debug)]
pub struct ResolvedCheck {
    /// Registry entry.
    pub spec: &'static CheckSpec,
    /// Settings from the document.
    pub settings: CheckSettings,
}

/// Resolves every registry entry against `document`.
///
/// # Errors
///
/// The first section that fails to resolve.
pub fn resolve(document: &SecurityDocument) -> SecurityResult<(DefaultSettings, Vec<ResolvedCheck>)> {
    let defaults = document.defaults()?;
    let resolved = REGISTRY
        .iter()
        .map(|spec| {
            document
                .check_settings(spec.id, &defaults)
                .map(|settings| ResolvedCheck { spec, settings })
        })
        .collect::<SecurityResult<Vec<_>>>()?;
    Ok((defaults, resolved))
}

/// Status line for one check: `Loaded Security Check: [MODE  ] id`.
#[must_use]
pub fn status_line(check: &ResolvedCheck, defaults: &DefaultSettings) -> String {
    let mut line = format!(
        "Loaded Security Check: [{:<6}] {}",
        check.settings.mode.name(),
        check.spec.id
    );
    if (check.settings.distance - defaults.distance).abs() > f32::EPSILON {
        line.push_str(&format!(" (distance: {:?})", check.settings.distance));
    }
    line
}

/// Loaded checks, grouped into chains. Immutable once built.
#[derive(Debug)]
pub struct Catalog {
    chains: HashMap<MessageType, Vec<Check>>,
    active: usize,
    total: usize,
}

impl Catalog {
    /// Builds every check from `document`. Nothing is built unless every
    /// section resolves.
    ///
    /// # Errors
    ///
    /// See [`resolve`].
    pub fn load(document: &SecurityDocument, services: &Services) -> SecurityResult<Self> {
        let (defaults, resolved) = resolve(document)?;

        let mut chains: HashMap<MessageType, Vec<Check>> = HashMap::new();
        let mut active = 0;
        let total = resolved.len();
        for check in resolved {
            info!(target: "security", "{}", status_line(&check, &defaults));
            if check.settings.mode.is_active() {
                active += 1;
            }
            let spec = check.spec;
            chains.entry(spec.message).or_default().push(Check::new(
                spec.id,
                check.settings,
                (spec.build)(),
                services.clone(),
            ));
        }
        let catalog = Self {
            chains,
            active,
            total,
        };
        info!(target: "security", "{}", catalog.summary());
        Ok(catalog)
    }

    /// Load report naming the active checks: `Loaded <n> security check(s).`
    #[must_use]
    pub fn summary(&self) -> String {
        format!("Loaded {} security check(s).", self.active)
    }

    /// Chain for one message type, in execution order.
    #[must_use]
    pub fn chain(&self, message: MessageType) -> &[Check] {
        self.chains.get(&message).map_or(&[], Vec::as_slice)
    }

    /// Checks whose mode is not OFF.
    #[must_use]
    pub const fn active_count(&self) -> usize {
        self.active
    }

    /// Every loaded check.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.total
    }

    /// Returns true if nothing was loaded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}
