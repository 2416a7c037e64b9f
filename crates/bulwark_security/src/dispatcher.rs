//! # Packet Checker
//!
//! Entry points the game server calls once per inbound message, before
//! its own handler runs.
//!
//! ```text
//!   inbound message
//!        │
//!        ▼
//!   check_<message>(session, buffer)
//!        │  catalog not loaded ───────────────► true   (fail open)
//!        │  chain[0] ─ chain[1] ─ ... ─ chain[n]
//!        │     └─ first failure ──────────────► false  (drop message)
//!        ▼
//!      true ──► game handler consumes the buffer from the same cursor
//! ```
//!
//! The chat filter is the one entry point that writes: it rewrites the
//! message body in place and leaves the cursor where it found it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bulwark_protocol::{ChatMessage, MessageBuffer, MessageType, MessageWriter, WireFormat};
use parking_lot::RwLock;
use tracing::error;

use crate::audit::Severity;
use crate::catalog::Catalog;
use crate::check::{Services, STAFF_CHANNEL_SENDER};
use crate::config::ConfigFile;
use crate::error::SecurityResult;
use crate::filter::TextFilter;
use crate::host::Session;

/// Routes inbound messages through their check chains.
pub struct PacketChecker {
    config: ConfigFile,
    services: Services,
    filter: Arc<TextFilter>,
    catalog: RwLock<Option<Arc<Catalog>>>,
    read_once: AtomicBool,
}

impl PacketChecker {
    /// Creates an unloaded checker. Every route passes until
    /// [`PacketChecker::load`] succeeds.
    #[must_use]
    pub fn new(config: ConfigFile, services: Services, filter: Arc<TextFilter>) -> Self {
        Self {
            config,
            services,
            filter,
            catalog: RwLock::new(None),
            read_once: AtomicBool::new(false),
        }
    }

    /// Reads `security.toml` and swaps in a fresh catalog. On failure the
    /// previous catalog, if any, stays active. Returns the number of
    /// active checks.
    ///
    /// # Errors
    ///
    /// Any configuration error; it is also logged.
    pub fn load(&self) -> SecurityResult<usize> {
        match self.build() {
            Ok(catalog) => {
                let active = catalog.active_count();
                *self.catalog.write() = Some(Arc::new(catalog));
                Ok(active)
            }
            Err(e) => {
                let state = if self.read_once.load(Ordering::Acquire) {
                    "not reloaded"
                } else {
                    "not active"
                };
                error!(target: "security", "Failed to parse security.toml. Security checks {state}.");
                error!(target: "security", "{e}");
                Err(e)
            }
        }
    }

    fn build(&self) -> SecurityResult<Catalog> {
        self.config.ensure_exists()?;
        let document = self.config.read()?;
        self.read_once.store(true, Ordering::Release);
        Catalog::load(&document, &self.services)
    }

    /// Returns true once a catalog has loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.catalog.read().is_some()
    }

    /// The active catalog.
    #[must_use]
    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.catalog.read().clone()
    }

    /// Configuration file.
    #[must_use]
    pub const fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Runs the chain for `message`. `Ok(false)` means drop the message.
    ///
    /// # Errors
    ///
    /// The first predicate fault; later checks do not run.
    pub fn route(
        &self,
        message: MessageType,
        session: &dyn Session,
        buffer: &MessageBuffer,
    ) -> SecurityResult<bool> {
        let Some(catalog) = self.catalog() else {
            return Ok(true);
        };
        for check in catalog.chain(message) {
            if !check.check(session, buffer)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Censors filtered phrases in a chat message, rewriting the body in
    /// place. Returns true if the message was rewritten. Runs whether or
    /// not a catalog is loaded.
    ///
    /// # Errors
    ///
    /// Malformed chat message, or a censored body too long to encode.
    pub fn filter_chat_message(
        &self,
        session: &dyn Session,
        buffer: &mut MessageBuffer,
    ) -> SecurityResult<bool> {
        let start = buffer.position();
        let mut reader = buffer.reader();
        let message = ChatMessage::decode(&mut reader)?;
        let end = reader.position();
        if !self.filter.test(&message.body) {
            return Ok(false);
        }

        let censored = ChatMessage {
            body: self.filter.censor(&message.body),
            ..message
        };
        let mut writer = MessageWriter::new();
        censored.encode(&mut writer)?;
        buffer.replace_range(start..end, writer.as_slice())?;

        let line = format!(
            "The player \"{}\" Tried to send message containing filter: \"{}\". Message censored.",
            session.username(),
            censored.body
        );
        self.services.audit.log(Severity::Info, &[&line]);
        self.services
            .host
            .message_staff(STAFF_CHANNEL_SENDER, &[line]);
        Ok(true)
    }
}

impl std::fmt::Debug for PacketChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketChecker")
            .field("config", &self.config)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

macro_rules! routes {
    ($($name:ident => $message:ident),* $(,)?) => {
        impl PacketChecker {
            $(
                #[doc = concat!("Runs the `", stringify!($message), "` chain. `Ok(false)` means drop the message.")]
                ///
                /// # Errors
                ///
                /// See [`PacketChecker::route`].
                pub fn $name(
                    &self,
                    session: &dyn Session,
                    buffer: &MessageBuffer,
                ) -> SecurityResult<bool> {
                    self.route(MessageType::$message, session, buffer)
                }
            )*
        }
    };
}

routes! {
    check_extra_info => ExtraInfo,
    check_teleport => Teleport,
    check_change_player_stats => ChangePlayerStats,
    check_inv_mng_get_item => InvMngGetItem,
    check_inv_mng_req_item => InvMngReqItem,
    check_inv_mng_remove_item => InvMngRemoveItem,
    check_request_inventory => RequestInventory,
    check_sandbox_options => SandboxOptions,
    check_sync_non_pvp_zone => SyncNonPvpZone,
    check_chat_message_from_player => ChatMessageFromPlayer,
    check_bandage => Bandage,
    check_stitch => Stitch,
    check_wound_infection => WoundInfection,
    check_disinfect => Disinfect,
    check_splint => Splint,
    check_additional_pain => AdditionalPain,
    check_remove_glass => RemoveGlass,
    check_remove_bullet => RemoveBullet,
    check_clean_burn => CleanBurn,
    check_hit_character => HitCharacter,
    check_player_death => PlayerDeath,
    check_player_damage => PlayerDamage,
    check_start_fire => StartFire,
    check_remove_item_from_square => RemoveItemFromSquare,
    check_sledgehammer_destroy => SledgehammerDestroy,
    check_get_db_schema => GetDbSchema,
    check_get_table_result => GetTableResult,
    check_execute_query => ExecuteQuery,
    check_climate_manager => ClimateManager,
}
