//! # BULWARK Security - The Gatekeeper
//!
//! Server-side validation of client messages. Every inbound message of a
//! watched type runs through a chain of configurable checks before the
//! game handler sees it.
//!
//! ## Design Principles
//!
//! 1. **Observe, never consume** - checks read through a detached reader;
//!    the game handler starts from the cursor it would have had anyway
//! 2. **Fail open** - with no valid configuration every message passes
//! 3. **Configuration decides** - each check is OFF, IGNORE or KICK, with its
//!    own log lines, kick message and distance in `security.toml`
//! 4. **No disk on the hot path** - audit lines are queued and written by a
//!    dedicated thread
//!
//! ## Example
//!
//! ```rust,ignore
//! use bulwark_security::{AuditConfig, SecurityPaths, SecurityService};
//!
//! let service = SecurityService::start(
//!     SecurityPaths::new("server", "server/logs"),
//!     host,
//!     AuditConfig::default(),
//! );
//!
//! // Before the game handler runs:
//! if !service.checker().check_bandage(&session, &buffer)? {
//!     return; // drop the message
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod audit;
pub mod catalog;
pub mod check;
pub mod checks;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod host;
pub mod mode;
pub mod service;
pub mod template;

pub use audit::{AuditConfig, SecurityLogger, Severity};
pub use catalog::{Catalog, CheckSpec, REGISTRY};
pub use check::{Check, CheckContext, Predicate, Services, Verdict};
pub use config::{CheckSettings, ConfigFile, DefaultSettings, SecurityDocument, CURRENT_VERSION};
pub use dispatcher::PacketChecker;
pub use error::{SecurityError, SecurityResult};
pub use filter::{PhraseSet, TextFilter};
pub use geometry::{Vec3, World};
pub use host::{
    AccessLevel, DeathReport, FireStart, GridCell, Host, PlayerId, PlayerSnapshot, ServerOptions,
    Session, Treatment, TreatmentKind,
};
pub use mode::Mode;
pub use service::{SecurityPaths, SecurityService};
pub use template::{FieldValue, Fields};
