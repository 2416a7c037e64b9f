//! # Check Abstraction
//!
//! A [`Check`] is one configured validator: settings from `security.toml`
//! plus a [`Predicate`] that knows one message layout.
//!
//! ## Contract
//!
//! ```text
//!   check(session, buffer)
//!     │
//!     ├─ mode OFF ─────────────────────────────────────────► Ok(true)
//!     │
//!     ├─ predicate(reader over buffer)
//!     │     ├─ Pass ────────────────────────────────────────► Ok(true)
//!     │     ├─ Fail(fields)
//!     │     │     + player_id, player_username, action
//!     │     │     → audit log (+ staff chat)
//!     │     │     → KICK: disconnect with rendered kick message ► Ok(false)
//!     │     └─ Err (malformed message, missing entity) ──────► Err
//! ```
//!
//! Predicates read through a detached [`MessageReader`]; the buffer's own
//! cursor is the same before and after, whatever the verdict.
//!
//! Predicates never log or kick. They parse what they need, consult the
//! [`World`], and return a [`Verdict`].

use std::sync::Arc;

use bulwark_protocol::{MessageBuffer, MessageReader};

use crate::audit::{SecurityLogger, Severity};
use crate::config::CheckSettings;
use crate::error::SecurityResult;
use crate::geometry::World;
use crate::host::{Host, Session};
use crate::mode::Mode;
use crate::template::{ansi, inject, inject_all, Fields};

/// Sender name on staff chat lines.
pub const STAFF_CHANNEL_SENDER: &str = "Security";

/// Outcome of a predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// Message is plausible.
    Pass,
    /// Message is rejected; the fields feed the templates.
    Fail(Fields),
}

impl Verdict {
    /// Rejection without diagnostics.
    #[must_use]
    pub const fn fail() -> Self {
        Self::Fail(Fields::new())
    }

    /// `Pass` when `ok`, otherwise a rejection carrying lazily built fields.
    pub fn check(ok: bool, fields: impl FnOnce() -> Fields) -> Self {
        if ok {
            Self::Pass
        } else {
            Self::Fail(fields())
        }
    }

    /// Returns true for [`Verdict::Pass`].
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// What a predicate can see.
pub struct CheckContext<'a> {
    /// Sending connection.
    pub session: &'a dyn Session,
    /// World lookups.
    pub world: World<'a>,
    /// Configured distance threshold of the check.
    pub distance: f32,
}

impl CheckContext<'_> {
    /// Staff bypass test.
    #[inline]
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.session.is_staff()
    }
}

/// Message-specific half of a check.
pub trait Predicate: Send + Sync {
    /// Decides whether the message is plausible.
    ///
    /// # Errors
    ///
    /// Malformed messages and entities that must exist but do not.
    fn evaluate(
        &self,
        ctx: &CheckContext<'_>,
        reader: &mut MessageReader<'_>,
    ) -> SecurityResult<Verdict>;
}

impl<F> Predicate for F
where
    F: Fn(&CheckContext<'_>, &mut MessageReader<'_>) -> SecurityResult<Verdict> + Send + Sync,
{
    fn evaluate(
        &self,
        ctx: &CheckContext<'_>,
        reader: &mut MessageReader<'_>,
    ) -> SecurityResult<Verdict> {
        self(ctx, reader)
    }
}

/// Shared handles every check acts through.
#[derive(Clone)]
pub struct Services {
    /// Game server.
    pub host: Arc<dyn Host>,
    /// Audit log.
    pub audit: Arc<SecurityLogger>,
}

/// One configured validator.
pub struct Check {
    id: &'static str,
    settings: CheckSettings,
    predicate: Box<dyn Predicate>,
    services: Services,
}

impl Check {
    /// Binds settings and a predicate.
    #[must_use]
    pub fn new(
        id: &'static str,
        settings: CheckSettings,
        predicate: Box<dyn Predicate>,
        services: Services,
    ) -> Self {
        Self {
            id,
            settings,
            predicate,
            services,
        }
    }

    /// Dotted id.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.id
    }

    /// Enforcement mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.settings.mode
    }

    /// Resolved settings.
    #[must_use]
    pub const fn settings(&self) -> &CheckSettings {
        &self.settings
    }

    /// Runs the check. `Ok(false)` means the message must be dropped.
    ///
    /// # Errors
    ///
    /// Predicate faults, see [`Predicate::evaluate`].
    pub fn check(&self, session: &dyn Session, buffer: &MessageBuffer) -> SecurityResult<bool> {
        if !self.settings.mode.is_active() {
            return Ok(true);
        }

        let ctx = CheckContext {
            session,
            world: World::new(self.services.host.as_ref()),
            distance: self.settings.distance,
        };
        let mut reader = buffer.reader();
        match self.predicate.evaluate(&ctx, &mut reader)? {
            Verdict::Pass => Ok(true),
            Verdict::Fail(fields) => {
                self.enforce(session, fields);
                Ok(false)
            }
        }
    }

    fn enforce(&self, session: &dyn Session, mut fields: Fields) {
        let mode = self.settings.mode;
        fields.set("player_id", session.id());
        fields.set("player_username", session.username());
        fields.set("action", mode.action());

        let severity = if mode == Mode::Kick {
            Severity::Alert
        } else {
            Severity::Warning
        };
        let lines = inject_all(&self.settings.log_messages, &fields, mode.color(), ansi::RESET);
        self.services.audit.log(severity, &lines);

        if self.settings.mirror_to_staff {
            let plain = inject_all(&self.settings.log_messages, &fields, "", "");
            self.services.host.message_staff(STAFF_CHANNEL_SENDER, &plain);
        }

        if mode == Mode::Kick {
            let reason = inject(&self.settings.kick_message, &fields, "", "");
            session.disconnect(&reason);
        }
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
