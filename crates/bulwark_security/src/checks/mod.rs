//! # Check Variants
//!
//! Almost every check in the catalog is one of a handful of shapes. Each
//! shape is a generic [`Predicate`] parameterized by an *observer*: a plain
//! function that decodes one message layout into an [`Observation`].
//!
//! | Variant | Rejects when |
//! |---------|--------------|
//! | [`OfflineTarget`] | the referenced player is not online |
//! | [`WithinReach`] | actor and target are farther apart than the threshold |
//! | [`SameIdentity`] | a claimed username is not the sender's |
//! | [`StaffOnly`] / [`AdminOnly`] | the sender lacks the privilege |
//! | [`ServerToggle`] | a server option forbids the action |
//! | [`CellExists`] | the addressed world cell does not exist |
//!
//! Compound actions that fail the game's own validation are rejected by
//! every variant before anything else is looked at. Staff bypass applies to
//! all variants except [`AdminOnly`].

pub mod observe;
pub mod special;

use bulwark_protocol::MessageReader;

use crate::check::{CheckContext, Predicate, Verdict};
use crate::error::{SecurityError, SecurityResult};
use crate::geometry::{distance_between, distance_to, Vec3};
use crate::host::{PlayerId, ServerOptions};
use crate::template::Fields;

/// What a message refers to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Subject {
    /// Nothing to resolve.
    Nothing,
    /// A player by online id.
    Player(PlayerId),
    /// A player the host already failed to resolve.
    Missing,
    /// A world coordinate.
    Point(Vec3),
}

/// Decoded view of one message, shared by the variants.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    /// The game's own validation and consistency tests passed.
    pub consistent: bool,
    /// Acting player; `None` means the sender.
    pub actor: Option<PlayerId>,
    /// What the message refers to.
    pub subject: Subject,
    /// Message-specific diagnostics.
    pub fields: Fields,
}

impl Observation {
    /// A consistent observation of `subject`.
    #[must_use]
    pub const fn of(subject: Subject, fields: Fields) -> Self {
        Self {
            consistent: true,
            actor: None,
            subject,
            fields,
        }
    }
}

/// Decodes one message layout.
pub type Observe = fn(&CheckContext<'_>, &mut MessageReader<'_>) -> SecurityResult<Observation>;

/// Extracts a claimed username.
pub type Claim = fn(&CheckContext<'_>, &mut MessageReader<'_>) -> SecurityResult<String>;

/// Reads a server option.
pub type Toggle = fn(&ServerOptions) -> bool;

/// Rejects messages whose target player is not online.
pub struct OfflineTarget(pub Observe);

impl Predicate for OfflineTarget {
    fn evaluate(
        &self,
        ctx: &CheckContext<'_>,
        reader: &mut MessageReader<'_>,
    ) -> SecurityResult<Verdict> {
        if ctx.is_staff() {
            return Ok(Verdict::Pass);
        }
        let observation = (self.0)(ctx, reader)?;
        if !observation.consistent {
            return Ok(Verdict::Fail(observation.fields));
        }
        let online = match observation.subject {
            Subject::Player(id) => ctx.world.online(id).is_some(),
            Subject::Missing => false,
            Subject::Nothing | Subject::Point(_) => true,
        };
        Ok(Verdict::check(online, || observation.fields))
    }
}

/// Rejects actions performed from farther away than the check's distance.
pub struct WithinReach(pub Observe);

impl Predicate for WithinReach {
    fn evaluate(
        &self,
        ctx: &CheckContext<'_>,
        reader: &mut MessageReader<'_>,
    ) -> SecurityResult<Verdict> {
        if ctx.is_staff() {
            return Ok(Verdict::Pass);
        }
        let Observation {
            consistent,
            actor,
            subject,
            mut fields,
        } = (self.0)(ctx, reader)?;
        if !consistent {
            return Ok(Verdict::Fail(fields));
        }

        let actor = match actor {
            Some(id) => ctx.world.require(id)?,
            None => ctx.world.sender(ctx.session)?,
        };
        let (measured, target) = match subject {
            Subject::Player(id) => {
                let target = ctx.world.require(id)?;
                (distance_between(&actor, &target), Some(target.username))
            }
            Subject::Point(point) => (distance_to(&actor, point), None),
            Subject::Missing => return Err(SecurityError::UnresolvedTarget),
            Subject::Nothing => return Ok(Verdict::Pass),
        };

        if ctx.distance >= measured {
            return Ok(Verdict::Pass);
        }
        if let Some(name) = target {
            fields.set("target_username", name);
        }
        fields.set("distance", ctx.distance);
        fields.set("distance_measured", measured);
        Ok(Verdict::Fail(fields))
    }
}

/// Rejects a claimed username that is not the sender's, ignoring case.
pub struct SameIdentity(pub Claim);

impl Predicate for SameIdentity {
    fn evaluate(
        &self,
        ctx: &CheckContext<'_>,
        reader: &mut MessageReader<'_>,
    ) -> SecurityResult<Verdict> {
        if ctx.is_staff() {
            return Ok(Verdict::Pass);
        }
        let claimed = (self.0)(ctx, reader)?;
        let same = claimed.to_lowercase() == ctx.session.username().to_lowercase();
        Ok(Verdict::check(same, || {
            Fields::new().with("target_username", claimed)
        }))
    }
}

fn reveal(
    observe: Option<Observe>,
    ctx: &CheckContext<'_>,
    reader: &mut MessageReader<'_>,
) -> SecurityResult<Fields> {
    let Some(observe) = observe else {
        return Ok(Fields::new());
    };
    let observation = observe(ctx, reader)?;
    let mut fields = observation.fields;
    if let Subject::Player(id) = observation.subject {
        fields.set("target_username", ctx.world.require(id)?.username);
    }
    Ok(fields)
}

/// Passes only for staff. The observer, if any, fills the diagnostics.
pub struct StaffOnly(pub Option<Observe>);

impl Predicate for StaffOnly {
    fn evaluate(
        &self,
        ctx: &CheckContext<'_>,
        reader: &mut MessageReader<'_>,
    ) -> SecurityResult<Verdict> {
        if ctx.is_staff() {
            return Ok(Verdict::Pass);
        }
        Ok(Verdict::Fail(reveal(self.0, ctx, reader)?))
    }
}

/// Passes only for administrators; staff get no bypass.
pub struct AdminOnly(pub Option<Observe>);

impl Predicate for AdminOnly {
    fn evaluate(
        &self,
        ctx: &CheckContext<'_>,
        reader: &mut MessageReader<'_>,
    ) -> SecurityResult<Verdict> {
        if ctx.session.access_level().is_admin() {
            return Ok(Verdict::Pass);
        }
        Ok(Verdict::Fail(reveal(self.0, ctx, reader)?))
    }
}

/// Rejects actions a server option forbids.
pub struct ServerToggle {
    /// Returns true when the action is allowed.
    pub allowed: Toggle,
    /// Decodes the message for diagnostics and consistency.
    pub observe: Observe,
}

impl Predicate for ServerToggle {
    fn evaluate(
        &self,
        ctx: &CheckContext<'_>,
        reader: &mut MessageReader<'_>,
    ) -> SecurityResult<Verdict> {
        if ctx.is_staff() {
            return Ok(Verdict::Pass);
        }
        let observation = (self.observe)(ctx, reader)?;
        if !observation.consistent {
            return Ok(Verdict::Fail(observation.fields));
        }
        let allowed = (self.allowed)(&ctx.world.host().options());
        Ok(Verdict::check(allowed, || observation.fields))
    }
}

/// Rejects actions on world cells that do not exist.
pub struct CellExists(pub Observe);

impl Predicate for CellExists {
    #[allow(clippy::cast_possible_truncation)]
    fn evaluate(
        &self,
        ctx: &CheckContext<'_>,
        reader: &mut MessageReader<'_>,
    ) -> SecurityResult<Verdict> {
        if ctx.is_staff() {
            return Ok(Verdict::Pass);
        }
        let observation = (self.0)(ctx, reader)?;
        if !observation.consistent {
            return Ok(Verdict::Fail(observation.fields));
        }
        let exists = match observation.subject {
            Subject::Point(p) => ctx.world.cell(p.x as i32, p.y as i32, p.z as i32).is_some(),
            Subject::Nothing | Subject::Player(_) | Subject::Missing => true,
        };
        Ok(Verdict::check(exists, || observation.fields))
    }
}
