//! Observers: one decoder per message layout.
//!
//! Fixed layouts go through [`WireFormat`]; compound actions are decoded
//! by the [`Host`](crate::host::Host).

use bulwark_protocol::{
    BandageRequest, ChatEnvelope, DamageRequest, ExtraInfoRequest, InventoryItemRequest,
    MessageReader, RemoveItemRequest, SquareObjectRef, TargetRef, TeleportRequest,
    TreatmentRequest, WireFormat,
};

use super::{Observation, Subject};
use crate::check::CheckContext;
use crate::error::{SecurityError, SecurityResult};
use crate::geometry::Vec3;
use crate::host::{Treatment, TreatmentKind};
use crate::template::{FieldValue, Fields};

fn player(target: i16, fields: Fields) -> Observation {
    Observation::of(Subject::Player(target), fields)
}

/// `ExtraInfo`: the player the powers describe.
pub fn extra_info(_: &CheckContext<'_>, r: &mut MessageReader<'_>) -> SecurityResult<Observation> {
    let request = ExtraInfoRequest::decode(r)?;
    Ok(player(request.player, Fields::new()))
}

/// A bare `i16 target`.
pub fn target(_: &CheckContext<'_>, r: &mut MessageReader<'_>) -> SecurityResult<Observation> {
    Ok(player(TargetRef::decode(r)?.target, Fields::new()))
}

/// `InvMngReqItem`.
pub fn inventory_request(
    _: &CheckContext<'_>,
    r: &mut MessageReader<'_>,
) -> SecurityResult<Observation> {
    Ok(player(InventoryItemRequest::decode(r)?.target, Fields::new()))
}

/// `InvMngRemoveItem`.
pub fn inventory_removal(
    _: &CheckContext<'_>,
    r: &mut MessageReader<'_>,
) -> SecurityResult<Observation> {
    let request = RemoveItemRequest::decode(r)?;
    Ok(player(request.target, Fields::new().with("item_id", request.item_id)))
}

/// `Bandage`.
pub fn bandage(_: &CheckContext<'_>, r: &mut MessageReader<'_>) -> SecurityResult<Observation> {
    let request = BandageRequest::decode(r)?;
    let fields = Fields::new()
        .with("body_part", request.body_part.name())
        .with("apply", request.apply)
        .with("bandage_life", request.life)
        .with("is_alcoholic_bandage", request.alcoholic)
        .with("bandage_type", request.bandage_type);
    Ok(player(request.target, fields))
}

/// Stitch, wound infection, splint and additional pain.
pub fn treatment(_: &CheckContext<'_>, r: &mut MessageReader<'_>) -> SecurityResult<Observation> {
    let request = TreatmentRequest::decode(r)?;
    let fields = Fields::new()
        .with("body_part", request.body_part.name())
        .with("flag", request.flag);
    Ok(player(request.target, fields))
}

fn compound(
    ctx: &CheckContext<'_>,
    r: &mut MessageReader<'_>,
    kind: TreatmentKind,
) -> SecurityResult<Observation> {
    let Treatment {
        valid,
        wielder,
        target,
        body_part,
        alcohol,
    } = ctx.world.host().decode_treatment(kind, ctx.session, r)?;

    let mut fields = Fields::new().with("body_part", body_part.name());
    if let Some(alcohol) = alcohol {
        fields.set("alcohol_level_to_add", alcohol);
    }
    Ok(Observation {
        consistent: valid,
        actor: wielder,
        subject: target.map_or(Subject::Missing, Subject::Player),
        fields,
    })
}

/// Compound `Disinfect`.
pub fn disinfect(ctx: &CheckContext<'_>, r: &mut MessageReader<'_>) -> SecurityResult<Observation> {
    compound(ctx, r, TreatmentKind::Disinfect)
}

/// Compound `CleanBurn`.
pub fn clean_burn(ctx: &CheckContext<'_>, r: &mut MessageReader<'_>) -> SecurityResult<Observation> {
    compound(ctx, r, TreatmentKind::CleanBurn)
}

/// Compound `RemoveGlass`.
pub fn remove_glass(
    ctx: &CheckContext<'_>,
    r: &mut MessageReader<'_>,
) -> SecurityResult<Observation> {
    compound(ctx, r, TreatmentKind::RemoveGlass)
}

/// Compound `RemoveBullet`.
pub fn remove_bullet(
    ctx: &CheckContext<'_>,
    r: &mut MessageReader<'_>,
) -> SecurityResult<Observation> {
    compound(ctx, r, TreatmentKind::RemoveBullet)
}

/// Compound `PlayerDeath`: the player reported dead.
pub fn player_death(
    ctx: &CheckContext<'_>,
    r: &mut MessageReader<'_>,
) -> SecurityResult<Observation> {
    let report = ctx.world.host().decode_death(ctx.session, r)?;
    let subject = report.player.map_or(Subject::Missing, Subject::Player);
    Ok(Observation::of(subject, Fields::new()))
}

/// `PlayerDamage`.
pub fn player_damage(
    _: &CheckContext<'_>,
    r: &mut MessageReader<'_>,
) -> SecurityResult<Observation> {
    let request = DamageRequest::decode(r)?;
    Ok(player(request.target, Fields::new().with("damage_amount", request.damage)))
}

/// Compound `StartFire`: the fire's coordinate.
#[allow(clippy::cast_possible_truncation)]
pub fn start_fire(ctx: &CheckContext<'_>, r: &mut MessageReader<'_>) -> SecurityResult<Observation> {
    let fire = ctx.world.host().decode_fire(ctx.session, r)?;
    let at = fire.position;
    let fields = Fields::new()
        .with("x", at.x as i32)
        .with("y", at.y as i32)
        .with("z", at.z as i32)
        .with("energy", fire.energy)
        .with("life", fire.life)
        .with("smoke", fire.smoke);
    Ok(Observation {
        consistent: fire.valid,
        actor: None,
        subject: Subject::Point(at),
        fields,
    })
}

/// `RemoveItemFromSquare` and `SledgehammerDestroy`: the addressed cell.
#[allow(clippy::cast_precision_loss)]
pub fn square_object(
    _: &CheckContext<'_>,
    r: &mut MessageReader<'_>,
) -> SecurityResult<Observation> {
    let SquareObjectRef {
        x,
        y,
        z,
        object_index,
    } = SquareObjectRef::decode(r)?;
    let fields = Fields::new()
        .with("x", x)
        .with("y", y)
        .with("z", z)
        .with("object_index", object_index);
    let point = Vec3::new(x as f32, y as f32, z as f32);
    Ok(Observation::of(Subject::Point(point), fields))
}

/// `Teleport`: destination and target name, for diagnostics only.
pub fn teleport(_: &CheckContext<'_>, r: &mut MessageReader<'_>) -> SecurityResult<Observation> {
    let request = TeleportRequest::decode(r)?;
    let fields = Fields::new()
        .with("target_username", request.target_username)
        .with("x", request.x)
        .with("y", request.y)
        .with("z", request.z);
    Ok(Observation::of(Subject::Nothing, fields))
}

/// `ExecuteQuery`: the query with its arguments bound, for diagnostics only.
pub fn database_query(
    ctx: &CheckContext<'_>,
    r: &mut MessageReader<'_>,
) -> SecurityResult<Observation> {
    let query = r.read_string()?;
    let rendered = match ctx.world.host().decode_query_args(r) {
        Ok(args) => bind_query(&query, &args),
        Err(_) => format!("{query} (Invalid Args)"),
    };
    Ok(Observation::of(Subject::Nothing, Fields::new().with("query", rendered)))
}

/// Replaces each `?` placeholder in order. Text arguments are quoted;
/// placeholders past the last argument stay as they are.
#[must_use]
pub fn bind_query(query: &str, args: &[FieldValue]) -> String {
    let mut out = String::with_capacity(query.len());
    let mut rest = query;
    for arg in args {
        let Some(at) = rest.find('?') else {
            break;
        };
        out.push_str(&rest[..at]);
        match arg {
            FieldValue::Text(text) => {
                out.push('\'');
                out.push_str(text);
                out.push('\'');
            }
            other => out.push_str(&other.to_string()),
        }
        rest = &rest[at + 1..];
    }
    out.push_str(rest);
    out
}

/// `ChatMessageFromPlayer`: the claimed author.
pub fn chat_author(_: &CheckContext<'_>, r: &mut MessageReader<'_>) -> SecurityResult<String> {
    Ok(ChatEnvelope::decode(r)?.author)
}

/// Compound `PlayerDeath`: username of the player reported dead.
pub fn dead_player(ctx: &CheckContext<'_>, r: &mut MessageReader<'_>) -> SecurityResult<String> {
    let report = ctx.world.host().decode_death(ctx.session, r)?;
    let id = report.player.ok_or(SecurityError::UnresolvedTarget)?;
    Ok(ctx.world.require(id)?.username)
}
