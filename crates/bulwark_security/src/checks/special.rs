//! Predicates with logic of their own.

use bulwark_protocol::{ExtraInfoRequest, HitType, MessageReader, SquareObjectRef, WireFormat};

use crate::check::{CheckContext, Verdict};
use crate::error::{SecurityError, SecurityResult};
use crate::template::Fields;

const SLEDGEHAMMER: &str = "sledgehammer";

/// Rejects power flags the server never granted the described player.
///
/// # Errors
///
/// Malformed message, or the described player is not online.
pub fn granted_powers(
    ctx: &CheckContext<'_>,
    reader: &mut MessageReader<'_>,
) -> SecurityResult<Verdict> {
    if ctx.is_staff() {
        return Ok(Verdict::Pass);
    }
    let request = ExtraInfoRequest::decode(reader)?;
    let player = ctx.world.require(request.player)?;
    if !request.powers.exceeds(&player.powers) {
        return Ok(Verdict::Pass);
    }

    let mut fields = Fields::new().with("target_username", player.username);
    for ((stem, claimed), (_, granted)) in request
        .powers
        .named()
        .into_iter()
        .zip(player.powers.named())
    {
        fields.set(format!("packet_is_{stem}_enabled"), claimed);
        fields.set(format!("player_is_{stem}_enabled"), granted);
    }
    Ok(Verdict::Fail(fields))
}

/// Rejects object indexes outside the addressed cell's object list.
///
/// # Errors
///
/// Malformed message, or the cell does not exist.
pub fn object_index_in_range(
    ctx: &CheckContext<'_>,
    reader: &mut MessageReader<'_>,
) -> SecurityResult<Verdict> {
    if ctx.is_staff() {
        return Ok(Verdict::Pass);
    }
    let SquareObjectRef {
        x,
        y,
        z,
        object_index,
    } = SquareObjectRef::decode(reader)?;
    let cell = ctx
        .world
        .cell(x, y, z)
        .ok_or(SecurityError::UnknownCell { x, y, z })?;
    let in_range = usize::try_from(object_index).is_ok_and(|i| i < cell.object_count);
    Ok(Verdict::check(in_range, || {
        Fields::new()
            .with("x", x)
            .with("y", y)
            .with("z", z)
            .with("object_index", object_index)
    }))
}

/// Rejects destruction without a sledgehammer in the primary hand.
///
/// # Errors
///
/// The sender has no player entity, or the message is malformed.
pub fn wields_sledgehammer(
    ctx: &CheckContext<'_>,
    reader: &mut MessageReader<'_>,
) -> SecurityResult<Verdict> {
    if ctx.is_staff() {
        return Ok(Verdict::Pass);
    }
    let item = ctx.world.sender(ctx.session)?.primary_hand_item;
    let armed = item
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(SLEDGEHAMMER));
    if armed {
        return Ok(Verdict::Pass);
    }

    let target = SquareObjectRef::decode(reader)?;
    let fields = Fields::new()
        .with("x", target.x)
        .with("y", target.y)
        .with("z", target.z)
        .with("object_index", target.object_index)
        .with("weapon", item.unwrap_or_else(|| "bare hands".to_owned()));
    Ok(Verdict::Fail(fields))
}

/// Rejects player-on-player hits while PvP is off.
///
/// # Errors
///
/// Empty message.
pub fn pvp_respected(
    ctx: &CheckContext<'_>,
    reader: &mut MessageReader<'_>,
) -> SecurityResult<Verdict> {
    if ctx.is_staff() || ctx.world.host().options().pvp {
        return Ok(Verdict::Pass);
    }
    let hit = HitType::from_u8(reader.read_u8()?);
    Ok(Verdict::check(hit != Some(HitType::PlayerHitPlayer), Fields::new))
}
