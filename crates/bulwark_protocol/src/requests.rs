//! # Request Bodies
//!
//! Typed views of the fixed-layout message bodies that validators read.
//! Compound actions (disinfect, fire, death, ...) are decoded by the host
//! and are not described here.
//!
//! ## Layouts
//!
//! ```text
//! TargetRef            i16 target
//! TreatmentRequest     i16 target │ i32 body part │ u8 flag
//! BandageRequest       i16 target │ i32 body part │ u8 apply │ f32 life │ u8 alcoholic │ str type
//! DamageRequest        i16 target │ f32 damage
//! ExtraInfoRequest     i16 player │ 6 × u8 power flags
//! SquareObjectRef      i32 x │ i32 y │ i32 z │ i32 object index
//! InventoryItemRequest u8 tag │ (str type | i32 id) │ i16 requester │ i16 target
//! RemoveItemRequest    i32 item id │ i16 target
//! TeleportRequest      str target │ f32 x │ f32 y │ f32 z
//! ChatEnvelope         i32 chat id │ str author
//! ChatMessage          i32 chat id │ str author │ str body
//! ```

use crate::buffer::{MessageReader, MessageWriter};
use crate::error::ProtocolResult;
use crate::tables::BodyPart;

/// Symmetric codec for one body layout.
pub trait WireFormat: Sized {
    /// Reads the layout from the reader's cursor.
    ///
    /// # Errors
    ///
    /// Any [`crate::ProtocolError`] raised by the underlying reads.
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self>;

    /// Appends the layout to a writer.
    ///
    /// # Errors
    ///
    /// [`crate::ProtocolError::StringTooLong`] for oversized strings.
    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()>;
}

/// A message naming one other player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetRef {
    /// Online id of the target.
    pub target: i16,
}

impl WireFormat for TargetRef {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            target: reader.read_i16()?,
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        writer.put_i16(self.target);
        Ok(())
    }
}

/// Stitch, splint, wound infection and additional pain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreatmentRequest {
    /// Patient.
    pub target: i16,
    /// Treated body part.
    pub body_part: BodyPart,
    /// Apply (`true`) or remove.
    pub flag: bool,
}

impl WireFormat for TreatmentRequest {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            target: reader.read_i16()?,
            body_part: BodyPart::from_index(reader.read_i32()?),
            flag: reader.read_bool()?,
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        writer
            .put_i16(self.target)
            .put_i32(self.body_part.index())
            .put_bool(self.flag);
        Ok(())
    }
}

/// Bandage application or removal.
#[derive(Clone, Debug, PartialEq)]
pub struct BandageRequest {
    /// Patient.
    pub target: i16,
    /// Bandaged body part.
    pub body_part: BodyPart,
    /// Apply (`true`) or remove.
    pub apply: bool,
    /// Remaining bandage life.
    pub life: f32,
    /// Alcohol-soaked bandage.
    pub alcoholic: bool,
    /// Item type of the bandage.
    pub bandage_type: String,
}

impl WireFormat for BandageRequest {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            target: reader.read_i16()?,
            body_part: BodyPart::from_index(reader.read_i32()?),
            apply: reader.read_bool()?,
            life: reader.read_f32()?,
            alcoholic: reader.read_bool()?,
            bandage_type: reader.read_string()?,
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        writer
            .put_i16(self.target)
            .put_i32(self.body_part.index())
            .put_bool(self.apply)
            .put_f32(self.life)
            .put_bool(self.alcoholic)
            .put_string(&self.bandage_type)?;
        Ok(())
    }
}

/// Damage dealt to another player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageRequest {
    /// Damaged player.
    pub target: i16,
    /// Damage amount.
    pub damage: f32,
}

impl WireFormat for DamageRequest {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            target: reader.read_i16()?,
            damage: reader.read_f32()?,
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        writer.put_i16(self.target).put_f32(self.damage);
        Ok(())
    }
}

/// Admin power flags, as claimed by a client or granted by the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdminPowers {
    /// Invulnerability.
    pub god_mode: bool,
    /// Zombies ignore the player.
    pub ghost_mode: bool,
    /// Hidden from other players.
    pub invisible: bool,
    /// Walk through walls.
    pub no_clip: bool,
    /// Admin tag above the head.
    pub show_admin_tag: bool,
    /// Hear every voice channel.
    pub can_hear_all: bool,
}

impl AdminPowers {
    /// Powers in wire order, paired with their field-name stem.
    #[must_use]
    pub const fn named(&self) -> [(&'static str, bool); 6] {
        [
            ("god_mod", self.god_mode),
            ("ghost_mode", self.ghost_mode),
            ("invisible", self.invisible),
            ("no_clip", self.no_clip),
            ("show_admin_tag", self.show_admin_tag),
            ("can_hear_all", self.can_hear_all),
        ]
    }

    /// Returns true if `self` claims any power `granted` lacks.
    #[must_use]
    pub const fn exceeds(&self, granted: &Self) -> bool {
        (self.god_mode && !granted.god_mode)
            || (self.ghost_mode && !granted.ghost_mode)
            || (self.invisible && !granted.invisible)
            || (self.no_clip && !granted.no_clip)
            || (self.show_admin_tag && !granted.show_admin_tag)
            || (self.can_hear_all && !granted.can_hear_all)
    }
}

/// Power flags broadcast for one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtraInfoRequest {
    /// Online id of the described player.
    pub player: i16,
    /// Claimed powers.
    pub powers: AdminPowers,
}

impl WireFormat for ExtraInfoRequest {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            player: reader.read_i16()?,
            powers: AdminPowers {
                god_mode: reader.read_bool()?,
                ghost_mode: reader.read_bool()?,
                invisible: reader.read_bool()?,
                no_clip: reader.read_bool()?,
                show_admin_tag: reader.read_bool()?,
                can_hear_all: reader.read_bool()?,
            },
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        writer.put_i16(self.player);
        for (_, flag) in self.powers.named() {
            writer.put_bool(flag);
        }
        Ok(())
    }
}

/// An object slot on a world cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SquareObjectRef {
    /// Cell x.
    pub x: i32,
    /// Cell y.
    pub y: i32,
    /// Cell z (floor).
    pub z: i32,
    /// Index into the cell's object list.
    pub object_index: i32,
}

impl WireFormat for SquareObjectRef {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            x: reader.read_i32()?,
            y: reader.read_i32()?,
            z: reader.read_i32()?,
            object_index: reader.read_i32()?,
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        writer
            .put_i32(self.x)
            .put_i32(self.y)
            .put_i32(self.z)
            .put_i32(self.object_index);
        Ok(())
    }
}

/// How an inventory request names its item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemKey {
    /// By item type (tag byte `1`).
    Type(String),
    /// By item id (any other tag byte).
    Id(i32),
}

/// Request for an item from another player's inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryItemRequest {
    /// Requested item.
    pub item: ItemKey,
    /// Online id of the requester.
    pub requester: i16,
    /// Online id of the inventory owner.
    pub target: i16,
}

impl WireFormat for InventoryItemRequest {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        let item = if reader.read_u8()? == 1 {
            ItemKey::Type(reader.read_string()?)
        } else {
            ItemKey::Id(reader.read_i32()?)
        };
        Ok(Self {
            item,
            requester: reader.read_i16()?,
            target: reader.read_i16()?,
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        match &self.item {
            ItemKey::Type(name) => {
                writer.put_u8(1).put_string(name)?;
            }
            ItemKey::Id(id) => {
                writer.put_u8(0).put_i32(*id);
            }
        }
        writer.put_i16(self.requester).put_i16(self.target);
        Ok(())
    }
}

/// Removal of an item from another player's inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveItemRequest {
    /// Item id.
    pub item_id: i32,
    /// Online id of the inventory owner.
    pub target: i16,
}

impl WireFormat for RemoveItemRequest {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            item_id: reader.read_i32()?,
            target: reader.read_i16()?,
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        writer.put_i32(self.item_id).put_i16(self.target);
        Ok(())
    }
}

/// Teleport to a player or coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct TeleportRequest {
    /// Username of the player being moved.
    pub target_username: String,
    /// Destination x.
    pub x: f32,
    /// Destination y.
    pub y: f32,
    /// Destination z.
    pub z: f32,
}

impl WireFormat for TeleportRequest {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            target_username: reader.read_string()?,
            x: reader.read_f32()?,
            y: reader.read_f32()?,
            z: reader.read_f32()?,
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        writer
            .put_string(&self.target_username)?
            .put_f32(self.x)
            .put_f32(self.y)
            .put_f32(self.z);
        Ok(())
    }
}

/// Leading fields of a chat message, enough to identify the author.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEnvelope {
    /// Chat channel id.
    pub chat_id: i32,
    /// Claimed author username.
    pub author: String,
}

impl WireFormat for ChatEnvelope {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            chat_id: reader.read_i32()?,
            author: reader.read_string()?,
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        writer.put_i32(self.chat_id).put_string(&self.author)?;
        Ok(())
    }
}

/// Full chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    /// Chat channel id.
    pub chat_id: i32,
    /// Claimed author username.
    pub author: String,
    /// Message text.
    pub body: String,
}

impl WireFormat for ChatMessage {
    fn decode(reader: &mut MessageReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            chat_id: reader.read_i32()?,
            author: reader.read_string()?,
            body: reader.read_string()?,
        })
    }

    fn encode(&self, writer: &mut MessageWriter) -> ProtocolResult<()> {
        writer
            .put_i32(self.chat_id)
            .put_string(&self.author)?
            .put_string(&self.body)?;
        Ok(())
    }
}
