//! # BULWARK Protocol - The Wire
//!
//! Binary view over the client messages that the security layer inspects.
//!
//! ## Message Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Body (big-endian, no framing - the host strips the header)   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ i8 │ i16 │ i32 │ f32 │ str = u16 length + UTF-8 bytes         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Philosophy
//!
//! - Validators observe, the game handler consumes
//! - A [`MessageReader`] owns its cursor, the [`MessageBuffer`] never moves
//!   because of a read
//! - Every decode is fallible; a short message is an error, never a panic

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod error;
pub mod message;
pub mod requests;
pub mod tables;

pub use buffer::{Mark, MessageBuffer, MessageReader, MessageWriter};
pub use error::{ProtocolError, ProtocolResult};
pub use message::MessageType;
pub use requests::{
    AdminPowers, BandageRequest, ChatEnvelope, ChatMessage, DamageRequest, ExtraInfoRequest,
    InventoryItemRequest, ItemKey, RemoveItemRequest, SquareObjectRef, TargetRef,
    TeleportRequest, TreatmentRequest, WireFormat,
};
pub use tables::{BodyPart, HitType};
