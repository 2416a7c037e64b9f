//! # Enforcement Mode
//!
//! ```text
//!   "false" ──────────────► OFF
//!   "off" / "ignore" / "kick" (any case, trimmed) ──► that mode
//!   anything else ────────► IGNORE
//!   ""  ──────────────────► rejected
//! ```
//!
//! Unknown strings land on IGNORE: a typo in the configuration keeps the
//! audit trail running instead of silently disabling the check.

use std::fmt;
use std::str::FromStr;

use crate::template::ansi;

/// What happens when a check fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Check is skipped entirely.
    Off,
    /// Failure is logged, the message is dropped.
    Ignore,
    /// Failure is logged and the sender is disconnected.
    Kick,
}

/// Error for an empty mode string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmptyModeError;

impl fmt::Display for EmptyModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("mode string is empty")
    }
}

impl std::error::Error for EmptyModeError {}

impl FromStr for Mode {
    type Err = EmptyModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(EmptyModeError);
        }
        Ok(match s.to_uppercase().trim() {
            "FALSE" | "OFF" => Self::Off,
            "KICK" => Self::Kick,
            _ => Self::Ignore,
        })
    }
}

impl Mode {
    /// Upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Ignore => "IGNORE",
            Self::Kick => "KICK",
        }
    }

    /// Value of the `action` diagnostic field.
    #[must_use]
    pub const fn action(self) -> &'static str {
        match self {
            Self::Off => "",
            Self::Ignore => "IGNORING",
            Self::Kick => "KICKING",
        }
    }

    /// Console color for failure lines.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Kick => ansi::RED,
            Self::Off | Self::Ignore => ansi::YELLOW,
        }
    }

    /// Returns true unless the mode is OFF.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
