//! # Wire Enumerations
//!
//! Index tables the client sends as raw integers.

use std::fmt;

/// Body part addressed by a medical message. Out-of-range indices map to
/// [`BodyPart::Max`], as the game does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BodyPart {
    HandL,
    HandR,
    ForeArmL,
    ForeArmR,
    UpperArmL,
    UpperArmR,
    TorsoUpper,
    TorsoLower,
    Head,
    Neck,
    Groin,
    UpperLegL,
    UpperLegR,
    LowerLegL,
    LowerLegR,
    FootL,
    FootR,
    Max,
}

impl BodyPart {
    const TABLE: [Self; 17] = [
        Self::HandL,
        Self::HandR,
        Self::ForeArmL,
        Self::ForeArmR,
        Self::UpperArmL,
        Self::UpperArmR,
        Self::TorsoUpper,
        Self::TorsoLower,
        Self::Head,
        Self::Neck,
        Self::Groin,
        Self::UpperLegL,
        Self::UpperLegR,
        Self::LowerLegL,
        Self::LowerLegR,
        Self::FootL,
        Self::FootR,
    ];

    /// Looks up a wire index.
    #[must_use]
    pub fn from_index(index: i32) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::TABLE.get(i).copied())
            .unwrap_or(Self::Max)
    }

    /// Wire index; [`BodyPart::Max`] is one past the last part.
    #[must_use]
    pub fn index(self) -> i32 {
        Self::TABLE
            .iter()
            .position(|part| *part == self)
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(17)
    }

    /// Game name, used in diagnostic fields.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HandL => "Hand_L",
            Self::HandR => "Hand_R",
            Self::ForeArmL => "ForeArm_L",
            Self::ForeArmR => "ForeArm_R",
            Self::UpperArmL => "UpperArm_L",
            Self::UpperArmR => "UpperArm_R",
            Self::TorsoUpper => "Torso_Upper",
            Self::TorsoLower => "Torso_Lower",
            Self::Head => "Head",
            Self::Neck => "Neck",
            Self::Groin => "Groin",
            Self::UpperLegL => "UpperLeg_L",
            Self::UpperLegR => "UpperLeg_R",
            Self::LowerLegL => "LowerLeg_L",
            Self::LowerLegR => "LowerLeg_R",
            Self::FootL => "Foot_L",
            Self::FootR => "Foot_R",
            Self::Max => "MAX",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First byte of a hit message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum HitType {
    /// Lower sentinel.
    Min = 0,
    /// Player hits a world cell.
    PlayerHitSquare = 1,
    /// Player hits a vehicle.
    PlayerHitVehicle = 2,
    /// Player hits a zombie.
    PlayerHitZombie = 3,
    /// Player hits another player.
    PlayerHitPlayer = 4,
    /// Zombie hits a player.
    ZombieHitPlayer = 5,
    /// Vehicle hits a zombie.
    VehicleHitZombie = 6,
    /// Vehicle hits a player.
    VehicleHitPlayer = 7,
    /// Upper sentinel.
    Max = 8,
}

impl HitType {
    /// Decodes the wire byte; unknown values are `None`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Min,
            1 => Self::PlayerHitSquare,
            2 => Self::PlayerHitVehicle,
            3 => Self::PlayerHitZombie,
            4 => Self::PlayerHitPlayer,
            5 => Self::ZombieHitPlayer,
            6 => Self::VehicleHitZombie,
            7 => Self::VehicleHitPlayer,
            8 => Self::Max,
            _ => return None,
        })
    }
}
