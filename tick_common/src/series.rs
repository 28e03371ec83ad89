//! The closed set of commodity series tracked by the board.
//!
//! Every series has a fixed integer index used to address its slot in the
//! shared region. The set is closed by design: producers must name one of
//! these series at startup, and the shared layout sizes its per-series
//! storage from [`Commodity::COUNT`].

use crate::consts::SERIES_COUNT;
use thiserror::Error;

/// A series name that is not part of the predefined set.
#[derive(Debug, Clone, Error)]
#[error("unknown commodity: {name}")]
pub struct UnknownCommodity {
    /// The rejected name, as supplied by the operator.
    pub name: String,
}

/// Commodity series identifier with a fixed shared-region index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Commodity {
    /// Aluminium
    Aluminium = 0,
    /// Copper
    Copper = 1,
    /// Cotton
    Cotton = 2,
    /// Crude oil
    CrudeOil = 3,
    /// Gold
    Gold = 4,
    /// Lead
    Lead = 5,
    /// Mentha oil
    MenthaOil = 6,
    /// Natural gas
    NaturalGas = 7,
    /// Nickel
    Nickel = 8,
    /// Silver
    Silver = 9,
    /// Zinc
    Zinc = 10,
}

impl Commodity {
    /// Number of predefined series.
    pub const COUNT: usize = SERIES_COUNT;

    /// All series in index order.
    pub const ALL: [Commodity; Self::COUNT] = [
        Self::Aluminium,
        Self::Copper,
        Self::Cotton,
        Self::CrudeOil,
        Self::Gold,
        Self::Lead,
        Self::MenthaOil,
        Self::NaturalGas,
        Self::Nickel,
        Self::Silver,
        Self::Zinc,
    ];

    /// Convert from raw `u8` value. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Aluminium),
            1 => Some(Self::Copper),
            2 => Some(Self::Cotton),
            3 => Some(Self::CrudeOil),
            4 => Some(Self::Gold),
            5 => Some(Self::Lead),
            6 => Some(Self::MenthaOil),
            7 => Some(Self::NaturalGas),
            8 => Some(Self::Nickel),
            9 => Some(Self::Silver),
            10 => Some(Self::Zinc),
            _ => None,
        }
    }

    /// Parse an operator-supplied series name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self, UnknownCommodity> {
        let upper = name.to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| UnknownCommodity {
                name: name.to_string(),
            })
    }

    /// Canonical display name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aluminium => "ALUMINIUM",
            Self::Copper => "COPPER",
            Self::Cotton => "COTTON",
            Self::CrudeOil => "CRUDEOIL",
            Self::Gold => "GOLD",
            Self::Lead => "LEAD",
            Self::MenthaOil => "MENTHAOIL",
            Self::NaturalGas => "NATURALGAS",
            Self::Nickel => "NICKEL",
            Self::Silver => "SILVER",
            Self::Zinc => "ZINC",
        }
    }

    /// Fixed shared-region index of this series.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
