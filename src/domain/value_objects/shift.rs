//! Shift value object module
//!
//! This module defines the two fixed production shifts. The wall-clock
//! windows themselves (03:00-15:00 and 15:00-03:00) live in the business
//! calendar service; a Shift value only carries identity.

use serde::{Deserialize, Serialize};

/// One of the two twelve-hour production shifts
///
/// Shift 1 runs 03:00-15:00 local, Shift 2 runs 15:00-03:00 local and
/// crosses midnight; for calendar purposes a Shift 2 window belongs to the
/// date on which it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Shift {
    /// Day shift, 03:00-15:00 local
    First,
    /// Night shift, 15:00-03:00 local (next calendar day)
    Second,
}

impl Shift {
    /// Returns both shifts in their canonical order
    pub fn both() -> [Shift; 2] {
        [Shift::First, Shift::Second]
    }

    /// Returns the other shift
    pub fn other(&self) -> Shift {
        match self {
            Shift::First => Shift::Second,
            Shift::Second => Shift::First,
        }
    }

    /// Returns the shift number as persisted and displayed
    ///
    /// # Returns
    ///
    /// 1 for the day shift, 2 for the night shift
    pub fn number(&self) -> u8 {
        match self {
            Shift::First => 1,
            Shift::Second => 2,
        }
    }

    /// Returns the operator efficiency factor applied to weekly capacity
    ///
    /// Night shift output is discounted more heavily than day shift output
    /// when computing effective weekly capacity.
    ///
    /// # Returns
    ///
    /// 0.825 for Shift 1, 0.605 for Shift 2
    pub fn efficiency(&self) -> f64 {
        match self {
            Shift::First => 0.825,
            Shift::Second => 0.605,
        }
    }
}

impl TryFrom<u8> for Shift {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Shift::First),
            2 => Ok(Shift::Second),
            other => Err(format!("invalid shift number: {}", other)),
        }
    }
}

impl From<Shift> for u8 {
    fn from(shift: Shift) -> Self {
        shift.number()
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Shift {}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_numbers() {
        assert_eq!(Shift::First.number(), 1);
        assert_eq!(Shift::Second.number(), 2);
    }

    #[test]
    fn test_shift_from_number() {
        assert_eq!(Shift::try_from(1u8).unwrap(), Shift::First);
        assert_eq!(Shift::try_from(2u8).unwrap(), Shift::Second);
        assert!(Shift::try_from(3u8).is_err());
    }

    #[test]
    fn test_other() {
        assert_eq!(Shift::First.other(), Shift::Second);
        assert_eq!(Shift::Second.other(), Shift::First);
    }

    #[test]
    fn test_efficiency_factors() {
        assert!((Shift::First.efficiency() - 0.825).abs() < f64::EPSILON);
        assert!((Shift::Second.efficiency() - 0.605).abs() < f64::EPSILON);
    }
}
