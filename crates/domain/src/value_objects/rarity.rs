use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Ordered rarity tier, 1 (common) through 5 (legendary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rarity(u8);

impl Rarity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(tier: u8) -> Result<Self, DomainError> {
        if (Self::MIN..=Self::MAX).contains(&tier) {
            Ok(Self(tier))
        } else {
            Err(DomainError::validation(format!(
                "Rarity tier must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                tier
            )))
        }
    }

    pub const fn common() -> Self {
        Self(Self::MIN)
    }

    pub fn tier(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "common",
            2 => "uncommon",
            3 => "rare",
            4 => "epic",
            _ => "legendary",
        }
    }
}

impl Default for Rarity {
    fn default() -> Self {
        Self::common()
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<u8> for Rarity {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rarity> for u8 {
    fn from(value: Rarity) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_through_five() {
        for tier in 1..=5 {
            assert_eq!(Rarity::new(tier).unwrap().tier(), tier);
        }
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Rarity::new(0).is_err());
        assert!(Rarity::new(6).is_err());
        assert!(serde_json::from_str::<Rarity>("9").is_err());
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(Rarity::new(5).unwrap() > Rarity::new(2).unwrap());
        assert_eq!(Rarity::new(5).unwrap().to_string(), "legendary");
    }
}
