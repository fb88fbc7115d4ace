//! Enum values stored in the history.
//!
//! An enum sample is a set of ordinals; aggregated samples hold the union of
//! every ordinal seen in their slot.

use serde::{Deserialize, Serialize};

use crate::error::HistoryError;

/// Ordinal of an enum option. Valid ordinals are `0..32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct HistoryEnumOrdinal(u8);

impl HistoryEnumOrdinal {
    /// Highest supported ordinal.
    pub const MAX: u8 = 31;

    /// Create an ordinal, rejecting values above [`Self::MAX`].
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    /// The raw ordinal.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HistoryEnumOrdinal {
    type Error = HistoryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(HistoryError::InvalidEnumOrdinal(value))
    }
}

/// Bit set of enum ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HistoryEnumSet(u32);

impl HistoryEnumSet {
    /// No ordinal set ("no value").
    pub const EMPTY: Self = Self(0);

    /// A set containing a single ordinal.
    pub fn single(ordinal: HistoryEnumOrdinal) -> Self {
        Self(1 << ordinal.0)
    }

    /// Check if no ordinal is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check whether the ordinal is contained.
    pub fn contains(self, ordinal: HistoryEnumOrdinal) -> bool {
        self.0 & (1 << ordinal.0) != 0
    }

    /// Union of both sets.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// The lowest ordinal in the set, which is the most important status.
    pub fn most_important(self) -> Option<HistoryEnumOrdinal> {
        if self.0 == 0 {
            return None;
        }
        Some(HistoryEnumOrdinal(self.0.trailing_zeros() as u8))
    }

    /// Iterate the contained ordinals in ascending order.
    pub fn ordinals(self) -> impl Iterator<Item = HistoryEnumOrdinal> {
        (0..=HistoryEnumOrdinal::MAX)
            .map(HistoryEnumOrdinal)
            .filter(move |ordinal| self.contains(*ordinal))
    }
}

/// How an aggregated enum sample is visualized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiscreteEntryAggregationMode {
    /// Show the ordinal that was present most of the time.
    #[default]
    MostOfTheTimeLabel,
    /// Show the most important status (lowest ordinal).
    ///
    /// This may differ from the most-of-the-time ordinal.
    MostImportantStatus,
}

impl DiscreteEntryAggregationMode {
    /// Pick the ordinal to visualize for an aggregated sample.
    pub fn resolve(
        self,
        set: HistoryEnumSet,
        most_of_the_time: Option<HistoryEnumOrdinal>,
    ) -> Option<HistoryEnumOrdinal> {
        match self {
            Self::MostOfTheTimeLabel => most_of_the_time.or_else(|| set.most_important()),
            Self::MostImportantStatus => set.most_important(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordinal(value: u8) -> HistoryEnumOrdinal {
        HistoryEnumOrdinal::new(value).unwrap()
    }

    #[test]
    fn ordinal_rejects_out_of_range() {
        assert!(HistoryEnumOrdinal::new(31).is_some());
        assert!(HistoryEnumOrdinal::new(32).is_none());
    }

    #[test]
    fn deserialized_ordinals_are_checked() {
        let valid: HistoryEnumOrdinal = serde_json::from_str("31").unwrap();
        assert_eq!(valid, ordinal(31));
        assert!(serde_json::from_str::<HistoryEnumOrdinal>("32").is_err());
        assert_eq!(HistoryEnumOrdinal::try_from(40), Err(HistoryError::InvalidEnumOrdinal(40)));
    }

    #[test]
    fn union_and_iteration() {
        let set = HistoryEnumSet::single(ordinal(3)).union(HistoryEnumSet::single(ordinal(1)));
        let ordinals: Vec<u8> = set.ordinals().map(HistoryEnumOrdinal::value).collect();
        assert_eq!(ordinals, vec![1, 3]);
        assert_eq!(set.most_important(), Some(ordinal(1)));
        assert!(HistoryEnumSet::EMPTY.most_important().is_none());
    }

    #[test]
    fn aggregation_mode_resolves() {
        let set = HistoryEnumSet::single(ordinal(0)).union(HistoryEnumSet::single(ordinal(4)));
        assert_eq!(
            DiscreteEntryAggregationMode::MostOfTheTimeLabel.resolve(set, Some(ordinal(4))),
            Some(ordinal(4))
        );
        assert_eq!(
            DiscreteEntryAggregationMode::MostImportantStatus.resolve(set, Some(ordinal(4))),
            Some(ordinal(0))
        );
        assert_eq!(
            DiscreteEntryAggregationMode::MostOfTheTimeLabel.resolve(set, None),
            Some(ordinal(0))
        );
    }
}
