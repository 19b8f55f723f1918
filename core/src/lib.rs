#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the seed scanner workspace.
//!
//! This crate defines the vocabulary that connects the read-only content
//! catalog, the host's seeded random primitive, and the pure systems that
//! replay unlock offers and shop filtering. Systems receive explicit context
//! objects (a [`ContentCatalog`] and a [`StreamSource`]) rather than reaching
//! for process-wide state, so every prediction is reproducible from a
//! [`Seed`] and the starting [`Selection`] alone.

mod difficulty;
mod flags;
mod records;
mod stream;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use difficulty::DifficultySettings;
pub use flags::{DecorationSet, DecorationType, Flag, FlagSet, ShoppingTag, ShoppingTags};
pub use records::{
    ApplianceRecord, ContentCatalog, Course, CustomerChange, DishInfo, DishType, Factor,
    SettingRecord, ShopRequirement, UnlockEffect, UnlockPackEntry, UnlockPackRecord, UnlockRecord,
};
pub use stream::{
    NestedStream, SeededStream, StreamSource, SubcontextKey, UnlockOptions, UnlockRequest,
    CATEGORY_SEED_STRIDE, SHOP_CATEGORY_SEED, UNLOCKS_CATEGORY_SEED, UNLOCK_SUBCONTEXT_INDEX,
};

/// Characters accepted inside a seed string.
pub const SEED_ALLOWED_CHARS: &str = "abcdefghijklmnopqrstuvwxyz123456789";

/// Maximum number of characters a seed may contain.
pub const SEED_MAX_LENGTH: usize = 8;

/// Day assigned to the synthetic root describing the starting state.
pub const START_DAY: i32 = -1;

/// Number of days scanned after a node when looking for the next unlock offer.
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 10;

/// Last regular day of a run; later days are reported as overtime.
pub const OVERTIME_START_DAY: i32 = 15;

/// Day limit used by exports when none is configured.
pub const DEFAULT_EXPORT_DAY: i32 = 15;

/// Validated seed string used as the root entropy source of a run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Seed(String);

impl Seed {
    /// Parses a seed, lowercasing the input before validating it.
    pub fn parse(input: &str) -> Result<Self, SeedError> {
        let lowered = input.to_lowercase();
        if lowered.is_empty() {
            return Err(SeedError::Empty);
        }

        let length = lowered.chars().count();
        if length > SEED_MAX_LENGTH {
            return Err(SeedError::TooLong { length });
        }

        if let Some(character) = lowered.chars().find(|c| !SEED_ALLOWED_CHARS.contains(*c)) {
            return Err(SeedError::InvalidCharacter { character });
        }

        Ok(Self(lowered))
    }

    /// Returns the validated seed text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Seed {
    type Err = SeedError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Seed {
    type Error = SeedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Seed> for String {
    fn from(seed: Seed) -> Self {
        seed.0
    }
}

/// Reasons a seed string may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SeedError {
    /// The seed contained no characters.
    #[error("seed must not be empty")]
    Empty,
    /// The seed exceeded [`SEED_MAX_LENGTH`] characters.
    #[error("seed has {length} characters, at most {SEED_MAX_LENGTH} are allowed")]
    TooLong {
        /// Number of characters supplied.
        length: usize,
    },
    /// The seed contained a character outside [`SEED_ALLOWED_CHARS`].
    #[error("seed contains unsupported character '{character}'")]
    InvalidCharacter {
        /// First offending character.
        character: char,
    },
}

/// Errors raised while converting host values into core types.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A host flag value carried bits that no known variant represents.
    #[error("{kind} flags {bits:#x} contain unknown bits")]
    UnknownFlag {
        /// Name of the flag family being decoded.
        kind: &'static str,
        /// Raw bits supplied by the host.
        bits: u32,
    },
}

macro_rules! host_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier with the provided host value.
            #[must_use]
            pub const fn new(value: i32) -> Self {
                Self(value)
            }

            /// Retrieves the host value of the identifier.
            #[must_use]
            pub const fn get(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

host_id!(
    /// Identifier of an unlock (card or dish) in the content catalog.
    UnlockId
);
host_id!(
    /// Identifier of an appliance in the content catalog.
    ApplianceId
);
host_id!(
    /// Identifier of a cooking process in the content catalog.
    ProcessId
);
host_id!(
    /// Identifier of a restaurant setting in the content catalog.
    SettingId
);
host_id!(
    /// Identifier of an unlock pack in the content catalog.
    UnlockPackId
);

/// Accumulated unlock identifiers selected along a path of the choice tree.
///
/// Identifiers keep the order in which they were selected so exported rows
/// line up with their day columns. A selection never shrinks and never holds
/// the same identifier twice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ordered: Vec<UnlockId>,
}

impl Selection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection from identifiers, keeping the first occurrence of each.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = UnlockId>) -> Self {
        let mut selection = Self::new();
        for id in ids {
            if !selection.contains(id) {
                selection.ordered.push(id);
            }
        }
        selection
    }

    /// Returns a new selection extended with `id`.
    #[must_use]
    pub fn with(&self, id: UnlockId) -> Self {
        let mut extended = self.clone();
        if !extended.contains(id) {
            extended.ordered.push(id);
        }
        extended
    }

    /// Reports whether `id` has been selected.
    #[must_use]
    pub fn contains(&self, id: UnlockId) -> bool {
        self.ordered.contains(&id)
    }

    /// Number of selected identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Reports whether nothing has been selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Iterates identifiers in selection order.
    pub fn iter(&self) -> impl Iterator<Item = UnlockId> + '_ {
        self.ordered.iter().copied()
    }

    /// Returns the identifiers in ascending order, independent of selection order.
    #[must_use]
    pub fn sorted(&self) -> Vec<UnlockId> {
        let mut sorted = self.ordered.clone();
        sorted.sort_unstable();
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::{Seed, SeedError, Selection, UnlockId};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn seed_is_lowercased() {
        let seed = Seed::parse("AbC12345").expect("valid seed");
        assert_eq!(seed.as_str(), "abc12345");
    }

    #[test]
    fn seed_rejects_empty_input() {
        assert_eq!(Seed::parse(""), Err(SeedError::Empty));
    }

    #[test]
    fn seed_rejects_long_input() {
        assert_eq!(
            Seed::parse("abcdefghi"),
            Err(SeedError::TooLong { length: 9 })
        );
    }

    #[test]
    fn seed_rejects_zero_and_punctuation() {
        assert_eq!(
            Seed::parse("ab0"),
            Err(SeedError::InvalidCharacter { character: '0' })
        );
        assert_eq!(
            Seed::parse("a,b"),
            Err(SeedError::InvalidCharacter { character: ',' })
        );
    }

    #[test]
    fn seed_round_trips_through_bincode() {
        assert_round_trip(&Seed::parse("kitchen1").expect("valid seed"));
    }

    #[test]
    fn selection_keeps_order_and_ignores_duplicates() {
        let selection = Selection::from_ids([UnlockId::new(9), UnlockId::new(3), UnlockId::new(9)]);
        let extended = selection.with(UnlockId::new(1)).with(UnlockId::new(3));

        assert_eq!(selection.len(), 2);
        assert_eq!(
            extended.iter().collect::<Vec<_>>(),
            vec![UnlockId::new(9), UnlockId::new(3), UnlockId::new(1)]
        );
        assert_eq!(
            extended.sorted(),
            vec![UnlockId::new(1), UnlockId::new(3), UnlockId::new(9)]
        );
    }
}
