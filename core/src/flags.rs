use std::{fmt, marker::PhantomData};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::CoreError;

/// Closed enumeration whose variants can be combined into a [`FlagSet`].
pub trait Flag: Copy + Eq + fmt::Debug + 'static {
    /// Name of the flag family used in diagnostics.
    const KIND: &'static str;
    /// Every variant of the enumeration.
    const ALL: &'static [Self];

    /// Bit representing the variant in the host's flag encoding.
    fn bit(self) -> u32;
}

/// Set of enumeration values with union and subset operations.
///
/// Only bits that belong to a known variant can ever be stored, so invalid
/// combinations are unrepresentable.
pub struct FlagSet<T> {
    mask: u32,
    marker: PhantomData<T>,
}

impl<T: Flag> FlagSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            mask: 0,
            marker: PhantomData,
        }
    }

    /// Decodes a host flag value, rejecting bits no variant represents.
    pub fn from_host_bits(bits: u32) -> Result<Self, CoreError> {
        let known = T::ALL.iter().fold(0, |mask, flag| mask | flag.bit());
        if bits & !known != 0 {
            return Err(CoreError::UnknownFlag {
                kind: T::KIND,
                bits,
            });
        }
        Ok(Self {
            mask: bits,
            marker: PhantomData,
        })
    }

    /// Decodes and unions a list of host flag values.
    pub fn from_host_values(values: &[u32]) -> Result<Self, CoreError> {
        values.iter().try_fold(Self::empty(), |set, bits| {
            Ok(set.union(Self::from_host_bits(*bits)?))
        })
    }

    /// Adds `flag` to the set.
    pub fn insert(&mut self, flag: T) {
        self.mask |= flag.bit();
    }

    /// Reports whether `flag` is a member of the set.
    #[must_use]
    pub fn contains(&self, flag: T) -> bool {
        self.mask & flag.bit() != 0
    }

    /// Returns the union of both sets.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            mask: self.mask | other.mask,
            marker: PhantomData,
        }
    }

    /// Reports whether both sets share at least one member.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.mask & other.mask != 0
    }

    /// Reports whether every member of `self` is also a member of `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.mask & !other.mask == 0
    }

    /// Reports whether the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Iterates members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        T::ALL.iter().copied().filter(|flag| self.contains(*flag))
    }
}

impl<T: Flag> FromIterator<T> for FlagSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::empty();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

impl<T> Clone for FlagSet<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FlagSet<T> {}

impl<T> PartialEq for FlagSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask
    }
}

impl<T> Eq for FlagSet<T> {}

impl<T: Flag> Default for FlagSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Flag> fmt::Debug for FlagSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Flag + Serialize> Serialize for FlagSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Flag + Deserialize<'de>> Deserialize<'de> for FlagSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flags = Vec::<T>::deserialize(deserializer)?;
        Ok(flags.into_iter().collect())
    }
}

/// Restaurant themes that gate decoration stock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationType {
    /// Exclusive theme.
    Exclusive,
    /// Affordable theme.
    Affordable,
    /// Charming theme.
    Charming,
    /// Formal theme.
    Formal,
}

impl Flag for DecorationType {
    const KIND: &'static str = "decoration";
    const ALL: &'static [Self] = &[
        Self::Exclusive,
        Self::Affordable,
        Self::Charming,
        Self::Formal,
    ];

    fn bit(self) -> u32 {
        match self {
            Self::Exclusive => 1,
            Self::Affordable => 2,
            Self::Charming => 4,
            Self::Formal => 8,
        }
    }
}

/// Set of restaurant themes.
pub type DecorationSet = FlagSet<DecorationType>;

/// Shopping categories used to pick which blueprints a shop slot may offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShoppingTag {
    /// Staple equipment every kitchen needs.
    Basic,
    /// Technology upgrades.
    Technology,
    /// Cooking equipment.
    Cooking,
    /// Miscellaneous equipment.
    Misc,
    /// Automation equipment.
    Automation,
    /// Plumbing equipment.
    Plumbing,
    /// Decorations.
    Decoration,
    /// Special event items.
    SpecialEvent,
}

impl Flag for ShoppingTag {
    const KIND: &'static str = "shopping tag";
    const ALL: &'static [Self] = &[
        Self::Basic,
        Self::Technology,
        Self::Cooking,
        Self::Misc,
        Self::Automation,
        Self::Plumbing,
        Self::Decoration,
        Self::SpecialEvent,
    ];

    fn bit(self) -> u32 {
        match self {
            Self::Basic => 1 << 0,
            Self::Technology => 1 << 1,
            Self::Cooking => 1 << 2,
            Self::Misc => 1 << 3,
            Self::Automation => 1 << 4,
            Self::Plumbing => 1 << 5,
            Self::Decoration => 1 << 6,
            Self::SpecialEvent => 1 << 7,
        }
    }
}

/// Set of shopping tags.
pub type ShoppingTags = FlagSet<ShoppingTag>;

impl FlagSet<ShoppingTag> {
    /// Tags offered by a regular, non-staple blueprint slot.
    #[must_use]
    pub fn default_shop() -> Self {
        [
            ShoppingTag::Technology,
            ShoppingTag::Cooking,
            ShoppingTag::Misc,
            ShoppingTag::Automation,
            ShoppingTag::Plumbing,
        ]
        .into_iter()
        .collect()
    }
}
