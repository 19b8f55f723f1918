use crate::{Selection, Seed, UnlockId, UnlockPackRecord};

/// Category constant the host uses for unlock draws.
pub const UNLOCKS_CATEGORY_SEED: i32 = 848_292;

/// Category constant the host uses for shop draws.
pub const SHOP_CATEGORY_SEED: i32 = 823_828;

/// Multiplier combining a category constant with an instance index.
pub const CATEGORY_SEED_STRIDE: i32 = 1_231_231;

/// Nested subcontext index reserved for unlock sampling.
pub const UNLOCK_SUBCONTEXT_INDEX: u32 = 1;

/// Identifies a deterministic substream of a run.
///
/// Two draws made through equal keys observe identical random sequences.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubcontextKey {
    seed: Seed,
    category: i32,
    instance: i32,
}

impl SubcontextKey {
    /// Creates a key from its components.
    #[must_use]
    pub fn new(seed: Seed, category: i32, instance: i32) -> Self {
        Self {
            seed,
            category,
            instance,
        }
    }

    /// Key used to sample the unlock offer of `day`.
    #[must_use]
    pub fn unlocks(seed: &Seed, day: i32) -> Self {
        Self::new(seed.clone(), UNLOCKS_CATEGORY_SEED, day)
    }

    /// Key used to sample the shop stock of `day`.
    #[must_use]
    pub fn shop(seed: &Seed, day: i32) -> Self {
        Self::new(seed.clone(), SHOP_CATEGORY_SEED, day)
    }

    /// Seed of the run.
    #[must_use]
    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    /// Category constant of the substream.
    #[must_use]
    pub const fn category(&self) -> i32 {
        self.category
    }

    /// Instance index within the category, usually a day.
    #[must_use]
    pub const fn instance(&self) -> i32 {
        self.instance
    }

    /// Context value handed to the host primitive, computed with host integer overflow.
    #[must_use]
    pub const fn context_value(&self) -> i32 {
        self.category
            .wrapping_mul(CATEGORY_SEED_STRIDE)
            .wrapping_add(self.instance)
    }
}

/// Parameters of a single unlock draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UnlockRequest {
    day: i32,
    tier: u32,
}

impl UnlockRequest {
    /// Creates a request for `day` at franchise `tier`.
    #[must_use]
    pub const fn new(day: i32, tier: u32) -> Self {
        Self { day, tier }
    }

    /// Day the offer would be presented.
    #[must_use]
    pub const fn day(&self) -> i32 {
        self.day
    }

    /// Franchise tier of the run.
    #[must_use]
    pub const fn tier(&self) -> u32 {
        self.tier
    }
}

/// Up to two unlock candidates presented together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct UnlockOptions {
    first: Option<UnlockId>,
    second: Option<UnlockId>,
}

impl UnlockOptions {
    /// Options describing a day without an offer.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            first: None,
            second: None,
        }
    }

    /// Creates options from both slots.
    #[must_use]
    pub const fn new(first: Option<UnlockId>, second: Option<UnlockId>) -> Self {
        Self { first, second }
    }

    /// Candidate shown in the first slot.
    #[must_use]
    pub const fn first(&self) -> Option<UnlockId> {
        self.first
    }

    /// Candidate shown in the second slot.
    #[must_use]
    pub const fn second(&self) -> Option<UnlockId> {
        self.second
    }

    /// Reports whether neither slot holds a candidate.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first.is_none() && self.second.is_none()
    }

    /// Both slots in display order.
    #[must_use]
    pub const fn slots(&self) -> [Option<UnlockId>; 2] {
        [self.first, self.second]
    }
}

/// Host primitive that opens deterministic substreams.
pub trait StreamSource {
    /// Handle to an open subcontext.
    type Stream<'a>: SeededStream
    where
        Self: 'a;

    /// Acquires the substream identified by `key`; dropping the handle releases it.
    fn open_subcontext(&self, key: &SubcontextKey) -> Self::Stream<'_>;
}

/// Open subcontext that can hand out nested substreams.
pub trait SeededStream {
    /// Handle to an open nested subcontext.
    type Nested<'a>: NestedStream
    where
        Self: 'a;

    /// Acquires nested subcontext `index` while the parent stays held.
    fn open_nested(&mut self, index: u32) -> Self::Nested<'_>;
}

/// Nested subcontext able to replay the host's unlock draw.
pub trait NestedStream {
    /// Draws the unlock candidates `pack` offers for `selection` and `request`.
    fn draw_unlock_options(
        &mut self,
        pack: &UnlockPackRecord,
        selection: &Selection,
        request: UnlockRequest,
    ) -> UnlockOptions;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_value_matches_host_formula() {
        let seed = Seed::parse("abc").expect("seed");
        let key = SubcontextKey::unlocks(&seed, 3);
        let expected = (i64::from(UNLOCKS_CATEGORY_SEED) * i64::from(CATEGORY_SEED_STRIDE) + 3) as i32;
        assert_eq!(key.context_value(), expected);
    }

    #[test]
    fn empty_options_report_empty() {
        assert!(UnlockOptions::none().is_empty());
        assert!(!UnlockOptions::new(None, Some(UnlockId::new(4))).is_empty());
    }
}
