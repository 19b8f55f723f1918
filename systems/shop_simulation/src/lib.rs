#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Composition of a day's shop requests and the stock each request may draw from.
//!
//! [`ShopSimulation::create`] lays out the blueprint slots the host opens at
//! the end of a day. [`ShopState::simulate`] runs the filter pipeline over a
//! fresh copy of the candidate pool and groups the survivors by the request
//! whose shopping tags they match.

use seed_scanner_core::{
    ApplianceId, ContentCatalog, DecorationSet, DifficultySettings, ProcessId, Seed, ShoppingTag,
    ShoppingTags, SubcontextKey,
};
use seed_scanner_system_shop_filters::{ShopCandidate, ShopFilterPipeline, ShopInputs};

/// Decoration blueprint slots opened on a decoration day.
pub const DECORATION_BLUEPRINT_SLOTS: usize = 8;

/// Special event blueprint slots opened on a decoration day.
pub const SPECIAL_EVENT_BLUEPRINT_SLOTS: usize = 2;

/// Wallpaper and flooring shops opened on a decoration day.
pub const DECOR_SHOP_SLOTS: usize = 6;

/// Single shop slot requested for a day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShopRequest {
    /// Blueprint slot stocked from appliances matching `tags`.
    Blueprint {
        /// Shopping tags the slot accepts.
        tags: ShoppingTags,
    },
    /// Wallpaper or flooring shop, which never stocks appliances.
    Decor,
}

impl ShopRequest {
    /// Shopping tags the request accepts; empty for decor shops.
    #[must_use]
    pub fn tags(&self) -> ShoppingTags {
        match self {
            Self::Blueprint { tags } => *tags,
            Self::Decor => ShoppingTags::empty(),
        }
    }

    /// Reports whether the request is a decor shop.
    #[must_use]
    pub const fn is_decor(&self) -> bool {
        matches!(self, Self::Decor)
    }
}

/// Shop slots requested at the end of a day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopSimulation {
    day: i32,
    requests: Vec<ShopRequest>,
}

impl ShopSimulation {
    /// Lays out the shop requests of `day`.
    ///
    /// Decoration days open decoration, special event and decor shops.
    /// Other days open at least one blueprint slot; staple slots come first
    /// and accept basic equipment, the rest accept the default tags.
    #[must_use]
    pub fn create(day: i32, difficulty: &DifficultySettings) -> Self {
        let mut requests = Vec::new();

        if difficulty.is_decoration_day(day) {
            requests.extend(
                std::iter::repeat(blueprint(ShoppingTag::Decoration))
                    .take(DECORATION_BLUEPRINT_SLOTS),
            );
            requests.extend(
                std::iter::repeat(blueprint(ShoppingTag::SpecialEvent))
                    .take(SPECIAL_EVENT_BLUEPRINT_SLOTS),
            );
            requests.extend(std::iter::repeat(ShopRequest::Decor).take(DECOR_SHOP_SLOTS));
            return Self { day, requests };
        }

        let total = difficulty.total_shop_count(day).max(1);
        let staples = difficulty.staple_count(day).min(total);
        let regular = total - staples;

        requests.extend(std::iter::repeat(blueprint(ShoppingTag::Basic)).take(staples as usize));
        requests.extend(
            std::iter::repeat(ShopRequest::Blueprint {
                tags: ShoppingTags::default_shop(),
            })
            .take(regular as usize),
        );
        Self { day, requests }
    }

    /// Day the simulation describes.
    #[must_use]
    pub const fn day(&self) -> i32 {
        self.day
    }

    /// Requests in the order the host opens them.
    #[must_use]
    pub fn requests(&self) -> &[ShopRequest] {
        &self.requests
    }

    /// Number of blueprint slots.
    #[must_use]
    pub fn blueprint_count(&self) -> usize {
        self.requests.iter().filter(|request| !request.is_decor()).count()
    }

    /// Number of decor shops.
    #[must_use]
    pub fn decor_count(&self) -> usize {
        self.requests.iter().filter(|request| request.is_decor()).count()
    }
}

fn blueprint(tag: ShoppingTag) -> ShopRequest {
    ShopRequest::Blueprint {
        tags: [tag].into_iter().collect(),
    }
}

/// Run state the shop is rolled for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShopState {
    /// Day whose end-of-day shop is rolled.
    pub day: i32,
    /// Number of rerolls already spent on the day.
    pub reroll_index: u32,
    /// Whether letters are delivered inside the restaurant.
    pub letters_inside: bool,
    /// Appliances currently owned.
    pub owned_appliances: Vec<ApplianceId>,
    /// Processes the current menu requires.
    pub required_processes: Vec<ProcessId>,
    /// Union of the active restaurant themes.
    pub active_themes: DecorationSet,
}

impl ShopState {
    /// Creates a state for `day` with nothing owned.
    #[must_use]
    pub fn new(day: i32) -> Self {
        Self {
            day,
            ..Self::default()
        }
    }

    /// Subcontext the host draws this shop from.
    #[must_use]
    pub fn subcontext_key(&self, seed: &Seed) -> SubcontextKey {
        SubcontextKey::shop(seed, self.day)
    }

    /// Filters a copy of `template` and groups survivors by request.
    #[must_use]
    pub fn simulate(
        &self,
        difficulty: &DifficultySettings,
        pipeline: &ShopFilterPipeline,
        template: &[ShopCandidate],
        catalog: &dyn ContentCatalog,
    ) -> ShopOutcome {
        let simulation = ShopSimulation::create(self.day, difficulty);
        if template.is_empty() {
            tracing::warn!(day = self.day, "no shop candidates to filter");
        }

        let mut candidates = template.to_vec();
        let inputs = ShopInputs {
            owned_appliances: &self.owned_appliances,
            required_processes: &self.required_processes,
            active_themes: self.active_themes,
        };
        pipeline.apply(&mut candidates, &inputs, catalog);

        tracing::debug!(
            day = self.day,
            reroll = self.reroll_index,
            requests = simulation.requests().len(),
            surviving = candidates.iter().filter(|candidate| !candidate.is_removed()).count(),
            "simulated shop"
        );
        ShopOutcome {
            simulation,
            candidates,
        }
    }
}

/// Filtered candidate pool together with the day's requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopOutcome {
    simulation: ShopSimulation,
    candidates: Vec<ShopCandidate>,
}

impl ShopOutcome {
    /// Requests of the simulated day.
    #[must_use]
    pub fn simulation(&self) -> &ShopSimulation {
        &self.simulation
    }

    /// Every candidate after filtering, removed ones included.
    #[must_use]
    pub fn candidates(&self) -> &[ShopCandidate] {
        &self.candidates
    }

    /// Candidates no step removed.
    pub fn surviving(&self) -> impl Iterator<Item = &ShopCandidate> + '_ {
        self.candidates.iter().filter(|candidate| !candidate.is_removed())
    }

    /// Surviving candidates whose tags intersect the request's tags.
    #[must_use]
    pub fn eligible_for(&self, request: &ShopRequest) -> Vec<&ShopCandidate> {
        let tags = request.tags();
        self.surviving()
            .filter(|candidate| candidate.shopping_tags().intersects(&tags))
            .collect()
    }

    /// Eligible candidates for every request, in request order.
    #[must_use]
    pub fn per_request(&self) -> Vec<(ShopRequest, Vec<&ShopCandidate>)> {
        self.simulation
            .requests()
            .iter()
            .map(|request| (*request, self.eligible_for(request)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_day_opens_staples_first() {
        let simulation = ShopSimulation::create(1, &DifficultySettings::default());
        let requests = simulation.requests();
        assert_eq!(requests.len(), 4);
        assert!(requests[0].tags().contains(ShoppingTag::Basic));
        assert_eq!(requests[1].tags(), ShoppingTags::default_shop());
        assert_eq!(simulation.decor_count(), 0);
    }

    #[test]
    fn decoration_day_opens_fixed_layout() {
        let simulation = ShopSimulation::create(5, &DifficultySettings::default());
        assert_eq!(simulation.requests().len(), 16);
        assert_eq!(simulation.blueprint_count(), 10);
        assert_eq!(simulation.decor_count(), 6);
        assert!(simulation.requests()[8].tags().contains(ShoppingTag::SpecialEvent));
    }

    #[test]
    fn at_least_one_slot_is_opened() {
        let difficulty = DifficultySettings {
            base_shop_count: 0,
            staple_count: 3,
            ..DifficultySettings::default()
        };
        let simulation = ShopSimulation::create(0, &difficulty);
        assert_eq!(simulation.requests().len(), 1);
        assert!(simulation.requests()[0].tags().contains(ShoppingTag::Basic));
    }
}
