use std::ops::Mul;

use serde::{Deserialize, Serialize};

use crate::{
    ApplianceId, DecorationSet, ProcessId, Selection, SettingId, ShoppingTags, UnlockId,
    UnlockPackId, UnlockRequest,
};

/// Multiplicative scaling factor applied to customer spawn rates.
///
/// The identity factor is `1.0`; factors combine by multiplication.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Factor(f32);

impl Factor {
    /// Factor that leaves a value unchanged.
    pub const IDENTITY: Self = Self(1.0);

    /// Creates a factor from its multiplier.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Multiplier represented by the factor.
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }

    /// Applies the factor once for each of `days`.
    #[must_use]
    pub fn repeat(self, days: u32) -> Self {
        let exponent = i32::try_from(days).unwrap_or(i32::MAX);
        Self(self.0.powi(exponent))
    }
}

impl Default for Factor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Factor {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

/// How an unlock changes the customer-count exponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerChange {
    /// Adds the provided number of points to the exponent.
    Points(i32),
    /// Franchise tier bonuses, which never contribute to the exponent.
    FranchiseTier,
}

impl CustomerChange {
    /// Points this change contributes to the customer exponent.
    #[must_use]
    pub const fn exponent_points(self) -> i32 {
        match self {
            Self::Points(points) => points,
            Self::FranchiseTier => 0,
        }
    }
}

impl Default for CustomerChange {
    fn default() -> Self {
        Self::Points(0)
    }
}

/// Typed effect attached to an unlock card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnlockEffect {
    /// Adjusts restaurant parameters.
    Parameter {
        /// Additive change to the customers-per-hour rate.
        #[serde(default)]
        customers_per_hour: f32,
    },
    /// Scales customer spawning.
    CustomerSpawn {
        /// Factor applied once.
        #[serde(default)]
        base: Factor,
        /// Factor applied once per elapsed day.
        #[serde(default)]
        per_day: Factor,
    },
    /// Any effect that does not influence customer flow.
    Other,
}

/// Fine-grained dish classification used by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DishType {
    /// Base dish a restaurant starts with.
    Base,
    /// Main course.
    Main,
    /// Starter.
    Starter,
    /// Side dish.
    Side,
    /// Dessert.
    Dessert,
    /// Extra topping or variant.
    Extra,
}

impl DishType {
    /// Coarse course the dish counts towards, if any.
    #[must_use]
    pub const fn course(self) -> Option<Course> {
        match self {
            Self::Starter => Some(Course::Starter),
            Self::Main | Self::Base => Some(Course::Main),
            Self::Dessert => Some(Course::Dessert),
            Self::Side | Self::Extra => None,
        }
    }
}

/// Coarse courses counted when deriving the course divisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Course {
    /// Starter course.
    Starter,
    /// Main course (mains and base dishes).
    Main,
    /// Dessert course.
    Dessert,
}

/// Dish-specific data attached to an unlock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishInfo {
    /// Classification of the dish.
    pub dish_type: DishType,
    /// Whether the dish can be chosen as a starting dish.
    #[serde(default)]
    pub unlockable: bool,
}

/// Unlock definition exposed by the content catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnlockRecord {
    /// Identifier of the unlock.
    pub id: UnlockId,
    /// Display name, possibly empty.
    #[serde(default)]
    pub name: String,
    /// Contribution to the customer-count exponent.
    #[serde(default)]
    pub customer_change: CustomerChange,
    /// Ordered card effects.
    #[serde(default)]
    pub effects: Vec<UnlockEffect>,
    /// Dish data when the unlock is a dish.
    #[serde(default)]
    pub dish: Option<DishInfo>,
}

impl UnlockRecord {
    /// Name to show for the unlock, falling back to its identifier.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }

    /// Reports whether the unlock can start a run.
    #[must_use]
    pub fn is_starting_dish(&self) -> bool {
        self.dish
            .map_or(false, |dish| dish.dish_type == DishType::Base && dish.unlockable)
    }
}

/// Extra capability an appliance requires before it can appear in the shop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopRequirement {
    /// No extra requirement.
    #[default]
    None,
    /// Requires an owned appliance that provides refreshable items.
    RefreshableProvider,
}

/// Appliance definition exposed by the content catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplianceRecord {
    /// Identifier of the appliance.
    pub id: ApplianceId,
    /// Display name, possibly empty.
    pub name: String,
    /// Whether the appliance can be bought as a blueprint.
    pub purchasable: bool,
    /// Whether the appliance can be bought as an upgrade.
    pub purchasable_as_upgrade: bool,
    /// Appliances of which at least one must be owned before this one is offered.
    pub requires_for_shop: Vec<ApplianceId>,
    /// Processes of which at least one must be required before this one is offered.
    pub requires_process_for_shop: Vec<ProcessId>,
    /// Only offered once a copy is already owned.
    pub sell_only_as_duplicate: bool,
    /// Only offered while no copy is owned.
    pub sell_only_as_unique: bool,
    /// Whether the appliance provides items that can be refreshed.
    pub refreshable_provider: bool,
    /// Whether the appliance becomes a staple while no copy is owned.
    pub staple_when_missing: bool,
    /// Shopping tags describing the blueprint.
    pub shopping_tags: ShoppingTags,
    /// Themes that must all be active for the appliance to be offered.
    pub decoration_required: DecorationSet,
    /// Extra capability requirement.
    pub shop_requirement: ShopRequirement,
}

/// Restaurant setting exposed by the content catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRecord {
    /// Identifier of the setting.
    pub id: SettingId,
    /// Display name, possibly empty.
    #[serde(default)]
    pub name: String,
    /// Unlock pack used by runs in this setting.
    #[serde(default)]
    pub unlock_pack: Option<UnlockPackId>,
    /// Unlock granted at the start of every run in this setting.
    #[serde(default)]
    pub starting_unlock: Option<UnlockId>,
}

impl SettingRecord {
    /// Name to show for the setting, falling back to its identifier.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// Single unlock offered by an unlock pack together with its eligibility rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockPackEntry {
    /// Unlock offered by the entry.
    pub unlock: UnlockId,
    /// First day on which the unlock may be offered.
    #[serde(default)]
    pub min_day: i32,
    /// Lowest franchise tier at which the unlock may be offered.
    #[serde(default)]
    pub min_tier: u32,
    /// Unlocks that must all be selected first.
    #[serde(default)]
    pub requires: Vec<UnlockId>,
    /// Unlocks that prevent this one from being offered once selected.
    #[serde(default)]
    pub blocked_by: Vec<UnlockId>,
}

impl UnlockPackEntry {
    /// Reports whether the entry may be offered for `selection` and `request`.
    #[must_use]
    pub fn is_eligible(&self, selection: &Selection, request: UnlockRequest) -> bool {
        !selection.contains(self.unlock)
            && request.day() >= self.min_day
            && request.tier() >= self.min_tier
            && self.requires.iter().all(|id| selection.contains(*id))
            && !self.blocked_by.iter().any(|id| selection.contains(*id))
    }
}

/// Unlock pack describing which unlocks a run may be offered and when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockPackRecord {
    /// Identifier of the pack.
    pub id: UnlockPackId,
    /// Display name, possibly empty.
    #[serde(default)]
    pub name: String,
    /// Days on which the pack presents an unlock choice.
    #[serde(default)]
    pub offer_days: Vec<i32>,
    /// Offerable unlocks.
    #[serde(default)]
    pub entries: Vec<UnlockPackEntry>,
}

impl UnlockPackRecord {
    /// Reports whether the pack presents a choice on `day`.
    #[must_use]
    pub fn offers_on(&self, day: i32) -> bool {
        self.offer_days.contains(&day)
    }

    /// Unlocks eligible for the request, in ascending identifier order.
    #[must_use]
    pub fn eligible_unlocks(&self, selection: &Selection, request: UnlockRequest) -> Vec<UnlockId> {
        let mut eligible: Vec<UnlockId> = self
            .entries
            .iter()
            .filter(|entry| entry.is_eligible(selection, request))
            .map(|entry| entry.unlock)
            .collect();
        eligible.sort_unstable();
        eligible.dedup();
        eligible
    }
}

/// Read-only lookup of the host's content definitions.
///
/// Bulk accessors return records in ascending identifier order.
pub trait ContentCatalog {
    /// Looks up an unlock.
    fn unlock(&self, id: UnlockId) -> Option<&UnlockRecord>;

    /// Looks up an appliance.
    fn appliance(&self, id: ApplianceId) -> Option<&ApplianceRecord>;

    /// Looks up a restaurant setting.
    fn setting(&self, id: SettingId) -> Option<&SettingRecord>;

    /// Looks up an unlock pack.
    fn unlock_pack(&self, id: UnlockPackId) -> Option<&UnlockPackRecord>;

    /// Pack used when a setting does not name one.
    fn default_unlock_pack(&self) -> Option<&UnlockPackRecord>;

    /// Every unlock in the catalog.
    fn unlocks(&self) -> Vec<&UnlockRecord>;

    /// Every appliance in the catalog.
    fn appliances(&self) -> Vec<&ApplianceRecord>;

    /// Every restaurant setting in the catalog.
    fn settings(&self) -> Vec<&SettingRecord>;

    /// Unlocks whose customer effect is known but not modelled.
    fn customer_count_exceptions(&self) -> &[UnlockId];

    /// Display name of an unlock, or its raw identifier when unknown.
    fn unlock_name(&self, id: UnlockId) -> String {
        self.unlock(id)
            .map_or_else(|| id.to_string(), UnlockRecord::display_name)
    }
}
