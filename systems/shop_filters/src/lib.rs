#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Re-derivation of the host's shop stock filtering.
//!
//! The host builds shop stock by running a list of filter systems over every
//! purchasable appliance. This crate mirrors that list with a closed set of
//! [`FilterKind`]s, each owning a plain transform function, and runs them in
//! the host's order over fresh [`ShopCandidate`]s. Candidates can be removed
//! but never restored, so the surviving pool only shrinks as steps run.

use std::fmt;

use seed_scanner_core::{
    ApplianceId, ApplianceRecord, ContentCatalog, DecorationSet, ProcessId, ShopRequirement,
    ShoppingTag, ShoppingTags,
};

/// Position of a step inside a [`ShopFilterPipeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterStepId(u32);

impl FilterStepId {
    /// Creates an identifier for the step at `position`.
    #[must_use]
    pub const fn new(position: u32) -> Self {
        Self(position)
    }

    /// Position of the step.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FilterStepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {}", self.0)
    }
}

/// Staple classification of a shop candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StapleKind {
    /// Not classified yet.
    #[default]
    Unclassified,
    /// Always stocked basic equipment.
    Fixed,
    /// Staple granted by a card or setting.
    Bonus,
    /// Staple while no copy is owned.
    WhenMissing,
    /// Regular stock.
    NonStaple,
}

/// One appliance the shop may stock, annotated by the filter steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopCandidate {
    appliance: ApplianceId,
    staple: StapleKind,
    removed: bool,
    filtered_by: Option<FilterStepId>,
    decoration_required: DecorationSet,
    shopping_tags: ShoppingTags,
    staple_when_missing: bool,
    requirement: ShopRequirement,
}

impl ShopCandidate {
    /// Creates an unclassified candidate for `record`.
    #[must_use]
    pub fn from_appliance(record: &ApplianceRecord) -> Self {
        Self {
            appliance: record.id,
            staple: StapleKind::Unclassified,
            removed: false,
            filtered_by: None,
            decoration_required: record.decoration_required,
            shopping_tags: record.shopping_tags,
            staple_when_missing: record.staple_when_missing,
            requirement: record.shop_requirement,
        }
    }

    /// Overrides the starting staple classification.
    #[must_use]
    pub fn with_staple(mut self, staple: StapleKind) -> Self {
        self.staple = staple;
        self
    }

    /// Appliance offered by the candidate.
    #[must_use]
    pub const fn appliance(&self) -> ApplianceId {
        self.appliance
    }

    /// Current staple classification.
    #[must_use]
    pub const fn staple(&self) -> StapleKind {
        self.staple
    }

    /// Reports whether a step removed the candidate.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.removed
    }

    /// Step that removed the candidate.
    #[must_use]
    pub const fn filtered_by(&self) -> Option<FilterStepId> {
        self.filtered_by
    }

    /// Themes that must all be active for the candidate to stay.
    #[must_use]
    pub const fn decoration_required(&self) -> DecorationSet {
        self.decoration_required
    }

    /// Shopping tags of the candidate.
    #[must_use]
    pub const fn shopping_tags(&self) -> ShoppingTags {
        self.shopping_tags
    }

    /// Whether the candidate becomes a staple while no copy is owned.
    #[must_use]
    pub const fn staple_when_missing(&self) -> bool {
        self.staple_when_missing
    }

    /// Extra requirement the candidate places on owned appliances.
    #[must_use]
    pub const fn requirement(&self) -> ShopRequirement {
        self.requirement
    }

    fn remove(&mut self, step: FilterStepId) {
        if !self.removed {
            self.removed = true;
            self.filtered_by = Some(step);
        }
    }
}

/// Fresh candidates for every appliance the shop can sell.
#[must_use]
pub fn candidates_from_catalog(catalog: &dyn ContentCatalog) -> Vec<ShopCandidate> {
    catalog
        .appliances()
        .into_iter()
        .filter(|appliance| appliance.purchasable || appliance.purchasable_as_upgrade)
        .map(ShopCandidate::from_appliance)
        .collect()
}

/// Run state a filter step may read.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShopInputs<'a> {
    /// Appliances currently owned.
    pub owned_appliances: &'a [ApplianceId],
    /// Processes the current menu requires.
    pub required_processes: &'a [ProcessId],
    /// Union of the active restaurant themes.
    pub active_themes: DecorationSet,
}

/// Which part of [`ShopInputs`] a step receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterSelector {
    /// No parameter.
    None,
    /// Owned appliances.
    OwnedAppliances,
    /// Required processes.
    RequiredProcesses,
    /// Active themes.
    ActiveThemes,
}

impl ParameterSelector {
    /// Selects the matching parameter from `inputs`.
    #[must_use]
    pub fn select<'a>(self, inputs: &ShopInputs<'a>) -> FilterParameter<'a> {
        match self {
            Self::None => FilterParameter::None,
            Self::OwnedAppliances => FilterParameter::OwnedAppliances(inputs.owned_appliances),
            Self::RequiredProcesses => {
                FilterParameter::RequiredProcesses(inputs.required_processes)
            }
            Self::ActiveThemes => FilterParameter::ActiveThemes(inputs.active_themes),
        }
    }
}

/// Parameter handed to a transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterParameter<'a> {
    /// No parameter.
    None,
    /// Owned appliances.
    OwnedAppliances(&'a [ApplianceId]),
    /// Required processes.
    RequiredProcesses(&'a [ProcessId]),
    /// Active themes.
    ActiveThemes(DecorationSet),
}

/// Everything a transform may observe besides the candidate itself.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    /// Step being run.
    pub step: FilterStepId,
    /// Parameter selected for the step.
    pub parameter: FilterParameter<'a>,
    /// Read-only content catalog.
    pub catalog: &'a dyn ContentCatalog,
}

impl fmt::Debug for FilterContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterContext")
            .field("step", &self.step)
            .field("parameter", &self.parameter)
            .finish_non_exhaustive()
    }
}

/// Transform applied to one candidate by a filter step.
pub type Transform = fn(&mut ShopCandidate, &FilterContext<'_>);

/// Closed set of host filter systems the pipeline can replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Classifies unclassified candidates as fixed or non staples.
    TagStaples,
    /// Promotes missing non-staples to when-missing staples.
    TagStapleWhenMissing,
    /// Removes candidates whose owned-appliance requirements fail.
    RequiredAppliances,
    /// Removes candidates whose process requirements fail.
    RequiredProcess,
    /// Removes candidates needing a refreshable provider that is not owned.
    Requirements,
    /// Removes candidates whose themes are not all active.
    Theme,
}

impl FilterKind {
    /// Every kind with its host system name, in registration order.
    pub const REGISTRY: [(&'static str, Self); 6] = [
        ("TagStaples", Self::TagStaples),
        ("TagStapleWhenMissing", Self::TagStapleWhenMissing),
        ("FilterByRequiredAppliances", Self::RequiredAppliances),
        ("FilterByRequiredProcess", Self::RequiredProcess),
        ("FilterByRequirements", Self::Requirements),
        ("FilterByTheme", Self::Theme),
    ];

    /// Resolves a host filter system name.
    #[must_use]
    pub fn from_host_name(name: &str) -> Option<Self> {
        Self::REGISTRY
            .iter()
            .find(|(host_name, _)| *host_name == name)
            .map(|(_, kind)| *kind)
    }

    /// Host filter system name of the kind.
    #[must_use]
    pub fn host_name(self) -> &'static str {
        Self::REGISTRY
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("", |(name, _)| *name)
    }

    /// Parameter the kind reads.
    #[must_use]
    pub const fn parameter(self) -> ParameterSelector {
        match self {
            Self::TagStaples => ParameterSelector::None,
            Self::TagStapleWhenMissing | Self::RequiredAppliances | Self::Requirements => {
                ParameterSelector::OwnedAppliances
            }
            Self::RequiredProcess => ParameterSelector::RequiredProcesses,
            Self::Theme => ParameterSelector::ActiveThemes,
        }
    }

    /// Transform implementing the kind.
    #[must_use]
    pub fn transform(self) -> Transform {
        match self {
            Self::TagStaples => tag_staples,
            Self::TagStapleWhenMissing => tag_staple_when_missing,
            Self::RequiredAppliances => filter_by_required_appliances,
            Self::RequiredProcess => filter_by_required_process,
            Self::Requirements => filter_by_requirements,
            Self::Theme => filter_by_theme,
        }
    }
}

/// Single configured step of a pipeline.
#[derive(Clone, Copy)]
pub struct FilterStep {
    id: FilterStepId,
    kind: FilterKind,
    parameter: ParameterSelector,
    transform: Transform,
}

impl fmt::Debug for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStep")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("parameter", &self.parameter)
            .finish_non_exhaustive()
    }
}

impl FilterStep {
    /// Creates the step for `kind` at position `id`.
    #[must_use]
    pub fn new(id: FilterStepId, kind: FilterKind) -> Self {
        Self {
            id,
            kind,
            parameter: kind.parameter(),
            transform: kind.transform(),
        }
    }

    /// Position of the step.
    #[must_use]
    pub const fn id(&self) -> FilterStepId {
        self.id
    }

    /// Kind of the step.
    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Parameter the step reads.
    #[must_use]
    pub const fn parameter(&self) -> ParameterSelector {
        self.parameter
    }
}

/// Ordered list of filter steps mirroring the host's filter systems.
#[derive(Clone, Debug, Default)]
pub struct ShopFilterPipeline {
    steps: Vec<FilterStep>,
}

impl ShopFilterPipeline {
    /// Pipeline in the host's default registration order.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_kinds([
            FilterKind::TagStaples,
            FilterKind::TagStapleWhenMissing,
            FilterKind::RequiredAppliances,
            FilterKind::RequiredProcess,
            FilterKind::Requirements,
            FilterKind::Theme,
        ])
    }

    /// Pipeline running `kinds` in the given order.
    #[must_use]
    pub fn from_kinds(kinds: impl IntoIterator<Item = FilterKind>) -> Self {
        let steps = kinds
            .into_iter()
            .zip(0_u32..)
            .map(|(kind, position)| FilterStep::new(FilterStepId::new(position), kind))
            .collect();
        Self { steps }
    }

    /// Pipeline following the host's filter system names in order.
    ///
    /// Names without a registered transform are logged and skipped.
    #[must_use]
    pub fn from_host_order<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut kinds = Vec::new();
        for name in names {
            let name = name.as_ref();
            match FilterKind::from_host_name(name) {
                Some(kind) => kinds.push(kind),
                None => tracing::warn!(filter = name, "no replacement transform for shop filter"),
            }
        }
        if kinds.is_empty() {
            tracing::warn!("shop filter list is empty, candidates pass through unfiltered");
        }
        Self::from_kinds(kinds)
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[FilterStep] {
        &self.steps
    }

    /// Reports whether the pipeline has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step over every candidate.
    pub fn apply(
        &self,
        candidates: &mut [ShopCandidate],
        inputs: &ShopInputs<'_>,
        catalog: &dyn ContentCatalog,
    ) {
        for step in &self.steps {
            let context = FilterContext {
                step: step.id,
                parameter: step.parameter.select(inputs),
                catalog,
            };
            let mut removed = 0_usize;
            for candidate in candidates.iter_mut() {
                let was_removed = candidate.removed;
                (step.transform)(candidate, &context);
                debug_assert!(
                    !was_removed || candidate.removed,
                    "filter steps must never restore a removed candidate"
                );
                if !was_removed && candidate.removed {
                    removed += 1;
                }
            }
            tracing::debug!(
                step = step.id.get(),
                filter = step.kind.host_name(),
                removed,
                "applied shop filter"
            );
        }
    }
}

fn is_exempt_staple(candidate: &ShopCandidate) -> bool {
    matches!(candidate.staple, StapleKind::Bonus | StapleKind::WhenMissing)
}

fn tag_staples(candidate: &mut ShopCandidate, _context: &FilterContext<'_>) {
    if candidate.staple == StapleKind::Unclassified {
        candidate.staple = if candidate.shopping_tags.contains(ShoppingTag::Basic) {
            StapleKind::Fixed
        } else {
            StapleKind::NonStaple
        };
    }
}

fn tag_staple_when_missing(candidate: &mut ShopCandidate, context: &FilterContext<'_>) {
    let FilterParameter::OwnedAppliances(owned) = context.parameter else {
        return;
    };
    if candidate.staple == StapleKind::NonStaple
        && candidate.staple_when_missing
        && !owned.contains(&candidate.appliance)
    {
        candidate.staple = StapleKind::WhenMissing;
    }
}

fn filter_by_required_appliances(candidate: &mut ShopCandidate, context: &FilterContext<'_>) {
    let FilterParameter::OwnedAppliances(owned) = context.parameter else {
        return;
    };
    if candidate.removed || is_exempt_staple(candidate) {
        return;
    }
    let Some(appliance) = context.catalog.appliance(candidate.appliance) else {
        return;
    };

    let has_copy = owned.contains(&appliance.id);
    let allowed = if appliance.sell_only_as_duplicate && !has_copy {
        false
    } else if appliance.sell_only_as_unique && has_copy {
        false
    } else {
        appliance.requires_for_shop.is_empty()
            || appliance.requires_for_shop.iter().any(|id| owned.contains(id))
    };
    if !allowed {
        candidate.remove(context.step);
    }
}

fn filter_by_required_process(candidate: &mut ShopCandidate, context: &FilterContext<'_>) {
    let FilterParameter::RequiredProcesses(processes) = context.parameter else {
        return;
    };
    if candidate.removed || is_exempt_staple(candidate) {
        return;
    }
    let Some(appliance) = context.catalog.appliance(candidate.appliance) else {
        return;
    };

    let required = &appliance.requires_process_for_shop;
    if !required.is_empty() && !required.iter().any(|id| processes.contains(id)) {
        candidate.remove(context.step);
    }
}

fn filter_by_requirements(candidate: &mut ShopCandidate, context: &FilterContext<'_>) {
    let FilterParameter::OwnedAppliances(owned) = context.parameter else {
        return;
    };
    if candidate.removed || candidate.staple == StapleKind::Bonus {
        return;
    }
    if candidate.requirement != ShopRequirement::RefreshableProvider {
        return;
    }

    let has_provider = owned.iter().any(|id| {
        context
            .catalog
            .appliance(*id)
            .map_or(false, |appliance| appliance.refreshable_provider)
    });
    if !has_provider {
        candidate.remove(context.step);
    }
}

fn filter_by_theme(candidate: &mut ShopCandidate, context: &FilterContext<'_>) {
    let FilterParameter::ActiveThemes(active) = context.parameter else {
        return;
    };
    if candidate.removed || candidate.decoration_required.is_empty() {
        return;
    }
    if !candidate.decoration_required.is_subset_of(&active) {
        candidate.remove(context.step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_round_trips_host_names() {
        for (name, kind) in FilterKind::REGISTRY {
            assert_eq!(FilterKind::from_host_name(name), Some(kind));
            assert_eq!(kind.host_name(), name);
        }
        assert_eq!(FilterKind::from_host_name("FilterByBlueprintCount"), None);
    }

    #[test]
    fn removal_records_first_step_only() {
        let mut candidate = ShopCandidate::from_appliance(&ApplianceRecord::default());
        candidate.remove(FilterStepId::new(2));
        candidate.remove(FilterStepId::new(4));
        assert!(candidate.is_removed());
        assert_eq!(candidate.filtered_by(), Some(FilterStepId::new(2)));
    }

    #[test]
    fn standard_pipeline_numbers_steps_in_order() {
        let pipeline = ShopFilterPipeline::standard();
        let ids: Vec<u32> = pipeline.steps().iter().map(|step| step.id().get()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(pipeline.steps()[0].kind(), FilterKind::TagStaples);
        assert_eq!(pipeline.steps()[5].parameter(), ParameterSelector::ActiveThemes);
    }
}
