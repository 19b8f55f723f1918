#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure aggregation of unlock effects into per-branch customer metrics.
//!
//! The aggregator folds the whole accumulated selection of a branch into the
//! scalars the scanner reports: the number of distinct courses, the course
//! divisor, the customer reduction exponent and the additive and
//! multiplicative spawn adjustments. Every call recomputes from scratch over
//! the selection in ascending identifier order, so the result never depends
//! on the order in which unlocks were chosen.

use std::collections::BTreeSet;

use seed_scanner_core::{ContentCatalog, Course, Selection, UnlockEffect};

pub use seed_scanner_core::Factor;

/// Fraction by which every additional course reduces customer numbers.
pub const COURSE_DIVISOR_STEP: f32 = 0.25;

/// Derived metrics of a single branch of the choice tree.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchMetrics {
    courses: u32,
    reduction_exponent: i32,
    customers_per_hour_change: f32,
    base_multiplier: Factor,
    per_day_multiplier: Factor,
    excluded_unlock_names: Vec<String>,
}

impl BranchMetrics {
    /// Metrics of a selection that affects nothing.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            courses: 1,
            reduction_exponent: 0,
            customers_per_hour_change: 0.0,
            base_multiplier: Factor::IDENTITY,
            per_day_multiplier: Factor::IDENTITY,
            excluded_unlock_names: Vec::new(),
        }
    }

    /// Number of distinct courses served, never below one.
    #[must_use]
    pub const fn courses(&self) -> u32 {
        self.courses
    }

    /// Divisor normalising customer numbers by the number of courses.
    #[must_use]
    pub fn course_divisor(&self) -> f32 {
        1.0 + (self.courses.saturating_sub(1)) as f32 * COURSE_DIVISOR_STEP
    }

    /// Sum of customer-change points contributed by the selection.
    #[must_use]
    pub const fn reduction_exponent(&self) -> i32 {
        self.reduction_exponent
    }

    /// Additive change to the customers-per-hour rate.
    #[must_use]
    pub const fn customers_per_hour_change(&self) -> f32 {
        self.customers_per_hour_change
    }

    /// Product of every base spawn factor.
    #[must_use]
    pub const fn base_multiplier(&self) -> Factor {
        self.base_multiplier
    }

    /// Product of every per-day spawn factor compounded up to the branch day.
    #[must_use]
    pub const fn per_day_multiplier(&self) -> Factor {
        self.per_day_multiplier
    }

    /// Names of selected unlocks whose customer effect is known but not modelled.
    #[must_use]
    pub fn excluded_unlock_names(&self) -> &[String] {
        &self.excluded_unlock_names
    }

    /// Reports whether any selected unlock was left out of the calculation.
    #[must_use]
    pub fn is_approximate(&self) -> bool {
        !self.excluded_unlock_names.is_empty()
    }

    /// Cumulative customer multiplier given the difficulty's per-point reduction.
    ///
    /// `per_point_percent` is the percentage by which each exponent point
    /// reduces customers. The power term is applied first, followed by the
    /// additive rate change, the spawn factors and the course normalisation.
    #[must_use]
    pub fn cumulative_customer_multiplier(&self, per_point_percent: f32) -> f32 {
        let reduction = (1.0 - per_point_percent / 100.0).powi(self.reduction_exponent);
        reduction
            * (1.0 + self.customers_per_hour_change)
            * self.base_multiplier.value()
            * self.per_day_multiplier.value()
            / self.course_divisor()
    }
}

impl Default for BranchMetrics {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Folds selections into [`BranchMetrics`] using a read-only catalog.
#[derive(Clone, Copy)]
pub struct EffectAggregator<'c> {
    catalog: &'c dyn ContentCatalog,
}

impl std::fmt::Debug for EffectAggregator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectAggregator").finish_non_exhaustive()
    }
}

impl<'c> EffectAggregator<'c> {
    /// Creates an aggregator reading unlock definitions from `catalog`.
    #[must_use]
    pub fn new(catalog: &'c dyn ContentCatalog) -> Self {
        Self { catalog }
    }

    /// Computes the metrics of `selection` as observed on `day`.
    ///
    /// Unknown identifiers contribute nothing except, when they are listed as
    /// customer-count exceptions, their raw identifier in the excluded names.
    /// Per-day factors only compound for non-negative days.
    #[must_use]
    pub fn aggregate(&self, selection: &Selection, day: i32) -> BranchMetrics {
        let exceptions = self.catalog.customer_count_exceptions();
        let mut metrics = BranchMetrics::neutral();
        let mut courses = BTreeSet::new();

        for id in selection.sorted() {
            let excluded = exceptions.contains(&id);
            if excluded {
                metrics.excluded_unlock_names.push(self.catalog.unlock_name(id));
            }

            let Some(unlock) = self.catalog.unlock(id) else {
                continue;
            };

            if !excluded {
                metrics.reduction_exponent += unlock.customer_change.exponent_points();
            }

            for effect in &unlock.effects {
                match effect {
                    UnlockEffect::Parameter { customers_per_hour } => {
                        metrics.customers_per_hour_change += *customers_per_hour;
                    }
                    UnlockEffect::CustomerSpawn { base, per_day } => {
                        metrics.base_multiplier = metrics.base_multiplier * *base;
                        if let Ok(days) = u32::try_from(day) {
                            metrics.per_day_multiplier =
                                metrics.per_day_multiplier * per_day.repeat(days);
                        }
                    }
                    UnlockEffect::Other => {}
                }
            }

            if let Some(course) = unlock.dish.and_then(|dish| dish.dish_type.course()) {
                let _ = courses.insert(course);
            }
        }

        metrics.courses = course_count(&courses);
        metrics
    }
}

fn course_count(courses: &BTreeSet<Course>) -> u32 {
    u32::try_from(courses.len()).unwrap_or(u32::MAX).max(1)
}
