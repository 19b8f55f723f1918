use seed_scanner_catalog::Catalog;
use seed_scanner_core::{Selection, UnlockId};
use seed_scanner_system_effects::EffectAggregator;

const CATALOG: &str = r#"
[references]
customer_count_exceptions = [40, 41]

[[unlocks]]
id = 1
name = "Burgers"
dish = { dish_type = "base", unlockable = true }

[[unlocks]]
id = 2
name = "Soup"
dish = { dish_type = "starter" }

[[unlocks]]
id = 3
name = "Cheesecake"
dish = { dish_type = "dessert" }

[[unlocks]]
id = 4
name = "Onion Rings"
dish = { dish_type = "side" }

[[unlocks]]
id = 5
name = "Steak"
dish = { dish_type = "main" }

[[unlocks]]
id = 10
name = "Advertising"
customer_change = { points = 2 }
effects = [{ kind = "parameter", customers_per_hour = 0.25 }]

[[unlocks]]
id = 11
name = "Word of Mouth"
customer_change = "franchise_tier"
effects = [{ kind = "customer_spawn", base = 1.5, per_day = 1.1 }]

[[unlocks]]
id = 40
name = "Lunch Rush"
customer_change = { points = 3 }
"#;

fn catalog() -> Catalog {
    Catalog::from_toml_str(CATALOG).expect("catalog parses")
}

fn ids(values: &[i32]) -> Selection {
    Selection::from_ids(values.iter().copied().map(UnlockId::new))
}

#[test]
fn courses_count_distinct_coarse_categories() {
    let catalog = catalog();
    let aggregator = EffectAggregator::new(&catalog);

    assert_eq!(aggregator.aggregate(&ids(&[1]), 0).courses(), 1);
    assert_eq!(aggregator.aggregate(&ids(&[1, 5]), 0).courses(), 1);
    assert_eq!(aggregator.aggregate(&ids(&[4]), 0).courses(), 1);

    let full = aggregator.aggregate(&ids(&[1, 2, 3, 4]), 0);
    assert_eq!(full.courses(), 3);
    assert_eq!(full.course_divisor(), 1.5);
}

#[test]
fn aggregation_ignores_selection_order() {
    let catalog = catalog();
    let aggregator = EffectAggregator::new(&catalog);

    let forward = aggregator.aggregate(&ids(&[1, 10, 11, 2, 40]), 4);
    let backward = aggregator.aggregate(&ids(&[40, 2, 11, 10, 1]), 4);

    assert_eq!(forward, backward);
    assert_eq!(
        forward.cumulative_customer_multiplier(10.0),
        backward.cumulative_customer_multiplier(10.0)
    );
}

#[test]
fn franchise_tier_and_exceptions_skip_the_exponent() {
    let catalog = catalog();
    let metrics = EffectAggregator::new(&catalog).aggregate(&ids(&[10, 11, 40, 41]), 2);

    assert_eq!(metrics.reduction_exponent(), 2);
    assert_eq!(metrics.excluded_unlock_names(), &["Lunch Rush", "41"]);
    assert!(metrics.is_approximate());
}

#[test]
fn spawn_factors_compound_per_day() {
    let catalog = catalog();
    let aggregator = EffectAggregator::new(&catalog);

    let day_two = aggregator.aggregate(&ids(&[11]), 2);
    assert!((day_two.base_multiplier().value() - 1.5).abs() < 1e-6);
    assert!((day_two.per_day_multiplier().value() - 1.21).abs() < 1e-5);

    let start = aggregator.aggregate(&ids(&[11]), -1);
    assert_eq!(start.per_day_multiplier().value(), 1.0);
}

#[test]
fn starting_dish_alone_is_neutral() {
    let catalog = catalog();
    let metrics = EffectAggregator::new(&catalog).aggregate(&ids(&[1]), -1);

    assert_eq!(metrics.cumulative_customer_multiplier(10.0), 1.0);
    assert!(!metrics.is_approximate());
}

#[test]
fn multiplier_combines_reduction_and_rate_change() {
    let catalog = catalog();
    let metrics = EffectAggregator::new(&catalog).aggregate(&ids(&[1, 2, 10]), 0);

    let expected = 0.9_f32.powi(2) * 1.25 / 1.25;
    assert!((metrics.cumulative_customer_multiplier(10.0) - expected).abs() < 1e-5);
}
