use seed_scanner_catalog::Catalog;
use seed_scanner_core::{
    ApplianceId, DecorationSet, DifficultySettings, Seed, ShoppingTag, SHOP_CATEGORY_SEED,
};
use seed_scanner_system_shop_filters::{candidates_from_catalog, ShopCandidate, ShopFilterPipeline};
use seed_scanner_system_shop_simulation::{ShopRequest, ShopState};

const CATALOG: &str = r#"
[[appliances]]
id = 1
name = "Counter"
purchasable = true
shopping_tags = ["basic"]

[[appliances]]
id = 2
name = "Hob"
purchasable = true
shopping_tags = ["cooking"]

[[appliances]]
id = 3
name = "Dishwasher"
purchasable = true
shopping_tags = ["plumbing"]
requires_for_shop = [4]

[[appliances]]
id = 4
name = "Sink"
purchasable = true
shopping_tags = ["plumbing"]

[[appliances]]
id = 5
name = "Potted Plant"
purchasable = true
shopping_tags = ["decoration"]

[[appliances]]
id = 6
name = "Candelabra"
purchasable = true
shopping_tags = ["decoration"]
decoration_required = ["formal"]
"#;

fn catalog() -> Catalog {
    Catalog::from_toml_str(CATALOG).expect("catalog parses")
}

fn ids(candidates: &[&ShopCandidate]) -> Vec<i32> {
    candidates.iter().map(|candidate| candidate.appliance().get()).collect()
}

#[test]
fn regular_day_groups_stock_by_request() {
    let catalog = catalog();
    let template = candidates_from_catalog(&catalog);
    let outcome = ShopState::new(1).simulate(
        &DifficultySettings::default(),
        &ShopFilterPipeline::standard(),
        &template,
        &catalog,
    );

    let per_request = outcome.per_request();
    assert_eq!(per_request.len(), 4);

    let (staple_request, staple_stock) = &per_request[0];
    assert!(staple_request.tags().contains(ShoppingTag::Basic));
    assert_eq!(ids(staple_stock), vec![1]);

    let (_, regular_stock) = &per_request[1];
    assert_eq!(ids(regular_stock), vec![2, 4]);
}

#[test]
fn owned_prerequisite_unlocks_stock() {
    let catalog = catalog();
    let template = candidates_from_catalog(&catalog);
    let mut state = ShopState::new(2);
    state.owned_appliances = vec![ApplianceId::new(4)];

    let outcome = state.simulate(
        &DifficultySettings::default(),
        &ShopFilterPipeline::standard(),
        &template,
        &catalog,
    );
    let surviving: Vec<i32> = outcome
        .surviving()
        .map(|candidate| candidate.appliance().get())
        .collect();
    assert!(surviving.contains(&3));
    assert_eq!(outcome.candidates().len(), template.len());
}

#[test]
fn decoration_day_offers_themed_stock_only_to_decoration_slots() {
    let catalog = catalog();
    let template = candidates_from_catalog(&catalog);
    let mut state = ShopState::new(5);
    state.active_themes = DecorationSet::from_host_bits(8).expect("formal theme");

    let outcome = state.simulate(
        &DifficultySettings::default(),
        &ShopFilterPipeline::standard(),
        &template,
        &catalog,
    );
    assert_eq!(outcome.simulation().decor_count(), 6);

    let first = outcome.simulation().requests()[0];
    assert_eq!(ids(&outcome.eligible_for(&first)), vec![5, 6]);
    assert!(outcome.eligible_for(&ShopRequest::Decor).is_empty());
}

#[test]
fn missing_theme_hides_decoration() {
    let catalog = catalog();
    let template = candidates_from_catalog(&catalog);
    let outcome = ShopState::new(5).simulate(
        &DifficultySettings::default(),
        &ShopFilterPipeline::standard(),
        &template,
        &catalog,
    );
    let first = outcome.simulation().requests()[0];
    assert_eq!(ids(&outcome.eligible_for(&first)), vec![5]);
}

#[test]
fn template_is_left_untouched() {
    let catalog = catalog();
    let template = candidates_from_catalog(&catalog);
    let _ = ShopState::new(1).simulate(
        &DifficultySettings::default(),
        &ShopFilterPipeline::standard(),
        &template,
        &catalog,
    );
    assert!(template.iter().all(|candidate| !candidate.is_removed()));
}

#[test]
fn shop_draws_use_the_shop_category() {
    let seed = Seed::parse("abc").expect("seed");
    let key = ShopState::new(3).subcontext_key(&seed);
    assert_eq!(key.category(), SHOP_CATEGORY_SEED);
    assert_eq!(key.instance(), 3);
    assert_eq!(key.seed(), &seed);
}
