use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use seed_scanner_catalog::Catalog;
use seed_scanner_core::{Seed, SettingId, UnlockId};
use seed_scanner_system_seeded_stream::HostStreams;
use seed_scanner_system_unlock_tree::{
    ChoiceTreeBuilder, CsvReport, Expansion, ReportHeader, RunStart, UnlockChoiceTree,
};

const CATALOG: &str = r#"
default_unlock_pack = 1

[[settings]]
id = 1
name = "Country"

[[unlock_packs]]
id = 1
name = "Default"
offer_days = [1, 2, 3, 5, 7, 9, 12, 15]

[[unlock_packs.entries]]
unlock = 10
[[unlock_packs.entries]]
unlock = 11
[[unlock_packs.entries]]
unlock = 12
[[unlock_packs.entries]]
unlock = 13
min_day = 3
[[unlock_packs.entries]]
unlock = 14
requires = [10]
[[unlock_packs.entries]]
unlock = 15
blocked_by = [11]

[[unlocks]]
id = 7
name = "Salad"
dish = { dish_type = "base", unlockable = true }

[[unlocks]]
id = 10
name = "Pies"
dish = { dish_type = "dessert" }

[[unlocks]]
id = 11
name = "Soup"
dish = { dish_type = "starter" }

[[unlocks]]
id = 12
name = "Double Helpings"
customer_change = { points = 1 }

[[unlocks]]
id = 13
name = "Advertising"
effects = [{ kind = "customer_spawn", base = 1.1, per_day = 1.0 }]

[[unlocks]]
id = 14
name = "Cherry Pies"
dish = { dish_type = "dessert" }

[[unlocks]]
id = 15
name = "Bread Starter"
dish = { dish_type = "starter" }
"#;

fn export(seed: &str) -> (Vec<String>, usize) {
    let catalog = Catalog::from_toml_str(CATALOG).expect("catalog parses");
    let builder = ChoiceTreeBuilder::new(&catalog, HostStreams::new());
    let start = RunStart::new(
        Seed::parse(seed).expect("seed"),
        SettingId::new(1),
        UnlockId::new(7),
    );
    let mut tree = UnlockChoiceTree::new_root(&catalog, start);
    let root = tree.root();
    let report = CsvReport::new(ReportHeader::for_tree(&tree, &catalog), 10.0);
    let lines = report.render(&mut tree, &builder, root, 15);
    (lines, tree.len())
}

fn fingerprint(lines: &[String]) -> u64 {
    let mut hasher = DefaultHasher::new();
    lines.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn export_replays_identically_for_equal_seeds() {
    let (first, first_nodes) = export("kitchen1");
    let (second, second_nodes) = export("KITCHEN1");

    assert_eq!(first, second, "export replay diverged");
    assert_eq!(first_nodes, second_nodes);
    assert_eq!(fingerprint(&first), fingerprint(&second));
}

#[test]
fn every_path_grows_one_unlock_per_day() {
    let catalog = Catalog::from_toml_str(CATALOG).expect("catalog parses");
    let builder = ChoiceTreeBuilder::new(&catalog, HostStreams::new());
    let start = RunStart::new(
        Seed::parse("abc12345").expect("seed"),
        SettingId::new(1),
        UnlockId::new(7),
    );
    let mut tree = UnlockChoiceTree::new_root(&catalog, start);
    let root = tree.root();
    let rows: Vec<_> = builder.leaf_rows(&mut tree, root, 15).collect();
    assert!(!rows.is_empty());

    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
        let node = tree.node(id).expect("node exists").clone();
        if let Expansion::Branched { day, children } = node.expansion() {
            for child in children.into_iter().flatten() {
                let child_node = tree.node(child).expect("child exists");
                assert_eq!(child_node.day(), day);
                assert!(day > node.day());
                assert_eq!(child_node.selection().len(), node.selection().len() + 1);
                assert!(!node.selection().contains(child_node.unlock().expect("unlock")));
                assert!(child_node.metrics().courses() >= 1);
                pending.push(child);
            }
        }
    }
}

#[test]
fn rows_are_numbered_from_one() {
    let (lines, _) = export("abc12345");
    for (index, line) in lines[5..].iter().enumerate() {
        assert!(line.starts_with(&format!("{},Salad", index + 1)), "{line}");
        assert!(line.ends_with('%'), "{line}");
    }
}
