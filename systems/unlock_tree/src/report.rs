use seed_scanner_core::{ContentCatalog, StreamSource, UnlockId, OVERTIME_START_DAY};
use seed_scanner_system_effects::BranchMetrics;

use crate::{ChoiceTreeBuilder, NodeId, UnlockChoiceTree};

/// First line of the accuracy warning shown for approximate multipliers.
pub const EXCLUDED_DISCLAIMER_PREFIX: &str =
    "Inaccurate customer multiplier.\nSome card effects are excluded from calculation:";

/// Run metadata printed above the rows of an export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportHeader {
    seed: String,
    setting: String,
    starting_dish: String,
}

impl ReportHeader {
    /// Resolves the display names of the run behind `tree`.
    #[must_use]
    pub fn for_tree(tree: &UnlockChoiceTree, catalog: &dyn ContentCatalog) -> Self {
        let start = tree.start();
        let setting = catalog
            .setting(start.setting)
            .map_or_else(|| start.setting.to_string(), |setting| setting.display_name());
        Self {
            seed: start.seed.to_string(),
            setting,
            starting_dish: catalog.unlock_name(start.starting_dish),
        }
    }

    /// Seed text.
    #[must_use]
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Setting name, or its identifier when unnamed.
    #[must_use]
    pub fn setting(&self) -> &str {
        &self.setting
    }

    /// Starting dish name, or its identifier when unnamed.
    #[must_use]
    pub fn starting_dish(&self) -> &str {
        &self.starting_dish
    }

    /// Stem shared by every export of the run.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.seed, self.setting, self.starting_dish)
    }

    /// File name of the CSV export up to `day`.
    #[must_use]
    pub fn csv_file_name(&self, day: i32) -> String {
        format!("{}_{day}.csv", self.file_stem())
    }
}

/// Renders leaf rows of a tree as the scanner's CSV export.
#[derive(Clone, Debug)]
pub struct CsvReport {
    header: ReportHeader,
    per_point_percent: f32,
}

impl CsvReport {
    /// Creates a report with `per_point_percent` customer reduction per exponent point.
    #[must_use]
    pub fn new(header: ReportHeader, per_point_percent: f32) -> Self {
        Self {
            header,
            per_point_percent,
        }
    }

    /// Metadata printed above the rows.
    #[must_use]
    pub fn header(&self) -> &ReportHeader {
        &self.header
    }

    /// Renders every leaf below `node` up to `day_limit`, header block first.
    pub fn render<S: StreamSource>(
        &self,
        tree: &mut UnlockChoiceTree,
        builder: &ChoiceTreeBuilder<'_, S>,
        node: NodeId,
        day_limit: i32,
    ) -> Vec<String> {
        let catalog = builder.catalog();
        let mut rows = builder.leaf_rows(tree, node, day_limit);
        let body: Vec<String> = rows
            .by_ref()
            .enumerate()
            .map(|(index, row)| {
                let names: Vec<String> = row
                    .selection()
                    .iter()
                    .map(|id| csv_name(catalog, id))
                    .collect();
                let multiplier = row
                    .metrics()
                    .cumulative_customer_multiplier(self.per_point_percent);
                format!(
                    "{},{},{},{}",
                    index + 1,
                    names.join(","),
                    row.metrics().courses(),
                    format_percentage(multiplier),
                )
            })
            .collect();

        let columns: Vec<String> = rows
            .header_days()
            .iter()
            .map(|day| if *day < 0 { "Start".to_owned() } else { day.to_string() })
            .collect();

        let mut lines = vec![
            format!("Seed,{}", self.header.seed),
            format!("Setting,{}", self.header.setting),
            format!("Starting Dish,{}", self.header.starting_dish),
            String::new(),
            format!("No.,{},Courses,Customer Multiplier", columns.join(",")),
        ];
        lines.extend(body);
        lines
    }
}

fn csv_name(catalog: &dyn ContentCatalog, id: UnlockId) -> String {
    catalog
        .unlock(id)
        .map_or_else(|| format!("Unknown ({id})"), |unlock| unlock.display_name())
}

/// Formats a multiplier as a percentage with at most two decimals.
///
/// Trailing zeros are dropped, so `1.0` becomes `100%` and `0.8125` becomes
/// `81.25%`. Ties round away from zero, so `0.03125` becomes `3.13%`.
#[must_use]
pub fn format_percentage(multiplier: f32) -> String {
    let percent = f64::from(multiplier) * 100.0;
    let mut text = format!("{:.2}", (percent * 100.0).round() / 100.0);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_owned();
    }
    text.push('%');
    text
}

/// Heading of a node as shown when browsing the tree.
///
/// Regular days read `Name (Day d)`, days after the last regular day read
/// `Name (Overtime Day n)` and the root lists its starting unlocks.
#[must_use]
pub fn node_label(
    tree: &UnlockChoiceTree,
    node: NodeId,
    catalog: &dyn ContentCatalog,
) -> Option<String> {
    let node = tree.node(node)?;
    if !node.is_root() {
        let day = node.day();
        return Some(if day > OVERTIME_START_DAY {
            format!("{} (Overtime Day {})", node.name(), day - OVERTIME_START_DAY)
        } else {
            format!("{} (Day {day})", node.name())
        });
    }

    let names: Vec<String> = node
        .selection()
        .iter()
        .map(|id| catalog.unlock_name(id))
        .collect();
    if names.is_empty() {
        Some("Starting Unlocks".to_owned())
    } else {
        Some(format!("Starting Unlocks ({})", names.join(", ")))
    }
}

/// Accuracy warning for metrics that left some unlocks out, if any were.
#[must_use]
pub fn excluded_disclaimer(metrics: &BranchMetrics) -> Option<String> {
    if !metrics.is_approximate() {
        return None;
    }
    let mut text = EXCLUDED_DISCLAIMER_PREFIX.to_owned();
    for name in metrics.excluded_unlock_names() {
        text.push('\n');
        text.push_str(name);
    }
    Some(text)
}
