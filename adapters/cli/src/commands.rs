use std::{fs, io::Write, path::Path};

use anyhow::{bail, Context, Result};
use seed_scanner_catalog::query;
use seed_scanner_core::{ApplianceId, ContentCatalog, DecorationSet, ProcessId, SettingId, UnlockId};
use seed_scanner_export::{ExportSink, FileSink};
use seed_scanner_system_seeded_stream::HostStreams;
use seed_scanner_system_shop_filters::{candidates_from_catalog, ShopFilterPipeline};
use seed_scanner_system_shop_simulation::{ShopRequest, ShopState};
use seed_scanner_system_unlock_tree::{
    excluded_disclaimer, format_percentage, node_label, ChildSlot, ChoiceTreeBuilder, CsvReport,
    Expansion, NodeId, PresentationState, ReportHeader, RunStart, UnlockChoiceTree,
};

use crate::{config::ScannerConfig, RunArgs, ShopArgs};

type Builder<'c> = ChoiceTreeBuilder<'c, HostStreams>;

/// Resolves the run described by `args` against the catalog.
///
/// Settings and dishes match by identifier or name; numeric input that the
/// catalog does not know is kept as a raw identifier.
pub(crate) fn resolve_run(catalog: &dyn ContentCatalog, args: &RunArgs) -> Result<RunStart> {
    let setting = match query::find_setting(catalog, &args.setting) {
        Some(setting) => setting.id,
        None => SettingId::new(raw_identifier("setting", &args.setting)?),
    };
    let dish = match query::find_starting_dish(catalog, &args.dish) {
        Some(dish) => dish.id,
        None => UnlockId::new(raw_identifier("starting dish", &args.dish)?),
    };

    let mut start = RunStart::new(args.seed.clone(), setting, dish);
    start.tier = args.tier;
    Ok(start)
}

fn raw_identifier(kind: &str, needle: &str) -> Result<i32> {
    let id = needle
        .trim()
        .parse()
        .with_context(|| format!("unknown {kind} `{needle}`"))?;
    tracing::warn!(kind, id, "not in catalog, using raw identifier");
    Ok(id)
}

fn new_tree(catalog: &dyn ContentCatalog, args: &RunArgs) -> Result<UnlockChoiceTree> {
    let mut tree = UnlockChoiceTree::new_root(catalog, resolve_run(catalog, args)?);
    tree.set_total_rerolls(args.rerolls);
    Ok(tree)
}

fn builder<'c>(catalog: &'c dyn ContentCatalog, config: &ScannerConfig) -> Builder<'c> {
    ChoiceTreeBuilder::new(catalog, HostStreams::new()).with_lookahead(config.lookahead_days)
}

pub(crate) fn list_settings(out: &mut impl Write, catalog: &dyn ContentCatalog) -> Result<()> {
    for setting in catalog.settings() {
        let pack = setting
            .unlock_pack
            .and_then(|id| catalog.unlock_pack(id))
            .or_else(|| catalog.default_unlock_pack())
            .map_or_else(|| "-".to_owned(), |pack| pack.name.clone());
        writeln!(out, "{}\t{}\t{pack}", setting.id, setting.display_name())?;
    }
    Ok(())
}

pub(crate) fn list_dishes(out: &mut impl Write, catalog: &dyn ContentCatalog) -> Result<()> {
    for dish in query::starting_dishes(catalog) {
        writeln!(out, "{}\t{}", dish.id, dish.display_name())?;
    }
    Ok(())
}

/// Prints the tree `depth` generations below the root.
pub(crate) fn print_tree(
    out: &mut impl Write,
    catalog: &dyn ContentCatalog,
    config: &ScannerConfig,
    args: &RunArgs,
    depth: u32,
) -> Result<()> {
    let builder = builder(catalog, config);
    let mut tree = new_tree(catalog, args)?;

    let mut pending = vec![(tree.root(), 0_u32)];
    while let Some((id, level)) = pending.pop() {
        writeln!(out, "{}{}", "  ".repeat(level as usize), describe(&tree, id, config, catalog)?)?;
        if level >= depth {
            continue;
        }
        if let Expansion::Branched { children, .. } = builder.expand(&mut tree, id)? {
            for child in children.into_iter().rev().flatten() {
                pending.push((child, level + 1));
            }
        }
    }
    Ok(())
}

/// Follows the chosen slots from the root and prints the resulting path.
pub(crate) fn print_path(
    out: &mut impl Write,
    catalog: &dyn ContentCatalog,
    config: &ScannerConfig,
    args: &RunArgs,
    choices: &[u32],
) -> Result<()> {
    let builder = builder(catalog, config);
    let mut tree = new_tree(catalog, args)?;
    let mut presentation = PresentationState::new();

    let mut current = tree.root();
    for (step, number) in choices.iter().enumerate() {
        let slot = ChildSlot::from_number(*number)
            .with_context(|| format!("choice {} must be 1 or 2, got {number}", step + 1))?;
        let _ = builder.expand(&mut tree, current)?;
        presentation.set_expanded(current, true);
        let Some(child) = presentation.select_child(&tree, current, slot) else {
            bail!(
                "{} offers no choice {number}",
                describe(&tree, current, config, catalog)?
            );
        };
        current = child;
    }

    for id in presentation.selection_path(&tree) {
        writeln!(out, "{}", describe(&tree, id, config, catalog)?)?;
    }

    match builder.expand(&mut tree, current)? {
        Expansion::Branched { children, .. } => {
            writeln!(out)?;
            writeln!(out, "Next choices:")?;
            for (slot, child) in children.into_iter().enumerate() {
                if let Some(child) = child {
                    writeln!(out, "  {}: {}", slot + 1, describe(&tree, child, config, catalog)?)?;
                }
            }
        }
        Expansion::Terminal | Expansion::Pending => {
            writeln!(out)?;
            writeln!(out, "No further choices within the lookahead window.")?;
        }
    }

    let node = tree
        .node(current)
        .with_context(|| format!("node {current} missing from tree"))?;
    if let Some(disclaimer) = excluded_disclaimer(node.metrics()) {
        writeln!(out)?;
        writeln!(out, "{disclaimer}")?;
    }
    Ok(())
}

fn describe(
    tree: &UnlockChoiceTree,
    id: NodeId,
    config: &ScannerConfig,
    catalog: &dyn ContentCatalog,
) -> Result<String> {
    let node = tree
        .node(id)
        .with_context(|| format!("node {id} missing from tree"))?;
    let label = node_label(tree, id, catalog).unwrap_or_else(|| node.name().to_owned());
    let metrics = node.metrics();
    let multiplier = format_percentage(
        metrics.cumulative_customer_multiplier(config.difficulty.customer_change_per_point),
    );
    let marker = if metrics.is_approximate() { "*" } else { "" };
    Ok(format!(
        "{label}  [{} courses, {multiplier}{marker}]",
        metrics.courses()
    ))
}

fn sink(config: &ScannerConfig) -> FileSink {
    FileSink::new(&config.export_dir, &config.export_folder)
}

/// Writes the CSV report of every leaf up to `day`.
pub(crate) fn export_csv(
    out: &mut impl Write,
    catalog: &dyn ContentCatalog,
    config: &ScannerConfig,
    args: &RunArgs,
    day: i32,
) -> Result<()> {
    let builder = builder(catalog, config);
    let mut tree = new_tree(catalog, args)?;
    let header = ReportHeader::for_tree(&tree, catalog);
    let file_name = header.csv_file_name(day);

    let report = CsvReport::new(header, config.difficulty.customer_change_per_point);
    let root = tree.root();
    let lines = report.render(&mut tree, &builder, root, day);
    let rows = lines.len().saturating_sub(5);

    let path = sink(config)
        .write_rows(&file_name, &lines)
        .context("failed to export scan")?;
    writeln!(out, "Exported {rows} rows to {}", path.display())?;
    Ok(())
}

/// Writes the card list of every unlock reachable by `day`.
///
/// With `art_dir`, pre-rendered `<id>.png` images found there are copied next
/// to the list under the unlock's name.
pub(crate) fn export_cards(
    out: &mut impl Write,
    catalog: &dyn ContentCatalog,
    config: &ScannerConfig,
    args: &RunArgs,
    day: i32,
    art_dir: Option<&Path>,
) -> Result<()> {
    let builder = builder(catalog, config);
    let mut tree = new_tree(catalog, args)?;
    let header = ReportHeader::for_tree(&tree, catalog);
    let root = tree.root();
    let unlocks = builder.unlocks_up_to_day(&mut tree, root, day);

    let sink = sink(config).nested(&header.file_stem());
    let mut rows = vec!["Id,Name".to_owned()];
    rows.extend(
        unlocks
            .iter()
            .map(|id| format!("{id},{}", catalog.unlock_name(*id))),
    );
    let list = sink
        .write_rows(&format!("cards_{day}.csv"), &rows)
        .context("failed to export card list")?;
    writeln!(out, "Listed {} cards in {}", unlocks.len(), list.display())?;

    let Some(art_dir) = art_dir else {
        return Ok(());
    };
    let mut copied = 0_usize;
    for id in &unlocks {
        let source = art_dir.join(format!("{id}.png"));
        if !source.is_file() {
            tracing::debug!(unlock = id.get(), path = %source.display(), "no card art");
            continue;
        }
        let bytes = fs::read(&source)
            .with_context(|| format!("failed to read card art at {}", source.display()))?;
        let _ = sink
            .write_image(&format!("{}.png", catalog.unlock_name(*id)), &bytes)
            .context("failed to export card art")?;
        copied += 1;
    }
    writeln!(out, "Copied {copied} card images")?;
    Ok(())
}

/// Prints the stock each shop request of the day may offer.
pub(crate) fn print_shop(
    out: &mut impl Write,
    catalog: &dyn ContentCatalog,
    config: &ScannerConfig,
    args: &ShopArgs,
) -> Result<()> {
    let pipeline = if args.filters.is_empty() {
        ShopFilterPipeline::standard()
    } else {
        ShopFilterPipeline::from_host_order(&args.filters)
    };
    let state = ShopState {
        day: args.day,
        reroll_index: args.reroll,
        letters_inside: args.letters_inside,
        owned_appliances: args.owned.iter().copied().map(ApplianceId::new).collect(),
        required_processes: args.processes.iter().copied().map(ProcessId::new).collect(),
        active_themes: DecorationSet::from_host_values(&args.themes)
            .context("invalid theme value")?,
    };

    let template = candidates_from_catalog(catalog);
    let outcome = state.simulate(&config.difficulty, &pipeline, &template, catalog);

    writeln!(out, "Shop after day {}", args.day)?;
    for (index, (request, stock)) in outcome.per_request().into_iter().enumerate() {
        let names: Vec<String> = stock
            .iter()
            .map(|candidate| appliance_name(catalog, candidate.appliance()))
            .collect();
        let stock = if names.is_empty() {
            "-".to_owned()
        } else {
            names.join(", ")
        };
        writeln!(out, "  Slot {} ({}): {stock}", index + 1, request_label(&request))?;
    }

    let removed: Vec<String> = outcome
        .candidates()
        .iter()
        .filter_map(|candidate| {
            let step = candidate.filtered_by()?;
            let filter = pipeline
                .steps()
                .get(step.get() as usize)
                .map_or("unknown filter", |filter_step| filter_step.kind().host_name());
            Some(format!(
                "{} ({step}, {filter})",
                appliance_name(catalog, candidate.appliance())
            ))
        })
        .collect();
    if !removed.is_empty() {
        writeln!(out, "Removed:")?;
        for line in removed {
            writeln!(out, "  {line}")?;
        }
    }
    Ok(())
}

fn appliance_name(catalog: &dyn ContentCatalog, id: ApplianceId) -> String {
    catalog
        .appliance(id)
        .filter(|appliance| !appliance.name.is_empty())
        .map_or_else(|| id.to_string(), |appliance| appliance.name.clone())
}

fn request_label(request: &ShopRequest) -> String {
    if request.is_decor() {
        return "decor".to_owned();
    }
    let tags: Vec<String> = request
        .tags()
        .iter()
        .map(|tag| format!("{tag:?}").to_lowercase())
        .collect();
    tags.join("/")
}
