//! Table output for comparisons and merge summaries.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use branchmerge_core::diff::{BranchDiffSummary, ClassifiedDiff};
use branchmerge_core::merge::{ItemMergeStrategy, MergeContent, MergeSettings, MergeSummary};
use branchmerge_core::render::{compact_records, VerboseRecord};

use crate::style;

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Counts of a comparison.
pub fn print_diff_summary(summary: &BranchDiffSummary) {
    println!();
    println!(
        "{}",
        style::header(&format!(
            "Branch comparison: {} ↔ {}",
            summary.base_branch, summary.compare_branch
        ))
    );
    println!();
    println!("  Differences in {:<12}: {}", summary.base_branch, summary.base);
    println!("  Differences in {:<12}: {}", summary.compare_branch, summary.compare);
    println!("  Only in {:<19}: {}", summary.base_branch, summary.base_only);
    println!("  Only in {:<19}: {}", summary.compare_branch, summary.compare_only);
    println!("  Modified in both            : {}", summary.modified);
    println!();
}

/// Compact view of one module's differences.
pub fn print_compact(heading: &str, classified: &ClassifiedDiff) {
    println!("{}", style::header(heading));
    if classified.is_empty() {
        println!("  {}", style::dim("No differences"));
        println!();
        return;
    }

    let mut table = new_table();
    table.set_header(vec!["", "Title", "UID", "Type"]);
    for record in compact_records(classified) {
        table.add_row(vec![
            style::kind_cell(record.kind),
            Cell::new(&record.title),
            Cell::new(&record.uid),
            Cell::new(record.item_type),
        ]);
    }
    println!("{}", table);
    println!();
}

/// Field-level view of modified items.
pub fn print_verbose(records: &[VerboseRecord]) {
    for record in records {
        println!(
            "{} {}",
            style::header(&record.title),
            style::dim(&format!("({}, {})", record.uid, record.item_type))
        );
        if record.rows.is_empty() {
            println!("  {}", style::dim("No field changes"));
            println!();
            continue;
        }

        let mut table = new_table();
        table.set_header(vec!["", "Display Name", "Path", "Field Type"]);
        for row in &record.rows {
            table.add_row(vec![
                style::kind_cell(row.kind),
                Cell::new(&row.display_name),
                Cell::new(&row.path),
                Cell::new(&row.field_type),
            ]);
        }
        println!("{}", table);
        println!();
    }
}

fn item_strategy<'a>(strategies: &'a [ItemMergeStrategy], uid: &str) -> Option<&'a ItemMergeStrategy> {
    strategies.iter().find(|s| s.uid == uid)
}

fn print_merge_content(content: &MergeContent, item_strategies: &[ItemMergeStrategy]) {
    for (module, diff) in content {
        println!("{}", style::header(module.label()));
        if diff.is_empty() {
            println!("  {}", style::dim("Nothing to merge"));
            println!();
            continue;
        }

        let mut table = new_table();
        let mut header = vec!["", "Title", "UID"];
        if !item_strategies.is_empty() {
            header.push("Strategy");
        }
        table.set_header(header);
        for record in compact_records(diff) {
            let mut row = vec![
                style::kind_cell(record.kind),
                Cell::new(&record.title),
                Cell::new(&record.uid),
            ];
            if !item_strategies.is_empty() {
                let strategy = item_strategy(item_strategies, &record.uid)
                    .map(|s| s.merge_strategy.to_string())
                    .unwrap_or_default();
                row.push(Cell::new(strategy));
            }
            table.add_row(row);
        }
        println!("{}", table);
        println!();
    }
}

/// Summary shown before the execution choice.
pub fn print_merge_settings(settings: &MergeSettings) {
    println!();
    println!(
        "{}",
        style::header(&format!(
            "Merge summary: {} → {}",
            settings.compare_branch, settings.base_branch
        ))
    );
    if let Some(strategy) = settings.resolved {
        println!("  Strategy: {}", strategy);
    }
    println!();
    print_merge_content(&settings.merge_content, &settings.item_merge_strategies);
}

/// Summary loaded from a file.
pub fn print_loaded_summary(summary: &MergeSummary) {
    let payload = &summary.request_payload;
    println!();
    println!(
        "{}",
        style::header(&format!(
            "Merge summary: {} → {}",
            payload.compare_branch, payload.base_branch
        ))
    );
    println!("  Strategy: {}", payload.default_merge_strategy);
    if !payload.merge_comment.is_empty() {
        println!("  Comment : {}", payload.merge_comment);
    }
    println!();
    let item_strategies = payload.item_merge_strategies.as_deref().unwrap_or_default();
    print_merge_content(&summary.merge_content, item_strategies);
}
