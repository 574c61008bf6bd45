use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutriter_core::history::EXPORT_FILENAME;
use nutriter_core::models::HistoryEntry;
use nutriter_core::service::NutriterService;

use super::helpers::{no_neg_zero, parse_range};

pub(crate) fn print_history_table(rows: &[&HistoryEntry]) {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "P/F/C %")]
        ratios: String,
    }

    let rows: Vec<HistoryRow> = rows
        .iter()
        .map(|e| HistoryRow {
            date: e.date.clone(),
            calories: e.calories.to_string(),
            protein: format!("{:.1}g", no_neg_zero(e.protein)),
            fat: format!("{:.1}g", no_neg_zero(e.fat)),
            carbs: format!("{:.1}g", no_neg_zero(e.carbs)),
            weight: e.weight.map_or("-".into(), |w| format!("{w:.1}")),
            ratios: format!(
                "{:.0}/{:.0}/{:.0}",
                e.protein_ratio * 100.0,
                e.fat_ratio * 100.0,
                e.carb_ratio * 100.0
            ),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn cmd_history_show(
    svc: &NutriterService,
    start: Option<String>,
    end: Option<String>,
    json: bool,
) -> Result<()> {
    let (start, end) = parse_range(start, end)?;
    let rows = svc.history_in_range(start, end);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        eprintln!("No saved days in range");
        process::exit(2);
    }

    print_history_table(&rows);
    Ok(())
}

pub(crate) async fn cmd_history_export(
    svc: &NutriterService,
    out: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let path = out.unwrap_or_else(|| PathBuf::from(EXPORT_FILENAME));
    let bytes = svc.export_history()?;
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let count = svc.history().len();
    if json {
        println!(
            "{}",
            serde_json::json!({ "path": path.display().to_string(), "records": count })
        );
    } else {
        println!("Exported {count} days to {}", path.display());
    }

    Ok(())
}

pub(crate) async fn cmd_history_import(
    svc: &mut NutriterService,
    file: &Path,
    json: bool,
) -> Result<()> {
    let raw = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let summary = svc.import_history(&raw)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Imported {} of {} records from {}",
            summary.records_kept,
            summary.records_read,
            file.display()
        );
        if summary.records_undated > 0 {
            println!(
                "  Skipped {} records without a date",
                summary.records_undated
            );
        }
        if summary.duplicates_collapsed > 0 {
            println!(
                "  Collapsed {} repeated dates (last one kept)",
                summary.duplicates_collapsed
            );
        }
        if summary.ratios_recomputed > 0 {
            println!(
                "  Recomputed macro ratios for {} days",
                summary.ratios_recomputed
            );
        }
    }

    Ok(())
}
