use anyhow::Result;
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutriter_core::convert::{format_amount, per_unit_hint};
use nutriter_core::models::{LogEntry, Nutrients};
use nutriter_core::service::NutriterService;

use super::helpers::{format_macros, json_error, no_neg_zero};

pub(crate) fn format_entry_amount(entry: &LogEntry) -> String {
    let amount = format_amount(entry.measure_kind, entry.amount);
    format!("{amount} {}", entry.measure_label)
}

pub(crate) fn cmd_preview(
    svc: &NutriterService,
    food: &str,
    amount: f64,
    measure: Option<&str>,
    json: bool,
) -> Result<()> {
    let Some(preview) = svc.preview(Some(food), measure, amount)? else {
        let msg = "Amount must be a number greater than 0";
        if json {
            println!("{}", json_error(msg));
        } else {
            eprintln!("{msg}");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
    } else {
        let amount = format_amount(preview.measure_kind, preview.amount);
        println!(
            "{}: {amount} {}",
            preview.food_name, preview.measure_label
        );
        println!("  {}", format_macros(&preview.totals));
        println!("  {}", per_unit_hint(&preview));
    }

    Ok(())
}

pub(crate) fn cmd_log_add(
    svc: &mut NutriterService,
    food: &str,
    amount: f64,
    measure: Option<&str>,
    json: bool,
) -> Result<()> {
    let entry = svc.log_food(Some(food), measure, amount)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!(
            "Logged {} — {} (id: {})",
            entry.food_name,
            format_entry_amount(&entry),
            entry.id
        );
        println!("  {}", format_macros(&entry.totals));
        println!("  TOTAL: {}", format_macros(&svc.tally_totals()));
    }

    Ok(())
}

pub(crate) fn cmd_log_show(svc: &NutriterService, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct LogView<'a> {
        entries: &'a [LogEntry],
        totals: Nutrients,
    }

    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Food")]
        food: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "kcal")]
        kcal: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
    }

    let entries = svc.entries();
    let totals = svc.tally_totals();

    if json {
        let view = LogView { entries, totals };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No entries logged");
        process::exit(2);
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            id: e.id.clone(),
            food: e.food_name.clone(),
            amount: format_entry_amount(e),
            kcal: format!("{:.0}", no_neg_zero(e.totals.kcal)),
            protein: format!("{:.1}g", no_neg_zero(e.totals.protein)),
            fat: format!("{:.1}g", no_neg_zero(e.totals.fat)),
            carbs: format!("{:.1}g", no_neg_zero(e.totals.carbs)),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!("  TOTAL: {}", format_macros(&totals));

    Ok(())
}

pub(crate) fn cmd_log_remove(svc: &mut NutriterService, id: &str, json: bool) -> Result<()> {
    let removed = svc.remove_entry(id);

    if json {
        println!(
            "{}",
            serde_json::json!({ "removed": removed, "id": id, "totals": svc.tally_totals() })
        );
    } else if removed {
        println!("Removed entry {id}");
        println!("  TOTAL: {}", format_macros(&svc.tally_totals()));
    } else {
        eprintln!("No entry with id {id}");
    }

    Ok(())
}

pub(crate) fn cmd_log_clear(svc: &mut NutriterService, json: bool) -> Result<()> {
    let count = svc.entries().len();
    svc.clear_log();

    if json {
        println!("{}", serde_json::json!({ "cleared": count }));
    } else {
        println!("Cleared {count} entries");
    }

    Ok(())
}
