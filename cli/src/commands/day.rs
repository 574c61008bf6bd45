use anyhow::Result;

use nutriter_core::models::HistoryEntry;
use nutriter_core::service::NutriterService;

use super::helpers::parse_date;

pub(crate) fn print_day(entry: &HistoryEntry) {
    let weight = entry
        .weight
        .map(|w| format!(" | {w:.1} kg"))
        .unwrap_or_default();
    println!(
        "  {}: {} kcal | P:{:.1}g F:{:.1}g C:{:.1}g{weight}",
        entry.date, entry.calories, entry.protein, entry.fat, entry.carbs
    );
    println!(
        "  Ratios: P {:.1}% F {:.1}% C {:.1}%",
        entry.protein_ratio * 100.0,
        entry.fat_ratio * 100.0,
        entry.carb_ratio * 100.0
    );
}

pub(crate) fn cmd_day_save(
    svc: &mut NutriterService,
    date: Option<String>,
    weight: Option<f64>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    if svc.entries().is_empty() {
        eprintln!("Note: the log is empty, saving a zero day for {date}");
    }
    let entry = svc.save_day(date, weight)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("Saved {}", entry.date);
        print_day(&entry);
    }

    Ok(())
}
