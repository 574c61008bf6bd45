use anyhow::Result;

use nutriter_core::service::NutriterService;

use super::helpers::parse_date;

pub(crate) fn cmd_weight(
    svc: &mut NutriterService,
    value: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let entry = svc.save_weight(date, value)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else if let Some(weight) = entry.weight {
        println!("Logged {weight:.1} for {}", entry.date);
        if entry.calories > 0 {
            println!("  Kept {} kcal already saved for that day", entry.calories);
        }
    }

    Ok(())
}
