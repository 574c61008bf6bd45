use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutriter_core::models::{FoodDefinition, Nutrients, parse_iso_date};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => parse_iso_date(&s).with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// A range bound: absent stays unbounded instead of meaning today.
pub(crate) fn parse_range_bound(date_str: Option<String>) -> Result<Option<NaiveDate>> {
    date_str.map(|s| parse_date(Some(s))).transpose()
}

pub(crate) fn parse_range(
    start: Option<String>,
    end: Option<String>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let start = parse_range_bound(start)?;
    let end = parse_range_bound(end)?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            bail!("Start date {s} is after end date {e}");
        }
    }
    Ok((start, end))
}

pub(crate) fn format_macros(n: &Nutrients) -> String {
    let kcal = no_neg_zero(n.kcal);
    let p = no_neg_zero(n.protein);
    let f = no_neg_zero(n.fat);
    let c = no_neg_zero(n.carbs);
    format!("{kcal:.0} kcal | P:{p:.1}g F:{f:.1}g C:{c:.1}g")
}

pub(crate) fn print_food_table(foods: &[&FoodDefinition]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Unit")]
        unit: String,
        #[tabled(rename = "kcal/100")]
        calories: String,
        #[tabled(rename = "P/100")]
        protein: String,
        #[tabled(rename = "F/100")]
        fat: String,
        #[tabled(rename = "C/100")]
        carbs: String,
        #[tabled(rename = "Measures")]
        measures: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .map(|f| {
            let per100 = f.per_base_unit.scale(100.0);
            FoodRow {
                id: f.id.clone(),
                name: truncate(&f.name, 30),
                unit: f.base_unit.symbol().to_string(),
                calories: format!("{:.0}", per100.kcal),
                protein: format!("{:.1}", per100.protein),
                fat: format!("{:.1}", per100.fat),
                carbs: format!("{:.1}", per100.carbs),
                measures: truncate(
                    &f.measures
                        .iter()
                        .map(|m| m.id.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    30,
                ),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
