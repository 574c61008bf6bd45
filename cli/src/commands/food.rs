use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutriter_core::models::FoodDefinition;
use nutriter_core::service::NutriterService;

use super::helpers::{json_error, print_food_table};

pub(crate) fn cmd_food_list(svc: &NutriterService, json: bool) -> Result<()> {
    let foods = svc.catalog().foods();

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods in catalog");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(foods)?);
    } else {
        let refs: Vec<&FoodDefinition> = foods.iter().collect();
        print_food_table(&refs);
    }

    Ok(())
}

pub(crate) fn cmd_food_show(svc: &NutriterService, id: &str, json: bool) -> Result<()> {
    let Some(food) = svc.catalog().get(id) else {
        if json {
            println!("{}", json_error(&format!("No food with id '{id}'")));
        } else {
            eprintln!("No food with id '{id}'");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(food)?);
        return Ok(());
    }

    #[derive(Tabled)]
    struct MeasureRow {
        #[tabled(rename = "Measure")]
        id: String,
        #[tabled(rename = "Label")]
        label: String,
        #[tabled(rename = "Kind")]
        kind: String,
        #[tabled(rename = "Base per measure")]
        base: String,
    }

    let unit = food.base_unit.symbol();
    let per = &food.per_base_unit;
    println!("{} ({})", food.name, food.id);
    println!(
        "  Per 1 {unit}: {} kcal, {}P, {}F, {}C",
        per.kcal, per.protein, per.fat, per.carbs
    );
    println!();

    let rows: Vec<MeasureRow> = food
        .measures
        .iter()
        .map(|m| MeasureRow {
            id: m.id.clone(),
            label: m.label.clone(),
            kind: m.kind.unit_label().to_string(),
            base: format!("{} {unit}", m.base_per_measure),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
