use serde::Serialize;

use crate::models::{BaseUnit, FoodDefinition, MeasureDefinition, MeasureKind, Nutrients};

/// Totals for a (food, measure, amount) triple, with enough snapshot data to
/// become a log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub food_id: String,
    pub food_name: String,
    pub measure_id: String,
    pub measure_label: String,
    pub measure_kind: MeasureKind,
    pub amount: f64,
    pub base_amount: f64,
    pub base_unit: BaseUnit,
    pub per_base_unit: Nutrients,
    pub totals: Nutrients,
}

/// Convert `amount` of `measure` into base units and multiply through the
/// food's per-base-unit densities.
///
/// Returns `None` for a non-finite or non-positive amount: there is nothing to
/// preview, which is not the same as a zero total.
#[must_use]
pub fn compute_preview(
    food: &FoodDefinition,
    measure: &MeasureDefinition,
    amount: f64,
) -> Option<Preview> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    let base_amount = amount * measure.base_per_measure;
    Some(Preview {
        food_id: food.id.clone(),
        food_name: food.name.clone(),
        measure_id: measure.id.clone(),
        measure_label: measure.label.clone(),
        measure_kind: measure.kind,
        amount,
        base_amount,
        base_unit: food.base_unit,
        per_base_unit: food.per_base_unit,
        totals: food.per_base_unit.scale(base_amount),
    })
}

/// Fixed-decimal display of an entered amount: counts as integers, weights
/// and volumes with one decimal.
#[must_use]
pub fn format_amount(kind: MeasureKind, amount: f64) -> String {
    format!("{amount:.prec$}", prec = kind.display_decimals())
}

/// The "Per 1 g: ..." line shown under a preview.
#[must_use]
pub fn per_unit_hint(preview: &Preview) -> String {
    let unit = preview.base_unit.symbol();
    let per = &preview.per_base_unit;
    format!(
        "Per 1 {unit}: {} kcal, {}P, {}F, {}C. ({:.1} {unit} total)",
        per.kcal, per.protein, per.fat, per.carbs, preview.base_amount
    )
}
