use std::iter::Sum;
use std::ops::{Add, AddAssign};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calories and macro grams. Used both for per-base-unit densities and for
/// computed totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    #[serde(default)]
    pub kcal: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbs: f64,
}

impl Nutrients {
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            kcal: self.kcal * factor,
            protein: self.protein * factor,
            fat: self.fat * factor,
            carbs: self.carbs * factor,
        }
    }
}

impl Add for Nutrients {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            kcal: self.kcal + rhs.kcal,
            protein: self.protein + rhs.protein,
            fat: self.fat + rhs.fat,
            carbs: self.carbs + rhs.carbs,
        }
    }
}

impl AddAssign for Nutrients {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Nutrients> for Nutrients {
    fn sum<I: Iterator<Item = &'a Nutrients>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseUnit {
    #[default]
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "ml")]
    Milliliters,
}

impl BaseUnit {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BaseUnit::Grams => "g",
            BaseUnit::Milliliters => "ml",
        }
    }

    /// Label of the measure synthesized for foods that define none.
    #[must_use]
    pub fn default_measure_label(self) -> &'static str {
        match self {
            BaseUnit::Grams => "grams (g)",
            BaseUnit::Milliliters => "milliliters (ml)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureKind {
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "ml")]
    Milliliters,
    #[serde(rename = "unit", alias = "count")]
    Count,
}

impl From<BaseUnit> for MeasureKind {
    fn from(unit: BaseUnit) -> Self {
        match unit {
            BaseUnit::Grams => MeasureKind::Grams,
            BaseUnit::Milliliters => MeasureKind::Milliliters,
        }
    }
}

impl MeasureKind {
    #[must_use]
    pub fn unit_label(self) -> &'static str {
        match self {
            MeasureKind::Grams => "g",
            MeasureKind::Milliliters => "ml",
            MeasureKind::Count => "count",
        }
    }

    /// Counts display as whole numbers, weights and volumes with one decimal.
    #[must_use]
    pub fn display_decimals(self) -> usize {
        match self {
            MeasureKind::Count => 0,
            MeasureKind::Grams | MeasureKind::Milliliters => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDefinition {
    pub id: String,
    pub label: String,
    pub kind: MeasureKind,
    pub base_per_measure: f64,
}

/// A catalog food in canonical shape. Built by `Catalog` normalization, never
/// deserialized directly from user files.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDefinition {
    pub id: String,
    pub name: String,
    pub base_unit: BaseUnit,
    pub per_base_unit: Nutrients,
    pub measures: Vec<MeasureDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub food_id: String,
    pub food_name: String,
    pub measure_id: String,
    pub measure_label: String,
    #[serde(default = "default_kind")]
    pub measure_kind: MeasureKind,
    pub amount: f64,
    pub base_amount: f64,
    pub totals: Nutrients,
}

fn default_kind() -> MeasureKind {
    MeasureKind::Grams
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    pub calories: i64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub protein_ratio: f64,
    pub carb_ratio: f64,
    pub fat_ratio: f64,
}

impl HistoryEntry {
    /// An entry for `date` with zero macros, zero ratios and no weight.
    #[must_use]
    pub fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            calories: 0,
            protein: 0.0,
            fat: 0.0,
            carbs: 0.0,
            weight: None,
            protein_ratio: 0.0,
            carb_ratio: 0.0,
            fat_ratio: 0.0,
        }
    }

    #[must_use]
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_iso_date(&self.date)
    }
}

/// Round half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let p = 10f64.powi(decimals);
    (value * p).round() / p
}

/// Strict `YYYY-MM-DD`. Anything else, including impossible calendar dates,
/// is unparseable.
#[must_use]
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    if !bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
    {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TrackerError::validation(
            "Amount must be a number greater than 0",
        ));
    }
    Ok(amount)
}

pub fn validate_weight(weight: f64) -> Result<f64> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(TrackerError::validation("Enter a valid weight first."));
    }
    Ok(weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_decimals() {
        assert!((round_to(25.04, 1) - 25.0).abs() < f64::EPSILON);
        assert!((round_to(0.123_456, 4) - 0.1235).abs() < f64::EPSILON);
        assert!((round_to(119.6, 0) - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_round_to_half_away_from_zero() {
        assert!((round_to(2.5, 0) - 3.0).abs() < f64::EPSILON);
        assert!((round_to(-2.5, 0) + 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_iso_date_valid() {
        assert_eq!(
            parse_iso_date("2024-01-15"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn test_parse_iso_date_rejects_loose_formats() {
        assert!(parse_iso_date("2024-1-15").is_none());
        assert!(parse_iso_date("2024/01/15").is_none());
        assert!(parse_iso_date("2024-01").is_none());
        assert!(parse_iso_date("").is_none());
        assert!(parse_iso_date("abcd-ef-gh").is_none());
        assert!(parse_iso_date("2024-02-30").is_none());
        assert!(parse_iso_date("+024-01-15").is_none());
    }

    #[test]
    fn test_nutrients_sum_and_scale() {
        let a = Nutrients {
            kcal: 100.0,
            protein: 10.0,
            fat: 5.0,
            carbs: 2.0,
        };
        let total: Nutrients = [a, a.scale(2.0)].iter().sum();
        assert!((total.kcal - 300.0).abs() < f64::EPSILON);
        assert!((total.protein - 30.0).abs() < f64::EPSILON);
        assert!((total.fat - 15.0).abs() < f64::EPSILON);
        assert!((total.carbs - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_measure_kind_serde_names() {
        assert_eq!(serde_json::to_string(&MeasureKind::Count).unwrap(), "\"unit\"");
        let kind: MeasureKind = serde_json::from_str("\"count\"").unwrap();
        assert_eq!(kind, MeasureKind::Count);
        let kind: MeasureKind = serde_json::from_str("\"ml\"").unwrap();
        assert_eq!(kind, MeasureKind::Milliliters);
    }

    #[test]
    fn test_history_entry_omits_absent_weight() {
        let json = serde_json::to_value(HistoryEntry::empty("2024-01-01")).unwrap();
        assert!(json.get("weight").is_none());
        assert_eq!(json["calories"], 0);
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(1.5).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-3.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_weight() {
        assert!(validate_weight(80.2).is_ok());
        assert!(validate_weight(0.0).is_err());
        assert!(validate_weight(f64::NAN).is_err());
    }
}
