use crate::models::{HistoryEntry, round_to};

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

const RATIO_DECIMALS: i32 = 4;

/// Caloric share of each macro, rounded to four decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MacroRatios {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl MacroRatios {
    /// Atwater 4/4/9 split. All zero when the macros carry no calories.
    #[must_use]
    pub fn from_grams(protein: f64, fat: f64, carbs: f64) -> Self {
        let p_cal = protein * KCAL_PER_G_PROTEIN;
        let c_cal = carbs * KCAL_PER_G_CARBS;
        let f_cal = fat * KCAL_PER_G_FAT;
        let total = p_cal + c_cal + f_cal;

        if total <= 0.0 || !total.is_finite() {
            return Self::default();
        }

        Self {
            protein: round_to(p_cal / total, RATIO_DECIMALS),
            fat: round_to(f_cal / total, RATIO_DECIMALS),
            carbs: round_to(c_cal / total, RATIO_DECIMALS),
        }
    }
}

/// Recompute the ratio fields of `entry` from its macro grams.
pub fn compute_ratios(entry: &mut HistoryEntry) -> &mut HistoryEntry {
    let ratios = MacroRatios::from_grams(entry.protein, entry.fat, entry.carbs);
    entry.protein_ratio = ratios.protein;
    entry.fat_ratio = ratios.fat;
    entry.carb_ratio = ratios.carbs;
    entry
}
