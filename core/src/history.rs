use std::rc::Rc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Result, TrackerError};
use crate::models::{HistoryEntry, Nutrients, format_date, round_to, validate_weight};
use crate::ratios::compute_ratios;
use crate::storage::{HISTORY_KEY, Slot, Storage};

pub const EXPORT_FILENAME: &str = "history.json";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub records_read: usize,
    pub records_kept: usize,
    pub records_undated: usize,
    pub duplicates_collapsed: usize,
    pub ratios_recomputed: usize,
}

/// Date-keyed day summaries, one per date, kept sorted ascending.
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    slot: Slot,
}

impl HistoryStore {
    /// Load history from storage, repairing records the same way an import
    /// does. Anything unreadable is an empty history.
    pub fn load(storage: Rc<dyn Storage>) -> Self {
        let slot = Slot::new(storage, HISTORY_KEY);
        let entries = slot
            .read::<Vec<Value>>()
            .map(|records| normalize_records(&records).0)
            .unwrap_or_default();
        debug!(count = entries.len(), "loaded history");
        Self { entries, slot }
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, date: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.date == date)
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        !self.slot.is_degraded()
    }

    /// Insert `entry`, or replace the existing entry for its date wholesale.
    pub fn upsert(&mut self, entry: HistoryEntry) -> HistoryEntry {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.date == entry.date) {
            existing.clone_from(&entry);
        } else {
            self.entries.push(entry.clone());
        }
        sort_by_date(&mut self.entries);
        self.persist();
        entry
    }

    /// Record the tally totals as the summary for `date`, replacing whatever
    /// was saved for that date before.
    pub fn save_day(
        &mut self,
        date: NaiveDate,
        totals: &Nutrients,
        weight: Option<f64>,
    ) -> Result<HistoryEntry> {
        let weight = weight.map(rounded_weight).transpose()?;
        let mut entry = HistoryEntry {
            date: format_date(date),
            calories: finite_or_zero(totals.kcal).round() as i64,
            protein: round_finite(totals.protein, 1).unwrap_or(0.0),
            fat: round_finite(totals.fat, 1).unwrap_or(0.0),
            carbs: round_finite(totals.carbs, 1).unwrap_or(0.0),
            weight,
            protein_ratio: 0.0,
            carb_ratio: 0.0,
            fat_ratio: 0.0,
        };
        compute_ratios(&mut entry);
        debug!(date = %entry.date, calories = entry.calories, "saving day");
        Ok(self.upsert(entry))
    }

    /// Record a weigh-in for `date`, keeping any macros already saved there.
    pub fn save_weight(&mut self, date: NaiveDate, weight: f64) -> Result<HistoryEntry> {
        let weight = rounded_weight(weight)?;
        let date = format_date(date);
        let mut entry = self
            .get(&date)
            .cloned()
            .unwrap_or_else(|| HistoryEntry::empty(&date));
        entry.weight = Some(weight);
        debug!(date = %entry.date, weight, "saving weight");
        Ok(self.upsert(entry))
    }

    #[must_use]
    pub fn filter_by_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<&HistoryEntry> {
        filter_by_range(&self.entries, start, end)
    }

    /// First and last parseable dates, used as the default chart range.
    #[must_use]
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.entries.iter().filter_map(HistoryEntry::parsed_date);
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some((min, max))
    }

    /// The whole history as a pretty-printed JSON array.
    pub fn export_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| TrackerError::format(format!("Failed to export history: {e}")))
    }

    /// Replace the whole history with the records in `raw`.
    ///
    /// Fails without touching the current history when `raw` is not JSON or
    /// not a top-level array. A leading UTF-8 byte-order mark is ignored.
    /// Records without a string `date` are dropped, numeric fields are coerced
    /// and rounded, and missing ratios are derived from the macros.
    pub fn import_json(&mut self, raw: &[u8]) -> Result<ImportSummary> {
        let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
        let value: Value = serde_json::from_slice(raw)
            .map_err(|e| TrackerError::format(format!("Failed to load history: {e}")))?;
        let Value::Array(records) = value else {
            return Err(TrackerError::format(format!(
                "{EXPORT_FILENAME} must be an array"
            )));
        };

        let (entries, summary) = normalize_records(&records);
        self.entries = entries;
        self.persist();
        info!(
            kept = summary.records_kept,
            undated = summary.records_undated,
            duplicates = summary.duplicates_collapsed,
            "imported history"
        );
        Ok(summary)
    }

    fn persist(&self) {
        self.slot.write(&self.entries);
    }
}

/// Entries dated within `start..=end`. A missing bound is unbounded on that
/// side; entries whose date does not parse are skipped.
#[must_use]
pub fn filter_by_range(
    entries: &[HistoryEntry],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<&HistoryEntry> {
    entries
        .iter()
        .filter(|entry| {
            entry.parsed_date().is_some_and(|d| {
                start.is_none_or(|lo| d >= lo) && end.is_none_or(|hi| d <= hi)
            })
        })
        .collect()
}

fn sort_by_date(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| a.date.cmp(&b.date));
}

fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() { n } else { 0.0 }
}

/// `round_to`, or `None` when the input or the scaled value is not finite.
fn round_finite(n: f64, decimals: i32) -> Option<f64> {
    let rounded = round_to(n, decimals);
    rounded.is_finite().then_some(rounded)
}

fn rounded_weight(weight: f64) -> Result<f64> {
    let weight = validate_weight(weight)?;
    round_finite(weight, 1)
        .ok_or_else(|| TrackerError::validation("Enter a valid weight first."))
}

/// Loose numeric coercion for imported fields: numbers, numeric strings and
/// booleans. An empty string counts as 0; anything else is `None`.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() { 0.0 } else { s.parse().ok()? }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    n.is_finite().then_some(n)
}

fn normalize_record(record: &Map<String, Value>) -> Option<(HistoryEntry, bool)> {
    let Some(Value::String(date)) = record.get("date") else {
        return None;
    };
    let field = |name: &str| coerce_number(record.get(name)).unwrap_or(0.0);
    let rounded = |name: &str, decimals| round_finite(field(name), decimals).unwrap_or(0.0);

    let mut entry = HistoryEntry {
        date: date.clone(),
        calories: field("calories").round() as i64,
        protein: rounded("protein", 1),
        fat: rounded("fat", 1),
        carbs: rounded("carbs", 1),
        weight: coerce_number(record.get("weight")).and_then(|w| round_finite(w, 1)),
        protein_ratio: rounded("protein_ratio", 4),
        carb_ratio: rounded("carb_ratio", 4),
        fat_ratio: rounded("fat_ratio", 4),
    };

    let has_macros = entry.protein != 0.0 || entry.fat != 0.0 || entry.carbs != 0.0;
    let has_ratios =
        entry.protein_ratio != 0.0 || entry.carb_ratio != 0.0 || entry.fat_ratio != 0.0;
    let recompute = has_macros && !has_ratios;
    if recompute {
        compute_ratios(&mut entry);
    }
    Some((entry, recompute))
}

/// Clean a batch of raw records into a sorted history with one entry per
/// date; the last record for a date wins.
fn normalize_records(records: &[Value]) -> (Vec<HistoryEntry>, ImportSummary) {
    let mut summary = ImportSummary {
        records_read: records.len(),
        ..ImportSummary::default()
    };

    let mut entries: Vec<HistoryEntry> = records
        .iter()
        .filter_map(|record| {
            let normalized = record.as_object().and_then(normalize_record);
            if normalized.is_none() {
                summary.records_undated += 1;
            }
            normalized
        })
        .map(|(entry, recomputed)| {
            if recomputed {
                summary.ratios_recomputed += 1;
            }
            entry
        })
        .collect();
    sort_by_date(&mut entries);

    let entries_before_dedup = entries.len();
    let mut deduped: Vec<HistoryEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match deduped.last_mut() {
            Some(last) if last.date == entry.date => *last = entry,
            _ => deduped.push(entry),
        }
    }

    summary.records_kept = deduped.len();
    summary.duplicates_collapsed = entries_before_dedup - deduped.len();
    (deduped, summary)
}
