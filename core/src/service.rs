use std::path::Path;
use std::rc::Rc;

use chrono::NaiveDate;
use tracing::debug;

use crate::catalog::Catalog;
use crate::chart::{ChartData, SeriesKey, project};
use crate::convert::{Preview, compute_preview};
use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::history::{HistoryStore, ImportSummary};
use crate::models::{HistoryEntry, LogEntry, Nutrients, validate_amount};
use crate::storage::Storage;
use crate::tally::TallyStore;

/// Single entry point for front ends: owns the catalog, the tally and the
/// history, which share one storage handle.
pub struct NutriterService {
    catalog: Catalog,
    tally: TallyStore,
    history: HistoryStore,
}

impl NutriterService {
    pub fn new(db_path: impl AsRef<Path>, catalog: Catalog) -> Result<Self> {
        let db = Database::open(db_path.as_ref())?;
        Ok(Self::with_storage(Rc::new(db), catalog))
    }

    pub fn new_in_memory(catalog: Catalog) -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_storage(Rc::new(db), catalog))
    }

    pub fn with_storage(storage: Rc<dyn Storage>, catalog: Catalog) -> Self {
        debug!(foods = catalog.len(), "starting service");
        Self {
            catalog,
            tally: TallyStore::load(storage.clone()),
            history: HistoryStore::load(storage),
        }
    }

    /// False once any store has fallen back to in-memory operation.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.tally.is_persistent() && self.history.is_persistent()
    }

    // --- Catalog and conversion ---

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Preview `amount` of a food in one of its measures. Unknown ids fall back
    /// to the first food or measure; an unusable amount is `Ok(None)`.
    pub fn preview(
        &self,
        food_id: Option<&str>,
        measure_id: Option<&str>,
        amount: f64,
    ) -> Result<Option<Preview>> {
        let food = self
            .catalog
            .food(food_id)
            .ok_or(TrackerError::EmptyCatalog)?;
        let measure = food.measure(measure_id).ok_or(TrackerError::EmptyCatalog)?;
        Ok(compute_preview(food, measure, amount))
    }

    // --- Tally ---

    pub fn log_food(
        &mut self,
        food_id: Option<&str>,
        measure_id: Option<&str>,
        amount: f64,
    ) -> Result<LogEntry> {
        if self.catalog.is_empty() {
            return Err(TrackerError::EmptyCatalog);
        }
        let amount = validate_amount(amount)?;
        let preview = self
            .preview(food_id, measure_id, amount)?
            .ok_or_else(|| TrackerError::validation("Amount must be a number greater than 0"))?;
        Ok(self.tally.add(&preview))
    }

    pub fn remove_entry(&mut self, id: &str) -> bool {
        self.tally.remove(id)
    }

    pub fn clear_log(&mut self) {
        self.tally.clear();
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        self.tally.entries()
    }

    #[must_use]
    pub fn tally_totals(&self) -> Nutrients {
        self.tally.totals()
    }

    // --- History ---

    /// Save the current tally totals as the summary for `date`.
    pub fn save_day(&mut self, date: NaiveDate, weight: Option<f64>) -> Result<HistoryEntry> {
        let totals = self.tally.totals();
        self.history.save_day(date, &totals, weight)
    }

    pub fn save_weight(&mut self, date: NaiveDate, weight: f64) -> Result<HistoryEntry> {
        self.history.save_weight(date, weight)
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    #[must_use]
    pub fn history_in_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<&HistoryEntry> {
        self.history.filter_by_range(start, end)
    }

    /// First and last saved dates.
    #[must_use]
    pub fn default_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.history.date_span()
    }

    pub fn export_history(&self) -> Result<Vec<u8>> {
        self.history.export_json()
    }

    pub fn import_history(&mut self, raw: &[u8]) -> Result<ImportSummary> {
        self.history.import_json(raw)
    }

    #[must_use]
    pub fn chart(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        keys: &[SeriesKey],
    ) -> ChartData {
        project(self.history.entries(), start, end, keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOODS: &str = r#"[
        {
            "id": "chicken_breast",
            "name": "Chicken Breast",
            "unit": "g",
            "perUnit": { "kcal": 1.071429, "protein": 0.223214, "fat": 0.017857, "carbs": 0.0 }
        },
        {
            "id": "egg_whole",
            "name": "Egg",
            "baseUnit": "g",
            "perBaseUnit": { "kcal": 1.428571, "protein": 0.125, "fat": 0.089286, "carbs": 0.0 },
            "measures": [
                { "id": "g", "label": "grams (g)", "kind": "g", "basePerMeasure": 1 },
                { "id": "egg", "label": "egg (56 g)", "kind": "unit", "basePerMeasure": 56 }
            ]
        }
    ]"#;

    fn service() -> NutriterService {
        NutriterService::new_in_memory(Catalog::from_json(FOODS).unwrap()).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_preview_chicken() {
        let svc = service();
        let p = svc
            .preview(Some("chicken_breast"), None, 112.0)
            .unwrap()
            .unwrap();
        assert!((p.totals.kcal - 120.0).abs() < 0.01);
        assert!((p.totals.protein - 25.0).abs() < 0.01);
        assert!((p.totals.fat - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_preview_invalid_amount_is_none() {
        let svc = service();
        assert!(svc.preview(None, None, 0.0).unwrap().is_none());
        assert!(svc.preview(None, None, f64::NAN).unwrap().is_none());
    }

    #[test]
    fn test_preview_falls_back_on_unknown_ids() {
        let svc = service();
        let p = svc
            .preview(Some("unicorn"), Some("horn"), 10.0)
            .unwrap()
            .unwrap();
        assert_eq!(p.food_id, "chicken_breast");
        assert_eq!(p.measure_id, "base");

        let p = svc.preview(Some("egg_whole"), Some("cup"), 1.0).unwrap().unwrap();
        assert_eq!(p.measure_id, "g");
    }

    #[test]
    fn test_log_food_by_count() {
        let mut svc = service();
        let entry = svc.log_food(Some("egg_whole"), Some("egg"), 2.0).unwrap();
        assert!((entry.base_amount - 112.0).abs() < f64::EPSILON);
        assert_eq!(entry.measure_label, "egg (56 g)");
        assert!((svc.tally_totals().kcal - 160.0).abs() < 0.01);
    }

    #[test]
    fn test_log_food_rejects_bad_amount() {
        let mut svc = service();
        let err = svc.log_food(Some("egg_whole"), None, -1.0).unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        assert!(svc.entries().is_empty());
    }

    #[test]
    fn test_empty_catalog_disables_logging() {
        let mut svc = NutriterService::new_in_memory(Catalog::default()).unwrap();
        assert!(matches!(
            svc.log_food(None, None, 100.0).unwrap_err(),
            TrackerError::EmptyCatalog
        ));
        assert!(matches!(
            svc.preview(None, None, 100.0).unwrap_err(),
            TrackerError::EmptyCatalog
        ));
    }

    #[test]
    fn test_save_day_from_tally() {
        let mut svc = service();
        svc.log_food(Some("chicken_breast"), None, 112.0).unwrap();
        svc.log_food(Some("egg_whole"), Some("egg"), 1.0).unwrap();

        let entry = svc.save_day(date("2024-01-01"), Some(80.0)).unwrap();
        assert_eq!(entry.calories, 200);
        assert!((entry.protein - 32.0).abs() < f64::EPSILON);
        assert_eq!(entry.weight, Some(80.0));
        let sum = entry.protein_ratio + entry.fat_ratio + entry.carb_ratio;
        assert!((sum - 1.0).abs() <= 0.001);
    }

    #[test]
    fn test_resave_day_keeps_one_entry_with_latest_totals() {
        let mut svc = service();
        svc.log_food(Some("chicken_breast"), None, 112.0).unwrap();
        svc.save_day(date("2024-01-01"), None).unwrap();

        svc.clear_log();
        svc.log_food(Some("egg_whole"), Some("egg"), 1.0).unwrap();
        svc.save_day(date("2024-01-01"), None).unwrap();

        assert_eq!(svc.history().len(), 1);
        assert_eq!(svc.history()[0].calories, 80);
    }

    #[test]
    fn test_remove_and_clear_log() {
        let mut svc = service();
        let a = svc.log_food(None, None, 100.0).unwrap();
        svc.log_food(None, None, 50.0).unwrap();
        assert!(svc.remove_entry(&a.id));
        assert!(!svc.remove_entry(&a.id));
        assert_eq!(svc.entries().len(), 1);
        svc.clear_log();
        assert_eq!(svc.tally_totals(), Nutrients::default());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nutriter.db");
        {
            let mut svc =
                NutriterService::new(&path, Catalog::from_json(FOODS).unwrap()).unwrap();
            svc.log_food(Some("egg_whole"), Some("egg"), 2.0).unwrap();
            svc.save_weight(date("2024-01-05"), 79.4).unwrap();
        }
        let svc = NutriterService::new(&path, Catalog::from_json(FOODS).unwrap()).unwrap();
        assert_eq!(svc.entries().len(), 1);
        assert!((svc.tally_totals().kcal - 160.0).abs() < 0.01);
        assert_eq!(svc.history()[0].weight, Some(79.4));
        assert!(svc.is_persistent());
    }

    #[test]
    fn test_export_import_through_service() {
        let mut svc = service();
        svc.log_food(None, None, 200.0).unwrap();
        svc.save_day(date("2024-01-02"), None).unwrap();
        svc.save_weight(date("2024-01-01"), 81.0).unwrap();
        let exported = svc.export_history().unwrap();

        let mut other = service();
        let summary = other.import_history(&exported).unwrap();
        assert_eq!(summary.records_kept, 2);
        assert_eq!(other.history(), svc.history());
        assert_eq!(
            other.default_range(),
            Some((date("2024-01-01"), date("2024-01-02")))
        );
    }

    #[test]
    fn test_chart_over_history() {
        let mut svc = service();
        svc.save_weight(date("2024-01-01"), 81.0).unwrap();
        svc.log_food(None, None, 200.0).unwrap();
        svc.save_day(date("2024-01-02"), None).unwrap();

        let data = svc.chart(None, None, &[SeriesKey::Weight, SeriesKey::Calories]);
        assert_eq!(data.labels, vec!["2024-01-01", "2024-01-02"]);
        assert_eq!(data.series[0].values, vec![Some(81.0), None]);
        assert_eq!(data.series[1].values, vec![Some(0.0), Some(214.0)]);

        let empty = svc.chart(Some(date("2030-01-01")), None, &SeriesKey::ALL);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_history_in_range() {
        let mut svc = service();
        for d in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            svc.save_weight(date(d), 80.0).unwrap();
        }
        let rows = svc.history_in_range(Some(date("2024-01-02")), Some(date("2024-01-02")));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2024-01-02");
    }
}
