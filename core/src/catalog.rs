use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, TrackerError};
use crate::models::{BaseUnit, FoodDefinition, MeasureDefinition, MeasureKind, Nutrients};

/// A food record as it appears in `foods.json`. Older files use `unit` and
/// `perUnit` instead of `baseUnit` and `perBaseUnit`, and most omit `measures`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFood {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    base_unit: Option<BaseUnit>,
    #[serde(default)]
    unit: Option<BaseUnit>,
    #[serde(default)]
    per_base_unit: Option<Nutrients>,
    #[serde(default)]
    per_unit: Option<Nutrients>,
    #[serde(default)]
    measures: Option<Vec<RawMeasure>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeasure {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    kind: Option<MeasureKind>,
    #[serde(default)]
    base_per_measure: Option<f64>,
}

impl RawFood {
    fn normalize(self) -> Result<FoodDefinition> {
        let base_unit = self.base_unit.or(self.unit).unwrap_or_default();
        let per_base_unit = self.per_base_unit.or(self.per_unit).unwrap_or_default();

        let measures = match self.measures {
            Some(raw) if !raw.is_empty() => raw
                .into_iter()
                .map(|m| m.normalize(&self.id, base_unit))
                .collect::<Result<Vec<_>>>()?,
            _ => vec![base_measure(base_unit)],
        };

        let name = if self.name.trim().is_empty() {
            self.id.clone()
        } else {
            self.name
        };

        Ok(FoodDefinition {
            id: self.id,
            name,
            base_unit,
            per_base_unit,
            measures,
        })
    }
}

impl RawMeasure {
    fn normalize(self, food_id: &str, base_unit: BaseUnit) -> Result<MeasureDefinition> {
        let base_per_measure = self.base_per_measure.unwrap_or(1.0);
        if !base_per_measure.is_finite() || base_per_measure <= 0.0 {
            return Err(TrackerError::validation(format!(
                "Measure '{}' of food '{food_id}' must have basePerMeasure greater than 0",
                self.id
            )));
        }
        Ok(MeasureDefinition {
            label: self.label.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            kind: self.kind.unwrap_or_else(|| base_unit.into()),
            base_per_measure,
        })
    }
}

fn base_measure(base_unit: BaseUnit) -> MeasureDefinition {
    MeasureDefinition {
        id: "base".to_string(),
        label: base_unit.default_measure_label().to_string(),
        kind: base_unit.into(),
        base_per_measure: 1.0,
    }
}

/// The read-only food catalog, normalized once on the way in.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    foods: Vec<FoodDefinition>,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let records: Vec<RawFood> = serde_json::from_str(raw)
            .map_err(|e| TrackerError::format(format!("Invalid food catalog: {e}")))?;
        let foods = records
            .into_iter()
            .map(RawFood::normalize)
            .collect::<Result<Vec<_>>>()?;
        debug!(count = foods.len(), "loaded food catalog");
        Ok(Self { foods })
    }

    /// Load `foods.json`. A missing file is an empty catalog, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "food catalog not found, calculations disabled");
                Ok(Self::default())
            }
            Err(e) => Err(TrackerError::format(format!(
                "Failed to read food catalog {}: {e}",
                path.display()
            ))),
        }
    }

    #[must_use]
    pub fn foods(&self) -> &[FoodDefinition] {
        &self.foods
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.foods.len()
    }

    /// Look up a food by id, falling back to the first food. `None` only when
    /// the catalog is empty.
    #[must_use]
    pub fn food(&self, id: Option<&str>) -> Option<&FoodDefinition> {
        id.and_then(|id| self.foods.iter().find(|f| f.id == id))
            .or_else(|| self.foods.first())
    }

    /// Exact lookup without fallback.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FoodDefinition> {
        self.foods.iter().find(|f| f.id == id)
    }
}

impl FoodDefinition {
    /// Look up a measure by id, falling back to the first measure.
    #[must_use]
    pub fn measure(&self, id: Option<&str>) -> Option<&MeasureDefinition> {
        id.and_then(|id| self.measures.iter().find(|m| m.id == id))
            .or_else(|| self.measures.first())
    }
}
