//! Fitted per-category models and the registry that holds them.

use crate::core::{Forecast, MonthlySeries};
use crate::error::Result;
use crate::models::arima::{ARIMA, SARIMA};
use crate::models::Forecaster;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Supported model families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Non-seasonal ARIMA(p,d,q).
    Arima,
    /// Seasonal ARIMA(p,d,q)(P,D,Q)s.
    #[default]
    Sarima,
}

impl ModelFamily {
    /// Where artifacts of this family are written unless told otherwise.
    pub fn default_artifact_path(self) -> PathBuf {
        match self {
            ModelFamily::Arima => PathBuf::from("models/accident_predictor_arima.json"),
            ModelFamily::Sarima => PathBuf::from("models/accident_predictor_sarima.json"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelFamily::Arima => "arima",
            ModelFamily::Sarima => "sarima",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arima" => Ok(ModelFamily::Arima),
            "sarima" => Ok(ModelFamily::Sarima),
            other => Err(format!("unknown model family '{other}' (expected arima or sarima)")),
        }
    }
}

/// A fitted model of one of the supported families.
///
/// Serving code only relies on the [`Forecaster`] capability; the variant
/// tag is what makes the persisted registry self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum FittedModel {
    Arima(ARIMA),
    Sarima(SARIMA),
}

impl FittedModel {
    fn inner(&self) -> &dyn Forecaster {
        match self {
            FittedModel::Arima(m) => m,
            FittedModel::Sarima(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Forecaster {
        match self {
            FittedModel::Arima(m) => m,
            FittedModel::Sarima(m) => m,
        }
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            FittedModel::Arima(_) => ModelFamily::Arima,
            FittedModel::Sarima(_) => ModelFamily::Sarima,
        }
    }

    /// Akaike information criterion of the fit, when defined.
    pub fn aic(&self) -> Option<f64> {
        match self {
            FittedModel::Arima(m) => m.aic(),
            FittedModel::Sarima(m) => m.aic(),
        }
    }
}

impl From<ARIMA> for FittedModel {
    fn from(model: ARIMA) -> Self {
        FittedModel::Arima(model)
    }
}

impl From<SARIMA> for FittedModel {
    fn from(model: SARIMA) -> Self {
        FittedModel::Sarima(model)
    }
}

impl Forecaster for FittedModel {
    fn fit(&mut self, series: &MonthlySeries) -> Result<()> {
        self.inner_mut().fit(series)
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.inner().predict(horizon)
    }

    fn fitted_values(&self) -> Option<Vec<f64>> {
        self.inner().fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.inner().residuals()
    }

    fn training_series(&self) -> Option<&MonthlySeries> {
        self.inner().training_series()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

/// Category → fitted model mapping; the unit of persistence.
///
/// Built once by the trainer and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRegistry {
    models: BTreeMap<String, FittedModel>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the model for `category`.
    pub fn insert(&mut self, category: impl Into<String>, model: impl Into<FittedModel>) {
        self.models.insert(category.into(), model.into());
    }

    pub fn get(&self, category: &str) -> Option<&FittedModel> {
        self.models.get(category)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.models.contains_key(category)
    }

    /// Registered categories in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FittedModel)> {
        self.models.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl FromIterator<(String, FittedModel)> for ModelRegistry {
    fn from_iter<I: IntoIterator<Item = (String, FittedModel)>>(iter: I) -> Self {
        Self {
            models: iter.into_iter().collect(),
        }
    }
}
