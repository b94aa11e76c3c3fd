//! Validated point-forecast serving over a loaded registry.

use crate::core::month::month_date;
use crate::error::ServiceError;
use crate::models::{Forecaster, ModelRegistry};
use crate::store::ModelStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Category used when a request does not name one.
pub const DEFAULT_CATEGORY: &str = "Alkoholunfälle";

/// Years up to and including this one are rejected.
pub const MIN_YEAR_EXCLUSIVE: i32 = 1999;

/// Process-wide registry handle.
///
/// Readers take an `Arc` snapshot and never observe a half-built registry;
/// [`SharedRegistry::publish`] swaps in a complete replacement.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Arc<ModelRegistry>>>,
}

impl SharedRegistry {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    /// Current registry.
    pub fn snapshot(&self) -> Arc<ModelRegistry> {
        // The guarded value is a plain Arc, so a poisoned lock still holds a
        // complete registry.
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the registry; returns the previous one.
    pub fn publish(&self, registry: ModelRegistry) -> Arc<ModelRegistry> {
        let next = Arc::new(registry);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }
}

/// A single non-negative point forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointForecast {
    pub category: String,
    pub year: i32,
    pub month: u32,
    pub predicted_value: f64,
    /// Whether a negative model output was raised to zero.
    pub clamped: bool,
}

/// Serving-boundary request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default = "default_category")]
    pub category: String,
    pub year: i32,
    pub month: i64,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Serving-boundary response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub category: String,
    pub year: i32,
    pub month: u32,
    pub predicted_value: f64,
}

impl From<PointForecast> for PredictionResponse {
    fn from(forecast: PointForecast) -> Self {
        Self {
            category: forecast.category,
            year: forecast.year,
            month: forecast.month,
            predicted_value: forecast.predicted_value,
        }
    }
}

/// Answers `(category, year, month)` queries from the shared registry.
///
/// Requests are independent: a failure never changes the registry seen by
/// later requests.
#[derive(Debug, Clone, Default)]
pub struct ForecastService {
    registry: SharedRegistry,
}

impl ForecastService {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    pub fn from_registry(registry: ModelRegistry) -> Self {
        Self::new(SharedRegistry::new(registry))
    }

    /// Load the store and build a service over it.
    ///
    /// A missing or unreadable artifact yields a service with no categories.
    pub fn startup(store: &ModelStore) -> Self {
        let service = Self::from_registry(store.load());
        let registry = service.registry.snapshot();
        if registry.is_empty() {
            warn!("serving with an empty registry; every prediction will be a lookup miss");
        } else if !registry.contains(DEFAULT_CATEGORY) {
            warn!(
                default_category = DEFAULT_CATEGORY,
                "default request category has no trained model"
            );
        }
        info!(categories = registry.len(), "forecast service ready");
        service
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Categories that can be predicted, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.registry
            .snapshot()
            .categories()
            .map(str::to_string)
            .collect()
    }

    pub fn default_category_available(&self) -> bool {
        self.registry.snapshot().contains(DEFAULT_CATEGORY)
    }

    /// Point forecast for the first day of `year`-`month`.
    ///
    /// The horizon is not capped. The model rolls forward one month at a
    /// time from the end of its training data, so time and memory grow
    /// linearly with the distance to the target month.
    pub fn predict(
        &self,
        category: &str,
        year: i32,
        month: i64,
    ) -> Result<PointForecast, ServiceError> {
        let (month, date) = validate(year, month)?;

        let registry = self.registry.snapshot();
        let model = registry
            .get(category)
            .ok_or_else(|| ServiceError::UnknownCategory(category.to_string()))?;

        let failure = |cause: String| ServiceError::PredictionFailure {
            category: category.to_string(),
            date,
            cause,
        };
        let raw = model.forecast_at(date).map_err(|e| failure(e.to_string()))?;
        if !raw.is_finite() {
            return Err(failure(format!("model produced non-finite value {raw}")));
        }

        let clamped = raw < 0.0;
        let predicted_value = if clamped { 0.0 } else { raw };
        debug!(category, %date, raw, clamped, "served forecast");

        Ok(PointForecast {
            category: category.to_string(),
            year,
            month,
            predicted_value,
            clamped,
        })
    }

    pub fn handle(&self, request: &PredictionRequest) -> Result<PredictionResponse, ServiceError> {
        self.predict(&request.category, request.year, request.month)
            .map(PredictionResponse::from)
    }
}

fn validate(year: i32, month: i64) -> Result<(u32, chrono::NaiveDate), ServiceError> {
    if year <= MIN_YEAR_EXCLUSIVE {
        return Err(ServiceError::Validation(format!(
            "year must be greater than {MIN_YEAR_EXCLUSIVE}, got {year}"
        )));
    }
    let month = u32::try_from(month)
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| {
            ServiceError::Validation(format!("month must be between 1 and 12, got {month}"))
        })?;
    let date = month_date(year, month).ok_or_else(|| {
        ServiceError::Validation(format!("{year}-{month:02} is not a valid calendar month"))
    })?;
    Ok((month, date))
}
