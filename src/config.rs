//! Training configuration.

use crate::models::arima::{ARIMASpec, SARIMASpec, ARIMA, SARIMA};
use crate::models::FittedModel;
use serde::{Deserialize, Serialize};

pub use crate::models::ModelFamily;

/// Hyperparameters of a training run.
///
/// Orders are fixed; no search is performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub family: ModelFamily,
    /// Non-seasonal order (p, d, q).
    pub order: (usize, usize, usize),
    /// Seasonal order (P, D, Q, s); ignored for [`ModelFamily::Arima`].
    pub seasonal_order: (usize, usize, usize, usize),
    /// Restrict coefficients to the stationary/invertible box.
    pub enforce_stationarity: bool,
    /// Fit categories on the rayon thread pool.
    pub parallel: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            family: ModelFamily::Sarima,
            order: (5, 1, 0),
            seasonal_order: (1, 1, 1, 12),
            enforce_stationarity: false,
            parallel: true,
        }
    }
}

impl TrainingConfig {
    /// Non-seasonal ARIMA(5,1,0) configuration.
    pub fn arima() -> Self {
        Self {
            family: ModelFamily::Arima,
            seasonal_order: (0, 0, 0, 0),
            ..Self::default()
        }
    }

    pub fn with_family(mut self, family: ModelFamily) -> Self {
        self.family = family;
        self
    }

    pub fn with_order(mut self, p: usize, d: usize, q: usize) -> Self {
        self.order = (p, d, q);
        self
    }

    pub fn with_seasonal_order(mut self, p: usize, d: usize, q: usize, period: usize) -> Self {
        self.seasonal_order = (p, d, q, period);
        self
    }

    pub fn with_enforce_stationarity(mut self, enforce: bool) -> Self {
        self.enforce_stationarity = enforce;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// A fresh, unfitted model for one category.
    pub fn build_model(&self) -> FittedModel {
        let (p, d, q) = self.order;
        match self.family {
            ModelFamily::Arima => ARIMA::from_spec(ARIMASpec::new(p, d, q))
                .with_enforce_stationarity(self.enforce_stationarity)
                .into(),
            ModelFamily::Sarima => SARIMA::from_spec(SARIMASpec::new(self.order, self.seasonal_order))
                .with_enforce_stationarity(self.enforce_stationarity)
                .into(),
        }
    }

    /// Human-readable order, e.g. `SARIMA(5,1,0)(1,1,1)12`.
    pub fn describe(&self) -> String {
        let (p, d, q) = self.order;
        match self.family {
            ModelFamily::Arima => format!("ARIMA({p},{d},{q})"),
            ModelFamily::Sarima => {
                let (sp, sd, sq, s) = self.seasonal_order;
                format!("SARIMA({p},{d},{q})({sp},{sd},{sq}){s}")
            }
        }
    }
}
