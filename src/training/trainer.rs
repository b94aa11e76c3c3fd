//! Per-category fitting and hold-out evaluation.

use crate::config::TrainingConfig;
use crate::core::CategorySeries;
use crate::error::{PersistenceError, TrainingError};
use crate::models::{FittedModel, Forecaster, ModelRegistry};
use crate::series::build_grid;
use crate::store::ModelStore;
use crate::utils::calculate_metrics;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Hold-out accuracy of one category's model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryMetrics {
    pub rmse: f64,
    pub mae: f64,
    /// Number of test months compared.
    pub test_points: usize,
    pub aic: Option<f64>,
}

/// A category that produced no model, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCategory {
    pub category: String,
    pub error: TrainingError,
}

/// Result of a training run.
///
/// A run with skipped categories, or even no trained category at all, still
/// completes; callers inspect `registry` and `skipped`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingOutcome {
    pub registry: ModelRegistry,
    pub metrics: BTreeMap<String, CategoryMetrics>,
    pub skipped: Vec<SkippedCategory>,
}

impl TrainingOutcome {
    /// Category → hold-out RMSE.
    pub fn rmse_by_category(&self) -> BTreeMap<String, f64> {
        self.metrics
            .iter()
            .map(|(category, m)| (category.clone(), m.rmse))
            .collect()
    }

    /// Mean RMSE over trained categories; `None` when nothing was trained.
    pub fn mean_rmse(&self) -> Option<f64> {
        if self.metrics.is_empty() {
            return None;
        }
        let total: f64 = self.metrics.values().map(|m| m.rmse).sum();
        Some(total / self.metrics.len() as f64)
    }

    pub fn trained(&self) -> usize {
        self.registry.len()
    }
}

/// Fits one fixed-order model per category.
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train and evaluate every category.
    ///
    /// Categories are independent. A failing category is logged and listed in
    /// [`TrainingOutcome::skipped`]; it never aborts the others.
    pub fn train_all(&self, series: &[CategorySeries]) -> TrainingOutcome {
        info!(
            categories = series.len(),
            model = %self.config.describe(),
            parallel = self.config.parallel,
            "training started"
        );

        let fit = |s: &CategorySeries| (s.category().to_string(), self.train_category(s));
        let results: Vec<_> = if self.config.parallel {
            series.par_iter().map(fit).collect()
        } else {
            series.iter().map(fit).collect()
        };

        let mut outcome = TrainingOutcome::default();
        for (category, result) in results {
            match result {
                Ok((model, metrics)) => {
                    info!(
                        category = %category,
                        rmse = metrics.rmse,
                        test_points = metrics.test_points,
                        "category trained"
                    );
                    outcome.registry.insert(category.clone(), model);
                    outcome.metrics.insert(category, metrics);
                }
                Err(error) => {
                    warn!(category = %category, %error, "skipping category");
                    outcome.skipped.push(SkippedCategory { category, error });
                }
            }
        }
        outcome.skipped.sort_by(|a, b| a.category.cmp(&b.category));

        match outcome.mean_rmse() {
            Some(mean) => info!(
                trained = outcome.trained(),
                skipped = outcome.skipped.len(),
                mean_rmse = mean,
                "training finished"
            ),
            None => warn!(
                skipped = outcome.skipped.len(),
                "training finished without any trained category"
            ),
        }
        outcome
    }

    /// Fit on the training months and score against the test months.
    pub fn train_category(
        &self,
        series: &CategorySeries,
    ) -> Result<(FittedModel, CategoryMetrics), TrainingError> {
        let grid = build_grid(series)?;
        let split = grid.split();

        if split.train.is_empty() {
            return Err(TrainingError::EmptyTrain);
        }
        let dates = split.test_dates();
        let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
            return Err(TrainingError::EmptyTest);
        };

        let train = split.train_series()?;
        let mut model = self.config.build_model();
        model.fit(&train)?;
        debug!(
            category = series.category(),
            train_points = train.len(),
            filled = grid.filled(),
            "model fitted"
        );

        // Forecast the full test span, then keep only the observed test months.
        let span = model.predict_range(first, last)?;
        let predicted = span.select(&dates).ok_or_else(|| {
            TrainingError::Evaluation(format!("forecast does not cover {first}..{last}"))
        })?;
        if predicted.iter().any(|v| !v.is_finite()) {
            return Err(TrainingError::Evaluation(
                "model produced a non-finite forecast".to_string(),
            ));
        }

        let accuracy = calculate_metrics(&split.test_values(), &predicted)
            .map_err(|e| TrainingError::Evaluation(e.to_string()))?;

        let metrics = CategoryMetrics {
            rmse: accuracy.rmse,
            mae: accuracy.mae,
            test_points: dates.len(),
            aic: model.aic(),
        };
        Ok((model, metrics))
    }
}

/// Errors of [`train_and_save`].
#[derive(Debug, thiserror::Error)]
pub enum TrainAndSaveError {
    #[error("no models were trained successfully")]
    NothingTrained { outcome: TrainingOutcome },

    #[error("training succeeded but the registry could not be saved: {source}")]
    Save {
        outcome: TrainingOutcome,
        #[source]
        source: PersistenceError,
    },
}

/// Train every category and persist the registry.
///
/// Nothing is written when no category trained. A failed save is returned
/// together with the outcome; the run counts as incomplete.
pub fn train_and_save(
    config: TrainingConfig,
    store: &ModelStore,
    series: &[CategorySeries],
) -> Result<TrainingOutcome, TrainAndSaveError> {
    let outcome = ModelTrainer::new(config).train_all(series);
    if outcome.registry.is_empty() {
        return Err(TrainAndSaveError::NothingTrained { outcome });
    }
    match store.save(&outcome.registry) {
        Ok(()) => Ok(outcome),
        Err(source) => Err(TrainAndSaveError::Save { outcome, source }),
    }
}
