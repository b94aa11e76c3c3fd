//! Persistence round-trip: a reloaded registry forecasts bit-identically.

mod common;

use accident_forecast::config::TrainingConfig;
use accident_forecast::core::CategorySeries;
use accident_forecast::core::month::add_months;
use accident_forecast::models::{Forecaster, ModelRegistry};
use accident_forecast::service::ForecastService;
use accident_forecast::store::ModelStore;
use accident_forecast::training::ModelTrainer;
use chrono::NaiveDate;
use common::seasonal_count;

fn d(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap()
}

fn series(category: &str, base: f64) -> CategorySeries {
    let values = (0..48).map(|i| (add_months(d(2017, 1), i as i64).unwrap(), seasonal_count(i, base)));
    CategorySeries::from_values(category, values).unwrap()
}

/// Registry mixing both model families.
fn mixed_registry() -> ModelRegistry {
    let seasonal = ModelTrainer::new(TrainingConfig::default())
        .train_all(&[series("Alkoholunfälle", 40.0), series("Fluchtunfälle", 90.0)]);
    let plain = ModelTrainer::new(TrainingConfig::arima()).train_all(&[series("Verkehrsunfälle", 150.0)]);

    let mut registry = seasonal.registry;
    for (category, model) in plain.registry.iter() {
        registry.insert(category, model.clone());
    }
    assert_eq!(registry.len(), 3);
    registry
}

#[test]
fn reloaded_models_forecast_identically() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("registry.json"));
    let original = mixed_registry();

    store.save(&original).unwrap();
    let reloaded = store.try_load().unwrap();
    assert_eq!(reloaded, original);

    let dates = [d(2017, 6), d(2019, 12), d(2020, 1), d(2020, 6), d(2021, 5), d(2035, 11)];
    for (category, model) in original.iter() {
        let restored = reloaded.get(category).unwrap();
        assert_eq!(restored.family(), model.family());
        for date in dates {
            let before = model.forecast_at(date).unwrap();
            let after = restored.forecast_at(date).unwrap();
            assert_eq!(
                before.to_bits(),
                after.to_bits(),
                "{category} at {date}: {before} != {after}"
            );
        }
    }
}

#[test]
fn served_predictions_match_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("models/registry.json"));
    let registry = mixed_registry();

    let before = ForecastService::from_registry(registry.clone());
    store.save(&registry).unwrap();
    let after = ForecastService::startup(&store);

    for category in before.categories() {
        for (year, month) in [(2020, 1), (2021, 7), (2024, 12)] {
            assert_eq!(
                before.predict(&category, year, month),
                after.predict(&category, year, month)
            );
        }
    }
}

#[test]
fn republishing_a_reloaded_registry_is_atomic() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("registry.json"));
    store.save(&mixed_registry()).unwrap();

    let service = ForecastService::from_registry(ModelRegistry::new());
    let old = service.registry().snapshot();
    service.registry().publish(store.load());

    assert!(old.is_empty());
    assert_eq!(service.categories().len(), 3);
    assert!(service.predict("Verkehrsunfälle", 2021, 1).is_ok());
}
