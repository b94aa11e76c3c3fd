//! Model training and hold-out evaluation.

mod trainer;

pub use trainer::{
    train_and_save, CategoryMetrics, ModelTrainer, SkippedCategory, TrainAndSaveError,
    TrainingOutcome,
};
