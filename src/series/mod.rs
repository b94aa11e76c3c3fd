//! Per-category monthly grids and the train/test split.

mod grid;

pub use grid::{build_grid, MonthlyGrid, TrainTestSplit, TEST_START, TRAIN_END};
