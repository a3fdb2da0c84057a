//! Application services: caches, aggregation engines, and the reconciler.

pub mod aggregation;
pub mod classifier;
pub mod mining;
pub mod oracle;
pub mod reconciler;

pub use aggregation::AggregationEngine;
pub use classifier::{AssetClassifier, ClassifierSnapshot};
pub use mining::MiningEngine;
pub use oracle::DifficultyOracle;
pub use reconciler::{ReconcileReport, ReconcileState, Reconciler};
