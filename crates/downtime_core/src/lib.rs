pub mod analytics;
pub mod db;
pub mod demo;
pub mod domain;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod reliability;
pub mod reports;
pub mod validate;

pub use engine::{aggregate, aggregate_week, AggregateOptions, AggregateResult};
