pub mod config;
pub mod distance_metric;
pub mod error;
pub mod series;
