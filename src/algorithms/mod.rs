pub mod activity;
pub mod closest_pair;
pub mod common;
pub mod partition;
pub mod summary;
