pub mod classify;
pub mod height;
pub mod pipeline;
pub mod raw;
pub mod summary;
pub mod tables;

pub use classify::{ClassificationStats, FeatureClassifier};
pub use pipeline::GeoPipeline;
pub use summary::summarize;
