// Domain layer - pure models and transformations
pub mod section;
pub mod series;
pub mod stats;
