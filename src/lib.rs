// Usage stats service - series normalization and section tracking
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
