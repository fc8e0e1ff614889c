// Application layer - use cases and collaborator traits
pub mod chart_renderer;
pub mod section_tracker;
pub mod stats_provider;
pub mod stats_service;
