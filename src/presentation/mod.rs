// Presentation layer - HTTP surface and page composition
pub mod app_state;
pub mod handlers;
pub mod home_page;
