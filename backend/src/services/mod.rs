pub mod config_service;
pub mod user_service;
pub mod draw_service;
