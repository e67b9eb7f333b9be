pub mod analytics;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod repo;
pub mod series;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
