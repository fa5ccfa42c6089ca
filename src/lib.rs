//! Workout session tracking: the in-progress workout, template loading and
//! validation against the exercise catalog, and completed-workout history.

pub mod app;
pub mod catalog;
pub mod config;
pub mod db;
pub mod fuzzy;
pub mod models;
pub mod session;
pub mod storage;
pub mod templates;
pub mod types;
pub mod utils;
pub mod validation;

pub use app::App;
pub use types::OutputFmt;
