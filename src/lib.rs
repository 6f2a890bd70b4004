pub mod configuration;
pub mod connectors;
pub mod console;
pub mod db;
pub mod errors;
pub mod forms;
pub mod helpers;
pub mod models;
pub mod services;
pub mod telemetry;
