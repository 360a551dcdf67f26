pub mod app;
pub mod cli;
pub mod config;
pub mod container;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod telemetry;
