pub mod api;
pub mod config;
pub mod database_ops;
pub mod error;
pub mod ingest;
pub mod models;
pub mod normalization;

pub mod util {
    pub mod env;
    pub mod logging;
}
