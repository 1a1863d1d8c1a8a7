// HTTP surface: CSV upload, JSON upserts, listings and the interval report

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
