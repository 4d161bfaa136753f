pub mod aggregation;
pub mod api;
pub mod app;
pub mod config;
pub mod controls;
pub mod error;
pub mod feed;
pub mod observability;
pub mod store;
pub mod types;
pub mod utils;
