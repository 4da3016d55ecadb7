pub mod config;
pub mod dedup;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod state;
