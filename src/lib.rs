pub mod api;
pub mod models;
pub mod registry;
pub mod sandbox;
pub mod server;

mod extractors;
mod utils;
