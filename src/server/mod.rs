pub mod config;
pub mod error;
mod http_layers;
mod search;
pub mod server;
pub mod session;
pub mod state;
mod views;

pub use config::ServerConfig;
pub use http_layers::*;
#[allow(unused_imports)] // Used by main.rs
pub use server::{make_app, run_server};
