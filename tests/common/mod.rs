//! Shared test infrastructure for the end-to-end suites.
#![allow(dead_code)] // Not every suite uses every helper

mod client;
mod constants;
mod fixtures;
mod server;

pub use client::TestClient;
pub use constants::*;
pub use fixtures::{fake_jpeg, MockImageHost};
pub use server::TestServer;
