//! Ghostfolio portfolio tracker adapter.

mod client;
mod models;

pub use client::{GhostfolioClient, DEFAULT_GHOSTFOLIO_HOST};
