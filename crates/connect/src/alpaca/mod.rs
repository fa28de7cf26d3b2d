//! Alpaca brokerage adapter.

mod client;
mod models;

pub use client::{AlpacaClient, DEFAULT_ALPACA_BASE_URL, DEFAULT_PAGE_SIZE};
pub use models::{AlpacaAccount, AlpacaActivity};
