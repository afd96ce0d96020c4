//! HTTP surface: thin axum glue over the ledger engine. No ledger logic
//! lives here; handlers translate wire shapes to engine calls and map the
//! error taxonomy to status codes.

pub mod portfolio;

pub use portfolio::{create_router, AppState};
