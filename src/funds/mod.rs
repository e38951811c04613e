//! Fund data boundary
//!
//! Typed client for the external fund service plus the table state and
//! widget rankings the dashboard computes locally.

pub mod client;
pub mod table;
pub mod widgets;

pub use client::FundsApiClient;
pub use table::FundsTable;
pub use widgets::{LocalWidgets, WidgetInsights};
