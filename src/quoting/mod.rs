//! Inventory-skewed quote pricing.
//!
//! ```text
//! position ─► skew_fraction ─┐
//! mid ───────────────────────┴─► plan ─► QuotePlan { bid, ask }
//! ```

pub mod quote_planner;
pub mod skew;

pub use quote_planner::plan;
