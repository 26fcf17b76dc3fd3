//! Supply-chain risk classification.
//!
//! - [`lifecycle`]: interprets distributor lifecycle text.
//! - [`scorer`]: turns a lookup outcome into a [`RiskTier`](crate::models::RiskTier).

pub mod lifecycle;
pub mod scorer;
