//! Shared types for the market router.
//!
//! Liquidity sources, samples, fills, native orders and the plan output
//! types used across the sampler, optimizer and order materializer, plus
//! the exact amount arithmetic they share.

pub mod fill;
pub mod market;
pub mod math;
pub mod order;
pub mod plan;
pub mod source;

pub use fill::*;
pub use market::*;
pub use order::*;
pub use plan::*;
pub use source::*;
