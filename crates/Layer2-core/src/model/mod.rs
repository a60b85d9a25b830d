//! Chain data model
//!
//! - `ids.rs` - BlockId
//! - `chain.rs` - Chain, ProcessBlock, ChainSettings

mod chain;
mod ids;

pub use chain::{Chain, ChainSettings, Params, ProcessBlock, DEFAULT_DELIMITER};
pub use ids::BlockId;
