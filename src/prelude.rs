//! Convenience re-exports for the most common types.

pub use crate::base::{
    config::Config,
    types::{Err, Res, Void},
};
pub use anyhow::anyhow;
pub use tracing::{debug, error, info, instrument, warn};
