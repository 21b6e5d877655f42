mod config;
mod constants;
mod error;
mod order;
mod phase;
mod stats;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use order::*;
pub use phase::*;
pub use stats::*;
