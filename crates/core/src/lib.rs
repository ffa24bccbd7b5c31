// crates/core/src/lib.rs
pub mod catalog;
pub mod error;
pub mod progress;

pub use catalog::*;
pub use error::*;
pub use progress::*;
