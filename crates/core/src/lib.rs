//! Core data types for the gift marketplace watcher.

pub mod filter;
pub mod listing;
pub mod marketplace;
pub mod subscription;
pub mod ton;
pub mod user;

pub use filter::*;
pub use listing::*;
pub use marketplace::*;
pub use subscription::*;
pub use ton::*;
pub use user::*;
