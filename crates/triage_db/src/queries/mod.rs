//! Database query functions.
//!
//! Organized by domain:
//! - `owner`: Owner directory and pattern rules
//! - `team`: Teams and membership
//! - `record`: Captured errors and owner assignment

mod owner;
mod record;
mod team;

pub use owner::*;
pub use record::*;
pub use team::*;
