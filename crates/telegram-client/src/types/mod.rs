//! Bot API request and response types.

mod send;
mod update;

pub use send::*;
pub use update::*;
