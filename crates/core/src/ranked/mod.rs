#![forbid(unsafe_code)]

mod manager;
mod port;
mod types;

pub use manager::*;
pub use port::*;
pub use types::*;
