//! Chess moves and their text representation

mod base;

pub mod make;
pub mod uci;

pub use base::*;
pub use make::{Make, Uci, Unchecked};

pub type UciMove = uci::Move;
