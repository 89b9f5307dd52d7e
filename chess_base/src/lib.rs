//! # Base types for ferrochess
//!
//! This is an auxiliary crate for `ferrochess`, which contains the core value types and bitboard
//! helpers. It was split from the main crate, so everything declared here can be used in the build
//! script for `ferrochess` to generate attack tables.
//!
//! Normally you don't want to use this crate directly. Use `ferrochess` instead.

pub mod bitboard;
pub mod bitboard_consts;
pub mod geometry;
pub mod types;
