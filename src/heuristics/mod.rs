//! Heuristics module for the TSP.
//!
//! This module exports the genetic engine, the ant colony solver and the
//! construction heuristics.

pub mod aco;
pub mod construction;
pub mod genetic;

pub use aco::*;
pub use construction::*;
pub use genetic::*;
