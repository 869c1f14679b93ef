//! # tokanagrammar
//!
//! A token-shuffling puzzle for Java programs: tokens are taken off a working
//! program, the player puts them back, and the reassembled program is
//! compiled and run to see whether it prints what it should.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Puzzle discovery and loading
pub mod catalog;
/// Compiling reassembled programs under a timeout
pub mod compile;
/// Runtime configuration
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Text rendering of boards, bays, and catalogs
pub mod display;
/// Java parsing, tokenizing, and toolchain access
pub mod java;
/// Subprocess helpers
pub mod process;
/// Tokens, shuffles, placements, and reassembly
pub mod puzzle;
/// The game-session controller
pub mod session;
/// Utility functions for convenience
pub mod util;
