//! Shared types, adapter traits, and core utilities for the Reservo platform.
//!
//! This crate contains the foundational types that are shared between the
//! server crate and all adapter implementations. Extracting these into a
//! separate crate allows adapter crates to compile in parallel with the
//! server's feature modules.

pub mod abuse_adapter;
pub mod error;
pub mod prelude;
pub mod types;

// vim: ts=4
