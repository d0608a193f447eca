//! Core back-office logic for the brokerage.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached only through the traits in [`export::source`].
//!
//! # Modules
//!
//! - `export` - Configuration-driven tabular export pipeline
//! - `user` - Protected-user rule for user management

pub mod export;
pub mod user;
