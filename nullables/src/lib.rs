//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the voting engine consumes (clock, reputation, stake
//! token) is abstracted behind a trait in `hive-types`. This crate provides
//! in-memory implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Expose their state for assertions after being handed to the engine
//!
//! Usage: wrap in `Arc`, keep one handle in the test, give a clone to the engine.

pub mod clock;
pub mod reputation;
pub mod token;

pub use clock::NullClock;
pub use reputation::NullReputation;
pub use token::NullToken;
