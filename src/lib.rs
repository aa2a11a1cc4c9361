//! Calibrates coalescent-simulation priors from an observed genome,
//! generates train/validation/test corpora against them, and dispatches
//! training of a per-window recombination-rate model.

pub mod calibrate;
pub mod cli;
pub mod collab;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod sim;
pub mod train;
pub mod types;

pub use error::{Result, RhonetError};
