//! Configuration values for the preconditioners.

pub mod options;

pub use options::{CoarseCorrection, DdOptions, GenEoOptions, SplittingOptions};
