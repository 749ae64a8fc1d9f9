//! PRACH Physical Layer Library
//! 
//! This crate generates 5G NR PRACH preamble frames according to 3GPP TS 38.211.

pub mod frame_structure;
pub mod prach;

use thiserror::Error;

pub use prach::{PrachConfig, PrachGenerator, PreambleSet};

/// Errors raised by the PRACH generation pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhyError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    
    #[error("{what} out of range: start {start}, length {len}, bound {bound}")]
    OutOfRange {
        what: &'static str,
        start: i64,
        len: usize,
        bound: usize,
    },
    
    #[error("Transform failure: {0}")]
    TransformFailure(String),
    
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
