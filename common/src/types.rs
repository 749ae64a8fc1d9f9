//! Common Types for the PRACH Generator
//! 
//! Defines fundamental types shared by the PHY library and the command-line tool

use serde::{Deserialize, Serialize};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

pub use num_complex::Complex32;

/// Number of contention-based preambles per PRACH occasion
pub const NUM_PREAMBLES: usize = 64;

/// Preamble Index (0-63)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PreambleIndex(pub u8);

impl PreambleIndex {
    /// Maximum valid preamble index
    pub const MAX: u8 = (NUM_PREAMBLES - 1) as u8;
    
    /// Create a new preamble index with validation
    pub fn new(value: i64) -> Option<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }
    
    /// Position inside the preamble set
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// Subcarrier spacing values in kHz
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive, Serialize, Deserialize)]
pub enum SubcarrierSpacing {
    /// 15 kHz
    Scs15 = 15,
    /// 30 kHz
    Scs30 = 30,
    /// 60 kHz
    Scs60 = 60,
    /// 120 kHz
    Scs120 = 120,
}

impl SubcarrierSpacing {
    /// Parse from a kHz value
    pub fn from_khz(khz: u32) -> Option<Self> {
        Self::from_u32(khz)
    }
    
    /// Spacing in kHz
    pub fn khz(&self) -> u32 {
        self.to_u32().unwrap_or(15)
    }
    
    /// Numerology index mu (15 kHz * 2^mu)
    pub fn numerology(&self) -> u32 {
        (self.khz() / 15).trailing_zeros()
    }
    
    /// Slots in one 1 ms subframe
    pub fn slots_per_subframe(&self) -> usize {
        1 << self.numerology()
    }
}
