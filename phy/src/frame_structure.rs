//! 5G NR Frame Structure
//! 
//! OFDM symbol timing according to 3GPP TS 38.211 section 5.3.1, expressed
//! in samples of the configured IFFT size.

use common::types::SubcarrierSpacing;
use tracing::trace;

/// Symbols per slot with normal cyclic prefix
pub const SYMBOLS_PER_SLOT: usize = 14;

/// Reference FFT size the CP lengths of 38.211 are defined against (2048 kappa)
const REFERENCE_FFT_SIZE: usize = 2048;

/// Normal CP length at the reference FFT size
const NORMAL_CP_REFERENCE: usize = 144;

/// Extra CP length of the first symbol in each half subframe, at 15 kHz
const LONG_CP_EXTENSION_REFERENCE: usize = 16;

/// Symbol timing for one numerology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    /// Subcarrier spacing of the carrier
    pub scs: SubcarrierSpacing,
    /// Samples per useful symbol
    pub fft_size: usize,
}

impl FrameTiming {
    /// Create frame timing
    pub fn new(scs: SubcarrierSpacing, fft_size: usize) -> Self {
        Self { scs, fft_size }
    }
    
    /// Slots in one 1 ms subframe
    pub fn slots_per_subframe(&self) -> usize {
        self.scs.slots_per_subframe()
    }
    
    /// Symbols in one 0.5 ms half subframe
    fn symbols_per_half_subframe(&self) -> usize {
        SYMBOLS_PER_SLOT * self.slots_per_subframe() / 2
    }
    
    /// Cyclic prefix length in samples of a symbol given its slot and symbol index
    pub fn cp_length(&self, slot: usize, symbol: usize) -> usize {
        let normal = self.scale_from_reference(NORMAL_CP_REFERENCE);
        let l = (slot % self.slots_per_subframe()) * SYMBOLS_PER_SLOT + symbol;
        
        if l % self.symbols_per_half_subframe() == 0 {
            let extension = self.scale_from_reference(LONG_CP_EXTENSION_REFERENCE * self.slots_per_subframe());
            normal + extension
        } else {
            normal
        }
    }
    
    /// `samples * fft_size / 2048`, widened so large FFT sizes cannot overflow
    fn scale_from_reference(&self, samples: usize) -> usize {
        (samples as u128 * self.fft_size as u128 / REFERENCE_FFT_SIZE as u128) as usize
    }
    
    /// Symbol length including the cyclic prefix
    pub fn symbol_length(&self, slot: usize, symbol: usize) -> usize {
        self.fft_size + self.cp_length(slot, symbol)
    }
    
    /// Lengths of the symbols that precede `starting_symbol` in `slot`
    pub fn preceding_symbol_lengths(&self, slot: usize, starting_symbol: usize) -> Vec<usize> {
        let lengths: Vec<usize> = (0..starting_symbol)
            .map(|symbol| self.symbol_length(slot, symbol))
            .collect();
        trace!("Symbols before {} in slot {}: {:?}", starting_symbol, slot, lengths);
        lengths
    }
    
    /// Total slot length in samples
    pub fn slot_length(&self, slot: usize) -> usize {
        (0..SYMBOLS_PER_SLOT).map(|symbol| self.symbol_length(slot, symbol)).sum()
    }
}
