//! Common Utilities
//! 
//! Sample buffer helpers used by the generator and the command-line tool

use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_complex::Complex32;
use tracing::trace;

/// Pack complex samples as interleaved little-endian f32 (I, Q, I, Q, ...)
pub fn pack_iq_le(samples: &[Complex32]) -> Bytes {
    let mut bytes = BytesMut::with_capacity(samples.len() * 8);
    
    for s in samples {
        bytes.put_f32_le(s.re);
        bytes.put_f32_le(s.im);
    }
    
    trace!("Packed {} samples into {} bytes", samples.len(), bytes.len());
    bytes.freeze()
}

/// Unpack interleaved little-endian f32 IQ data. Trailing partial samples are ignored.
pub fn unpack_iq_le(mut data: &[u8]) -> Vec<Complex32> {
    let mut samples = Vec::with_capacity(data.len() / 8);
    
    while data.remaining() >= 8 {
        let re = data.get_f32_le();
        let im = data.get_f32_le();
        samples.push(Complex32::new(re, im));
    }
    
    samples
}

/// Mean power of a buffer (linear)
pub fn mean_power(samples: &[Complex32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.norm_sqr()).sum::<f32>() / samples.len() as f32
}

/// Convert linear power to dB, clamped for silent buffers
pub fn power_to_db(power: f32) -> f32 {
    10.0 * power.max(1e-20).log10()
}

/// Number of samples that are not exactly zero
pub fn count_nonzero(samples: &[Complex32]) -> usize {
    samples.iter().filter(|s| s.re != 0.0 || s.im != 0.0).count()
}

/// Time utilities for slot/frame sample bookkeeping
pub mod time {
    use crate::types::SubcarrierSpacing;
    
    /// Subframes in one 10 ms radio frame
    pub const SUBFRAMES_PER_FRAME: usize = 10;
    
    /// Samples in one radio frame, saturating at `usize::MAX`
    pub fn samples_per_frame(samples_per_ms: usize) -> usize {
        samples_per_ms.saturating_mul(SUBFRAMES_PER_FRAME)
    }
    
    /// Samples in one slot
    pub fn samples_per_slot(samples_per_ms: usize, scs: SubcarrierSpacing) -> usize {
        samples_per_ms / scs.slots_per_subframe()
    }
}
