//! Time-domain preamble assembly: cyclic prefix followed by repetitions

use crate::PhyError;
use num_complex::Complex32;
use tracing::trace;

/// Build `CP + repeat_count x block`, the CP being the last `cyclic_prefix_length` samples
pub fn build_block(
    time_block: &[Complex32],
    cyclic_prefix_length: usize,
    repeat_count: usize,
) -> Result<Vec<Complex32>, PhyError> {
    if cyclic_prefix_length > time_block.len() {
        return Err(PhyError::InvalidArgument(format!(
            "Cyclic prefix length {} exceeds block length {}",
            cyclic_prefix_length,
            time_block.len()
        )));
    }
    if repeat_count < 1 {
        return Err(PhyError::InvalidArgument("Repeat count must be at least 1".to_string()));
    }

    let total = repeat_count
        .checked_mul(time_block.len())
        .and_then(|len| len.checked_add(cyclic_prefix_length))
        .ok_or_else(|| PhyError::InvalidArgument(format!(
            "{} repetitions of {} samples overflow",
            repeat_count,
            time_block.len()
        )))?;
    let mut buffer = Vec::with_capacity(total);
    buffer.extend_from_slice(&time_block[time_block.len() - cyclic_prefix_length..]);
    for _ in 0..repeat_count {
        buffer.extend_from_slice(time_block);
    }

    trace!("Assembled {} samples (CP {}, {} repetitions)", buffer.len(), cyclic_prefix_length, repeat_count);
    Ok(buffer)
}
