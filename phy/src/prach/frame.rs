//! Placement of the assembled preamble inside a radio frame

use super::config::PrachConfig;
use crate::PhyError;
use common::utils::time;
use num_complex::Complex32;
use tracing::trace;

/// Sample offset of the PRACH block from the start of the buffer:
/// frame start + slot start + the symbols preceding the starting symbol.
/// Fails with `OutOfRange` when the offset does not fit in `usize`.
pub fn compute_time_offset(config: &PrachConfig) -> Result<usize, PhyError> {
    let placement = &config.placement;
    let overflow = || PhyError::OutOfRange {
        what: "Time offset",
        start: i64::try_from(placement.frame_index).unwrap_or(i64::MAX),
        len: 0,
        bound: usize::MAX,
    };

    let frame_start = placement.frame_index
        .checked_mul(config.samples_per_ms)
        .ok_or_else(overflow)?;
    let slot_start = placement.slot_index
        .checked_mul(time::samples_per_slot(config.samples_per_ms, config.subcarrier_spacing))
        .ok_or_else(overflow)?;

    let computed;
    let lengths = match &placement.preceding_symbol_lengths {
        Some(lengths) => lengths.as_slice(),
        None => {
            computed = config
                .frame_timing()
                .preceding_symbol_lengths(placement.slot_index, placement.starting_symbol);
            computed.as_slice()
        }
    };
    let preceding = lengths
        .iter()
        .try_fold(0usize, |acc, &len| acc.checked_add(len))
        .ok_or_else(overflow)?;

    trace!(
        "Time offset: frame {} + slot {} + preceding symbols {}",
        frame_start, slot_start, preceding
    );
    frame_start
        .checked_add(slot_start)
        .and_then(|offset| offset.checked_add(preceding))
        .ok_or_else(overflow)
}

/// Copy `block` into a zero buffer of `frame_duration_samples` at `offset`
pub fn place_in_frame(
    block: &[Complex32],
    frame_duration_samples: usize,
    offset: i64,
) -> Result<Vec<Complex32>, PhyError> {
    let (start, end) = usize::try_from(offset)
        .ok()
        .and_then(|start| Some((start, start.checked_add(block.len())?)))
        .filter(|&(_, end)| end <= frame_duration_samples)
        .ok_or(PhyError::OutOfRange {
            what: "Frame placement",
            start: offset,
            len: block.len(),
            bound: frame_duration_samples,
        })?;

    let mut frame = vec![Complex32::new(0.0, 0.0); frame_duration_samples];
    frame[start..end].copy_from_slice(block);
    Ok(frame)
}
