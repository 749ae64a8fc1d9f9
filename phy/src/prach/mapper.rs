//! Frequency-domain mapping of a preamble onto the IFFT grid

use super::config::constants::SUBCARRIERS_PER_RB;
use crate::PhyError;
use num_complex::Complex32;
use tracing::trace;

/// Places preamble sequences into a zero grid of fixed size
#[derive(Debug, Clone, Copy)]
pub struct SpectralMapper {
    grid_size: usize,
}

impl SpectralMapper {
    /// Create a mapper for an IFFT of `grid_size` bins
    pub fn new(grid_size: usize) -> Self {
        Self { grid_size }
    }

    /// Grid size
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// First bin of the allocation: (N - 12 * N_RB) / 2 + offset.
    /// `None` when the arithmetic leaves the i64 range.
    pub fn start_index(&self, frequency_offset: i64, resource_block_count: usize) -> Option<i64> {
        let allocated = i64::try_from(SUBCARRIERS_PER_RB.checked_mul(resource_block_count)?).ok()?;
        let grid_size = i64::try_from(self.grid_size).ok()?;
        ((grid_size - allocated) / 2).checked_add(frequency_offset)
    }

    /// Copy `sequence` into a zero grid at the centred allocation start.
    /// Bins run from the lowest negative frequency to the highest positive one.
    pub fn place_in_grid(
        &self,
        sequence: &[Complex32],
        frequency_offset: i64,
        resource_block_count: usize,
    ) -> Result<Vec<Complex32>, PhyError> {
        let out_of_range = |start: i64| PhyError::OutOfRange {
            what: "Spectral placement",
            start,
            len: sequence.len(),
            bound: self.grid_size,
        };

        if SUBCARRIERS_PER_RB.saturating_mul(resource_block_count) > self.grid_size {
            return Err(out_of_range(frequency_offset));
        }

        let start = self
            .start_index(frequency_offset, resource_block_count)
            .ok_or_else(|| out_of_range(frequency_offset))?;
        let end = start
            .checked_add(sequence.len() as i64)
            .ok_or_else(|| out_of_range(start))?;

        if start < 0 || end > self.grid_size as i64 {
            return Err(out_of_range(start));
        }

        let mut grid = vec![Complex32::new(0.0, 0.0); self.grid_size];
        grid[start as usize..end as usize].copy_from_slice(sequence);

        trace!("Mapped {} subcarriers at bins [{}, {})", sequence.len(), start, end);
        Ok(grid)
    }

    /// Swap the two halves of the grid so DC lands on bin 0.
    /// Its own inverse for even lengths.
    pub fn reorder_for_transform(grid: &[Complex32]) -> Vec<Complex32> {
        let (low, high) = grid.split_at(grid.len() / 2);
        let mut reordered = Vec::with_capacity(grid.len());
        reordered.extend_from_slice(high);
        reordered.extend_from_slice(low);
        reordered
    }

    /// Place then reorder
    pub fn map(
        &self,
        sequence: &[Complex32],
        frequency_offset: i64,
        resource_block_count: usize,
    ) -> Result<Vec<Complex32>, PhyError> {
        let grid = self.place_in_grid(sequence, frequency_offset, resource_block_count)?;
        Ok(Self::reorder_for_transform(&grid))
    }
}
