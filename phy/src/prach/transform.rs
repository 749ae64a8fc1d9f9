//! Inverse transform backends
//!
//! Every backend computes the unnormalized backward DFT
//! `x[k] = sum_n X[n] * exp(+j * 2 * pi * n * k / N)` and then multiplies the
//! result by the configured [`IfftScaling`] factor. Engine-specific buffer
//! layouts never leave this module.

use super::config::{IfftScaling, TransformBackend};
use crate::PhyError;
use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tracing::{debug, info};

/// Inverse DFT service of fixed size
pub trait TimeDomainTransformer: Send + Sync {
    /// Transform `grid` (natural bin order, DC at bin 0) to the time domain
    fn inverse(&self, grid: &[Complex32]) -> Result<Vec<Complex32>, PhyError>;

    /// Transform size
    fn size(&self) -> usize;

    /// Output scaling convention
    fn scaling(&self) -> IfftScaling;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

fn check_input_length(grid: &[Complex32], size: usize) -> Result<(), PhyError> {
    if grid.len() != size {
        return Err(PhyError::TransformFailure(format!(
            "Input has {} samples, transform size is {}",
            grid.len(),
            size
        )));
    }
    Ok(())
}

/// Software IFFT based on rustfft
pub struct RustFftTransformer {
    size: usize,
    scaling: IfftScaling,
    ifft: Arc<dyn Fft<f32>>,
}

impl RustFftTransformer {
    /// Plan an inverse FFT of `size` points
    pub fn new(size: usize, scaling: IfftScaling) -> Result<Self, PhyError> {
        if size == 0 {
            return Err(PhyError::TransformFailure("Transform size must be non-zero".to_string()));
        }
        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(size);

        Ok(Self { size, scaling, ifft })
    }
}

impl TimeDomainTransformer for RustFftTransformer {
    fn inverse(&self, grid: &[Complex32]) -> Result<Vec<Complex32>, PhyError> {
        check_input_length(grid, self.size)?;

        let mut buffer = grid.to_vec();
        let mut scratch = vec![Complex32::new(0.0, 0.0); self.ifft.get_inplace_scratch_len()];
        self.ifft.process_with_scratch(&mut buffer, &mut scratch);

        let scale = self.scaling.factor(self.size);
        if scale != 1.0 {
            buffer.iter_mut().for_each(|s| *s *= scale);
        }
        Ok(buffer)
    }

    fn size(&self) -> usize {
        self.size
    }

    fn scaling(&self) -> IfftScaling {
        self.scaling
    }

    fn backend_name(&self) -> &'static str {
        "Software (rustfft)"
    }
}

/// FFTW backend; plan and aligned buffers live only for the duration of one call
#[cfg(feature = "fftw")]
pub struct FftwTransformer {
    size: usize,
    scaling: IfftScaling,
}

#[cfg(feature = "fftw")]
impl FftwTransformer {
    /// Create an FFTW transformer of `size` points
    pub fn new(size: usize, scaling: IfftScaling) -> Result<Self, PhyError> {
        if size == 0 {
            return Err(PhyError::TransformFailure("Transform size must be non-zero".to_string()));
        }
        Ok(Self { size, scaling })
    }
}

#[cfg(feature = "fftw")]
impl TimeDomainTransformer for FftwTransformer {
    fn inverse(&self, grid: &[Complex32]) -> Result<Vec<Complex32>, PhyError> {
        use fftw::array::AlignedVec;
        use fftw::plan::{C2CPlan, C2CPlan32};
        use fftw::types::{Flag, Sign};

        check_input_length(grid, self.size)?;

        // Dropped on every return path, including the error ones
        let mut input = AlignedVec::new(self.size);
        let mut output = AlignedVec::new(self.size);
        let mut plan = C2CPlan32::aligned(&[self.size], Sign::Backward, Flag::ESTIMATE)
            .map_err(|e| PhyError::TransformFailure(format!("Failed to create IFFT plan: {:?}", e)))?;

        for (dst, src) in input.iter_mut().zip(grid) {
            *dst = fftw::types::c32::new(src.re, src.im);
        }

        plan.c2c(&mut input, &mut output)
            .map_err(|e| PhyError::TransformFailure(format!("IFFT failed: {:?}", e)))?;

        let scale = self.scaling.factor(self.size);
        Ok(output.iter().map(|c| Complex32::new(c.re, c.im) * scale).collect())
    }

    fn size(&self) -> usize {
        self.size
    }

    fn scaling(&self) -> IfftScaling {
        self.scaling
    }

    fn backend_name(&self) -> &'static str {
        "Software (FFTW)"
    }
}

/// Create a transformer for the requested backend, falling back to rustfft
/// when FFTW support is not compiled in
pub fn create_transformer(
    backend: TransformBackend,
    size: usize,
    scaling: IfftScaling,
) -> Result<Box<dyn TimeDomainTransformer>, PhyError> {
    let transformer: Box<dyn TimeDomainTransformer> = match backend {
        #[cfg(feature = "fftw")]
        TransformBackend::Fftw => Box::new(FftwTransformer::new(size, scaling)?),
        #[cfg(not(feature = "fftw"))]
        TransformBackend::Fftw => {
            info!("FFTW support not compiled in, falling back to rustfft");
            Box::new(RustFftTransformer::new(size, scaling)?)
        }
        TransformBackend::RustFft => Box::new(RustFftTransformer::new(size, scaling)?),
    };

    debug!("Using {} IFFT of size {} with {:?} scaling", transformer.backend_name(), size, scaling);
    Ok(transformer)
}
