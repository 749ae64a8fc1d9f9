//! PRACH (Physical Random Access Channel) Preamble Generation
//!
//! Generates a short-sequence PRACH preamble according to 3GPP TS 38.211
//! section 6.3.3 and places it in a full radio frame of baseband samples.

pub mod assembler;
pub mod config;
pub mod frame;
pub mod mapper;
pub mod selector;
pub mod sequence;
pub mod transform;

pub use config::{IfftScaling, PrachConfig, PrachOccasion, PrachPlacement, TransformBackend};
pub use mapper::SpectralMapper;
pub use selector::{FixedSelector, PreambleSelector, SeededRandomSelector};
pub use sequence::{PreambleSet, SequenceGenerator};
pub use transform::{create_transformer, RustFftTransformer, TimeDomainTransformer};

use crate::PhyError;
use common::types::PreambleIndex;
use num_complex::Complex32;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// End-to-end PRACH frame generator
pub struct PrachGenerator {
    /// Generation parameters
    config: PrachConfig,
    /// Zadoff-Chu sequence generator
    sequence_generator: SequenceGenerator,
    /// Frequency-domain mapper
    mapper: SpectralMapper,
    /// IFFT backend
    transformer: Box<dyn TimeDomainTransformer>,
    /// Preambles, built on first use
    preambles: OnceLock<Arc<PreambleSet>>,
    /// Start of the PRACH block in the frame buffer
    time_offset: usize,
}

impl PrachGenerator {
    /// Create a generator using the configured transform backend
    pub fn new(config: PrachConfig) -> Result<Self, PhyError> {
        let transformer = create_transformer(config.backend, config.fft_size, config.scaling)?;
        Self::with_transformer(config, transformer)
    }

    /// Create a generator with a caller-supplied transform backend
    pub fn with_transformer(
        config: PrachConfig,
        transformer: Box<dyn TimeDomainTransformer>,
    ) -> Result<Self, PhyError> {
        let sequence_generator = SequenceGenerator::new(&config)?;

        if transformer.size() != config.fft_size {
            return Err(PhyError::InvalidConfiguration(format!(
                "Transformer size {} does not match FFT size {}",
                transformer.size(), config.fft_size
            )));
        }

        let time_offset = frame::compute_time_offset(&config)?;
        let frame_length = config.frame_duration_samples();
        let fits = time_offset
            .checked_add(config.assembled_length())
            .is_some_and(|end| end <= frame_length);
        if !fits {
            return Err(PhyError::OutOfRange {
                what: "Frame placement",
                start: i64::try_from(time_offset).unwrap_or(i64::MAX),
                len: config.assembled_length(),
                bound: frame_length,
            });
        }

        info!(
            "PRACH generator: {} roots x {} shifts, {} RBs, CP {}, {} repetitions, offset {} of {} samples",
            config.i_length(), config.card_v(), config.resource_block_count,
            config.cyclic_prefix_length, config.repeat_count, time_offset, frame_length
        );

        Ok(Self {
            mapper: SpectralMapper::new(config.fft_size),
            sequence_generator,
            transformer,
            preambles: OnceLock::new(),
            time_offset,
            config,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &PrachConfig {
        &self.config
    }

    /// Sequence generator in use
    pub fn sequence_generator(&self) -> &SequenceGenerator {
        &self.sequence_generator
    }

    /// Start of the PRACH block inside the frame buffer
    pub fn time_offset(&self) -> usize {
        self.time_offset
    }

    /// Frame buffer length in samples
    pub fn frame_duration_samples(&self) -> usize {
        self.config.frame_duration_samples()
    }

    /// The shared preamble set, generated on first access
    pub fn preamble_set(&self) -> Arc<PreambleSet> {
        self.preambles
            .get_or_init(|| Arc::new(self.sequence_generator.generate_all_preambles()))
            .clone()
    }

    fn validate_index(&self, preamble_index: i64) -> Result<PreambleIndex, PhyError> {
        PreambleIndex::new(preamble_index)
            .filter(|index| index.as_usize() < self.config.num_preambles())
            .ok_or_else(|| PhyError::InvalidArgument(format!(
                "Preamble index {} outside [0, {})",
                preamble_index, self.config.num_preambles()
            )))
    }

    /// Frequency grid of the selected preamble, reordered for the IFFT
    pub fn prepare_grid(&self, preamble_index: i64) -> Result<Vec<Complex32>, PhyError> {
        let index = self.validate_index(preamble_index)?;
        let preambles = self.preamble_set();
        let sequence = preambles.get(index.as_usize()).ok_or_else(|| {
            PhyError::InvalidArgument(format!("Preamble {} was not generated", index.0))
        })?;

        self.mapper.map(sequence, self.config.frequency_offset, self.config.resource_block_count)
    }

    /// One time-domain PRACH symbol of the selected preamble
    pub fn time_domain_block(&self, preamble_index: i64) -> Result<Vec<Complex32>, PhyError> {
        let grid = self.prepare_grid(preamble_index)?;
        self.transformer.inverse(&grid)
    }

    /// CP followed by the repeated PRACH symbols
    pub fn assembled_block(&self, preamble_index: i64) -> Result<Vec<Complex32>, PhyError> {
        let block = self.time_domain_block(preamble_index)?;
        assembler::build_block(&block, self.config.cyclic_prefix_length, self.config.repeat_count)
    }

    /// Full frame buffer carrying the selected preamble
    pub fn generate_preamble(&self, preamble_index: i64) -> Result<Vec<Complex32>, PhyError> {
        let index = self.validate_index(preamble_index)?;

        let frame_index = self.config.placement.frame_index as u32;
        if !self.config.occasion.is_prach_frame(frame_index) {
            warn!(
                "Frame {} is not a PRACH frame for x={}, y={}",
                frame_index, self.config.occasion.frame_period_x, self.config.occasion.frame_offset_y
            );
        }

        let block = self.assembled_block(preamble_index)?;
        let offset = i64::try_from(self.time_offset).map_err(|_| PhyError::OutOfRange {
            what: "Frame placement",
            start: i64::MAX,
            len: block.len(),
            bound: self.frame_duration_samples(),
        })?;
        let frame = frame::place_in_frame(&block, self.frame_duration_samples(), offset)?;

        debug!(
            "Generated preamble {} ({:?}): {} samples at offset {} in a {} sample frame",
            index.0,
            self.preamble_set().origin(index.as_usize()),
            block.len(),
            self.time_offset,
            frame.len()
        );
        Ok(frame)
    }

    /// Draw the preamble index from `selector`, then generate
    pub fn generate_with_selector(
        &self,
        selector: &mut dyn PreambleSelector,
    ) -> Result<(i64, Vec<Complex32>), PhyError> {
        let index = selector.select(self.config.num_preambles());
        let frame = self.generate_preamble(index)?;
        Ok((index, frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::utils::count_nonzero;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    const GOLDEN_OFFSET: usize = 9 * 30720 + 15360 + 2208;
    const GOLDEN_BLOCK_LEN: usize = 468 + 12 * 1024;

    #[test]
    fn test_golden_frame_layout() {
        let generator = PrachGenerator::new(PrachConfig::default()).unwrap();
        assert_eq!(generator.time_offset(), GOLDEN_OFFSET);

        let frame = generator.generate_preamble(0).unwrap();
        assert_eq!(frame.len(), 307200);

        let zero = Complex32::new(0.0, 0.0);
        assert!(frame[..GOLDEN_OFFSET].iter().all(|s| *s == zero));
        assert!(frame[GOLDEN_OFFSET + GOLDEN_BLOCK_LEN..].iter().all(|s| *s == zero));

        let block = generator.assembled_block(0).unwrap();
        assert_eq!(block.len(), GOLDEN_BLOCK_LEN);
        assert_eq!(frame[GOLDEN_OFFSET..GOLDEN_OFFSET + GOLDEN_BLOCK_LEN], block[..]);
        assert!(count_nonzero(&frame) > GOLDEN_BLOCK_LEN / 2);
    }

    /// Time sample k of preamble 0 (u = 710, v = 0) from the closed form:
    /// ZC root, length-139 DFT, then bins 736.. of an unnormalized 1024-point IDFT
    fn closed_form_sample(k: usize) -> Complex64 {
        let zc: Vec<Complex64> = (0..139u64)
            .map(|i| Complex64::from_polar(1.0, -PI * ((710 * i * (i + 1)) % 278) as f64 / 139.0))
            .collect();
        (0..139u64)
            .map(|n| {
                let y: Complex64 = (0..139u64)
                    .map(|m| zc[m as usize] * Complex64::from_polar(1.0, -2.0 * PI * ((m * n) % 139) as f64 / 139.0))
                    .sum();
                y * Complex64::from_polar(1.0, 2.0 * PI * (((736 + n) * k as u64) % 1024) as f64 / 1024.0)
            })
            .sum()
    }

    fn assert_sample(actual: Complex32, expected: Complex64) {
        let error = ((actual.re as f64 - expected.re).powi(2) + (actual.im as f64 - expected.im).powi(2)).sqrt();
        assert!(error < 1e-2, "sample {} differs from {}", actual, expected);
    }

    #[test]
    fn test_golden_frame_samples() {
        let generator = PrachGenerator::new(PrachConfig::default()).unwrap();
        let frame = generator.generate_preamble(0).unwrap();

        // CP starts 468 samples before the end of the 1024-sample symbol
        assert_sample(frame[GOLDEN_OFFSET], closed_form_sample(1024 - 468));
        assert_sample(frame[GOLDEN_OFFSET + 468], closed_form_sample(0));
        assert_sample(frame[GOLDEN_OFFSET + 469], closed_form_sample(1));
        assert_sample(frame[GOLDEN_OFFSET + 468 + 11 * 1024 + 100], closed_form_sample(100));

        // Pinned values
        assert_sample(frame[GOLDEN_OFFSET], Complex64::new(-129.41835, 98.63963));
        assert_sample(frame[GOLDEN_OFFSET + 468], Complex64::new(139.0, 0.0));
        assert_sample(frame[GOLDEN_OFFSET + 469], Complex64::new(40.04868, -141.00387));
        assert_sample(frame[GOLDEN_OFFSET + 468 + 100], Complex64::new(-23.14317, 149.30758));
    }

    #[test]
    fn test_golden_frame_is_deterministic() {
        let a = PrachGenerator::new(PrachConfig::default()).unwrap();
        let b = PrachGenerator::new(PrachConfig::default()).unwrap();
        assert_eq!(a.generate_preamble(0).unwrap(), b.generate_preamble(0).unwrap());
    }

    #[test]
    fn test_grid_holds_selected_preamble() {
        let generator = PrachGenerator::new(PrachConfig::default()).unwrap();
        let grid = generator.prepare_grid(5).unwrap();
        let set = generator.preamble_set();
        let sequence = set.get(5).unwrap();

        // Bin 224 of the centred grid lands on 224 + 512 after the half swap
        assert_eq!(grid[736..736 + 139], sequence[..]);
        assert_eq!(count_nonzero(&grid), 139);
    }

    #[test]
    fn test_time_block_energy() {
        // Parseval: sum |x|^2 = N * sum |X|^2 for the unnormalized IFFT
        let generator = PrachGenerator::new(PrachConfig::default()).unwrap();
        let block = generator.time_domain_block(0).unwrap();
        assert_eq!(block.len(), 1024);

        let time_energy: f64 = block.iter().map(|s| s.norm_sqr() as f64).sum();
        let freq_energy = 1024.0 * 139.0 * 139.0;
        assert!((time_energy / freq_energy - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_normalized_scaling() {
        let config = PrachConfig { scaling: IfftScaling::InverseN, ..Default::default() };
        let normalized = PrachGenerator::new(config).unwrap().time_domain_block(0).unwrap();
        let raw = PrachGenerator::new(PrachConfig::default()).unwrap().time_domain_block(0).unwrap();

        for (n, r) in normalized.iter().zip(&raw) {
            assert!((*n * 1024.0 - *r).norm() < 1e-2);
        }
    }

    #[test]
    fn test_preamble_index_bounds() {
        let generator = PrachGenerator::new(PrachConfig::default()).unwrap();
        assert!(matches!(generator.generate_preamble(64), Err(PhyError::InvalidArgument(_))));
        assert!(matches!(generator.generate_preamble(-1), Err(PhyError::InvalidArgument(_))));
        assert!(generator.generate_preamble(63).is_ok());
    }

    #[test]
    fn test_preamble_set_is_shared() {
        let generator = PrachGenerator::new(PrachConfig::default()).unwrap();
        let a = generator.preamble_set();
        let b = generator.preamble_set();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_generate_with_selector() {
        let generator = PrachGenerator::new(PrachConfig::default()).unwrap();

        let (index, frame) = generator.generate_with_selector(&mut FixedSelector(3)).unwrap();
        assert_eq!(index, 3);
        assert_eq!(frame, generator.generate_preamble(3).unwrap());

        let (first, _) = generator.generate_with_selector(&mut SeededRandomSelector::new(7)).unwrap();
        let (second, _) = generator.generate_with_selector(&mut SeededRandomSelector::new(7)).unwrap();
        assert_eq!(first, second);

        assert!(matches!(
            generator.generate_with_selector(&mut FixedSelector(99)),
            Err(PhyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_frame_overflow_is_rejected() {
        let mut config = PrachConfig::default();
        config.placement.slot_index = 19;
        assert!(matches!(PrachGenerator::new(config), Err(PhyError::OutOfRange { .. })));
    }

    #[test]
    fn test_extreme_placement_is_rejected() {
        let mut config = PrachConfig::default();
        config.placement.frame_index = usize::MAX / 1000;
        assert!(matches!(PrachGenerator::new(config), Err(PhyError::OutOfRange { .. })));

        let config = PrachConfig { repeat_count: usize::MAX, ..Default::default() };
        assert!(matches!(PrachGenerator::new(config), Err(PhyError::InvalidConfiguration(_))));

        let mut config = PrachConfig::default();
        config.placement.starting_symbol = 20;
        assert!(matches!(PrachGenerator::new(config), Err(PhyError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_frequency_offset_out_of_grid() {
        let config = PrachConfig { frequency_offset: 700, ..Default::default() };
        let generator = PrachGenerator::new(config).unwrap();
        assert!(matches!(generator.generate_preamble(0), Err(PhyError::OutOfRange { .. })));

        for frequency_offset in [i64::MAX, i64::MIN] {
            let config = PrachConfig { frequency_offset, ..Default::default() };
            let generator = PrachGenerator::new(config).unwrap();
            assert!(matches!(generator.generate_preamble(0), Err(PhyError::OutOfRange { .. })));
        }
    }

    #[test]
    fn test_transformer_size_mismatch() {
        let transformer = Box::new(RustFftTransformer::new(512, IfftScaling::None).unwrap());
        assert!(matches!(
            PrachGenerator::with_transformer(PrachConfig::default(), transformer),
            Err(PhyError::InvalidConfiguration(_))
        ));
    }
}
