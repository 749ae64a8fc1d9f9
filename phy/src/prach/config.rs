//! PRACH generation configuration
//!
//! Immutable parameters for short-sequence format B4 preambles on a
//! 30 kHz carrier sampled at 30.72 Msps.

use crate::frame_structure::{FrameTiming, SYMBOLS_PER_SLOT};
use crate::PhyError;
use common::types::{SubcarrierSpacing, NUM_PREAMBLES};
use common::utils::time;
use serde::{Deserialize, Serialize};

/// PRACH constants according to 3GPP
pub mod constants {
    /// Short sequence length (L_RA for formats A1-C2)
    pub const SHORT_SEQUENCE_LENGTH: usize = 139;
    /// Subcarriers per resource block
    pub const SUBCARRIERS_PER_RB: usize = 12;
    /// Logical root sequence table used by default
    pub const DEFAULT_ROOT_SEQUENCE_TABLE: [u32; 40] = [
        129, 710, 140, 699, 120, 719, 210, 629, 168, 671,
        84, 755, 105, 734, 93, 746, 70, 769, 60, 779,
        2, 837, 1, 838, 56, 783, 112, 727, 148, 691,
        80, 759, 42, 797, 40, 799, 35, 804, 73, 766,
    ];
}

/// Scaling applied to the raw (unnormalized) inverse transform output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfftScaling {
    /// Leave the backward transform unnormalized
    #[default]
    None,
    /// Multiply by 1/N
    InverseN,
    /// Multiply by 1/sqrt(N)
    InverseSqrtN,
}

impl IfftScaling {
    /// Linear factor for a transform of `size` points
    pub fn factor(&self, size: usize) -> f32 {
        match self {
            IfftScaling::None => 1.0,
            IfftScaling::InverseN => 1.0 / size as f32,
            IfftScaling::InverseSqrtN => 1.0 / (size as f32).sqrt(),
        }
    }
}

/// Transform engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformBackend {
    /// Pure Rust FFT
    #[default]
    RustFft,
    /// FFTW (requires the `fftw` feature)
    Fftw,
}

/// Where the preamble lands inside the radio frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrachPlacement {
    /// Frame whose samples carry the PRACH
    pub frame_index: usize,
    /// Slot inside the frame
    pub slot_index: usize,
    /// First PRACH symbol inside the slot
    pub starting_symbol: usize,
    /// Explicit lengths of the symbols before `starting_symbol`;
    /// derived from the numerology when absent
    pub preceding_symbol_lengths: Option<Vec<usize>>,
}

impl Default for PrachPlacement {
    fn default() -> Self {
        Self {
            frame_index: 9,
            slot_index: 1,
            starting_symbol: 2,
            preceding_symbol_lengths: None,
        }
    }
}

/// PRACH occasion parameters from Table 6.3.3.2-3 (configuration index 160)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrachOccasion {
    /// PRACH configuration index (0-255)
    pub config_index: u8,
    /// System frame period (x)
    pub frame_period_x: u32,
    /// System frame offset (y)
    pub frame_offset_y: u32,
    /// Number of time-domain PRACH occasions within a PRACH slot
    pub occasions_per_slot: u8,
    /// PRACH duration in symbols
    pub duration_symbols: u8,
}

impl Default for PrachOccasion {
    fn default() -> Self {
        Self {
            config_index: 160,
            frame_period_x: 1,
            frame_offset_y: 0,
            occasions_per_slot: 1,
            duration_symbols: 12,
        }
    }
}

impl PrachOccasion {
    /// True when `sfn mod x == y`
    pub fn is_prach_frame(&self, sfn: u32) -> bool {
        self.frame_period_x != 0 && sfn % self.frame_period_x == self.frame_offset_y
    }
}

/// Complete PRACH generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrachConfig {
    /// Logical root sequence table
    pub root_sequence_table: Vec<u32>,
    /// Position of the first root used inside the table
    pub root_sequence_index: usize,
    /// Zadoff-Chu length (L_RA)
    pub sequence_length: usize,
    /// Cyclic shift spacing (N_CS)
    pub cyclic_shift_spacing: usize,
    /// Frequency offset of the PRACH allocation in subcarriers
    pub frequency_offset: i64,
    /// PRACH allocation width in resource blocks
    pub resource_block_count: usize,
    /// IFFT size
    pub fft_size: usize,
    /// Cyclic prefix length N_RA_CP in samples
    pub cyclic_prefix_length: usize,
    /// Repetitions of the time-domain block
    pub repeat_count: usize,
    /// Samples in one millisecond
    pub samples_per_ms: usize,
    /// Carrier subcarrier spacing
    pub subcarrier_spacing: SubcarrierSpacing,
    /// Output scaling of the inverse transform
    pub scaling: IfftScaling,
    /// Transform engine
    pub backend: TransformBackend,
    /// Time placement
    pub placement: PrachPlacement,
    /// Occasion periodicity
    pub occasion: PrachOccasion,
}

impl Default for PrachConfig {
    fn default() -> Self {
        Self {
            root_sequence_table: constants::DEFAULT_ROOT_SEQUENCE_TABLE.to_vec(),
            root_sequence_index: 1,
            sequence_length: constants::SHORT_SEQUENCE_LENGTH,
            cyclic_shift_spacing: 69,
            frequency_offset: 0,
            resource_block_count: 48,
            fft_size: 1024,
            cyclic_prefix_length: 936 / 2,
            repeat_count: 12,
            samples_per_ms: 30720,
            subcarrier_spacing: SubcarrierSpacing::Scs30,
            scaling: IfftScaling::None,
            backend: TransformBackend::RustFft,
            placement: PrachPlacement::default(),
            occasion: PrachOccasion::default(),
        }
    }
}

impl PrachConfig {
    /// Cyclic shifts per root: floor(L_RA / N_CS)
    pub fn card_v(&self) -> usize {
        if self.cyclic_shift_spacing == 0 {
            return 0;
        }
        self.sequence_length / self.cyclic_shift_spacing
    }

    /// Roots needed to obtain all preambles: 64 / card_v
    pub fn i_length(&self) -> usize {
        match self.card_v() {
            0 => 0,
            card_v => NUM_PREAMBLES / card_v,
        }
    }

    /// Number of generated preambles
    pub fn num_preambles(&self) -> usize {
        self.card_v() * self.i_length()
    }

    /// Roots actually used, in table order
    pub fn roots_in_use(&self) -> &[u32] {
        let end = self.root_sequence_index
            .saturating_add(self.i_length())
            .min(self.root_sequence_table.len());
        let start = self.root_sequence_index.min(end);
        &self.root_sequence_table[start..end]
    }

    /// Non-zero subcarriers of the PRACH allocation
    pub fn allocated_subcarriers(&self) -> usize {
        constants::SUBCARRIERS_PER_RB * self.resource_block_count
    }

    /// Frame length in samples (10 ms); saturates, rejected by [`Self::validate`]
    pub fn frame_duration_samples(&self) -> usize {
        time::samples_per_frame(self.samples_per_ms)
    }

    /// Length of the assembled CP + repetitions block; saturates, rejected by [`Self::validate`]
    pub fn assembled_length(&self) -> usize {
        self.checked_assembled_length().unwrap_or(usize::MAX)
    }

    fn checked_assembled_length(&self) -> Option<usize> {
        self.repeat_count
            .checked_mul(self.fft_size)?
            .checked_add(self.cyclic_prefix_length)
    }

    /// Symbol timing of the carrier
    pub fn frame_timing(&self) -> FrameTiming {
        FrameTiming::new(self.subcarrier_spacing, self.fft_size)
    }

    /// Check the configuration invariants
    pub fn validate(&self) -> Result<(), PhyError> {
        if self.sequence_length != constants::SHORT_SEQUENCE_LENGTH {
            return Err(PhyError::InvalidConfiguration(format!(
                "Sequence length must be {}, got {}",
                constants::SHORT_SEQUENCE_LENGTH, self.sequence_length
            )));
        }

        let card_v = self.card_v();
        if card_v == 0 {
            return Err(PhyError::InvalidConfiguration(format!(
                "Cyclic shift spacing {} yields no shifts for length {}",
                self.cyclic_shift_spacing, self.sequence_length
            )));
        }

        if self.num_preambles() != NUM_PREAMBLES {
            return Err(PhyError::InvalidConfiguration(format!(
                "{} shifts per root cannot cover {} preambles",
                card_v, NUM_PREAMBLES
            )));
        }

        if self.root_sequence_index.saturating_add(self.i_length()) > self.root_sequence_table.len() {
            return Err(PhyError::InvalidConfiguration(format!(
                "Root table has {} entries, need {} from position {}",
                self.root_sequence_table.len(), self.i_length(), self.root_sequence_index
            )));
        }

        if let Some(&root) = self.roots_in_use().iter().find(|&&u| u as usize % self.sequence_length == 0) {
            return Err(PhyError::InvalidConfiguration(format!(
                "Root {} is not coprime with {}",
                root, self.sequence_length
            )));
        }

        if self.fft_size == 0 || self.fft_size % 2 != 0 {
            return Err(PhyError::InvalidConfiguration(format!(
                "FFT size must be even and non-zero, got {}",
                self.fft_size
            )));
        }

        if self.allocated_subcarriers() > self.fft_size {
            return Err(PhyError::InvalidConfiguration(format!(
                "{} resource blocks do not fit in FFT size {}",
                self.resource_block_count, self.fft_size
            )));
        }

        if self.sequence_length > self.allocated_subcarriers() {
            return Err(PhyError::InvalidConfiguration(format!(
                "Sequence length {} exceeds the {} allocated subcarriers",
                self.sequence_length, self.allocated_subcarriers()
            )));
        }

        if self.samples_per_ms == 0 {
            return Err(PhyError::InvalidConfiguration("Samples per ms must be non-zero".to_string()));
        }

        if self.samples_per_ms.checked_mul(time::SUBFRAMES_PER_FRAME).is_none() {
            return Err(PhyError::InvalidConfiguration(format!(
                "Frame of {} samples per ms overflows",
                self.samples_per_ms
            )));
        }

        if self.checked_assembled_length().is_none() {
            return Err(PhyError::InvalidConfiguration(format!(
                "CP {} + {} x {} samples overflows",
                self.cyclic_prefix_length, self.repeat_count, self.fft_size
            )));
        }

        if self.placement.starting_symbol >= SYMBOLS_PER_SLOT {
            return Err(PhyError::InvalidConfiguration(format!(
                "Starting symbol {} outside slot of {} symbols",
                self.placement.starting_symbol, SYMBOLS_PER_SLOT
            )));
        }

        if let Some(lengths) = &self.placement.preceding_symbol_lengths {
            if lengths.len() != self.placement.starting_symbol {
                return Err(PhyError::InvalidConfiguration(format!(
                    "Expected {} preceding symbol lengths, got {}",
                    self.placement.starting_symbol, lengths.len()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_counts() {
        let config = PrachConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.card_v(), 2);
        assert_eq!(config.i_length(), 32);
        assert_eq!(config.num_preambles(), 64);
        assert_eq!(config.roots_in_use().len(), 32);
        assert_eq!(config.roots_in_use()[0], 710);
        assert_eq!(config.roots_in_use()[31], 42);
        assert_eq!(config.frame_duration_samples(), 307200);
        assert_eq!(config.assembled_length(), 12756);
    }

    #[test]
    fn test_validation_failures() {
        let config = PrachConfig { cyclic_shift_spacing: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));

        // 139 / 46 = 3 shifts, which does not divide 64
        let config = PrachConfig { cyclic_shift_spacing: 46, ..Default::default() };
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));

        let config = PrachConfig { root_sequence_index: 9, ..Default::default() };
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));

        let config = PrachConfig { resource_block_count: 86, ..Default::default() };
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));

        let mut config = PrachConfig::default();
        config.root_sequence_table[1] = 278;
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));

        let mut config = PrachConfig::default();
        config.placement.preceding_symbol_lengths = Some(vec![1112]);
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_starting_symbol_bound() {
        let mut config = PrachConfig::default();
        config.placement.starting_symbol = 13;
        assert!(config.validate().is_ok());

        config.placement.starting_symbol = 14;
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));

        config.placement.starting_symbol = usize::MAX;
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_overflowing_lengths_are_rejected() {
        let config = PrachConfig { repeat_count: usize::MAX, ..Default::default() };
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));
        assert_eq!(config.assembled_length(), usize::MAX);

        let config = PrachConfig { cyclic_prefix_length: usize::MAX, repeat_count: 1, ..Default::default() };
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));

        let config = PrachConfig { samples_per_ms: usize::MAX, ..Default::default() };
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));
        assert_eq!(config.frame_duration_samples(), usize::MAX);

        let config = PrachConfig { root_sequence_index: usize::MAX, ..Default::default() };
        assert!(matches!(config.validate(), Err(PhyError::InvalidConfiguration(_))));
        assert!(config.roots_in_use().is_empty());
    }

    #[test]
    fn test_occasion_periodicity() {
        let occasion = PrachOccasion { frame_period_x: 2, frame_offset_y: 1, ..Default::default() };
        assert!(occasion.is_prach_frame(9));
        assert!(!occasion.is_prach_frame(8));
        assert!(PrachOccasion::default().is_prach_frame(9));
    }

    #[test]
    fn test_partial_config_deserialization() {
        let config: PrachConfig = serde_json::from_str(
            r#"{ "resource_block_count": 24, "scaling": "inverse_n", "placement": { "frame_index": 3 } }"#,
        ).unwrap();
        assert_eq!(config.resource_block_count, 24);
        assert_eq!(config.scaling, IfftScaling::InverseN);
        assert_eq!(config.placement.frame_index, 3);
        assert_eq!(config.placement.slot_index, 1);
        assert_eq!(config.root_sequence_table.len(), 40);
    }

    #[test]
    fn test_scaling_factor() {
        assert_eq!(IfftScaling::None.factor(1024), 1.0);
        assert!((IfftScaling::InverseN.factor(1024) - 1.0 / 1024.0).abs() < 1e-9);
        assert!((IfftScaling::InverseSqrtN.factor(1024) - 1.0 / 32.0).abs() < 1e-9);
    }
}
