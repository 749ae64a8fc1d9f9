//! Zadoff-Chu preamble sequence generation
//!
//! Implements the frequency-domain preamble sequences of 3GPP TS 38.211
//! section 6.3.3.1 for the short sequence length L_RA = 139:
//!
//! ```text
//! x_u(i)   = exp(-j * pi * u * i * (i + 1) / L_RA)
//! x_u,v(n) = x_u((n + C_v) mod L_RA),  C_v = v * N_CS
//! y_u,v(n) = sum_m x_u,v(m) * exp(-j * 2 * pi * m * n / L_RA)
//! ```

use super::config::PrachConfig;
use crate::PhyError;
use num_complex::{Complex32, Complex64};
use rustfft::FftPlanner;
use std::f64::consts::PI;
use tracing::debug;

/// The 64 preambles of one PRACH occasion, indexed `root_position * card_v + v`
#[derive(Debug, Clone, PartialEq)]
pub struct PreambleSet {
    sequences: Vec<Vec<Complex32>>,
    roots: Vec<u32>,
    card_v: usize,
}

impl PreambleSet {
    /// Number of preambles
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// True when no preambles were generated
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Preamble at `index`
    pub fn get(&self, index: usize) -> Option<&[Complex32]> {
        self.sequences.get(index).map(Vec::as_slice)
    }

    /// Iterate over all preambles in index order
    pub fn iter(&self) -> impl Iterator<Item = &[Complex32]> {
        self.sequences.iter().map(Vec::as_slice)
    }

    /// Root value and cyclic shift number that produced `index`
    pub fn origin(&self, index: usize) -> Option<(u32, usize)> {
        if index >= self.len() {
            return None;
        }
        Some((self.roots[index / self.card_v], index % self.card_v))
    }
}

/// Generator of the shifted root sequences and their DFT
///
/// Single-sequence operations address roots by their position in the full
/// logical root table. The preamble set uses the `i_length` positions
/// starting at `root_sequence_index`.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    /// Full logical root table
    table: Vec<u32>,
    /// Table position of the first root used by the preamble set
    root_sequence_index: usize,
    /// Roots used by the preamble set, in table order
    roots: Vec<u32>,
    /// L_RA
    length: usize,
    /// N_CS
    cyclic_shift_spacing: usize,
    /// Cyclic shifts per root
    card_v: usize,
    /// exp(-j * 2 * pi * k / L_RA) for k in 0..L_RA
    twiddles: Vec<Complex64>,
}

impl SequenceGenerator {
    /// Create a generator from a validated configuration
    pub fn new(config: &PrachConfig) -> Result<Self, PhyError> {
        config.validate()?;

        let length = config.sequence_length;
        let twiddles = (0..length)
            .map(|k| Complex64::from_polar(1.0, -2.0 * PI * k as f64 / length as f64))
            .collect();

        Ok(Self {
            table: config.root_sequence_table.clone(),
            root_sequence_index: config.root_sequence_index,
            roots: config.roots_in_use().to_vec(),
            length,
            cyclic_shift_spacing: config.cyclic_shift_spacing,
            card_v: config.card_v(),
            twiddles,
        })
    }

    /// Sequence length L_RA
    pub fn sequence_length(&self) -> usize {
        self.length
    }

    /// Cyclic shifts per root
    pub fn card_v(&self) -> usize {
        self.card_v
    }

    /// Roots used by the preamble set, in table order
    pub fn roots(&self) -> &[u32] {
        &self.roots
    }

    /// Full logical root table
    pub fn root_table(&self) -> &[u32] {
        &self.table
    }

    /// Table position of the first root used by the preamble set
    pub fn root_sequence_index(&self) -> usize {
        self.root_sequence_index
    }

    fn root_sample_f64(&self, n: i64, u: u32) -> Complex64 {
        // exp(-j*pi*k/L) has period 2L in k; reduce exactly before going to float
        let modulus = 2 * self.length as i128;
        let n = n as i128;
        let k = (u as i128 * n * (n + 1)).rem_euclid(modulus);
        Complex64::from_polar(1.0, -PI * k as f64 / self.length as f64)
    }

    fn shifted_sequence_f64(&self, u: u32, v: usize) -> Vec<Complex64> {
        let shift = (v * self.cyclic_shift_spacing) as i64;
        (0..self.length as i64)
            .map(|m| self.root_sample_f64((m + shift).rem_euclid(self.length as i64), u))
            .collect()
    }

    fn check_shift(&self, v: usize) -> Result<(), PhyError> {
        if v >= self.card_v {
            return Err(PhyError::InvalidArgument(format!(
                "Cyclic shift {} outside [0, {})",
                v, self.card_v
            )));
        }
        Ok(())
    }

    fn root_at(&self, root_position: usize) -> Result<u32, PhyError> {
        self.table.get(root_position).copied().ok_or_else(|| {
            PhyError::InvalidArgument(format!(
                "Root position {} outside table [0, {})",
                root_position,
                self.table.len()
            ))
        })
    }

    /// Root Zadoff-Chu sample x_u(n); unit magnitude for every n
    pub fn root_sample(&self, n: i64, u: u32) -> Complex32 {
        let s = self.root_sample_f64(n, u);
        Complex32::new(s.re as f32, s.im as f32)
    }

    /// Cyclically shifted sample x_u((n + v * N_CS) mod L_RA)
    pub fn cyclic_shift_sample(&self, u: u32, v: usize, n: i64) -> Result<Complex32, PhyError> {
        self.check_shift(v)?;
        let shift = (v * self.cyclic_shift_spacing) as i64;
        Ok(self.root_sample((n + shift).rem_euclid(self.length as i64), u))
    }

    /// n-th DFT coefficient of the v-shifted sequence of the root stored at
    /// table position `root_position`, by direct summation
    pub fn dft_coefficient(&self, root_position: usize, v: usize, n: usize) -> Result<Complex32, PhyError> {
        self.check_shift(v)?;
        let u = self.root_at(root_position)?;
        let shifted = self.shifted_sequence_f64(u, v);
        let y = self.dft_from_shifted(&shifted, n);
        Ok(Complex32::new(y.re as f32, y.im as f32))
    }

    fn dft_from_shifted(&self, shifted: &[Complex64], n: usize) -> Complex64 {
        shifted
            .iter()
            .enumerate()
            .map(|(m, &x)| x * self.twiddles[(m * n) % self.length])
            .sum()
    }

    /// Frequency-domain preamble y_u,v for one (table position, shift) pair
    pub fn generate_sequence(&self, root_position: usize, v: usize) -> Result<Vec<Complex32>, PhyError> {
        self.check_shift(v)?;
        let u = self.root_at(root_position)?;
        Ok(self.direct_sequence(u, v))
    }

    fn direct_sequence(&self, u: u32, v: usize) -> Vec<Complex32> {
        let shifted = self.shifted_sequence_f64(u, v);
        (0..self.length)
            .map(|n| {
                let y = self.dft_from_shifted(&shifted, n);
                Complex32::new(y.re as f32, y.im as f32)
            })
            .collect()
    }

    /// All preambles by direct summation
    pub fn generate_all_preambles(&self) -> PreambleSet {
        let sequences: Vec<Vec<Complex32>> = self
            .index_pairs()
            .map(|(position, v)| self.direct_sequence(self.roots[position], v))
            .collect();

        self.finish_set(sequences)
    }

    /// All preambles through a forward FFT of length L_RA
    pub fn generate_all_preambles_fft(&self) -> PreambleSet {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(self.length);
        let mut scratch = vec![Complex64::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        let sequences: Vec<Vec<Complex32>> = self
            .index_pairs()
            .map(|(position, v)| {
                let mut buffer = self.shifted_sequence_f64(self.roots[position], v);
                fft.process_with_scratch(&mut buffer, &mut scratch);
                buffer.iter().map(|y| Complex32::new(y.re as f32, y.im as f32)).collect::<Vec<_>>()
            })
            .collect();

        self.finish_set(sequences)
    }

    /// (position in the roots in use, v) pairs in preamble index order
    fn index_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.roots.len()).flat_map(move |position| (0..self.card_v).map(move |v| (position, v)))
    }

    fn finish_set(&self, sequences: Vec<Vec<Complex32>>) -> PreambleSet {
        debug!(
            "Generated {} preambles from {} roots ({} shifts each, N_CS={})",
            sequences.len(),
            self.roots.len(),
            self.card_v,
            self.cyclic_shift_spacing
        );

        PreambleSet {
            sequences,
            roots: self.roots.clone(),
            card_v: self.card_v,
        }
    }
}
