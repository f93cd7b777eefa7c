//! Multiband compressor: crossover + per-band dynamics.
//!
//! The input is split by the cascaded Linkwitz-Riley network, each band runs
//! through its own independently configured dynamics core, and the bands are
//! summed back. The `*_multi` variants expose the per-band outputs for
//! metering and band-soloing front ends.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::crossover::{MAX_BANDS, MultibandSplitter};
use crate::dynamics::{DynamicsConfig, DynamicsProcessor};
use crate::error::DspError;
use crate::math::sanitize;

/// Crossover-split dynamics processor.
#[derive(Debug, Clone)]
pub struct MultibandCompressor {
    splitter: MultibandSplitter,
    bands: Vec<DynamicsProcessor>,
}

impl MultibandCompressor {
    /// Create a multiband compressor.
    ///
    /// `configs` must carry exactly `freqs.len() + 1` entries, low band
    /// first.
    ///
    /// # Errors
    ///
    /// Crossover validation errors (see
    /// [`MultibandSplitter::new`]), dynamics validation errors, or
    /// [`DspError::DimensionMismatch`] when the config count is wrong.
    pub fn new(
        sample_rate: f64,
        freqs: &[f64],
        order: usize,
        configs: &[DynamicsConfig],
    ) -> Result<Self, DspError> {
        let splitter = MultibandSplitter::new(sample_rate, freqs, order)?;
        if configs.len() != splitter.num_bands() {
            return Err(DspError::DimensionMismatch {
                expected: splitter.num_bands(),
                got: configs.len(),
            });
        }
        let mut bands = Vec::with_capacity(configs.len());
        for config in configs {
            bands.push(DynamicsProcessor::new(sample_rate, *config)?);
        }
        Ok(Self { splitter, bands })
    }

    /// Number of bands.
    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    /// Reconfigure one band, preserving its detector state.
    pub fn set_band_config(&mut self, band: usize, config: DynamicsConfig) -> Result<(), DspError> {
        match self.bands.get_mut(band) {
            Some(processor) => processor.set_config(config),
            None => Err(DspError::DimensionMismatch {
                expected: self.bands.len(),
                got: band,
            }),
        }
    }

    /// Process one sample, returning the band sum.
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let mut scratch = [0.0; MAX_BANDS];
        self.process_sample_into(input, &mut scratch)
    }

    /// Process one sample, exposing the per-band outputs.
    ///
    /// `band_out` must hold exactly [`num_bands`](Self::num_bands) entries;
    /// the return value is their sum.
    #[inline]
    pub fn process_sample_multi(&mut self, input: f64, band_out: &mut [f64]) -> f64 {
        debug_assert_eq!(band_out.len(), self.num_bands());
        let mut scratch = [0.0; MAX_BANDS];
        let sum = self.process_sample_into(input, &mut scratch);
        band_out.copy_from_slice(&scratch[..band_out.len()]);
        sum
    }

    #[inline]
    fn process_sample_into(&mut self, input: f64, scratch: &mut [f64; MAX_BANDS]) -> f64 {
        let input = sanitize(input);
        let n = self.num_bands();
        self.splitter.process_sample(input, &mut scratch[..n]);
        let mut sum = 0.0;
        for (band, processor) in scratch[..n].iter_mut().zip(self.bands.iter_mut()) {
            *band = processor.process_sample(*band, *band);
            sum += *band;
        }
        sum
    }

    /// Process a block in place.
    pub fn process_in_place(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Process a block, writing each band into its own buffer and the sum
    /// back into `block`.
    ///
    /// # Errors
    ///
    /// [`DspError::DimensionMismatch`] when the band count or any band
    /// buffer length disagrees with `block`.
    pub fn process_in_place_multi(
        &mut self,
        block: &mut [f64],
        band_blocks: &mut [Vec<f64>],
    ) -> Result<(), DspError> {
        if band_blocks.len() != self.num_bands() {
            return Err(DspError::DimensionMismatch {
                expected: self.num_bands(),
                got: band_blocks.len(),
            });
        }
        for band in band_blocks.iter() {
            if band.len() != block.len() {
                return Err(DspError::DimensionMismatch {
                    expected: block.len(),
                    got: band.len(),
                });
            }
        }
        let mut scratch = [0.0; MAX_BANDS];
        for (i, sample) in block.iter_mut().enumerate() {
            let sum = self.process_sample_into(*sample, &mut scratch);
            for (b, band) in band_blocks.iter_mut().enumerate() {
                band[i] = scratch[b];
            }
            *sample = sum;
        }
        Ok(())
    }

    /// Clear crossover and band state.
    pub fn reset(&mut self) {
        self.splitter.reset();
        for band in self.bands.iter_mut() {
            band.reset();
        }
    }
}
