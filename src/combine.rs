//! SSIM combination and reduction.
//!
//! `SSIM(p) = ((2 mu_xy + C1)(2 sigma_xy + C2)) / ((mu_x^2 + mu_y^2 + C1)(sigma_x^2 + sigma_y^2 + C2))`
//!
//! With `C1, C2 > 0` the denominator is strictly positive and every value is
//! finite. With both constants zero, flat regions divide by zero and the
//! resulting non-finite values are passed through unchanged.

use crate::image::{ImageView, MAX_CHANNELS};
use crate::kernel::Exec;
use crate::stats::LocalStats;
use crate::util::math::mean_f64;
use crate::util::SsimResult;
use std::ops::Index;

/// Writes the SSIM field for one channel into `out`, reusing its allocation.
pub(crate) fn combine_channel(
    exec: Exec,
    stats: &LocalStats,
    c1: f32,
    c2: f32,
    out: &mut Vec<f32>,
) -> SsimResult<()> {
    out.resize(stats.width() * stats.height(), 0.0);
    exec.combine(stats.combine_inputs(), c1, c2, out, stats.width())
}

/// Mean of a similarity field, accumulated in `f64`.
pub(crate) fn reduce_mean(exec: Exec, field: &[f32]) -> f64 {
    match exec {
        Exec::Sequential => mean_f64(field),
        #[cfg(feature = "rayon")]
        Exec::Parallel => crate::kernel::rayon::mean_f64_par(field),
    }
}

/// Per-channel mean SSIM, one entry per configured channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeanSimilarity {
    values: [f64; MAX_CHANNELS],
    channels: usize,
}

impl MeanSimilarity {
    pub(crate) fn from_slice(values: &[f64]) -> Self {
        let channels = values.len().min(MAX_CHANNELS);
        let mut out = [0.0; MAX_CHANNELS];
        out[..channels].copy_from_slice(&values[..channels]);
        Self {
            values: out,
            channels,
        }
    }

    /// Number of channels carrying a score.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Scores for the configured channels.
    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.channels]
    }

    /// Score of channel `c`, if configured.
    pub fn get(&self, c: usize) -> Option<f64> {
        self.as_slice().get(c).copied()
    }

    /// Iterates over the per-channel scores.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.as_slice().iter().copied()
    }

    /// Mean over channels.
    pub fn average(&self) -> f64 {
        if self.channels == 0 {
            return 0.0;
        }
        self.iter().sum::<f64>() / self.channels as f64
    }
}

impl Index<usize> for MeanSimilarity {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.as_slice()[index]
    }
}

/// Borrowed per-channel SSIM maps of the last computation.
///
/// The maps live in the engine and are overwritten by the next computation;
/// use [`SimilarityMap::to_vecs`] to keep a copy.
#[derive(Clone, Debug)]
pub struct SimilarityMap<'a> {
    fields: Vec<&'a [f32]>,
    width: usize,
    height: usize,
}

impl<'a> SimilarityMap<'a> {
    pub(crate) fn new(fields: Vec<&'a [f32]>, width: usize, height: usize) -> Self {
        Self {
            fields,
            width,
            height,
        }
    }

    /// Map width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Map height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.fields.len()
    }

    /// Row-major SSIM values of channel `c`.
    pub fn channel(&self, c: usize) -> Option<&'a [f32]> {
        self.fields.get(c).copied()
    }

    /// Single-channel image view of channel `c`.
    pub fn view(&self, c: usize) -> Option<ImageView<'a, f32>> {
        let field = self.channel(c)?;
        ImageView::from_slice(field, self.width, self.height, 1).ok()
    }

    /// SSIM value of channel `c` at `(x, y)`.
    pub fn get(&self, x: usize, y: usize, c: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.channel(c)?.get(y * self.width + x).copied()
    }

    /// Iterates over the channel fields.
    pub fn iter(&self) -> impl Iterator<Item = &'a [f32]> + '_ {
        self.fields.iter().copied()
    }

    /// Copies every channel into owned buffers.
    pub fn to_vecs(&self) -> Vec<Vec<f32>> {
        self.fields.iter().map(|f| f.to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{MeanSimilarity, SimilarityMap};

    #[test]
    fn mean_similarity_exposes_only_configured_channels() {
        let mean = MeanSimilarity::from_slice(&[0.5, 0.75, 1.0]);
        assert_eq!(mean.channels(), 3);
        assert_eq!(mean.as_slice(), &[0.5, 0.75, 1.0]);
        assert_eq!(mean[1], 0.75);
        assert_eq!(mean.get(3), None);
        assert!((mean.average() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn similarity_map_indexes_row_major() {
        let field = [0.1f32, 0.2, 0.3, 0.4, 0.5, 0.6];
        let map = SimilarityMap::new(vec![&field], 3, 2);
        assert_eq!(map.get(2, 1, 0), Some(0.6));
        assert_eq!(map.get(3, 0, 0), None);
        assert_eq!(map.view(0).unwrap().row(1).unwrap(), &[0.4, 0.5, 0.6]);
        assert!(map.view(1).is_none());
    }
}
