//! Cumulative threshold curves over files and regions.
//!
//! A threshold curve summarizes a pool of pixel samples: for each integer
//! threshold `t` in `[0, max_level)` it records how many samples are
//! strictly greater than `t`. The engine aggregates samples from every
//! region in every file of a batch, either pooled into one curve or broken
//! out per file for comparison.

mod worker;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{ImageStore, LoadError};
use crate::model::Region;

pub use worker::{CurveWorker, JobId, JobOutcome, JobResult};

/// Default threshold upper bound.
pub const DEFAULT_MAX_LEVEL: u32 = 255;

/// Errors from batch curve computation.
#[derive(Error, Debug)]
pub enum CurveError {
    /// A file failed to load while `fail_fast` was requested.
    #[error("failed to load {path:?}: {source}")]
    Load {
        /// The file that failed.
        path: PathBuf,
        /// Underlying load failure.
        #[source]
        source: LoadError,
    },

    /// The computation was cancelled between per-file iterations.
    #[error("curve computation cancelled")]
    Cancelled,
}

/// Caller-supplied computation parameters.
///
/// `max_level` is deliberately a parameter, not a constant: the single-area
/// flow historically used 255 and the multi-file comparison flow 100, and
/// neither value is semantically required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveOptions {
    /// Threshold levels range over `[0, max_level)`.
    pub max_level: u32,
    /// Abort the whole batch on the first unreadable file instead of
    /// recording and skipping it.
    pub fail_fast: bool,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            fail_fast: false,
        }
    }
}

/// Cooperative cancellation handle.
///
/// Cloneable; the engine checks it between per-file iterations, so
/// cancelling from another thread stops the batch at the next file boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Histogram accumulator over integer threshold levels.
///
/// Samples are binned by `ceil(v)` clamped to `[0, max_level]`, which makes
/// the suffix-sum curve bit-identical to counting `v > t` directly: for an
/// integer threshold `t`, `v > t` holds exactly when `ceil(v) >= t + 1`.
#[derive(Debug, Clone)]
struct LevelHistogram {
    bins: Vec<u64>,
}

impl LevelHistogram {
    fn new(max_level: u32) -> Self {
        Self {
            bins: vec![0; max_level as usize + 1],
        }
    }

    fn accumulate(&mut self, samples: impl IntoIterator<Item = f32>) {
        let max = (self.bins.len() - 1) as f32;
        for v in samples {
            let bin = v.ceil().clamp(0.0, max);
            // NaN clamps to NaN and casts to 0, so it never passes a threshold.
            self.bins[bin as usize] += 1;
        }
    }

    fn into_curve(self) -> ThresholdCurve {
        let max_level = self.bins.len() - 1;
        let mut counts = vec![0; max_level];
        let mut above = 0;
        for t in (0..max_level).rev() {
            above += self.bins[t + 1];
            counts[t] = above;
        }
        ThresholdCurve { counts }
    }
}

/// A cumulative threshold curve.
///
/// `count_above(t)` is the number of aggregated samples strictly greater
/// than `t`, for `t` in `[0, max_level)`. Counts are non-increasing in `t`
/// by construction. Curves are derived values and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdCurve {
    counts: Vec<u64>,
}

impl ThresholdCurve {
    /// Build a curve from a pool of samples.
    pub fn from_samples(samples: impl IntoIterator<Item = f32>, max_level: u32) -> Self {
        let mut histogram = LevelHistogram::new(max_level);
        histogram.accumulate(samples);
        histogram.into_curve()
    }

    /// The all-zero curve over `max_level` levels.
    pub fn empty(max_level: u32) -> Self {
        Self {
            counts: vec![0; max_level as usize],
        }
    }

    /// The threshold upper bound this curve was computed for.
    pub fn max_level(&self) -> u32 {
        self.counts.len() as u32
    }

    /// Number of samples strictly greater than `level`.
    ///
    /// Levels at or beyond `max_level` report zero.
    pub fn count_above(&self, level: u32) -> u64 {
        self.counts.get(level as usize).copied().unwrap_or(0)
    }

    /// The raw counts, indexed by threshold level.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// `(level, count)` pairs in ascending level order.
    pub fn points(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(t, &count)| (t as u32, count))
    }
}

/// A file that could not be read during a batch computation.
#[derive(Debug)]
pub struct SkippedFile {
    /// The unreadable file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub error: LoadError,
}

/// Result of a pooled aggregate computation.
#[derive(Debug)]
pub struct CurveOutcome {
    /// One curve over every region in every readable file.
    pub curve: ThresholdCurve,
    /// Files that were recorded and skipped.
    pub skipped: Vec<SkippedFile>,
}

/// One file's curve in a per-file computation.
#[derive(Debug)]
pub struct FileCurve {
    /// The file the curve was computed from.
    pub path: PathBuf,
    /// Curve over every region of this file.
    pub curve: ThresholdCurve,
}

/// Result of a per-file comparison computation.
#[derive(Debug)]
pub struct PerFileOutcome {
    /// One curve per readable file, in input order.
    pub curves: Vec<FileCurve>,
    /// Files that were recorded and skipped.
    pub skipped: Vec<SkippedFile>,
}

/// Computes threshold curves over batches of files and regions.
///
/// Each engine owns its own [`ImageStore`]; regions and options are read as
/// immutable snapshots, so concurrent engines need no locking.
pub struct CurveEngine {
    store: ImageStore,
}

impl CurveEngine {
    /// Create an engine with the built-in loader registry.
    pub fn new() -> Self {
        Self::with_store(ImageStore::new())
    }

    /// Create an engine over a specific image store.
    pub fn with_store(store: ImageStore) -> Self {
        Self { store }
    }

    /// Compute one pooled curve over every region in every file.
    ///
    /// Regions must carry absolute image coordinates; each one is clipped
    /// to the bounds of the image at hand, so a region hanging over an edge
    /// contributes its in-image intersection. Unreadable files are
    /// recorded in the outcome's `skipped` list unless `fail_fast` is set.
    /// Zero files, zero regions, or all-empty extractions yield the all-zero
    /// curve, not an error.
    pub fn aggregate(
        &mut self,
        files: &[PathBuf],
        regions: &[Region],
        options: &CurveOptions,
        cancel: &CancelToken,
    ) -> Result<CurveOutcome, CurveError> {
        let mut histogram = LevelHistogram::new(options.max_level);
        let mut skipped = Vec::new();

        for path in files {
            if cancel.is_cancelled() {
                return Err(CurveError::Cancelled);
            }
            match self.accumulate_file(path, regions, &mut histogram) {
                Ok(()) => {}
                Err(error) if options.fail_fast => {
                    return Err(CurveError::Load {
                        path: path.clone(),
                        source: error,
                    });
                }
                Err(error) => {
                    log::warn!("Skipping {path:?}: {error}");
                    skipped.push(SkippedFile {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }

        Ok(CurveOutcome {
            curve: histogram.into_curve(),
            skipped,
        })
    }

    /// Compute one curve per file, applying the same region set to each.
    ///
    /// Used by the multi-file comparison flow; failure isolation matches
    /// [`aggregate`](Self::aggregate).
    pub fn per_file(
        &mut self,
        files: &[PathBuf],
        regions: &[Region],
        options: &CurveOptions,
        cancel: &CancelToken,
    ) -> Result<PerFileOutcome, CurveError> {
        let mut curves = Vec::with_capacity(files.len());
        let mut skipped = Vec::new();

        for path in files {
            if cancel.is_cancelled() {
                return Err(CurveError::Cancelled);
            }
            let mut histogram = LevelHistogram::new(options.max_level);
            match self.accumulate_file(path, regions, &mut histogram) {
                Ok(()) => curves.push(FileCurve {
                    path: path.clone(),
                    curve: histogram.into_curve(),
                }),
                Err(error) if options.fail_fast => {
                    return Err(CurveError::Load {
                        path: path.clone(),
                        source: error,
                    });
                }
                Err(error) => {
                    log::warn!("Skipping {path:?}: {error}");
                    skipped.push(SkippedFile {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }

        Ok(PerFileOutcome { curves, skipped })
    }

    fn accumulate_file(
        &mut self,
        path: &Path,
        regions: &[Region],
        histogram: &mut LevelHistogram,
    ) -> Result<(), LoadError> {
        let image = self.store.load(path)?;
        for region in regions {
            // Clip to this image's bounds: a region partially overlapping
            // the image contributes its in-image intersection.
            let clipped = region.clamped(image.width(), image.height());
            histogram.accumulate(image.extract(&clipped));
        }
        Ok(())
    }
}

impl Default for CurveEngine {
    fn default() -> Self {
        Self::new()
    }
}
