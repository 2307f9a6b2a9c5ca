//! Baseline screenshot storage and comparison.
//!
//! Mirrors the snapshot-testing workflow the harness relies on: the first
//! sighting of a snapshot records it as the baseline and passes; later runs
//! compare pixel-for-pixel against the stored PNG and fail once the
//! configured threshold is exceeded, leaving the received image and a diff
//! visualization under `__diff_output__` for inspection.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use image::{Rgba, RgbaImage};
use tracing::{debug, info};

use crate::error::HarnessError;

/// How `failure_threshold` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    /// Absolute number of differing pixels allowed.
    Pixel,
    /// Fraction of the image allowed to differ (0.01 = 1%).
    Percent,
}

#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    /// Baseline storage directory, scoped to the test suite.
    pub snapshots_dir: PathBuf,
    /// Name prefix; snapshots are numbered `{name}-1.png`, `{name}-2.png`, ...
    pub name: String,
    pub failure_threshold: f64,
    pub threshold_kind: ThresholdKind,
    /// Overwrite baselines instead of comparing.
    pub update_snapshots: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            snapshots_dir: PathBuf::from("__image_snapshots__"),
            name: "page".into(),
            failure_threshold: 0.0,
            threshold_kind: ThresholdKind::Pixel,
            update_snapshots: false,
        }
    }
}

/// Compares screenshots against stored baselines, numbering them in capture
/// order within a run.
pub struct SnapshotMatcher {
    options: SnapshotOptions,
    counter: AtomicU32,
}

impl SnapshotMatcher {
    pub fn new(options: SnapshotOptions) -> Self {
        Self {
            options,
            counter: AtomicU32::new(0),
        }
    }

    /// Match `png` against the next numbered baseline.
    ///
    /// Records and passes when the baseline is missing or updating is on.
    /// Otherwise fails with [`HarnessError::SnapshotMismatch`] when the pixel
    /// difference exceeds the threshold, writing failure artifacts first.
    pub fn matches(&self, png: &[u8]) -> Result<(), HarnessError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let name = format!("{}-{index}", self.options.name);
        let baseline_path = self.options.snapshots_dir.join(format!("{name}.png"));

        let received = image::load_from_memory(png)?.to_rgba8();

        if self.options.update_snapshots || !baseline_path.exists() {
            fs::create_dir_all(&self.options.snapshots_dir)?;
            fs::write(&baseline_path, png)?;
            info!(%name, "recorded snapshot baseline");
            return Ok(());
        }

        let baseline = image::open(&baseline_path)?.to_rgba8();
        if baseline.dimensions() != received.dimensions() {
            self.write_failure_artifacts(&name, png, None)?;
            let total = u64::from(received.width()) * u64::from(received.height());
            return Err(HarnessError::SnapshotMismatch {
                name,
                diff_pixels: total,
                diff_ratio: 1.0,
            });
        }

        let (width, height) = baseline.dimensions();
        let mut diff = RgbaImage::new(width, height);
        let mut diff_pixels = 0u64;
        for (x, y, pixel) in baseline.enumerate_pixels() {
            if pixel == received.get_pixel(x, y) {
                // Fade matching pixels so the differences stand out.
                let Rgba([r, g, b, _]) = *pixel;
                diff.put_pixel(x, y, Rgba([r / 3 + 170, g / 3 + 170, b / 3 + 170, 255]));
            } else {
                diff_pixels += 1;
                diff.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }

        let total = u64::from(width) * u64::from(height);
        let diff_ratio = if total == 0 {
            0.0
        } else {
            diff_pixels as f64 / total as f64
        };
        let exceeded = match self.options.threshold_kind {
            ThresholdKind::Pixel => diff_pixels as f64 > self.options.failure_threshold,
            ThresholdKind::Percent => diff_ratio > self.options.failure_threshold,
        };

        if diff_pixels > 0 && exceeded {
            self.write_failure_artifacts(&name, png, Some(&diff))?;
            return Err(HarnessError::SnapshotMismatch {
                name,
                diff_pixels,
                diff_ratio,
            });
        }

        debug!(%name, diff_pixels, "snapshot matched baseline");
        Ok(())
    }

    fn write_failure_artifacts(
        &self,
        name: &str,
        received_png: &[u8],
        diff: Option<&RgbaImage>,
    ) -> Result<(), HarnessError> {
        let dir = self.diff_dir();
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}-received.png")), received_png)?;
        if let Some(diff) = diff {
            diff.save(dir.join(format!("{name}-diff.png")))?;
        }
        Ok(())
    }

    pub fn diff_dir(&self) -> PathBuf {
        self.options.snapshots_dir.join("__diff_output__")
    }
}
