//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Used by the CLI's `--diagnostics` report when tuning line spacing and
//! resolution against an image. Timing goes through the [`Clock`] trait
//! so this crate never touches a platform clock itself.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::brightness::BrightnessMap;
use crate::types::{Dimensions, MachineBounds, PathConfig, PipelineError, ProcessResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of monotonic timestamps.
///
/// Native callers implement this over `std::time::Instant` (or
/// `web_time::Instant`); tests can supply a fake.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 0: image decoding.
    pub decode: StageDiagnostics,
    /// Stage 1: placement on the machine.
    pub placement: StageDiagnostics,
    /// Stage 2: resampling to one pixel per millimetre.
    pub resample: StageDiagnostics,
    /// Stage 3: sine-wave path generation.
    pub generate: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
    },
    /// Placement metrics.
    Placement {
        /// Region left edge in millimetres.
        x: f64,
        /// Region top edge in millimetres.
        y: f64,
        /// Region width in millimetres.
        width: u32,
        /// Region height in millimetres.
        height: u32,
    },
    /// Resampling metrics.
    Resample {
        /// Pixels in the resampled map.
        pixel_count: u64,
    },
    /// Path generation metrics.
    Generate {
        /// Number of scan passes.
        passes: u32,
        /// Samples per pass.
        samples_per_pass: u32,
        /// Points in the final path.
        point_count: usize,
        /// Total pen travel in millimetres.
        travel_mm: f64,
    },
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Decode", &self.decode),
            ("Placement", &self.placement),
            ("Resample", &self.resample),
            ("Generate", &self.generate),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Placement {
            x,
            y,
            width,
            height,
        } => format!("{width}x{height}mm at ({x:.1}, {y:.1})"),
        StageMetrics::Resample { pixel_count } => format!("{pixel_count} px"),
        StageMetrics::Generate {
            passes,
            samples_per_pass,
            point_count,
            travel_mm,
        } => format!(
            "{passes} passes x {samples_per_pass} samples = {point_count} pts, {travel_mm:.1}mm travel",
        ),
    }
}

/// Run the pipeline like [`crate::process`], timing each stage.
///
/// # Errors
///
/// Same as [`crate::process`].
pub fn process_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    bounds: &MachineBounds,
    config: &PathConfig,
    clock: &C,
) -> Result<(ProcessResult, PipelineDiagnostics), PipelineError> {
    config.validate()?;
    bounds.validate()?;

    let start = clock.now();

    let t = clock.now();
    let image = crate::decode::decode(image_bytes)?;
    let dimensions = Dimensions {
        width: image.width(),
        height: image.height(),
    };
    let decode = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: dimensions.width,
            height: dimensions.height,
        },
    };

    let t = clock.now();
    let region = crate::placement::fit_region(dimensions, bounds, config.fill);
    let placement = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Placement {
            x: region.origin.x,
            y: region.origin.y,
            width: region.width,
            height: region.height,
        },
    };

    let t = clock.now();
    let sampled = crate::decode::resample(&image, &region);
    let resample = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Resample {
            pixel_count: u64::from(sampled.width()) * u64::from(sampled.height()),
        },
    };

    let t = clock.now();
    let path = crate::sine::generate_sine_path(&BrightnessMap::new(&sampled), &region, config);
    let (passes, samples_per_pass) = crate::sine::scan_shape(&region, config);
    let generate = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Generate {
            passes,
            samples_per_pass,
            point_count: path.len(),
            travel_mm: path.length(),
        },
    };

    let diagnostics = PipelineDiagnostics {
        decode,
        placement,
        resample,
        generate,
        total_duration: clock.elapsed(&start),
    };

    Ok((
        ProcessResult {
            path,
            region,
            dimensions,
        },
        diagnostics,
    ))
}
