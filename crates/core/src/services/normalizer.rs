use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::models::period::Period;
use crate::models::sample::Sample;
use crate::models::series::NormalizedSeries;
use crate::models::settings::ChartSettings;

/// Resampling parameters, usually derived from `ChartSettings`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerConfig {
    pub target_points: usize,
    /// Per-period density overrides.
    pub period_targets: HashMap<Period, usize>,
    pub jitter_ratio: f64,
    pub jitter_seed: Option<u64>,
}

impl NormalizerConfig {
    pub fn from_settings(settings: &ChartSettings) -> Self {
        Self {
            target_points: settings.target_points,
            period_targets: settings.period_targets.clone(),
            jitter_ratio: settings.jitter_ratio,
            jitter_seed: settings.jitter_seed,
        }
    }

    /// Density for `period`, never below 2.
    pub fn target_for(&self, period: Period) -> usize {
        self.period_targets
            .get(&period)
            .copied()
            .unwrap_or(self.target_points)
            .max(2)
    }

    fn rng(&self) -> StdRng {
        match self.jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self::from_settings(&ChartSettings::default())
    }
}

/// Resample `raw` to roughly the target density for `period`.
///
/// - Fewer than 2 points come back unchanged; the caller shows an
///   "insufficient data" state.
/// - More points than the target are stride-sampled, keeping the first and
///   last sample.
/// - Fewer points than the target get linearly interpolated synthetic
///   points in every gap. Their high/low carry a small random jitter that is
///   purely cosmetic.
///
/// The output is strictly ascending by timestamp and starts and ends with
/// the first and last real input samples. Pure apart from the jitter, which
/// is reproducible when a seed is configured.
pub fn normalize(raw: &[Sample], period: Period, config: &NormalizerConfig) -> NormalizedSeries {
    let samples = ordered_samples(raw);
    let n = samples.len();
    let target = config.target_for(period);

    if n < 2 {
        debug!(%period, count = n, "series too short to resample");
        return NormalizedSeries::from_samples(samples);
    }

    if n > target {
        downsample(samples, target, period)
    } else if n < target {
        upsample(&samples, target, period, config)
    } else {
        NormalizedSeries::from_samples(samples)
    }
}

/// Drop unusable samples and restore ascending unique timestamps if the
/// caller handed us something out of order.
fn ordered_samples(raw: &[Sample]) -> Vec<Sample> {
    let mut samples: Vec<Sample> = raw.iter().copied().filter(Sample::has_valid_prices).collect();
    if samples.len() != raw.len() {
        warn!(
            dropped = raw.len() - samples.len(),
            "dropped samples with invalid prices"
        );
    }

    let ascending = samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp);
    if !ascending {
        warn!("input samples not strictly ascending; sorting and de-duplicating");
        samples.sort_by_key(|s| s.timestamp);
        samples.dedup_by_key(|s| s.timestamp);
    }
    samples
}

fn downsample(samples: Vec<Sample>, target: usize, period: Period) -> NormalizedSeries {
    let n = samples.len();
    let rate = n.div_ceil(target);
    debug!(%period, count = n, target, rate, "downsampling series");

    let mut kept: Vec<Sample> = samples.iter().step_by(rate).copied().collect();
    if (n - 1) % rate != 0 {
        kept.push(samples[n - 1]);
    }
    NormalizedSeries::from_samples(kept)
}

fn upsample(
    samples: &[Sample],
    target: usize,
    period: Period,
    config: &NormalizerConfig,
) -> NormalizedSeries {
    let n = samples.len();
    let per_gap = (target - n) / (n - 1);
    if per_gap == 0 {
        return NormalizedSeries::from_samples(samples.to_vec());
    }
    debug!(%period, count = n, target, per_gap, "interpolating series");

    let mut rng = config.rng();
    let mut out = Vec::with_capacity(n + (n - 1) * per_gap);
    let mut synthetic = Vec::with_capacity(out.capacity());

    for pair in samples.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        out.push(a);
        synthetic.push(false);

        // Computed in f64: far-apart timestamps overflow an i64 difference.
        let span = b.timestamp as f64 - a.timestamp as f64;
        let mut prev_close = a.close;
        for k in 1..=per_gap {
            let f = k as f64 / (per_gap + 1) as f64;
            let timestamp = a.timestamp.saturating_add((span * f).round() as i64);
            let last_ts = out.last().map_or(i64::MIN, |s: &Sample| s.timestamp);
            // Gaps narrower than the point count would produce duplicates.
            if timestamp <= last_ts || timestamp >= b.timestamp {
                continue;
            }

            let close = a.close + (b.close - a.close) * f;
            let open = prev_close;
            let jitter_up = rng.random::<f64>() * config.jitter_ratio * close;
            let jitter_down = rng.random::<f64>() * config.jitter_ratio * close;
            out.push(Sample::new(
                timestamp,
                open,
                open.max(close) + jitter_up,
                (open.min(close) - jitter_down).max(0.0),
                close,
                0.0,
            ));
            synthetic.push(true);
            prev_close = close;
        }
    }

    out.push(samples[n - 1]);
    synthetic.push(false);
    NormalizedSeries::with_flags(out, synthetic)
}
