//! History settings supplied by the embedding application.

use serde::{Deserialize, Serialize};

use crate::history::{DownSamplingMode, GapCalculator, InMemoryHistoryStorage, SamplingPeriod};
use crate::time::seconds_to_millis;

const TARGET: &str = "meistercharts::settings";

/// Partial history settings. Absent fields keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistorySettings {
    /// Whether stored data is aggregated into coarser periods.
    pub down_sampling_mode: Option<DownSamplingMode>,
    /// Expected distance between two samples (ms).
    pub duration_between_samples: Option<f64>,
    /// Gap size, as a multiple of the sampling period distance.
    pub min_gap_size_factor: Option<f64>,
    /// History length (s) that is kept at the natural sampling period.
    pub guaranteed_history_length: Option<f64>,
}

fn sanitize(name: &'static str, value: Option<f64>) -> Option<f64> {
    match value {
        Some(value) if value.is_finite() && value > 0.0 => Some(value),
        Some(value) => {
            tracing::warn!(target: TARGET, setting = name, value, "ignoring invalid setting");
            None
        }
        None => None,
    }
}

impl HistorySettings {
    /// Apply the present fields to the assistant and the storage.
    pub fn apply(&self, assistant: &mut ConfigurationAssistant, storage: &mut InMemoryHistoryStorage) {
        match self.down_sampling_mode {
            Some(DownSamplingMode::Automatic) => storage.schedule_down_sampling(),
            Some(DownSamplingMode::None) => storage.stop_down_sampling(),
            None => {}
        }
        if let Some(duration) = sanitize("durationBetweenSamples", self.duration_between_samples) {
            assistant.set_duration_between_samples(duration);
        }
        if let Some(factor) = sanitize("minGapSizeFactor", self.min_gap_size_factor) {
            assistant.set_gap_factor(factor);
        }
        let guaranteed_history_length = sanitize("guaranteedHistoryLength", self.guaranteed_history_length)
            .map_or(storage.guaranteed_history_length(), seconds_to_millis);
        assistant.apply_to_storage(storage, guaranteed_history_length);
    }
}

/// Derives storage and gap settings from the expected sample spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigurationAssistant {
    natural_sampling_period: SamplingPeriod,
    duration_between_samples: f64,
    gap_factor: f64,
}

impl ConfigurationAssistant {
    /// Assistant for data arriving at the given period.
    pub fn with_sampling_period(sampling_period: SamplingPeriod) -> Self {
        Self {
            natural_sampling_period: sampling_period,
            duration_between_samples: sampling_period.distance(),
            gap_factor: GapCalculator::DEFAULT_FACTOR,
        }
    }

    /// The natural sampling period.
    pub fn natural_sampling_period(&self) -> SamplingPeriod {
        self.natural_sampling_period
    }

    /// Expected distance between two samples (ms).
    pub fn duration_between_samples(&self) -> f64 {
        self.duration_between_samples
    }

    /// Set the expected sample spacing. Picks the finest period that is not
    /// finer than the spacing.
    pub fn set_duration_between_samples(&mut self, duration: f64) {
        self.duration_between_samples = duration;
        self.natural_sampling_period = SamplingPeriod::with_max_distance(duration);
        tracing::debug!(
            target: TARGET,
            duration,
            sampling_period = ?self.natural_sampling_period,
            "natural sampling period derived"
        );
    }

    /// Set the gap factor.
    pub fn set_gap_factor(&mut self, factor: f64) {
        self.gap_factor = factor;
    }

    /// Configure the storage for the natural period and retention (ms).
    pub fn apply_to_storage(&self, storage: &mut InMemoryHistoryStorage, guaranteed_history_length: f64) {
        storage.set_natural_sampling_period(self.natural_sampling_period);
        storage.set_guaranteed_history_length(guaranteed_history_length);
    }

    /// Gap calculator for the configured factor.
    pub fn gap_calculator(&self) -> GapCalculator {
        GapCalculator::new(self.gap_factor)
    }
}

impl Default for ConfigurationAssistant {
    fn default() -> Self {
        Self::with_sampling_period(SamplingPeriod::EveryHundredMillis)
    }
}
