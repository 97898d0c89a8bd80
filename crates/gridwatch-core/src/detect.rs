// ── Fault detector bank ──
//
// Rule-based detectors over a short window of recent readings. Each
// detector averages one metric and applies fixed thresholds; the bank is
// an ordered registry so that evaluation order is stable across cycles.

use std::borrow::Borrow;

use serde::Serialize;

use crate::model::{FaultType, Metric, TelemetryReading};

/// Number of most recent readings a detector averages over.
pub const WINDOW_SIZE: usize = 5;

/// Sites with fewer readings than this are not evaluated at all.
pub const MIN_READINGS: usize = 3;

/// Raw detector output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Signal {
    pub probability: f64,
    pub ttf_min: u32,
}

impl Signal {
    const fn new(probability: f64, ttf_min: u32) -> Self {
        Self {
            probability,
            ttf_min,
        }
    }
}

/// A single rule-based detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detector {
    Overvoltage,
    Undervoltage,
    FrequencyDrift,
    InverterOverheat,
    ScadaLatency,
    HarmonicSpike,
}

impl Detector {
    /// Every detector, in registry order.
    pub const ALL: [Self; 6] = [
        Self::Overvoltage,
        Self::Undervoltage,
        Self::FrequencyDrift,
        Self::InverterOverheat,
        Self::ScadaLatency,
        Self::HarmonicSpike,
    ];

    pub fn fault_type(self) -> FaultType {
        match self {
            Self::Overvoltage => FaultType::Overvoltage,
            Self::Undervoltage => FaultType::Undervoltage,
            Self::FrequencyDrift => FaultType::FrequencyDrift,
            Self::InverterOverheat => FaultType::InverterOverheat,
            Self::ScadaLatency => FaultType::ScadaLatency,
            Self::HarmonicSpike => FaultType::HarmonicSpike,
        }
    }

    /// The metric this detector averages.
    pub fn metric(self) -> Metric {
        match self {
            Self::Overvoltage | Self::Undervoltage => Metric::VoltageKv,
            Self::FrequencyDrift => Metric::FrequencyHz,
            Self::InverterOverheat => Metric::InverterTempC,
            Self::ScadaLatency => Metric::LatencyMs,
            Self::HarmonicSpike => Metric::ThdPct,
        }
    }

    /// Human-readable trigger rule, for listings.
    pub fn rule(self) -> &'static str {
        match self {
            Self::Overvoltage => "mean > 124 -> (0.85, 25)",
            Self::Undervoltage => "mean < 112 -> (0.78, 30)",
            Self::FrequencyDrift => "mean < 59.6 or > 60.4 -> (0.72, 20)",
            Self::InverterOverheat => "mean > 80 -> (0.92, 15); mean > 72 -> (0.65, 45)",
            Self::ScadaLatency => "mean > 150 -> (0.75, 35)",
            Self::HarmonicSpike => "mean > 7 -> (0.68, 40)",
        }
    }

    /// Evaluate against readings ordered newest first.
    ///
    /// Only the first [`WINDOW_SIZE`] readings are used. An empty window
    /// yields nothing.
    pub fn evaluate<R: Borrow<TelemetryReading>>(self, window: &[R]) -> Option<Signal> {
        let mean = window_mean(window, self.metric())?;
        match self {
            Self::Overvoltage => (mean > 124.0).then_some(Signal::new(0.85, 25)),
            Self::Undervoltage => (mean < 112.0).then_some(Signal::new(0.78, 30)),
            Self::FrequencyDrift => {
                (mean < 59.6 || mean > 60.4).then_some(Signal::new(0.72, 20))
            }
            Self::InverterOverheat => {
                if mean > 80.0 {
                    Some(Signal::new(0.92, 15))
                } else if mean > 72.0 {
                    Some(Signal::new(0.65, 45))
                } else {
                    None
                }
            }
            Self::ScadaLatency => (mean > 150.0).then_some(Signal::new(0.75, 35)),
            Self::HarmonicSpike => (mean > 7.0).then_some(Signal::new(0.68, 40)),
        }
    }
}

/// Mean of `metric` over the newest [`WINDOW_SIZE`] readings. Missing
/// values count as the metric's neutral value.
pub fn window_mean<R: Borrow<TelemetryReading>>(window: &[R], metric: Metric) -> Option<f64> {
    let (sum, count) = window
        .iter()
        .take(WINDOW_SIZE)
        .fold((0.0, 0.0), |(sum, count), r| {
            (sum + r.borrow().metric(metric), count + 1.0)
        });
    (count > 0.0).then(|| sum / count)
}

/// One detector firing for a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub fault_type: FaultType,
    #[serde(flatten)]
    pub signal: Signal,
}

/// Result of one pass of the bank over a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankRun {
    /// Detectors evaluated.
    pub runs: usize,
    /// Detectors that fired, in bank order.
    pub detections: Vec<Detection>,
}

/// Ordered registry of detectors.
#[derive(Debug, Clone)]
pub struct DetectorBank {
    detectors: Vec<Detector>,
}

impl DetectorBank {
    /// A bank holding exactly the given detectors, in order.
    pub fn new(detectors: Vec<Detector>) -> Self {
        Self { detectors }
    }

    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run every detector once over `window`.
    pub fn run<R: Borrow<TelemetryReading>>(&self, window: &[R]) -> BankRun {
        let mut run = BankRun::default();
        for detector in &self.detectors {
            run.runs += 1;
            if let Some(signal) = detector.evaluate(window) {
                run.detections.push(Detection {
                    fault_type: detector.fault_type(),
                    signal,
                });
            }
        }
        run
    }
}

impl Default for DetectorBank {
    fn default() -> Self {
        Self::new(Detector::ALL.to_vec())
    }
}
