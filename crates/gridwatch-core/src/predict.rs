// ── Prediction synthesizer ──
//
// Turns detector output into persisted `Prediction` records. A cycle first
// evaluates every site and detector, then persists the results; a failed
// write is logged and the rest of the batch still goes through.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::detect::{DetectorBank, MIN_READINGS};
use crate::model::{ConfidenceLevel, EntityId, FaultType, Prediction, TelemetryReading};
use crate::store::Repository;

/// Version tag stamped on every prediction by default.
pub const MODEL_VERSION: &str = "v2.4.1-rf-ensemble";

/// Detector results at or below this probability are discarded.
pub const EMIT_THRESHOLD: f64 = 0.5;

/// Fixed explanation phrases attached to a prediction.
pub fn contributing_factors(fault_type: &FaultType) -> Vec<String> {
    let factors: &[&str] = match fault_type {
        FaultType::Overvoltage => &[
            "Rising voltage trend",
            "Grid instability detected",
            "Load imbalance",
        ],
        FaultType::Undervoltage => &[
            "Voltage drop trend",
            "High load conditions",
            "Transformer tap position",
        ],
        FaultType::FrequencyDrift => &[
            "Generation-load mismatch",
            "Interconnection stress",
            "Governor response delay",
        ],
        FaultType::InverterOverheat => &[
            "Ambient temperature rise",
            "Reduced cooling efficiency",
            "High power throughput",
        ],
        FaultType::ScadaLatency => &[
            "Network congestion",
            "RTU response delay",
            "Packet queue buildup",
        ],
        FaultType::HarmonicSpike => &[
            "Non-linear load increase",
            "Filter degradation",
            "Resonance conditions",
        ],
        FaultType::DcInstability | FaultType::Other(_) => &["Anomaly pattern detected"],
    };
    factors.iter().map(|&f| f.to_owned()).collect()
}

/// Sort predictions by probability, highest first. Ties keep their order.
pub fn rank_by_probability(predictions: &mut [Arc<Prediction>]) {
    predictions.sort_by(|a, b| b.fault_probability.total_cmp(&a.fault_probability));
}

/// Group readings by site, preserving the input order inside each group.
pub fn group_by_site(
    readings: &[Arc<TelemetryReading>],
) -> BTreeMap<String, Vec<Arc<TelemetryReading>>> {
    let mut groups: BTreeMap<String, Vec<Arc<TelemetryReading>>> = BTreeMap::new();
    for reading in readings {
        groups
            .entry(reading.site_id.clone())
            .or_default()
            .push(Arc::clone(reading));
    }
    groups
}

/// Unpersisted output of one site's evaluation.
#[derive(Debug, Clone)]
pub struct SiteEvaluation {
    pub site_id: String,
    pub detector_runs: usize,
    pub predictions: Vec<Prediction>,
}

/// Summary of one prediction cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub sites_evaluated: usize,
    /// Sites with too few readings, or already under evaluation.
    pub sites_skipped: usize,
    pub detector_runs: usize,
    pub predictions: Vec<Arc<Prediction>>,
    pub failures: usize,
}

/// Runs the detector bank over each site and builds predictions.
#[derive(Debug, Clone)]
pub struct PredictionSynthesizer {
    bank: DetectorBank,
    model_version: String,
}

impl PredictionSynthesizer {
    pub fn new(bank: DetectorBank, model_version: impl Into<String>) -> Self {
        Self {
            bank,
            model_version: model_version.into(),
        }
    }

    pub fn bank(&self) -> &DetectorBank {
        &self.bank
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Evaluate one site's readings (newest first).
    ///
    /// Returns `None` when the site has fewer than [`MIN_READINGS`].
    pub fn evaluate_site(
        &self,
        site_id: &str,
        readings: &[Arc<TelemetryReading>],
        now: DateTime<Utc>,
    ) -> Option<SiteEvaluation> {
        if readings.len() < MIN_READINGS {
            return None;
        }

        let run = self.bank.run(readings);
        let predictions = run
            .detections
            .into_iter()
            .filter(|d| d.signal.probability > EMIT_THRESHOLD)
            .map(|d| Prediction {
                id: EntityId::unassigned(),
                site_id: site_id.to_owned(),
                timestamp: now,
                contributing_factors: contributing_factors(&d.fault_type),
                predicted_fault_type: d.fault_type,
                fault_probability: d.signal.probability,
                estimated_time_to_failure_min: d.signal.ttf_min,
                confidence_level: ConfidenceLevel::from_probability(d.signal.probability),
                model_version: self.model_version.clone(),
                was_accurate: None,
            })
            .collect();

        Some(SiteEvaluation {
            site_id: site_id.to_owned(),
            detector_runs: run.runs,
            predictions,
        })
    }

    /// Evaluate every site in `readings` (newest first). Returns the
    /// evaluations and the number of sites skipped for lack of data.
    pub fn evaluate(
        &self,
        readings: &[Arc<TelemetryReading>],
        now: DateTime<Utc>,
    ) -> (Vec<SiteEvaluation>, usize) {
        let mut skipped = 0;
        let evaluations = group_by_site(readings)
            .into_iter()
            .filter_map(|(site_id, window)| {
                let evaluation = self.evaluate_site(&site_id, &window, now);
                if evaluation.is_none() {
                    debug!(site = %site_id, readings = window.len(), "skipping site with too few readings");
                    skipped += 1;
                }
                evaluation
            })
            .collect();
        (evaluations, skipped)
    }

    /// Persist evaluated predictions. Each failed write is logged and counted.
    pub fn persist(
        evaluations: Vec<SiteEvaluation>,
        repo: &dyn Repository<Prediction>,
    ) -> CycleReport {
        let mut report = CycleReport::default();
        for evaluation in evaluations {
            report.sites_evaluated += 1;
            report.detector_runs += evaluation.detector_runs;
            for prediction in evaluation.predictions {
                let fault_type = prediction.predicted_fault_type.clone();
                match repo.create(prediction) {
                    Ok(saved) => report.predictions.push(saved),
                    Err(e) => {
                        warn!(
                            site = %evaluation.site_id,
                            fault_type = %fault_type,
                            error = %e,
                            "failed to save prediction"
                        );
                        report.failures += 1;
                    }
                }
            }
        }
        report
    }

    /// Evaluate all sites, then persist the results.
    pub fn run_cycle(
        &self,
        readings: &[Arc<TelemetryReading>],
        repo: &dyn Repository<Prediction>,
        now: DateTime<Utc>,
    ) -> CycleReport {
        let (evaluations, skipped) = self.evaluate(readings, now);
        let mut report = Self::persist(evaluations, repo);
        report.sites_skipped += skipped;
        debug!(
            sites = report.sites_evaluated,
            skipped = report.sites_skipped,
            predictions = report.predictions.len(),
            failures = report.failures,
            "prediction cycle complete"
        );
        report
    }
}

impl Default for PredictionSynthesizer {
    fn default() -> Self {
        Self::new(DetectorBank::default(), MODEL_VERSION)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::detect::Detector;
    use crate::error::CoreError;
    use crate::model::Metric;
    use crate::store::{EntityCollection, SortOrder};

    fn readings(site: &str, metric: Metric, values: &[f64]) -> Vec<Arc<TelemetryReading>> {
        values
            .iter()
            .map(|v| Arc::new(TelemetryReading::new(site, Utc::now()).with_metric(metric, *v)))
            .collect()
    }

    fn nominal(site: &str, count: usize) -> Vec<Arc<TelemetryReading>> {
        (0..count)
            .map(|_| {
                Arc::new(
                    TelemetryReading::new(site, Utc::now())
                        .with_metric(Metric::VoltageKv, 120.0)
                        .with_metric(Metric::FrequencyHz, 60.0)
                        .with_metric(Metric::InverterTempC, 60.0)
                        .with_metric(Metric::LatencyMs, 25.0)
                        .with_metric(Metric::ThdPct, 3.0),
                )
            })
            .collect()
    }

    /// Repository whose writes always fail.
    struct FailingRepo;

    impl Repository<Prediction> for FailingRepo {
        fn create(&self, _: Prediction) -> Result<Arc<Prediction>, CoreError> {
            Err(CoreError::Persistence {
                entity_type: "prediction".into(),
                message: "disk full".into(),
            })
        }
        fn list(&self, _: SortOrder, _: Option<usize>) -> Vec<Arc<Prediction>> {
            Vec::new()
        }
        fn filter(
            &self,
            _: &dyn Fn(&Prediction) -> bool,
            _: SortOrder,
            _: Option<usize>,
        ) -> Vec<Arc<Prediction>> {
            Vec::new()
        }
        fn update(
            &self,
            id: &EntityId,
            _: &dyn Fn(&mut Prediction) -> Result<(), CoreError>,
        ) -> Result<Arc<Prediction>, CoreError> {
            Err(CoreError::not_found("prediction", id))
        }
        fn get(&self, _: &EntityId) -> Option<Arc<Prediction>> {
            None
        }
    }

    #[test]
    fn overvoltage_window_yields_one_very_high_prediction() {
        let all = readings("S1", Metric::VoltageKv, &[126.0, 127.0, 125.0, 128.0, 124.0]);

        let repo = EntityCollection::new();
        let report = PredictionSynthesizer::default().run_cycle(&all, &repo, Utc::now());

        assert_eq!(report.predictions.len(), 1);
        let p = &report.predictions[0];
        assert_eq!(p.site_id, "S1");
        assert_eq!(p.predicted_fault_type, FaultType::Overvoltage);
        assert!((p.fault_probability - 0.85).abs() < f64::EPSILON);
        assert_eq!(p.estimated_time_to_failure_min, 25);
        assert_eq!(p.confidence_level, ConfidenceLevel::VeryHigh);
        assert_eq!(p.model_version, MODEL_VERSION);
        assert_eq!(p.contributing_factors.len(), 3);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn sites_below_three_readings_are_skipped() {
        let mut all = readings("S1", Metric::VoltageKv, &[140.0, 140.0]);
        all.extend(nominal("S2", 4));

        let repo = EntityCollection::new();
        let report = PredictionSynthesizer::default().run_cycle(&all, &repo, Utc::now());

        assert_eq!(report.sites_evaluated, 1);
        assert_eq!(report.sites_skipped, 1);
        assert!(report.predictions.is_empty());
    }

    #[test]
    fn every_detector_runs_once_per_evaluated_site() {
        let mut all = nominal("A", 3);
        all.extend(nominal("B", 6));

        let repo = EntityCollection::new();
        let report = PredictionSynthesizer::default().run_cycle(&all, &repo, Utc::now());

        assert_eq!(report.sites_evaluated, 2);
        assert_eq!(report.detector_runs, 2 * Detector::ALL.len());
    }

    #[test]
    fn detector_runs_follow_the_configured_bank() {
        let bank = DetectorBank::new(vec![Detector::Overvoltage, Detector::HarmonicSpike]);
        let synthesizer = PredictionSynthesizer::new(bank, MODEL_VERSION);
        let mut all = readings("A", Metric::VoltageKv, &[130.0; 4]);
        all.extend(nominal("B", 3));
        all.extend(nominal("C", 2));

        let repo = EntityCollection::new();
        let report = synthesizer.run_cycle(&all, &repo, Utc::now());

        assert_eq!(report.sites_evaluated, 2);
        assert_eq!(report.sites_skipped, 1);
        assert_eq!(report.detector_runs, 4);
        assert_eq!(report.predictions.len(), 1);
    }

    #[test]
    fn multiple_detectors_fire_for_one_site() {
        let all: Vec<_> = (0..5)
            .map(|_| {
                Arc::new(
                    TelemetryReading::new("S1", Utc::now())
                        .with_metric(Metric::VoltageKv, 130.0)
                        .with_metric(Metric::FrequencyHz, 60.0)
                        .with_metric(Metric::InverterTempC, 85.0)
                        .with_metric(Metric::LatencyMs, 300.0),
                )
            })
            .collect();

        let repo = EntityCollection::new();
        let report = PredictionSynthesizer::default().run_cycle(&all, &repo, Utc::now());
        let types: Vec<_> = report
            .predictions
            .iter()
            .map(|p| p.predicted_fault_type.clone())
            .collect();
        assert_eq!(
            types,
            vec![
                FaultType::Overvoltage,
                FaultType::InverterOverheat,
                FaultType::ScadaLatency
            ]
        );
    }

    #[test]
    fn persistence_failures_are_counted_not_fatal() {
        let mut all = readings("A", Metric::VoltageKv, &[140.0; 5]);
        all.extend(readings("B", Metric::VoltageKv, &[140.0; 5]));

        let report = PredictionSynthesizer::default().run_cycle(&all, &FailingRepo, Utc::now());

        assert_eq!(report.sites_evaluated, 2);
        assert_eq!(report.failures, 2);
        assert!(report.predictions.is_empty());
    }

    #[test]
    fn unknown_types_get_generic_factor() {
        assert_eq!(
            contributing_factors(&FaultType::Other("islanding".into())),
            vec!["Anomaly pattern detected".to_owned()]
        );
        assert_eq!(
            contributing_factors(&FaultType::Overvoltage),
            vec![
                "Rising voltage trend".to_owned(),
                "Grid instability detected".to_owned(),
                "Load imbalance".to_owned()
            ]
        );
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let make = |site: &str, p: f64| {
            Arc::new(Prediction {
                id: EntityId::unassigned(),
                site_id: site.into(),
                timestamp: Utc::now(),
                predicted_fault_type: FaultType::Overvoltage,
                fault_probability: p,
                estimated_time_to_failure_min: 10,
                confidence_level: ConfidenceLevel::from_probability(p),
                contributing_factors: Vec::new(),
                model_version: MODEL_VERSION.into(),
                was_accurate: None,
            })
        };
        let mut ranked = vec![make("a", 0.68), make("b", 0.92), make("c", 0.68), make("d", 0.75)];
        rank_by_probability(&mut ranked);
        let order: Vec<_> = ranked.iter().map(|p| p.site_id.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }
}
