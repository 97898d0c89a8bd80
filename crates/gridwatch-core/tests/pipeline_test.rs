//! End-to-end tests for the monitor pipeline.
//!
//! Scheduling tests run on paused tokio time, so a 30-unit cadence takes no
//! wall-clock time. Record timestamps come from a `ManualClock`.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use gridwatch_core::{
    Clock, Command, CommandResult, ConfidenceLevel, CoreError, DuplicatePolicy, FaultScenario,
    FaultType, MaintenanceStatus, ManualClock, Metric, Monitor, MonitorConfig, MonitorEvent,
    Priority, Recommendation, Repository, Site, SiteType, SortOrder, TelemetryReading,
    maintenance_queue,
};
use pretty_assertions::assert_eq;

// ── Helpers ─────────────────────────────────────────────────────────

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    ))
}

fn fleet() -> Vec<Site> {
    let now = Utc::now();
    vec![
        Site::new("S1", "Alpha Solar", SiteType::Solar, now),
        Site::new("S2", "Bravo Wind", SiteType::Wind, now),
    ]
}

fn config() -> MonitorConfig {
    MonitorConfig {
        seed: Some(42),
        ..MonitorConfig::default()
    }
}

fn monitor_with(config: MonitorConfig) -> Monitor {
    Monitor::with_clock(config, fleet(), clock())
}

fn voltage(site: &str, kv: f64) -> TelemetryReading {
    TelemetryReading::new(site, Utc::now()).with_metric(Metric::VoltageKv, kv)
}

// ── Analysis pipeline ───────────────────────────────────────────────

#[test]
fn overvoltage_readings_become_a_critical_action() {
    let clock = clock();
    let monitor = Monitor::with_clock(config(), fleet(), clock.clone());
    for kv in [126.0, 127.0, 125.0, 128.0, 124.0] {
        monitor.ingest(voltage("S1", kv)).unwrap();
    }

    let report = monitor.run_prediction_cycle();
    assert_eq!(report.sites_evaluated, 1);
    assert_eq!(report.predictions.len(), 1);

    let prediction = &report.predictions[0];
    assert_eq!(prediction.site_id, "S1");
    assert_eq!(prediction.predicted_fault_type, FaultType::Overvoltage);
    assert!((prediction.fault_probability - 0.85).abs() < 1e-9);
    assert_eq!(prediction.estimated_time_to_failure_min, 25);
    assert_eq!(prediction.confidence_level, ConfidenceLevel::VeryHigh);
    assert_eq!(prediction.timestamp, clock.now());

    let recommendation = monitor.recommend(&prediction.id).unwrap();
    let action = recommendation.action();
    assert!(recommendation.is_new());
    assert_eq!(action.priority, Priority::Critical);
    assert_eq!(action.estimated_repair_cost_usd, 2500);
    assert_eq!(action.estimated_downtime_if_ignored_hr, 8);
    assert_eq!(action.status, MaintenanceStatus::Pending);
    assert_eq!(action.triggered_by_prediction_id, prediction.id);
    assert_eq!(monitor.store().maintenance().len(), 1);
}

#[test]
fn sites_with_too_few_readings_are_skipped() {
    let monitor = monitor_with(config());
    monitor.ingest(voltage("S1", 140.0)).unwrap();
    monitor.ingest(voltage("S1", 140.0)).unwrap();
    for _ in 0..3 {
        monitor.ingest(voltage("S2", 121.0)).unwrap();
    }

    let report = monitor.run_prediction_cycle();
    assert_eq!(report.sites_skipped, 1);
    assert_eq!(report.sites_evaluated, 1);
    assert_eq!(report.detector_runs, 6);
    assert!(report.predictions.is_empty());
}

#[test]
fn skip_policy_returns_the_existing_action() {
    let monitor = monitor_with(MonitorConfig {
        duplicate_recommendations: DuplicatePolicy::Skip,
        ..config()
    });
    for _ in 0..5 {
        monitor.ingest(voltage("S1", 100.0)).unwrap();
    }
    let report = monitor.run_prediction_cycle();
    let prediction = &report.predictions[0];
    assert_eq!(prediction.predicted_fault_type, FaultType::Undervoltage);

    let first = monitor.recommend(&prediction.id).unwrap();
    let second = monitor.recommend(&prediction.id).unwrap();
    assert!(matches!(second, Recommendation::Existing(_)));
    assert_eq!(first.action().id, second.action().id);
    assert_eq!(monitor.store().maintenance().len(), 1);
}

#[test]
fn maintenance_queue_and_status_rules() {
    let monitor = monitor_with(config());
    // Overvoltage (0.85, critical) on S1, harmonic spike (0.68, high) on S2.
    for _ in 0..5 {
        monitor.ingest(voltage("S1", 130.0)).unwrap();
        monitor
            .ingest(voltage("S2", 120.0).with_metric(Metric::ThdPct, 12.0))
            .unwrap();
    }
    let report = monitor.run_prediction_cycle();
    assert_eq!(report.predictions.len(), 2);
    for prediction in &report.predictions {
        monitor.recommend(&prediction.id).unwrap();
    }

    let mut queue = monitor
        .store()
        .maintenance()
        .list(SortOrder::OldestFirst, None);
    maintenance_queue(&mut queue);
    let priorities: Vec<_> = queue.iter().map(|a| a.priority).collect();
    assert_eq!(priorities, vec![Priority::Critical, Priority::High]);

    let id = queue[0].id.clone();
    let scheduled = monitor
        .update_maintenance_status(&id, MaintenanceStatus::Scheduled)
        .unwrap();
    assert_eq!(scheduled.status, MaintenanceStatus::Scheduled);
    let err = monitor
        .update_maintenance_status(&id, MaintenanceStatus::InProgress)
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));
}

#[tokio::test]
async fn evaluation_with_no_history_uses_fallbacks() {
    let monitor = monitor_with(config());
    let result = monitor.run_evaluation().await.unwrap();
    assert_eq!(result.true_positives, 12);
    assert_eq!(result.false_positives, 3);
    assert_eq!(result.false_negatives, 2);
    assert_eq!(result.true_negatives, 45);
    assert!((result.precision - 0.86).abs() < 1e-9);
    assert!((result.recall - 0.92).abs() < 1e-9);
    assert!((result.f1_score - 0.89).abs() < 1e-9);
    assert_eq!(result.avg_early_warning_lead_time_min, 35);
    assert_eq!(monitor.store().evaluations().len(), 1);
}

#[test]
fn labelled_predictions_keep_their_label() {
    let monitor = monitor_with(config());
    for _ in 0..3 {
        monitor.ingest(voltage("S1", 130.0)).unwrap();
    }
    let prediction = monitor.run_prediction_cycle().predictions[0].clone();
    monitor.label_prediction(&prediction.id, true).unwrap();
    let stored = monitor.store().predictions().get(&prediction.id).unwrap();
    assert_eq!(stored.was_accurate, Some(true));
}

// ── Scheduling (paused time) ────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn running_monitor_generates_readings_until_stopped() {
    let monitor = monitor_with(config());
    monitor.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(monitor.store().readings().len(), 3);

    monitor.stop().await;
    let after_stop = monitor.store().readings().len();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(monitor.store().readings().len(), after_stop);
    assert!(!monitor.simulator_state().await.running);
}

#[tokio::test(start_paused = true)]
async fn prediction_cycle_runs_on_its_cadence() {
    let monitor = monitor_with(config());
    let mut events = monitor.events();
    monitor.start().await.unwrap();
    monitor
        .execute(Command::ActivateScenario {
            scenario: FaultScenario::InverterOverheat,
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30_500)).await;
    monitor.stop().await;

    let mut completed = None;
    while let Ok(event) = events.try_recv() {
        if let MonitorEvent::PredictionCycleCompleted { report } = event.as_ref() {
            completed = Some(report.clone());
        }
    }
    let report = completed.expect("a prediction cycle ran");
    assert!(report.sites_evaluated >= 1);
    assert!(
        report
            .predictions
            .iter()
            .all(|p| p.predicted_fault_type == FaultType::InverterOverheat)
    );
}

#[tokio::test(start_paused = true)]
async fn scenario_countdown_expires_and_allows_the_next() {
    let monitor = monitor_with(config());
    monitor.start().await.unwrap();

    let result = monitor
        .execute(Command::ActivateScenario {
            scenario: FaultScenario::HarmonicSpike,
        })
        .await
        .unwrap();
    let CommandResult::ScenarioActivated(Some(fault)) = result else {
        panic!("expected an activation with a fault");
    };
    assert_eq!(fault.fault_type, FaultType::HarmonicSpike);

    let busy = monitor
        .execute(Command::ActivateScenario {
            scenario: FaultScenario::Overvoltage,
        })
        .await
        .unwrap_err();
    assert!(matches!(busy, CoreError::ScenarioActive { .. }));

    tokio::time::sleep(Duration::from_millis(15_500)).await;
    assert!(monitor.simulator_state().await.active.is_none());
    assert!(
        monitor
            .execute(Command::ActivateScenario {
                scenario: FaultScenario::Overvoltage,
            })
            .await
            .is_ok()
    );
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn autonomous_mode_injects_a_fault() {
    let monitor = monitor_with(MonitorConfig {
        auto_fault: true,
        ..config()
    });
    monitor.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(45_500)).await;
    monitor.stop().await;

    assert!(!monitor.store().faults().is_empty());
}
