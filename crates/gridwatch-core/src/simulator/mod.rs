// ── SCADA telemetry simulator ──
//
// Explicit simulation state owned by one `Simulator`. The scheduler drives
// it through `next_reading` (reading cadence) and `tick` (one time unit);
// all randomness comes from the simulator's own seeded RNG.

pub mod generator;
pub mod scenario;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::Rng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{EntityId, Fault, FaultStatus, TelemetryReading};

pub use generator::{BASELINE, generate_reading};
pub use scenario::{FaultScenario, MetricRange, symptoms_for};

/// Probability that an injected fault is flagged as AI-detected.
pub const AI_DETECTION_PROBABILITY: f64 = 0.7;

/// Bounds of the autonomous-mode trigger delay, in time units.
pub const AUTO_FAULT_DELAY: std::ops::Range<u32> = 15..45;

/// The scenario currently overriding telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveScenario {
    pub scenario: FaultScenario,
    pub remaining_units: u32,
}

/// Observable simulator state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulatorState {
    pub running: bool,
    pub active: Option<ActiveScenario>,
    pub readings_generated: u64,
    pub auto_fault: bool,
    /// Units left before autonomous mode activates a scenario.
    pub auto_fault_due: Option<u32>,
}

/// Result of a scenario activation.
#[derive(Debug, Clone)]
pub struct Activation {
    pub scenario: FaultScenario,
    /// Fault record to persist; `None` when the fleet is empty.
    pub fault: Option<Fault>,
}

/// What happened during one time unit.
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    pub expired: Option<FaultScenario>,
    pub activation: Option<Activation>,
}

pub struct Simulator {
    sites: Vec<String>,
    state: SimulatorState,
    rng: StdRng,
}

impl Simulator {
    /// A paused simulator over `sites`. `seed` fixes every random draw.
    pub fn new(sites: Vec<String>, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self::with_rng(sites, rng)
    }

    pub fn with_rng(sites: Vec<String>, rng: StdRng) -> Self {
        Self {
            sites,
            state: SimulatorState::default(),
            rng,
        }
    }

    pub fn state(&self) -> &SimulatorState {
        &self.state
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn set_sites(&mut self, sites: Vec<String>) {
        self.sites = sites;
    }

    /// Mutable access to the simulator RNG for callers sharing its seed.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn active_scenario(&self) -> Option<FaultScenario> {
        self.state.active.map(|a| a.scenario)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    pub fn start(&mut self) {
        self.state.running = true;
        self.schedule_auto_fault();
    }

    pub fn pause(&mut self) {
        self.state.running = false;
        self.state.auto_fault_due = None;
    }

    /// Clear the reading counter and any active scenario.
    pub fn reset(&mut self) {
        self.state.readings_generated = 0;
        self.state.active = None;
        self.state.auto_fault_due = None;
        self.schedule_auto_fault();
    }

    pub fn set_auto_fault(&mut self, enabled: bool) {
        self.state.auto_fault = enabled;
        if enabled {
            self.schedule_auto_fault();
        } else {
            self.state.auto_fault_due = None;
        }
    }

    // ── Generation ───────────────────────────────────────────────────

    /// Produce a reading for a random site. `None` while paused or when
    /// there are no sites.
    pub fn next_reading(&mut self, now: DateTime<Utc>) -> Option<TelemetryReading> {
        if !self.state.running || self.sites.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.sites.len());
        let site_id = self.sites.get(index)?.clone();
        let reading = generate_reading(&site_id, self.active_scenario(), &mut self.rng, now);
        self.state.readings_generated += 1;
        Some(reading)
    }

    /// Activate `scenario`. Rejected while another scenario is active.
    pub fn activate(
        &mut self,
        scenario: FaultScenario,
        now: DateTime<Utc>,
    ) -> Result<Activation, CoreError> {
        if let Some(active) = self.state.active {
            return Err(CoreError::ScenarioActive {
                active: active.scenario.to_string(),
            });
        }

        self.state.active = Some(ActiveScenario {
            scenario,
            remaining_units: scenario.duration_units(),
        });
        self.state.auto_fault_due = None;
        info!(%scenario, duration = scenario.duration_units(), "fault scenario activated");

        let fault = if self.sites.is_empty() {
            None
        } else {
            let index = self.rng.gen_range(0..self.sites.len());
            self.sites.get(index).map(|site_id| {
                let fault_type = scenario.fault_type();
                Fault {
                    id: EntityId::unassigned(),
                    fault_id: format!("F-{}", now.timestamp_millis()),
                    site_id: site_id.clone(),
                    severity: scenario.severity(),
                    status: FaultStatus::Active,
                    start_timestamp: now,
                    trigger_condition: scenario.trigger_condition(),
                    observable_symptoms: symptoms_for(&fault_type),
                    detected_by_ai: self.rng.gen_bool(AI_DETECTION_PROBABILITY),
                    detection_lead_time_min: None,
                    resolved_at: None,
                    fault_type,
                }
            })
        };

        Ok(Activation { scenario, fault })
    }

    /// Advance one time unit: run the countdown and autonomous mode.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if let Some(active) = self.state.active.as_mut() {
            active.remaining_units = active.remaining_units.saturating_sub(1);
            if active.remaining_units == 0 {
                let scenario = active.scenario;
                self.state.active = None;
                debug!(%scenario, "fault scenario expired");
                outcome.expired = Some(scenario);
                self.schedule_auto_fault();
            }
            return outcome;
        }

        if !self.state.running || !self.state.auto_fault {
            return outcome;
        }
        let Some(due) = self.state.auto_fault_due else {
            self.schedule_auto_fault();
            return outcome;
        };
        if due > 1 {
            self.state.auto_fault_due = Some(due - 1);
            return outcome;
        }

        let index = self.rng.gen_range(0..FaultScenario::ALL.len());
        if let Some(&scenario) = FaultScenario::ALL.get(index) {
            outcome.activation = self.activate(scenario, now).ok();
        }
        outcome
    }

    fn schedule_auto_fault(&mut self) {
        if self.state.auto_fault && self.state.running && self.state.active.is_none() {
            self.state.auto_fault_due = Some(self.rng.gen_range(AUTO_FAULT_DELAY));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn sim() -> Simulator {
        Simulator::new(vec!["S1".into(), "S2".into()], Some(17))
    }

    #[test]
    fn paused_simulator_produces_nothing() {
        let mut s = sim();
        assert!(s.next_reading(Utc::now()).is_none());
        s.start();
        assert!(s.next_reading(Utc::now()).is_some());
        assert_eq!(s.state().readings_generated, 1);
    }

    #[test]
    fn empty_fleet_produces_nothing() {
        let mut s = Simulator::new(Vec::new(), Some(1));
        s.start();
        assert!(s.next_reading(Utc::now()).is_none());
        let activation = s.activate(FaultScenario::Overvoltage, Utc::now()).unwrap();
        assert!(activation.fault.is_none());
        assert_eq!(s.active_scenario(), Some(FaultScenario::Overvoltage));
    }

    #[test]
    fn second_activation_is_rejected_while_active() {
        let mut s = sim();
        s.activate(FaultScenario::Overvoltage, Utc::now()).unwrap();
        let err = s.activate(FaultScenario::Undervoltage, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::ScenarioActive { ref active } if active == "overvoltage"));
        assert_eq!(s.active_scenario(), Some(FaultScenario::Overvoltage));
    }

    #[test]
    fn activation_builds_active_fault() {
        let mut s = sim();
        let now = Utc::now();
        let fault = s
            .activate(FaultScenario::InverterOverheat, now)
            .unwrap()
            .fault
            .unwrap();
        assert_eq!(fault.status, FaultStatus::Active);
        assert_eq!(fault.severity, Severity::High);
        assert_eq!(fault.trigger_condition, "Simulated inverter_overheat event");
        assert_eq!(fault.observable_symptoms.len(), 3);
        assert_eq!(fault.fault_id, format!("F-{}", now.timestamp_millis()));
        assert!(["S1", "S2"].contains(&fault.site_id.as_str()));
    }

    #[test]
    fn scenario_expires_after_its_duration() {
        let mut s = sim();
        s.activate(FaultScenario::HarmonicSpike, Utc::now()).unwrap();
        for _ in 0..14 {
            assert!(s.tick(Utc::now()).expired.is_none());
        }
        assert_eq!(s.tick(Utc::now()).expired, Some(FaultScenario::HarmonicSpike));
        assert!(s.active_scenario().is_none());
        assert!(s.activate(FaultScenario::Undervoltage, Utc::now()).is_ok());
    }

    #[test]
    fn active_scenario_overrides_readings() {
        let mut s = sim();
        s.start();
        s.activate(FaultScenario::Overvoltage, Utc::now()).unwrap();
        for _ in 0..20 {
            let voltage = s.next_reading(Utc::now()).unwrap().voltage_kv.unwrap();
            assert!((130.0..145.0).contains(&voltage));
        }
    }

    #[test]
    fn auto_fault_fires_within_delay_window() {
        let mut s = sim();
        s.set_auto_fault(true);
        s.start();
        let due = s.state().auto_fault_due.unwrap();
        assert!(AUTO_FAULT_DELAY.contains(&due));

        let mut fired_at = None;
        for unit in 1..=45 {
            if s.tick(Utc::now()).activation.is_some() {
                fired_at = Some(unit);
                break;
            }
        }
        assert_eq!(fired_at, Some(due));
        assert!(s.active_scenario().is_some());
    }

    #[test]
    fn auto_fault_waits_while_paused() {
        let mut s = sim();
        s.set_auto_fault(true);
        for _ in 0..60 {
            assert!(s.tick(Utc::now()).activation.is_none());
        }
    }

    #[test]
    fn reset_clears_counter_and_scenario() {
        let mut s = sim();
        s.start();
        s.next_reading(Utc::now());
        s.activate(FaultScenario::DcInstability, Utc::now()).unwrap();
        s.reset();
        assert_eq!(s.state().readings_generated, 0);
        assert!(s.active_scenario().is_none());
        assert!(s.is_running());
    }

    #[test]
    fn same_seed_same_sequence() {
        let now = Utc::now();
        let mut a = sim();
        let mut b = sim();
        a.start();
        b.start();
        for _ in 0..10 {
            let ra = a.next_reading(now).unwrap();
            let rb = b.next_reading(now).unwrap();
            assert_eq!(ra.site_id, rb.site_id);
            assert_eq!(ra.voltage_kv, rb.voltage_kv);
        }
    }
}
