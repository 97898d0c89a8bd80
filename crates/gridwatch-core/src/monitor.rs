// ── Monitor abstraction ──
//
// Full lifecycle management for one monitored fleet. Owns the simulator,
// the analysis services and the DataStore; drives the recurring reading,
// countdown and prediction tasks; routes operator commands.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::MonitorConfig;
use crate::detect::DetectorBank;
use crate::error::CoreError;
use crate::evaluate::Evaluator;
use crate::model::{
    EntityId, EvaluationResult, Fault, FaultStatus, MaintenanceAction, MaintenanceStatus,
    Prediction, Site, TelemetryReading,
};
use crate::predict::{CycleReport, PredictionSynthesizer, group_by_site};
use crate::recommend::{Recommendation, RecommendationGenerator};
use crate::simulator::{Activation, FaultScenario, Simulator, SimulatorState};
use crate::store::{DataStore, Repository, SortOrder};
use crate::stream::EntityStream;

const COMMAND_CHANNEL_SIZE: usize = 64;
const EVENT_CHANNEL_SIZE: usize = 256;

// ── MonitorState ────────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Idle,
    Running,
    Stopped,
}

// ── MonitorEvent ────────────────────────────────────────────────────

/// Notifications broadcast as the pipeline runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    ReadingRecorded {
        reading: Arc<TelemetryReading>,
    },
    ScenarioActivated {
        scenario: FaultScenario,
        fault: Option<Arc<Fault>>,
    },
    ScenarioExpired {
        scenario: FaultScenario,
    },
    PredictionCycleCompleted {
        report: CycleReport,
    },
    MaintenanceRecommended {
        action: Arc<MaintenanceAction>,
    },
    EvaluationRecorded {
        result: Arc<EvaluationResult>,
    },
}

// ── Monitor ─────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. Operations can be called
/// directly at any time; [`start()`](Self::start) additionally spawns the
/// recurring tasks and the command processor behind
/// [`execute()`](Self::execute).
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    store: Arc<DataStore>,
    clock: Arc<dyn Clock>,
    simulator: Mutex<Simulator>,
    synthesizer: PredictionSynthesizer,
    recommender: RecommendationGenerator,
    evaluator: Evaluator,
    state: watch::Sender<MonitorState>,
    event_tx: broadcast::Sender<Arc<MonitorEvent>>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    sites_in_flight: DashSet<String>,
}

impl Monitor {
    /// Create a monitor over `fleet` using the system clock.
    pub fn new(config: MonitorConfig, fleet: Vec<Site>) -> Self {
        Self::with_clock(config, fleet, Arc::new(SystemClock))
    }

    /// Create a monitor with an injected clock for record timestamps.
    pub fn with_clock(config: MonitorConfig, fleet: Vec<Site>, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(DataStore::with_reading_retention(config.reading_retention));
        let site_ids = fleet.iter().map(|s| s.site_id.clone()).collect();
        store.apply_fleet(fleet);

        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let mut simulator = Simulator::with_rng(site_ids, rng);
        simulator.set_auto_fault(config.auto_fault);

        let synthesizer =
            PredictionSynthesizer::new(DetectorBank::default(), config.model_version.clone());
        let recommender = RecommendationGenerator::new(config.duplicate_recommendations);
        let evaluator = Evaluator::new(config.evaluation_period_days, config.model_version.clone());

        let (state, _) = watch::channel(MonitorState::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(MonitorInner {
                config,
                store,
                clock,
                simulator: Mutex::new(simulator),
                synthesizer,
                recommender,
                evaluator,
                state,
                event_tx,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
                sites_in_flight: DashSet::new(),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn synthesizer(&self) -> &PredictionSynthesizer {
        &self.inner.synthesizer
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the simulator and spawn the background tasks.
    ///
    /// A monitor runs once: after [`stop()`](Self::stop) it cannot be
    /// started again.
    pub async fn start(&self) -> Result<(), CoreError> {
        // Held until the state flips, so concurrent callers spawn one task set.
        let mut handles = self.inner.task_handles.lock().await;
        let state = *self.inner.state.borrow();
        match state {
            MonitorState::Running => return Ok(()),
            MonitorState::Stopped => return Err(CoreError::MonitorStopped),
            MonitorState::Idle => {}
        }

        self.inner.simulator.lock().await.start();

        let config = &self.inner.config;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let monitor = self.clone();
            handles.push(tokio::spawn(command_processor_task(monitor, rx)));
        }

        if config.reading_every > 0 {
            let monitor = self.clone();
            let every = config.units(config.reading_every);
            handles.push(tokio::spawn(reading_task(monitor, every)));
        }

        let monitor = self.clone();
        handles.push(tokio::spawn(countdown_task(monitor, config.units(1))));

        if config.prediction_every > 0 {
            let monitor = self.clone();
            let every = config.units(config.prediction_every);
            handles.push(tokio::spawn(prediction_task(monitor, every)));
        }

        let _ = self.inner.state.send(MonitorState::Running);
        drop(handles);
        info!(
            sites = self.inner.store.sites().len(),
            auto_fault = config.auto_fault,
            "monitor started"
        );
        Ok(())
    }

    /// Cancel future timer firings and join the background tasks.
    /// Writes already in flight complete.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        self.inner.simulator.lock().await.pause();
        let _ = self.inner.state.send(MonitorState::Stopped);
        debug!("monitor stopped");
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a command through the command processor.
    ///
    /// Commands are applied one at a time in arrival order. Fails with
    /// [`CoreError::MonitorStopped`] unless the monitor is running.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.state.borrow() != MonitorState::Running {
            return Err(CoreError::MonitorStopped);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::MonitorStopped)?;

        rx.await.map_err(|_| CoreError::MonitorStopped)?
    }

    // ── Simulator operations ─────────────────────────────────────────

    pub async fn simulator_state(&self) -> SimulatorState {
        self.inner.simulator.lock().await.state().clone()
    }

    pub async fn set_auto_fault(&self, enabled: bool) {
        self.inner.simulator.lock().await.set_auto_fault(enabled);
        info!(enabled, "autonomous fault mode changed");
    }

    /// Activate a fault scenario and persist its fault record.
    ///
    /// Rejected with [`CoreError::ScenarioActive`] while another scenario
    /// runs. A failed fault write is logged; the scenario stays active.
    pub async fn activate_scenario(
        &self,
        scenario: FaultScenario,
    ) -> Result<Option<Arc<Fault>>, CoreError> {
        let now = self.inner.clock.now();
        let activation = self.inner.simulator.lock().await.activate(scenario, now)?;
        Ok(self.record_activation(activation))
    }

    /// Advance the simulator by one time unit.
    pub async fn tick(&self) {
        let now = self.inner.clock.now();
        let outcome = self.inner.simulator.lock().await.tick(now);

        if let Some(scenario) = outcome.expired {
            info!(%scenario, "fault scenario ended");
            self.emit(MonitorEvent::ScenarioExpired { scenario });
        }
        if let Some(activation) = outcome.activation {
            self.record_activation(activation);
        }
    }

    /// Generate and store one reading. `None` while paused or when the
    /// write fails.
    pub async fn generate_reading(&self) -> Option<Arc<TelemetryReading>> {
        let now = self.inner.clock.now();
        let reading = self.inner.simulator.lock().await.next_reading(now)?;
        let site_id = reading.site_id.clone();

        match self.inner.store.readings().create(reading) {
            Ok(saved) => {
                self.emit(MonitorEvent::ReadingRecorded {
                    reading: Arc::clone(&saved),
                });
                Some(saved)
            }
            Err(e) => {
                warn!(site = %site_id, error = %e, "failed to save reading");
                None
            }
        }
    }

    /// Store an externally supplied reading.
    pub fn ingest(&self, reading: TelemetryReading) -> Result<Arc<TelemetryReading>, CoreError> {
        let saved = self.inner.store.readings().create(reading)?;
        self.emit(MonitorEvent::ReadingRecorded {
            reading: Arc::clone(&saved),
        });
        Ok(saved)
    }

    /// Drop all activity records and reset the simulator.
    pub async fn reset(&self) {
        self.inner.simulator.lock().await.reset();
        self.inner.store.clear_activity();
        info!("monitor reset");
    }

    // ── Analysis operations ──────────────────────────────────────────

    /// Run one prediction cycle over the newest readings.
    ///
    /// Every site is evaluated before anything is persisted. A site that
    /// a concurrent cycle is still evaluating or persisting is skipped.
    pub fn run_prediction_cycle(&self) -> CycleReport {
        let report = self.prediction_cycle_into(self.inner.store.predictions());
        info!(
            sites = report.sites_evaluated,
            skipped = report.sites_skipped,
            predictions = report.predictions.len(),
            failures = report.failures,
            "prediction cycle complete"
        );
        self.emit(MonitorEvent::PredictionCycleCompleted {
            report: report.clone(),
        });
        report
    }

    /// Evaluate and persist one cycle into `repo`. Each evaluated site's
    /// guard is held until the whole batch has been written.
    fn prediction_cycle_into(&self, repo: &dyn Repository<Prediction>) -> CycleReport {
        let inner = &self.inner;
        let now = inner.clock.now();
        let readings = inner
            .store
            .readings()
            .list(SortOrder::NewestFirst, Some(inner.config.prediction_sample));

        let mut skipped = 0;
        let mut guards = Vec::new();
        let mut evaluations = Vec::new();
        for (site_id, window) in group_by_site(&readings) {
            let Some(guard) = SiteGuard::acquire(&inner.sites_in_flight, &site_id) else {
                debug!(site = %site_id, "site already under evaluation");
                skipped += 1;
                continue;
            };
            match inner.synthesizer.evaluate_site(&site_id, &window, now) {
                Some(evaluation) => {
                    evaluations.push(evaluation);
                    guards.push(guard);
                }
                None => skipped += 1,
            }
        }

        let mut report = PredictionSynthesizer::persist(evaluations, repo);
        drop(guards);
        report.sites_skipped += skipped;
        report
    }

    /// Recommend a maintenance action for a stored prediction.
    pub fn recommend(&self, prediction_id: &EntityId) -> Result<Recommendation, CoreError> {
        let prediction = self
            .inner
            .store
            .predictions()
            .get(prediction_id)
            .ok_or_else(|| CoreError::not_found("prediction", prediction_id))?;

        let recommendation = self.inner.recommender.recommend(
            &prediction,
            self.inner.store.maintenance(),
            self.inner.clock.now(),
        )?;
        if recommendation.is_new() {
            self.emit(MonitorEvent::MaintenanceRecommended {
                action: Arc::clone(recommendation.action()),
            });
        }
        Ok(recommendation)
    }

    /// Score the newest predictions and faults and record the result.
    pub async fn run_evaluation(&self) -> Result<Arc<EvaluationResult>, CoreError> {
        let inner = &self.inner;
        let sample = Some(inner.config.evaluation_sample);
        let predictions = inner.store.predictions().list(SortOrder::NewestFirst, sample);
        let faults = inner.store.faults().list(SortOrder::NewestFirst, sample);

        let mut simulator = inner.simulator.lock().await;
        let result = inner.evaluator.record(
            &predictions,
            &faults,
            inner.store.evaluations(),
            simulator.rng(),
            inner.clock.now(),
        )?;
        drop(simulator);

        self.emit(MonitorEvent::EvaluationRecorded {
            result: Arc::clone(&result),
        });
        Ok(result)
    }

    // ── Operator lifecycle ───────────────────────────────────────────

    pub fn update_maintenance_status(
        &self,
        id: &EntityId,
        status: MaintenanceStatus,
    ) -> Result<Arc<MaintenanceAction>, CoreError> {
        self.inner.store.maintenance().update(id, &|action| {
            if !action.status.can_transition_to(status) {
                return Err(CoreError::invalid_transition(
                    "maintenance action",
                    action.status,
                    status,
                ));
            }
            action.status = status;
            Ok(())
        })
    }

    pub fn update_fault_status(
        &self,
        id: &EntityId,
        status: FaultStatus,
    ) -> Result<Arc<Fault>, CoreError> {
        let now = self.inner.clock.now();
        self.inner.store.faults().update(id, &|fault| {
            if !fault.status.can_transition_to(status) {
                return Err(CoreError::invalid_transition("fault", fault.status, status));
            }
            fault.status = status;
            if status == FaultStatus::Resolved {
                fault.resolved_at = Some(now);
            }
            Ok(())
        })
    }

    /// Backfill whether a prediction came true.
    pub fn label_prediction(
        &self,
        id: &EntityId,
        was_accurate: bool,
    ) -> Result<Arc<Prediction>, CoreError> {
        self.inner.store.predictions().update(id, &|prediction| {
            prediction.was_accurate = Some(was_accurate);
            Ok(())
        })
    }

    // ── State observation ────────────────────────────────────────────

    pub fn state(&self) -> watch::Receiver<MonitorState> {
        self.inner.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<Arc<MonitorEvent>> {
        self.inner.event_tx.subscribe()
    }

    pub fn readings(&self) -> EntityStream<TelemetryReading> {
        self.inner.store.subscribe_readings()
    }

    pub fn faults(&self) -> EntityStream<Fault> {
        self.inner.store.subscribe_faults()
    }

    pub fn predictions(&self) -> EntityStream<Prediction> {
        self.inner.store.subscribe_predictions()
    }

    pub fn maintenance(&self) -> EntityStream<MaintenanceAction> {
        self.inner.store.subscribe_maintenance()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn record_activation(&self, activation: Activation) -> Option<Arc<Fault>> {
        let Activation { scenario, fault } = activation;
        let saved = fault.and_then(|fault| {
            let site_id = fault.site_id.clone();
            self.inner
                .store
                .faults()
                .create(fault)
                .inspect_err(|e| warn!(site = %site_id, %scenario, error = %e, "failed to save fault"))
                .ok()
        });
        self.emit(MonitorEvent::ScenarioActivated {
            scenario,
            fault: saved.clone(),
        });
        saved
    }

    fn emit(&self, event: MonitorEvent) {
        let _ = self.inner.event_tx.send(Arc::new(event));
    }
}

// ── Per-site cycle guard ────────────────────────────────────────────

/// Marks a site as under evaluation until dropped.
struct SiteGuard<'a> {
    in_flight: &'a DashSet<String>,
    site_id: String,
}

impl<'a> SiteGuard<'a> {
    fn acquire(in_flight: &'a DashSet<String>, site_id: &str) -> Option<Self> {
        in_flight.insert(site_id.to_owned()).then(|| Self {
            in_flight,
            site_id: site_id.to_owned(),
        })
    }
}

impl Drop for SiteGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.site_id);
    }
}

// ── Background tasks ────────────────────────────────────────────────

/// Build an interval whose immediate first tick is already consumed.
async fn interval_after(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;
    interval
}

/// Generate one reading every reading period.
async fn reading_task(monitor: Monitor, every: Duration) {
    let cancel = monitor.inner.cancel.clone();
    let mut interval = interval_after(every).await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                monitor.generate_reading().await;
            }
        }
    }
}

/// Advance the scenario countdown and autonomous mode once per unit.
async fn countdown_task(monitor: Monitor, unit: Duration) {
    let cancel = monitor.inner.cancel.clone();
    let mut interval = interval_after(unit).await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => monitor.tick().await,
        }
    }
}

/// Run a prediction cycle every prediction period once telemetry exists.
async fn prediction_task(monitor: Monitor, every: Duration) {
    let cancel = monitor.inner.cancel.clone();
    let mut interval = interval_after(every).await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if monitor.inner.store.readings().is_empty() {
                    debug!("no telemetry yet, skipping prediction cycle");
                } else {
                    monitor.run_prediction_cycle();
                }
            }
        }
    }
}

/// Process commands from the mpsc channel in arrival order.
async fn command_processor_task(monitor: Monitor, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = monitor.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&monitor, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ─────────────────────────────────────────────────

async fn route_command(monitor: &Monitor, cmd: Command) -> Result<CommandResult, CoreError> {
    match cmd {
        // ── Simulator ────────────────────────────────────────────────
        Command::StartSimulator => {
            monitor.inner.simulator.lock().await.start();
            Ok(CommandResult::Ok)
        }

        Command::PauseSimulator => {
            monitor.inner.simulator.lock().await.pause();
            Ok(CommandResult::Ok)
        }

        Command::ResetSimulator => {
            monitor.reset().await;
            Ok(CommandResult::Ok)
        }

        Command::ActivateScenario { scenario } => monitor
            .activate_scenario(scenario)
            .await
            .map(CommandResult::ScenarioActivated),

        Command::SetAutoFault { enabled } => {
            monitor.set_auto_fault(enabled).await;
            Ok(CommandResult::Ok)
        }

        // ── Analysis ─────────────────────────────────────────────────
        Command::RunPredictionCycle => Ok(CommandResult::Cycle(monitor.run_prediction_cycle())),

        Command::Recommend { prediction_id } => monitor
            .recommend(&prediction_id)
            .map(CommandResult::Recommendation),

        Command::RunEvaluation => monitor.run_evaluation().await.map(CommandResult::Evaluation),

        // ── Operator lifecycle ───────────────────────────────────────
        Command::UpdateMaintenanceStatus { id, status } => monitor
            .update_maintenance_status(&id, status)
            .map(CommandResult::Maintenance),

        Command::UpdateFaultStatus { id, status } => monitor
            .update_fault_status(&id, status)
            .map(CommandResult::Fault),

        Command::LabelPrediction { id, was_accurate } => monitor
            .label_prediction(&id, was_accurate)
            .map(CommandResult::Prediction),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Metric, SiteType};
    use crate::store::EntityCollection;

    fn monitor() -> Monitor {
        let config = MonitorConfig {
            seed: Some(3),
            ..MonitorConfig::default()
        };
        let fleet = vec![Site::new("S1", "Alpha", SiteType::Solar, chrono::Utc::now())];
        Monitor::new(config, fleet)
    }

    #[test]
    fn site_guard_blocks_reentry_until_dropped() {
        let set = DashSet::new();
        let guard = SiteGuard::acquire(&set, "S1").unwrap();
        assert!(SiteGuard::acquire(&set, "S1").is_none());
        assert!(SiteGuard::acquire(&set, "S2").is_some());
        drop(guard);
        assert!(SiteGuard::acquire(&set, "S1").is_some());
    }

    #[test]
    fn cycle_skips_site_under_evaluation() {
        let m = monitor();
        for _ in 0..3 {
            m.ingest(
                TelemetryReading::new("S1", chrono::Utc::now())
                    .with_metric(Metric::VoltageKv, 130.0),
            )
            .unwrap();
        }
        let _held = SiteGuard::acquire(&m.inner.sites_in_flight, "S1").unwrap();
        let report = m.run_prediction_cycle();
        assert_eq!(report.sites_skipped, 1);
        assert!(report.predictions.is_empty());
    }

    /// Prediction repository that records whether each write happened
    /// while its site was still marked in flight.
    struct GuardCheckingRepo<'a> {
        in_flight: &'a DashSet<String>,
        inner: EntityCollection<Prediction>,
        writes: std::sync::Mutex<Vec<(String, bool)>>,
    }

    impl Repository<Prediction> for GuardCheckingRepo<'_> {
        fn create(&self, record: Prediction) -> Result<Arc<Prediction>, CoreError> {
            let held = self.in_flight.contains(&record.site_id);
            self.writes
                .lock()
                .unwrap()
                .push((record.site_id.clone(), held));
            self.inner.create(record)
        }
        fn list(&self, order: SortOrder, limit: Option<usize>) -> Vec<Arc<Prediction>> {
            self.inner.list(order, limit)
        }
        fn filter(
            &self,
            predicate: &dyn Fn(&Prediction) -> bool,
            order: SortOrder,
            limit: Option<usize>,
        ) -> Vec<Arc<Prediction>> {
            self.inner.filter(predicate, order, limit)
        }
        fn update(
            &self,
            id: &EntityId,
            patch: &dyn Fn(&mut Prediction) -> Result<(), CoreError>,
        ) -> Result<Arc<Prediction>, CoreError> {
            self.inner.update(id, patch)
        }
        fn get(&self, id: &EntityId) -> Option<Arc<Prediction>> {
            self.inner.get(id)
        }
    }

    #[test]
    fn site_stays_guarded_until_predictions_are_written() {
        let m = monitor();
        for site in ["S1", "S2"] {
            for _ in 0..3 {
                m.ingest(
                    TelemetryReading::new(site, chrono::Utc::now())
                        .with_metric(Metric::VoltageKv, 130.0),
                )
                .unwrap();
            }
        }

        let repo = GuardCheckingRepo {
            in_flight: &m.inner.sites_in_flight,
            inner: EntityCollection::new(),
            writes: std::sync::Mutex::new(Vec::new()),
        };
        let report = m.prediction_cycle_into(&repo);

        assert_eq!(report.predictions.len(), 2);
        let writes = repo.writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|(_, held)| *held), "{writes:?}");
        assert!(m.inner.sites_in_flight.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_starts_spawn_one_task_set() {
        let m = monitor();
        let first = tokio::spawn({
            let m = m.clone();
            async move { m.start().await }
        });
        let second = tokio::spawn({
            let m = m.clone();
            async move { m.start().await }
        });
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        // Command processor plus reading, countdown and prediction tasks.
        assert_eq!(m.inner.task_handles.lock().await.len(), 4);
        assert_eq!(*m.state().borrow(), MonitorState::Running);
        m.stop().await;
    }

    #[tokio::test]
    async fn execute_requires_running_monitor() {
        let m = monitor();
        let err = m.execute(Command::RunPredictionCycle).await.unwrap_err();
        assert!(matches!(err, CoreError::MonitorStopped));
    }

    #[tokio::test]
    async fn stopped_monitor_cannot_restart() {
        let m = monitor();
        m.start().await.unwrap();
        m.stop().await;
        assert_eq!(*m.state().borrow(), MonitorState::Stopped);
        assert!(matches!(m.start().await, Err(CoreError::MonitorStopped)));
    }

    #[tokio::test]
    async fn fault_lifecycle_rejects_reopening() {
        let m = monitor();
        let fault = m
            .activate_scenario(FaultScenario::Overvoltage)
            .await
            .unwrap()
            .unwrap();

        let resolved = m.update_fault_status(&fault.id, FaultStatus::Resolved).unwrap();
        assert!(resolved.resolved_at.is_some());

        let err = m
            .update_fault_status(&fault.id, FaultStatus::Acknowledged)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn writes_to_unknown_ids_are_not_found() {
        let m = monitor();
        let missing = EntityId::generate();
        assert!(matches!(
            m.recommend(&missing),
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(
            m.label_prediction(&missing, true),
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(
            m.update_maintenance_status(&missing, MaintenanceStatus::Scheduled),
            Err(CoreError::NotFound { .. })
        ));
    }
}
