// ── Filter predicates for record streams ──
//
// Narrow snapshots or store queries to one site or one kind of record.

use crate::model::{
    BreakerStatus, ConfidenceLevel, Fault, FaultStatus, FaultType, MaintenanceAction,
    MaintenanceStatus, Prediction, Priority, TelemetryReading,
};

/// Filter predicate for telemetry snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingFilter {
    All,
    BySite(String),
    /// Readings whose breaker is not closed.
    BreakerAbnormal,
}

impl ReadingFilter {
    pub fn matches(&self, reading: &TelemetryReading) -> bool {
        match self {
            Self::All => true,
            Self::BySite(site) => reading.site_id == *site,
            Self::BreakerAbnormal => reading.breaker_status != BreakerStatus::Closed,
        }
    }
}

/// Filter predicate for fault snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum FaultFilter {
    All,
    BySite(String),
    ByType(FaultType),
    ByStatus(FaultStatus),
    /// Not yet resolved.
    Open,
    /// Communications-layer faults.
    Cyber,
}

impl FaultFilter {
    pub fn matches(&self, fault: &Fault) -> bool {
        match self {
            Self::All => true,
            Self::BySite(site) => fault.site_id == *site,
            Self::ByType(ft) => fault.fault_type == *ft,
            Self::ByStatus(st) => fault.status == *st,
            Self::Open => fault.status != FaultStatus::Resolved,
            Self::Cyber => fault.fault_type.is_cyber(),
        }
    }
}

/// Filter predicate for prediction snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionFilter {
    All,
    BySite(String),
    /// Probability at or above the threshold.
    AtLeast(f64),
    MinConfidence(ConfidenceLevel),
    Unlabeled,
}

impl PredictionFilter {
    pub fn matches(&self, prediction: &Prediction) -> bool {
        match self {
            Self::All => true,
            Self::BySite(site) => prediction.site_id == *site,
            Self::AtLeast(p) => prediction.fault_probability >= *p,
            Self::MinConfidence(level) => prediction.confidence_level >= *level,
            Self::Unlabeled => prediction.was_accurate.is_none(),
        }
    }
}

/// Filter predicate for maintenance snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum MaintenanceFilter {
    All,
    BySite(String),
    ByPriority(Priority),
    ByStatus(MaintenanceStatus),
}

impl MaintenanceFilter {
    pub fn matches(&self, action: &MaintenanceAction) -> bool {
        match self {
            Self::All => true,
            Self::BySite(site) => action.site_id == *site,
            Self::ByPriority(p) => action.priority == *p,
            Self::ByStatus(st) => action.status == *st,
        }
    }
}
