//! Inspection status state machine
//!
//! ```text
//! pending ──► approved   (terminal)
//!    │
//!    └─────► rejected    (terminal)
//! ```

use crate::error::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InspectionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl InspectionStatus {
    pub const ALL: [InspectionStatus; 3] = [
        InspectionStatus::Pending,
        InspectionStatus::Approved,
        InspectionStatus::Rejected,
    ];

    /// Evidence is frozen once approved
    pub fn locks_evidence(self) -> bool {
        matches!(self, InspectionStatus::Approved)
    }

    /// New evidence may only be added while pending
    pub fn accepts_evidence(self) -> bool {
        matches!(self, InspectionStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InspectionStatus::Pending => "pending",
            InspectionStatus::Approved => "approved",
            InspectionStatus::Rejected => "rejected",
        }
    }

    /// Label used in exported reports
    pub fn label_es(self) -> &'static str {
        match self {
            InspectionStatus::Pending => "Pendiente",
            InspectionStatus::Approved => "Aprobada",
            InspectionStatus::Rejected => "Rechazada",
        }
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InspectionStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InspectionStatus::Pending),
            "approved" => Ok(InspectionStatus::Approved),
            "rejected" => Ok(InspectionStatus::Rejected),
            other => Err(TypeError::UnknownStatus(other.to_string())),
        }
    }
}

/// The only statuses a reviewer may move an inspection into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionTarget {
    Approved,
    Rejected,
}

impl DecisionTarget {
    /// Rejections must explain themselves
    pub fn requires_comment(self) -> bool {
        matches!(self, DecisionTarget::Rejected)
    }
}

impl From<DecisionTarget> for InspectionStatus {
    fn from(target: DecisionTarget) -> Self {
        match target {
            DecisionTarget::Approved => InspectionStatus::Approved,
            DecisionTarget::Rejected => InspectionStatus::Rejected,
        }
    }
}

impl fmt::Display for DecisionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        InspectionStatus::from(*self).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_targets_are_terminal() {
        assert_eq!(
            InspectionStatus::from(DecisionTarget::Approved),
            InspectionStatus::Approved
        );
        assert_eq!(
            InspectionStatus::from(DecisionTarget::Rejected),
            InspectionStatus::Rejected
        );
        assert!(DecisionTarget::Rejected.requires_comment());
        assert!(!DecisionTarget::Approved.requires_comment());
        assert!(serde_json::from_str::<DecisionTarget>("\"pending\"").is_err());
    }

    #[test]
    fn test_evidence_rules() {
        assert!(InspectionStatus::Approved.locks_evidence());
        assert!(!InspectionStatus::Rejected.locks_evidence());
        assert!(!InspectionStatus::Pending.locks_evidence());

        assert!(InspectionStatus::Pending.accepts_evidence());
        assert!(!InspectionStatus::Rejected.accepts_evidence());
    }

    #[test]
    fn test_typo_status_does_not_deserialize() {
        let parsed: Result<InspectionStatus, _> = serde_json::from_str("\"aproved\"");
        assert!(parsed.is_err());
        assert!("Approved".parse::<InspectionStatus>().is_err());
    }

    #[test]
    fn test_decision_target_cannot_be_pending() {
        let parsed: Result<DecisionTarget, _> = serde_json::from_str("\"pending\"");
        assert!(parsed.is_err());
    }
}
