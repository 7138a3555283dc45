//! The inspection record and its derived views

use crate::catalog::{Plant, ShippingLine, User};
use crate::evidence::Photo;
use crate::ids::{InspectionId, PlantId, ShippingLineId, UserId};
use crate::status::InspectionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Longest accepted container number after normalization
pub const MAX_CONTAINER_LEN: usize = 30;

/// Longest accepted decision comment
pub const MAX_COMMENT_LEN: usize = 500;

/// Accepted temperature readings in degrees Celsius
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = -50.0..=50.0;

/// Human-readable inspection code, `INS_<unix-millis>_<4 hex>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InspectionCode(String);

impl InspectionCode {
    /// Generate a code for an inspection created at `at`
    ///
    /// The hex suffix keeps codes distinct when two inspections are created
    /// in the same millisecond.
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().as_u128() as u16;
        Self(format!("INS_{}_{:04x}", at.timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InspectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who decided an inspection, when, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decided_by: UserId,
    pub decided_at: DateTime<Utc>,
    pub comment: Option<String>,
}

/// One physical container inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: InspectionId,
    pub code: InspectionCode,
    pub container_number: String,
    pub plant_id: PlantId,
    pub shipping_line_id: ShippingLineId,
    pub inspector_id: UserId,
    pub temperature_c: Option<f64>,
    pub observations: Option<String>,
    pub signature_path: Option<String>,
    pub status: InspectionStatus,
    pub decision: Option<Decision>,
    pub inspected_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Inspection {
    /// Build a new pending inspection
    pub fn new(
        container_number: String,
        plant_id: PlantId,
        shipping_line_id: ShippingLineId,
        inspector_id: UserId,
        inspected_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: InspectionId::generate(),
            code: InspectionCode::generate(now),
            container_number,
            plant_id,
            shipping_line_id,
            inspector_id,
            temperature_c: None,
            observations: None,
            signature_path: None,
            status: InspectionStatus::Pending,
            decision: None,
            inspected_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_temperature(mut self, temperature_c: Option<f64>) -> Self {
        self.temperature_c = temperature_c;
        self
    }

    pub fn with_observations(mut self, observations: Option<String>) -> Self {
        self.observations = observations;
        self
    }

    pub fn mutability(&self) -> EvidenceMutability {
        EvidenceMutability::for_status(self.status)
    }
}

/// Whether an inspection's evidence may still change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceMutability {
    /// Evidence is frozen (inspection approved)
    pub is_immutable: bool,
    /// New evidence may be attached (inspection pending)
    pub can_attach: bool,
}

impl EvidenceMutability {
    pub fn for_status(status: InspectionStatus) -> Self {
        Self {
            is_immutable: status.locks_evidence(),
            can_attach: status.accepts_evidence(),
        }
    }
}

/// Inspection with its resolved references and ordered photos
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionDetail {
    #[serde(flatten)]
    pub inspection: Inspection,
    pub plant: Option<Plant>,
    pub shipping_line: Option<ShippingLine>,
    pub inspector: Option<User>,
    pub photos: Vec<Photo>,
    pub mutability: EvidenceMutability,
}
