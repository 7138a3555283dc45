//! Inspection lifecycle events
//!
//! Every state change in the engine produces one envelope, which the daemon
//! fans out to notifications and the SSE stream.

use crate::ids::{InspectionId, PhotoId, UserId};
use crate::status::InspectionStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all inspection events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// User who triggered the event
    pub actor: UserId,

    /// The actual event
    pub event: InspectionEvent,
}

impl InspectionEventEnvelope {
    pub fn new(actor: UserId, event: InspectionEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            actor,
            event,
        }
    }
}

/// Inspection events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InspectionEvent {
    #[serde(rename = "inspeccion:creada")]
    Created {
        inspection_id: InspectionId,
        code: String,
        container_number: String,
        inspector_id: UserId,
    },

    #[serde(rename = "inspeccion:evidencia_agregada")]
    EvidenceAttached {
        inspection_id: InspectionId,
        photo_ids: Vec<PhotoId>,
    },

    #[serde(rename = "inspeccion:evidencia_eliminada")]
    EvidenceRemoved {
        inspection_id: InspectionId,
        photo_id: PhotoId,
    },

    #[serde(rename = "inspeccion:firma_agregada")]
    SignatureAttached { inspection_id: InspectionId },

    #[serde(rename = "inspeccion:estado_cambiado")]
    StatusChanged {
        inspection_id: InspectionId,
        code: String,
        inspector_id: UserId,
        from: InspectionStatus,
        to: InspectionStatus,
        comment: Option<String>,
    },

    #[serde(rename = "inspeccion:eliminada")]
    Deleted { inspection_id: InspectionId },
}

impl InspectionEvent {
    pub fn inspection_id(&self) -> InspectionId {
        match self {
            InspectionEvent::Created { inspection_id, .. }
            | InspectionEvent::EvidenceAttached { inspection_id, .. }
            | InspectionEvent::EvidenceRemoved { inspection_id, .. }
            | InspectionEvent::SignatureAttached { inspection_id }
            | InspectionEvent::StatusChanged { inspection_id, .. }
            | InspectionEvent::Deleted { inspection_id } => *inspection_id,
        }
    }

    /// Wire name used as the SSE event type
    pub fn name(&self) -> &'static str {
        match self {
            InspectionEvent::Created { .. } => "inspeccion:creada",
            InspectionEvent::EvidenceAttached { .. } => "inspeccion:evidencia_agregada",
            InspectionEvent::EvidenceRemoved { .. } => "inspeccion:evidencia_eliminada",
            InspectionEvent::SignatureAttached { .. } => "inspeccion:firma_agregada",
            InspectionEvent::StatusChanged { .. } => "inspeccion:estado_cambiado",
            InspectionEvent::Deleted { .. } => "inspeccion:eliminada",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_change_wire_name() {
        let event = InspectionEvent::StatusChanged {
            inspection_id: InspectionId::generate(),
            code: "INS_1_0000".into(),
            inspector_id: UserId::generate(),
            from: InspectionStatus::Pending,
            to: InspectionStatus::Approved,
            comment: None,
        };
        assert_eq!(event.name(), "inspeccion:estado_cambiado");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "inspeccion:estado_cambiado");
        assert_eq!(json["data"]["to"], "approved");
    }

    #[test]
    fn test_envelope_carries_actor() {
        let actor = UserId::generate();
        let id = InspectionId::generate();
        let env = InspectionEventEnvelope::new(actor, InspectionEvent::Deleted { inspection_id: id });
        assert_eq!(env.actor, actor);
        assert_eq!(env.event.inspection_id(), id);
    }
}
