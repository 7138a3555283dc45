//! In-app notifications derived from lifecycle events
//!
//! A new inspection notifies reviewers; a decision notifies the inspection's
//! inspector. Kept in memory only; a restart clears them.

use chrono::{DateTime, Utc};
use inspection_types::{
    Caller, InspectionEvent, InspectionEventEnvelope, InspectionId, Role, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Oldest notifications are dropped past this many
const MAX_NOTIFICATIONS: usize = 1_000;

/// Who a notification is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Recipient {
    User(UserId),
    /// Every user whose role satisfies this one
    Role(Role),
}

impl Recipient {
    fn includes(&self, caller: &Caller) -> bool {
        match self {
            Recipient::User(id) => *id == caller.user_id,
            Recipient::Role(role) => caller.role.satisfies(*role),
        }
    }
}

#[derive(Debug, Clone)]
struct Notification {
    id: Uuid,
    recipient: Recipient,
    title: String,
    message: String,
    inspection_id: InspectionId,
    event: &'static str,
    created_at: DateTime<Utc>,
    read_by: HashSet<UserId>,
}

/// A notification as seen by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub inspection_id: InspectionId,
    pub event: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// In-memory notification inbox shared by all users
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    items: Arc<RwLock<VecDeque<Notification>>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a notification from an event, if it warrants one
    pub async fn ingest(&self, envelope: &InspectionEventEnvelope) {
        let Some((recipient, title, message)) = Self::describe(&envelope.event) else {
            return;
        };

        let notification = Notification {
            id: Uuid::new_v4(),
            recipient,
            title,
            message,
            inspection_id: envelope.event.inspection_id(),
            event: envelope.event.name(),
            created_at: envelope.timestamp,
            read_by: HashSet::new(),
        };
        debug!(
            notification_id = %notification.id,
            inspection_id = %notification.inspection_id,
            event = notification.event,
            "Notification queued"
        );

        let mut items = self.items.write().await;
        if items.len() >= MAX_NOTIFICATIONS {
            items.pop_front();
        }
        items.push_back(notification);
    }

    fn describe(event: &InspectionEvent) -> Option<(Recipient, String, String)> {
        match event {
            InspectionEvent::Created {
                code,
                container_number,
                ..
            } => Some((
                Recipient::Role(Role::Supervisor),
                "Nueva inspección pendiente".to_string(),
                format!("La inspección {code} del contenedor {container_number} espera revisión"),
            )),
            InspectionEvent::StatusChanged {
                code,
                inspector_id,
                to,
                comment,
                ..
            } => {
                let label = to.label_es().to_lowercase();
                let mut message = format!("La inspección {code} fue {label}");
                if let Some(comment) = comment {
                    message.push_str(&format!(": {comment}"));
                }
                Some((
                    Recipient::User(*inspector_id),
                    format!("Inspección {label}"),
                    message,
                ))
            }
            _ => None,
        }
    }

    /// Notifications visible to `caller`, newest first
    pub async fn list(&self, caller: &Caller, unread_only: bool) -> Vec<NotificationView> {
        let items = self.items.read().await;
        items
            .iter()
            .rev()
            .filter(|n| n.recipient.includes(caller))
            .map(|n| NotificationView {
                id: n.id,
                title: n.title.clone(),
                message: n.message.clone(),
                inspection_id: n.inspection_id,
                event: n.event.to_string(),
                read: n.read_by.contains(&caller.user_id),
                created_at: n.created_at,
            })
            .filter(|v| !unread_only || !v.read)
            .collect()
    }

    /// Mark one notification read for `caller`
    ///
    /// Returns false when it does not exist or is not addressed to them.
    pub async fn mark_read(&self, caller: &Caller, id: &Uuid) -> bool {
        let mut items = self.items.write().await;
        match items
            .iter_mut()
            .find(|n| &n.id == id && n.recipient.includes(caller))
        {
            Some(notification) => {
                notification.read_by.insert(caller.user_id);
                true
            }
            None => false,
        }
    }

    /// Consume lifecycle events until the channel closes
    pub fn spawn(&self, mut rx: broadcast::Receiver<InspectionEventEnvelope>) -> JoinHandle<()> {
        let center = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => center.ingest(&envelope).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification feed lagged; events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspection_types::InspectionStatus;

    fn created(inspector: UserId) -> InspectionEventEnvelope {
        InspectionEventEnvelope::new(
            inspector,
            InspectionEvent::Created {
                inspection_id: InspectionId::generate(),
                code: "INS_1_abcd".into(),
                container_number: "ABCD1234567".into(),
                inspector_id: inspector,
            },
        )
    }

    fn rejected(actor: UserId, inspector: UserId) -> InspectionEventEnvelope {
        InspectionEventEnvelope::new(
            actor,
            InspectionEvent::StatusChanged {
                inspection_id: InspectionId::generate(),
                code: "INS_1_abcd".into(),
                inspector_id: inspector,
                from: InspectionStatus::Pending,
                to: InspectionStatus::Rejected,
                comment: Some("missing seal".into()),
            },
        )
    }

    #[tokio::test]
    async fn test_created_goes_to_reviewers() {
        let center = NotificationCenter::new();
        let inspector = Caller::new(UserId::generate(), Role::Inspector);
        let supervisor = Caller::new(UserId::generate(), Role::Supervisor);
        let admin = Caller::new(UserId::generate(), Role::Admin);

        center.ingest(&created(inspector.user_id)).await;

        assert!(center.list(&inspector, false).await.is_empty());
        assert_eq!(center.list(&supervisor, false).await.len(), 1);
        assert_eq!(center.list(&admin, false).await.len(), 1);
    }

    #[tokio::test]
    async fn test_decision_goes_to_inspector() {
        let center = NotificationCenter::new();
        let inspector = Caller::new(UserId::generate(), Role::Inspector);
        let other = Caller::new(UserId::generate(), Role::Inspector);
        let supervisor = Caller::new(UserId::generate(), Role::Supervisor);

        center
            .ingest(&rejected(supervisor.user_id, inspector.user_id))
            .await;

        let mine = center.list(&inspector, false).await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Inspección rechazada");
        assert!(mine[0].message.ends_with("missing seal"));
        assert!(center.list(&other, false).await.is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_is_per_user() {
        let center = NotificationCenter::new();
        let sup_a = Caller::new(UserId::generate(), Role::Supervisor);
        let sup_b = Caller::new(UserId::generate(), Role::Supervisor);
        let inspector = Caller::new(UserId::generate(), Role::Inspector);
        center.ingest(&created(inspector.user_id)).await;

        let id = center.list(&sup_a, false).await[0].id;
        assert!(!center.mark_read(&inspector, &id).await);
        assert!(center.mark_read(&sup_a, &id).await);

        assert!(center.list(&sup_a, true).await.is_empty());
        assert!(center.list(&sup_a, false).await[0].read);
        assert_eq!(center.list(&sup_b, true).await.len(), 1);
    }

    #[tokio::test]
    async fn test_newest_first_and_ignores_other_events() {
        let center = NotificationCenter::new();
        let inspector = UserId::generate();
        let admin = Caller::new(UserId::generate(), Role::Admin);

        let first = created(inspector);
        center.ingest(&first).await;
        center
            .ingest(&InspectionEventEnvelope::new(
                admin.user_id,
                InspectionEvent::Deleted {
                    inspection_id: first.event.inspection_id(),
                },
            ))
            .await;
        let second = created(inspector);
        center.ingest(&second).await;

        let listed = center.list(&admin, false).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].inspection_id, second.event.inspection_id());
    }
}
