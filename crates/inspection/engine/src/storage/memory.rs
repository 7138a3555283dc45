//! In-memory storage implementation
//!
//! All tables sit behind one lock so that guarded writes check the parent
//! inspection and mutate in the same critical section.

use super::traits::*;
use crate::error::{StorageError, StorageResult};
use crate::query::{InspectionFilter, Page, PageRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inspection_types::{
    Decision, Inspection, InspectionEventEnvelope, InspectionId, InspectionStatus, Photo, PhotoId,
    Plant, PlantId, ShippingLine, ShippingLineId, User, UserId,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Oldest events are dropped past this many
const EVENT_LOG_CAPACITY: usize = 10_000;

#[derive(Debug, Default)]
struct Tables {
    inspections: HashMap<InspectionId, Inspection>,
    photos: HashMap<PhotoId, Photo>,
    plants: HashMap<PlantId, Plant>,
    shipping_lines: HashMap<ShippingLineId, ShippingLine>,
    users: HashMap<UserId, User>,
    events: VecDeque<InspectionEventEnvelope>,
}

impl Tables {
    fn photos_of(&self, inspection_id: &InspectionId) -> Vec<Photo> {
        let mut photos: Vec<Photo> = self
            .photos
            .values()
            .filter(|p| &p.inspection_id == inspection_id)
            .cloned()
            .collect();
        photos.sort_by_key(|p| p.sequence);
        photos
    }
}

/// In-memory storage for development and testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {}

#[async_trait]
impl InspectionStorage for InMemoryStorage {
    async fn insert_inspection(&self, inspection: Inspection) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        if tables.inspections.contains_key(&inspection.id) {
            return Err(StorageError::Conflict(format!(
                "inspection {} already exists",
                inspection.id
            )));
        }
        tables.inspections.insert(inspection.id, inspection);
        Ok(())
    }

    async fn get_inspection(&self, id: &InspectionId) -> StorageResult<Option<Inspection>> {
        let tables = self.tables.read().await;
        Ok(tables.inspections.get(id).cloned())
    }

    async fn list_inspections(
        &self,
        filter: &InspectionFilter,
        page: &PageRequest,
    ) -> StorageResult<Page<Inspection>> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Inspection> = tables
            .inspections
            .values()
            .filter(|i| filter.matches(i))
            .collect();
        matching.sort_by(|a, b| page.compare(a, b));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, total, page))
    }

    async fn find_inspections(&self, filter: &InspectionFilter) -> StorageResult<Vec<Inspection>> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Inspection> = tables
            .inspections
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.inspected_at.cmp(&a.inspected_at));
        Ok(matching)
    }

    async fn decide_if_pending(
        &self,
        id: &InspectionId,
        status: InspectionStatus,
        decision: Decision,
    ) -> StorageResult<Guarded<Inspection>> {
        let mut tables = self.tables.write().await;
        let Some(inspection) = tables.inspections.get_mut(id) else {
            return Ok(Guarded::Missing);
        };
        if inspection.status != InspectionStatus::Pending {
            return Ok(Guarded::Blocked(inspection.status));
        }
        inspection.status = status;
        inspection.updated_at = decision.decided_at;
        inspection.decision = Some(decision);
        Ok(Guarded::Applied(inspection.clone()))
    }

    async fn set_signature_if_pending(
        &self,
        id: &InspectionId,
        path: &str,
    ) -> StorageResult<Guarded<Option<String>>> {
        let mut tables = self.tables.write().await;
        let Some(inspection) = tables.inspections.get_mut(id) else {
            return Ok(Guarded::Missing);
        };
        if !inspection.status.accepts_evidence() {
            return Ok(Guarded::Blocked(inspection.status));
        }
        let previous = inspection.signature_path.replace(path.to_string());
        inspection.updated_at = Utc::now();
        Ok(Guarded::Applied(previous))
    }

    async fn delete_inspection(
        &self,
        id: &InspectionId,
    ) -> StorageResult<Option<(Inspection, Vec<Photo>)>> {
        let mut tables = self.tables.write().await;
        let Some(inspection) = tables.inspections.remove(id) else {
            return Ok(None);
        };
        let photos = tables.photos_of(id);
        for photo in &photos {
            tables.photos.remove(&photo.id);
        }
        Ok(Some((inspection, photos)))
    }
}

#[async_trait]
impl EvidenceStorage for InMemoryStorage {
    async fn insert_photos_if_pending(
        &self,
        inspection_id: &InspectionId,
        photos: Vec<Photo>,
    ) -> StorageResult<Guarded<Vec<Photo>>> {
        let mut tables = self.tables.write().await;
        let Some(inspection) = tables.inspections.get(inspection_id) else {
            return Ok(Guarded::Missing);
        };
        if !inspection.status.accepts_evidence() {
            return Ok(Guarded::Blocked(inspection.status));
        }

        let last = tables
            .photos
            .values()
            .filter(|p| &p.inspection_id == inspection_id)
            .map(|p| p.sequence)
            .max()
            .unwrap_or(0);

        let mut stored = Vec::with_capacity(photos.len());
        for (offset, mut photo) in photos.into_iter().enumerate() {
            photo.inspection_id = *inspection_id;
            photo.sequence = last + offset as u32 + 1;
            tables.photos.insert(photo.id, photo.clone());
            stored.push(photo);
        }
        Ok(Guarded::Applied(stored))
    }

    async fn list_photos(&self, inspection_id: &InspectionId) -> StorageResult<Vec<Photo>> {
        let tables = self.tables.read().await;
        Ok(tables.photos_of(inspection_id))
    }

    async fn delete_photo_unless_approved(
        &self,
        inspection_id: &InspectionId,
        photo_id: &PhotoId,
    ) -> StorageResult<Guarded<Option<Photo>>> {
        let mut tables = self.tables.write().await;
        let Some(inspection) = tables.inspections.get(inspection_id) else {
            return Ok(Guarded::Missing);
        };
        if inspection.status.locks_evidence() {
            return Ok(Guarded::Blocked(inspection.status));
        }
        let belongs = tables
            .photos
            .get(photo_id)
            .is_some_and(|p| &p.inspection_id == inspection_id);
        if !belongs {
            return Ok(Guarded::Applied(None));
        }
        Ok(Guarded::Applied(tables.photos.remove(photo_id)))
    }
}

#[async_trait]
impl PlantStorage for InMemoryStorage {
    async fn get_plant(&self, id: &PlantId) -> StorageResult<Option<Plant>> {
        let tables = self.tables.read().await;
        Ok(tables.plants.get(id).cloned())
    }

    async fn list_plants(&self) -> StorageResult<Vec<Plant>> {
        let tables = self.tables.read().await;
        let mut plants: Vec<Plant> = tables.plants.values().cloned().collect();
        plants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(plants)
    }

    async fn upsert_plant(&self, plant: Plant) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .plants
            .values()
            .any(|p| p.id != plant.id && p.code == plant.code);
        if duplicate {
            return Err(StorageError::Conflict(format!(
                "plant code '{}' already exists",
                plant.code
            )));
        }
        tables.plants.insert(plant.id, plant);
        Ok(())
    }

    async fn delete_plant(&self, id: &PlantId) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.inspections.values().any(|i| &i.plant_id == id) {
            return Err(StorageError::Conflict(format!(
                "plant {id} is referenced by inspections"
            )));
        }
        Ok(tables.plants.remove(id).is_some())
    }
}

#[async_trait]
impl ShippingLineStorage for InMemoryStorage {
    async fn get_shipping_line(&self, id: &ShippingLineId) -> StorageResult<Option<ShippingLine>> {
        let tables = self.tables.read().await;
        Ok(tables.shipping_lines.get(id).cloned())
    }

    async fn list_shipping_lines(&self) -> StorageResult<Vec<ShippingLine>> {
        let tables = self.tables.read().await;
        let mut lines: Vec<ShippingLine> = tables.shipping_lines.values().cloned().collect();
        lines.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lines)
    }

    async fn upsert_shipping_line(&self, line: ShippingLine) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .shipping_lines
            .values()
            .any(|l| l.id != line.id && (l.code == line.code || l.name == line.name));
        if duplicate {
            return Err(StorageError::Conflict(format!(
                "shipping line '{}' / '{}' already exists",
                line.code, line.name
            )));
        }
        tables.shipping_lines.insert(line.id, line);
        Ok(())
    }

    async fn delete_shipping_line(&self, id: &ShippingLineId) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.inspections.values().any(|i| &i.shipping_line_id == id) {
            return Err(StorageError::Conflict(format!(
                "shipping line {id} is referenced by inspections"
            )));
        }
        Ok(tables.shipping_lines.remove(id).is_some())
    }
}

#[async_trait]
impl UserStorage for InMemoryStorage {
    async fn get_user(&self, id: &UserId) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(id).cloned())
    }

    async fn list_users(&self, include_inactive: bool) -> StorageResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| include_inactive || u.is_active())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn upsert_user(&self, user: User) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email));
        if duplicate {
            return Err(StorageError::Conflict(format!(
                "email '{}' already registered",
                user.email
            )));
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    async fn patch_user(
        &self,
        id: &UserId,
        patch: &UserPatch,
        at: DateTime<Utc>,
    ) -> StorageResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &patch.email {
            let duplicate = tables
                .users
                .values()
                .any(|u| &u.id != id && u.email.eq_ignore_ascii_case(email));
            if duplicate {
                return Err(StorageError::Conflict(format!(
                    "email '{email}' already registered"
                )));
            }
        }
        Ok(tables.users.get_mut(id).map(|user| {
            patch.apply(user, at);
            user.clone()
        }))
    }

    async fn touch_last_seen(&self, id: &UserId, at: DateTime<Utc>) -> StorageResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(id).map(|user| {
            user.last_seen_at = Some(at);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: &UserId) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.inspections.values().any(|i| &i.inspector_id == id) {
            return Err(StorageError::Conflict(format!(
                "user {id} is referenced by inspections"
            )));
        }
        Ok(tables.users.remove(id).is_some())
    }
}

#[async_trait]
impl EventStorage for InMemoryStorage {
    async fn record_event(&self, event: InspectionEventEnvelope) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        if tables.events.len() >= EVENT_LOG_CAPACITY {
            tables.events.pop_front();
        }
        tables.events.push_back(event);
        Ok(())
    }

    async fn list_events(&self, limit: usize) -> StorageResult<Vec<InspectionEventEnvelope>> {
        let tables = self.tables.read().await;
        Ok(tables.events.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspection_types::{ContentHash, InspectionEvent, MediaType, Role};

    fn photo(inspection_id: InspectionId) -> Photo {
        Photo {
            id: PhotoId::generate(),
            inspection_id,
            path: "p.jpg".into(),
            media_type: MediaType::Jpeg,
            hash: ContentHash::from_hex("00"),
            sequence: 0,
            taken_at: None,
            created_at: Utc::now(),
        }
    }

    async fn seeded() -> (InMemoryStorage, Inspection) {
        let storage = InMemoryStorage::new();
        let insp = Inspection::new(
            "ABC123".into(),
            PlantId::generate(),
            ShippingLineId::generate(),
            UserId::generate(),
            Utc::now(),
        );
        storage.insert_inspection(insp.clone()).await.unwrap();
        (storage, insp)
    }

    fn decision() -> Decision {
        Decision {
            decided_by: UserId::generate(),
            decided_at: Utc::now(),
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_photo_sequence_continues() {
        let (storage, insp) = seeded().await;

        let first = storage
            .insert_photos_if_pending(&insp.id, vec![photo(insp.id), photo(insp.id)])
            .await
            .unwrap();
        let Guarded::Applied(first) = first else { panic!("expected applied") };
        assert_eq!(first.iter().map(|p| p.sequence).collect::<Vec<_>>(), vec![1, 2]);

        let second = storage
            .insert_photos_if_pending(&insp.id, vec![photo(insp.id)])
            .await
            .unwrap();
        let Guarded::Applied(second) = second else { panic!("expected applied") };
        assert_eq!(second[0].sequence, 3);

        assert_eq!(storage.list_photos(&insp.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_decide_only_once() {
        let (storage, insp) = seeded().await;

        let first = storage
            .decide_if_pending(&insp.id, InspectionStatus::Approved, decision())
            .await
            .unwrap();
        assert!(matches!(first, Guarded::Applied(ref i) if i.status == InspectionStatus::Approved));

        let second = storage
            .decide_if_pending(&insp.id, InspectionStatus::Rejected, decision())
            .await
            .unwrap();
        assert_eq!(second, Guarded::Blocked(InspectionStatus::Approved));

        let missing = storage
            .decide_if_pending(&InspectionId::generate(), InspectionStatus::Approved, decision())
            .await
            .unwrap();
        assert_eq!(missing, Guarded::Missing);
    }

    #[tokio::test]
    async fn test_photo_delete_blocked_when_approved() {
        let (storage, insp) = seeded().await;
        let p = photo(insp.id);
        storage
            .insert_photos_if_pending(&insp.id, vec![p.clone()])
            .await
            .unwrap();
        storage
            .decide_if_pending(&insp.id, InspectionStatus::Approved, decision())
            .await
            .unwrap();

        let outcome = storage
            .delete_photo_unless_approved(&insp.id, &p.id)
            .await
            .unwrap();
        assert_eq!(outcome, Guarded::Blocked(InspectionStatus::Approved));
        assert_eq!(storage.list_photos(&insp.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_photo_of_other_inspection_is_not_deleted() {
        let (storage, insp) = seeded().await;
        let other = Inspection::new(
            "XYZ9".into(),
            PlantId::generate(),
            ShippingLineId::generate(),
            UserId::generate(),
            Utc::now(),
        );
        storage.insert_inspection(other.clone()).await.unwrap();
        let p = photo(other.id);
        storage
            .insert_photos_if_pending(&other.id, vec![p.clone()])
            .await
            .unwrap();

        let outcome = storage
            .delete_photo_unless_approved(&insp.id, &p.id)
            .await
            .unwrap();
        assert_eq!(outcome, Guarded::Applied(None));
        assert_eq!(storage.list_photos(&other.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_referenced_catalog_rows_cannot_be_deleted() {
        let storage = InMemoryStorage::new();
        let plant = Plant::new("P1".into(), "Plant one".into(), None);
        let line = ShippingLine::new("L1".into(), "Line one".into());
        let user = User::new("Ana".into(), "ana@example.com".into(), Role::Inspector);
        storage.upsert_plant(plant.clone()).await.unwrap();
        storage.upsert_shipping_line(line.clone()).await.unwrap();
        storage.upsert_user(user.clone()).await.unwrap();

        let insp = Inspection::new("C1".into(), plant.id, line.id, user.id, Utc::now());
        storage.insert_inspection(insp).await.unwrap();

        assert!(matches!(storage.delete_plant(&plant.id).await, Err(StorageError::Conflict(_))));
        assert!(matches!(
            storage.delete_shipping_line(&line.id).await,
            Err(StorageError::Conflict(_))
        ));
        assert!(matches!(storage.delete_user(&user.id).await, Err(StorageError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unique_keys() {
        let storage = InMemoryStorage::new();
        storage
            .upsert_plant(Plant::new("P1".into(), "A".into(), None))
            .await
            .unwrap();
        let dup = storage
            .upsert_plant(Plant::new("P1".into(), "B".into(), None))
            .await;
        assert!(matches!(dup, Err(StorageError::Conflict(_))));

        storage
            .upsert_user(User::new("A".into(), "a@x.io".into(), Role::Admin))
            .await
            .unwrap();
        let dup = storage
            .upsert_user(User::new("B".into(), "A@X.io".into(), Role::Admin))
            .await;
        assert!(matches!(dup, Err(StorageError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_events_newest_first() {
        let storage = InMemoryStorage::new();
        let actor = UserId::generate();
        let ids: Vec<InspectionId> = (0..3).map(|_| InspectionId::generate()).collect();
        for id in &ids {
            storage
                .record_event(InspectionEventEnvelope::new(
                    actor,
                    InspectionEvent::Deleted { inspection_id: *id },
                ))
                .await
                .unwrap();
        }
        let events = storage.list_events(2).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event.inspection_id(), ids[2]);
        assert_eq!(events[1].event.inspection_id(), ids[1]);
    }
}
