//! Storage trait definitions
//!
//! Every write that depends on the parent inspection's status is a single
//! conditional operation on the backend, so the status check and the write
//! cannot interleave with a concurrent transition.

use crate::error::StorageResult;
use crate::query::{InspectionFilter, Page, PageRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inspection_types::{
    Decision, Inspection, InspectionEventEnvelope, InspectionId, InspectionStatus, Photo, PhotoId,
    Plant, PlantId, Role, ShippingLine, ShippingLineId, User, UserId, UserStatus,
};

/// Outcome of a write guarded by the parent inspection's status
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<T> {
    /// The guard held and the write was applied
    Applied(T),
    /// The inspection does not exist
    Missing,
    /// The inspection exists but its status blocked the write
    Blocked(InspectionStatus),
}

/// Combined storage trait
#[async_trait]
pub trait Storage:
    InspectionStorage
    + EvidenceStorage
    + PlantStorage
    + ShippingLineStorage
    + UserStorage
    + EventStorage
    + Send
    + Sync
{
}

/// Storage for inspections
#[async_trait]
pub trait InspectionStorage: Send + Sync {
    /// Insert a new inspection
    async fn insert_inspection(&self, inspection: Inspection) -> StorageResult<()>;

    /// Get an inspection by ID
    async fn get_inspection(&self, id: &InspectionId) -> StorageResult<Option<Inspection>>;

    /// One filtered, ordered page of inspections
    async fn list_inspections(
        &self,
        filter: &InspectionFilter,
        page: &PageRequest,
    ) -> StorageResult<Page<Inspection>>;

    /// Every inspection matching `filter`, newest first
    async fn find_inspections(&self, filter: &InspectionFilter) -> StorageResult<Vec<Inspection>>;

    /// Set a terminal status only if the inspection is still pending
    async fn decide_if_pending(
        &self,
        id: &InspectionId,
        status: InspectionStatus,
        decision: Decision,
    ) -> StorageResult<Guarded<Inspection>>;

    /// Replace the signature path only if pending; yields the previous path
    async fn set_signature_if_pending(
        &self,
        id: &InspectionId,
        path: &str,
    ) -> StorageResult<Guarded<Option<String>>>;

    /// Delete an inspection with its photo rows; yields what was removed
    async fn delete_inspection(
        &self,
        id: &InspectionId,
    ) -> StorageResult<Option<(Inspection, Vec<Photo>)>>;
}

/// Storage for evidence photos
#[async_trait]
pub trait EvidenceStorage: Send + Sync {
    /// Append photos only if the inspection is pending
    ///
    /// Sequence numbers are assigned here, continuing after existing photos
    /// in the order given.
    async fn insert_photos_if_pending(
        &self,
        inspection_id: &InspectionId,
        photos: Vec<Photo>,
    ) -> StorageResult<Guarded<Vec<Photo>>>;

    /// Photos of an inspection ordered by sequence
    async fn list_photos(&self, inspection_id: &InspectionId) -> StorageResult<Vec<Photo>>;

    /// Delete one photo unless the inspection is approved
    ///
    /// `Applied(None)` means the photo does not exist on this inspection.
    async fn delete_photo_unless_approved(
        &self,
        inspection_id: &InspectionId,
        photo_id: &PhotoId,
    ) -> StorageResult<Guarded<Option<Photo>>>;
}

/// Storage for plants
#[async_trait]
pub trait PlantStorage: Send + Sync {
    async fn get_plant(&self, id: &PlantId) -> StorageResult<Option<Plant>>;

    async fn list_plants(&self) -> StorageResult<Vec<Plant>>;

    /// Insert or update; `Conflict` if another plant has the same code
    async fn upsert_plant(&self, plant: Plant) -> StorageResult<()>;

    /// `Conflict` if any inspection references the plant
    async fn delete_plant(&self, id: &PlantId) -> StorageResult<bool>;
}

/// Storage for shipping lines
#[async_trait]
pub trait ShippingLineStorage: Send + Sync {
    async fn get_shipping_line(&self, id: &ShippingLineId) -> StorageResult<Option<ShippingLine>>;

    async fn list_shipping_lines(&self) -> StorageResult<Vec<ShippingLine>>;

    /// Insert or update; `Conflict` on duplicate code or name
    async fn upsert_shipping_line(&self, line: ShippingLine) -> StorageResult<()>;

    /// `Conflict` if any inspection references the line
    async fn delete_shipping_line(&self, id: &ShippingLineId) -> StorageResult<bool>;
}

/// Field-level change to a user account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overwrite the set fields and stamp `updated_at`
    pub fn apply(&self, user: &mut User, at: DateTime<Utc>) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(status) = self.status {
            user.status = status;
        }
        user.updated_at = at;
    }
}

/// Storage for user accounts
#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn get_user(&self, id: &UserId) -> StorageResult<Option<User>>;

    async fn list_users(&self, include_inactive: bool) -> StorageResult<Vec<User>>;

    /// Insert or update; `Conflict` on duplicate email
    async fn upsert_user(&self, user: User) -> StorageResult<()>;

    /// Apply the set fields of `patch` to the stored record in one write
    ///
    /// Fields left `None` keep their stored value. `Conflict` on duplicate
    /// email, `None` if the user does not exist.
    async fn patch_user(
        &self,
        id: &UserId,
        patch: &UserPatch,
        at: DateTime<Utc>,
    ) -> StorageResult<Option<User>>;

    /// Set `last_seen_at` and nothing else, returning the stored record
    async fn touch_last_seen(&self, id: &UserId, at: DateTime<Utc>) -> StorageResult<Option<User>>;

    /// `Conflict` if any inspection references the user
    async fn delete_user(&self, id: &UserId) -> StorageResult<bool>;
}

/// Storage for the recent event log
#[async_trait]
pub trait EventStorage: Send + Sync {
    /// Append an event
    async fn record_event(&self, event: InspectionEventEnvelope) -> StorageResult<()>;

    /// Most recent events, newest first
    async fn list_events(&self, limit: usize) -> StorageResult<Vec<InspectionEventEnvelope>>;
}
