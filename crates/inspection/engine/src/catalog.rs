//! Reference-data management: plants, shipping lines and users

use crate::error::{EngineError, EngineResult};
use crate::storage::{PlantStorage, ShippingLineStorage, Storage, UserPatch, UserStorage};
use crate::validate;
use chrono::{Duration, Utc};
use inspection_policy::{AccessGate, Action, Module};
use inspection_types::{
    Caller, Plant, PlantId, Role, ShippingLine, ShippingLineId, User, UserId, UserStatus,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const MAX_CODE_LEN: usize = 50;
const MAX_NAME_LEN: usize = 120;
const MAX_LOCATION_LEN: usize = 191;

/// `last_seen_at` is only rewritten when older than this
const LAST_SEEN_GRANULARITY_SECS: i64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantInput {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingLineInput {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Partial user update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Role-gated CRUD over the reference catalogs
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Storage>,
    gate: AccessGate,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            store,
            gate: AccessGate::new(),
        }
    }

    // Plants

    pub async fn list_plants(&self, caller: &Caller) -> EngineResult<Vec<Plant>> {
        self.gate.require(caller, Module::Plants, Action::Read)?;
        Ok(self.store.list_plants().await?)
    }

    pub async fn create_plant(&self, caller: &Caller, input: PlantInput) -> EngineResult<Plant> {
        self.gate.require(caller, Module::Plants, Action::Create)?;
        let plant = Plant::new(
            validate::required_text("code", &input.code, MAX_CODE_LEN)?,
            validate::required_text("name", &input.name, MAX_NAME_LEN)?,
            validate::optional_text("location", input.location.as_deref(), MAX_LOCATION_LEN)?,
        );
        self.store.upsert_plant(plant.clone()).await?;
        info!(plant_id = %plant.id, code = %plant.code, actor = %caller.user_id, "Plant created");
        Ok(plant)
    }

    pub async fn update_plant(
        &self,
        caller: &Caller,
        id: &PlantId,
        input: PlantInput,
    ) -> EngineResult<Plant> {
        self.gate.require(caller, Module::Plants, Action::Update)?;
        let mut plant = self
            .store
            .get_plant(id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("plant {id}")))?;
        plant.code = validate::required_text("code", &input.code, MAX_CODE_LEN)?;
        plant.name = validate::required_text("name", &input.name, MAX_NAME_LEN)?;
        plant.location =
            validate::optional_text("location", input.location.as_deref(), MAX_LOCATION_LEN)?;
        plant.updated_at = Utc::now();
        self.store.upsert_plant(plant.clone()).await?;
        info!(plant_id = %plant.id, actor = %caller.user_id, "Plant updated");
        Ok(plant)
    }

    pub async fn delete_plant(&self, caller: &Caller, id: &PlantId) -> EngineResult<()> {
        self.gate.require(caller, Module::Plants, Action::Delete)?;
        if !self.store.delete_plant(id).await? {
            return Err(EngineError::not_found(format!("plant {id}")));
        }
        info!(plant_id = %id, actor = %caller.user_id, "Plant deleted");
        Ok(())
    }

    // Shipping lines

    pub async fn list_shipping_lines(&self, caller: &Caller) -> EngineResult<Vec<ShippingLine>> {
        self.gate
            .require(caller, Module::ShippingLines, Action::Read)?;
        Ok(self.store.list_shipping_lines().await?)
    }

    pub async fn create_shipping_line(
        &self,
        caller: &Caller,
        input: ShippingLineInput,
    ) -> EngineResult<ShippingLine> {
        self.gate
            .require(caller, Module::ShippingLines, Action::Create)?;
        let line = ShippingLine::new(
            validate::required_text("code", &input.code, MAX_CODE_LEN)?,
            validate::required_text("name", &input.name, MAX_NAME_LEN)?,
        );
        self.store.upsert_shipping_line(line.clone()).await?;
        info!(shipping_line_id = %line.id, code = %line.code, actor = %caller.user_id, "Shipping line created");
        Ok(line)
    }

    pub async fn update_shipping_line(
        &self,
        caller: &Caller,
        id: &ShippingLineId,
        input: ShippingLineInput,
    ) -> EngineResult<ShippingLine> {
        self.gate
            .require(caller, Module::ShippingLines, Action::Update)?;
        let mut line = self
            .store
            .get_shipping_line(id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("shipping line {id}")))?;
        line.code = validate::required_text("code", &input.code, MAX_CODE_LEN)?;
        line.name = validate::required_text("name", &input.name, MAX_NAME_LEN)?;
        line.updated_at = Utc::now();
        self.store.upsert_shipping_line(line.clone()).await?;
        info!(shipping_line_id = %line.id, actor = %caller.user_id, "Shipping line updated");
        Ok(line)
    }

    pub async fn delete_shipping_line(
        &self,
        caller: &Caller,
        id: &ShippingLineId,
    ) -> EngineResult<()> {
        self.gate
            .require(caller, Module::ShippingLines, Action::Delete)?;
        if !self.store.delete_shipping_line(id).await? {
            return Err(EngineError::not_found(format!("shipping line {id}")));
        }
        info!(shipping_line_id = %id, actor = %caller.user_id, "Shipping line deleted");
        Ok(())
    }

    // Users

    pub async fn list_users(&self, caller: &Caller, include_inactive: bool) -> EngineResult<Vec<User>> {
        self.gate.require(caller, Module::Users, Action::Read)?;
        Ok(self.store.list_users(include_inactive).await?)
    }

    pub async fn create_user(&self, caller: &Caller, input: NewUser) -> EngineResult<User> {
        self.gate.require(caller, Module::Users, Action::Create)?;
        let user = User::new(
            validate::required_text("name", &input.name, MAX_NAME_LEN)?,
            validate::email(&input.email)?,
            input.role,
        );
        self.store.upsert_user(user.clone()).await?;
        info!(user_id = %user.id, role = %user.role, actor = %caller.user_id, "User created");
        Ok(user)
    }

    pub async fn update_user(
        &self,
        caller: &Caller,
        id: &UserId,
        input: UserUpdate,
    ) -> EngineResult<User> {
        self.gate.require(caller, Module::Users, Action::Update)?;
        let patch = UserPatch {
            name: input
                .name
                .map(|name| validate::required_text("name", &name, MAX_NAME_LEN))
                .transpose()?,
            email: input.email.map(|email| validate::email(&email)).transpose()?,
            role: input.role,
            status: None,
        };
        let user = self.patch_user(id, &patch).await?;
        info!(user_id = %user.id, actor = %caller.user_id, "User updated");
        Ok(user)
    }

    pub async fn set_user_status(
        &self,
        caller: &Caller,
        id: &UserId,
        status: UserStatus,
    ) -> EngineResult<User> {
        self.gate.require(caller, Module::Users, Action::Update)?;
        let patch = UserPatch {
            status: Some(status),
            ..UserPatch::default()
        };
        let user = self.patch_user(id, &patch).await?;
        info!(user_id = %user.id, status = status.as_str(), actor = %caller.user_id, "User status changed");
        Ok(user)
    }

    pub async fn delete_user(&self, caller: &Caller, id: &UserId) -> EngineResult<()> {
        self.gate.require(caller, Module::Users, Action::Delete)?;
        if !self.store.delete_user(id).await? {
            return Err(EngineError::not_found(format!("user {id}")));
        }
        info!(user_id = %id, actor = %caller.user_id, "User deleted");
        Ok(())
    }

    async fn patch_user(&self, id: &UserId, patch: &UserPatch) -> EngineResult<User> {
        self.store
            .patch_user(id, patch, Utc::now())
            .await?
            .ok_or_else(|| EngineError::not_found(format!("user {id}")))
    }

    /// Look up the account behind an authenticated request
    ///
    /// Not gated: this is how a caller comes to exist. Refreshes
    /// `last_seen_at` for active users without rewriting any other field.
    pub async fn lookup_account(&self, id: &UserId) -> EngineResult<Option<User>> {
        let Some(user) = self.store.get_user(id).await? else {
            return Ok(None);
        };
        let now = Utc::now();
        let stale = user
            .last_seen_at
            .map_or(true, |seen| now - seen > Duration::seconds(LAST_SEEN_GRANULARITY_SECS));
        if user.is_active() && stale {
            // The touched record carries any concurrent role or status change
            return Ok(self.store.touch_last_seen(id, now).await?);
        }
        Ok(Some(user))
    }

    /// Create the first admin account if no users exist yet
    pub async fn bootstrap_admin(&self, name: &str, email: &str) -> EngineResult<Option<User>> {
        if !self.store.list_users(true).await?.is_empty() {
            return Ok(None);
        }
        let admin = User::new(
            validate::required_text("name", name, MAX_NAME_LEN)?,
            validate::email(email)?,
            Role::Admin,
        );
        self.store.upsert_user(admin.clone()).await?;
        info!(user_id = %admin.id, email = %admin.email, "Bootstrap admin created");
        Ok(Some(admin))
    }
}
