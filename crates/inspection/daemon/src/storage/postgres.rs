//! PostgreSQL storage implementation
//!
//! Rows keep the full record as JSONB next to the columns used for
//! filtering, ordering and constraints. Guarded writes lock or condition on
//! the parent inspection's `status` column inside the same statement or
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inspection_engine::{
    EventStorage, EvidenceStorage, Guarded, InspectionFilter, InspectionStorage, Page, PageRequest,
    PlantStorage, ShippingLineStorage, SortField, SortOrder, Storage, StorageError, StorageResult,
    UserPatch, UserStorage,
};
use inspection_types::{
    Decision, Inspection, InspectionEventEnvelope, InspectionId, InspectionStatus, Photo, PhotoId,
    Plant, PlantId, ShippingLine, ShippingLineId, User, UserId,
};
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder, Row, Transaction};
use std::time::Duration;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL-backed storage
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connect to PostgreSQL and initialize schema
    pub async fn new(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let storage = Self { pool };
        storage.initialize_schema().await?;
        Ok(storage)
    }

    async fn initialize_schema(&self) -> Result<(), StorageError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS plants (
                id UUID PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                data JSONB NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS shipping_lines (
                id UUID PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL UNIQUE,
                data JSONB NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                email TEXT NOT NULL,
                name TEXT NOT NULL,
                active BOOLEAN NOT NULL,
                data JSONB NOT NULL
            );
            "#,
            r#"CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower ON users(LOWER(email));"#,
            r#"
            CREATE TABLE IF NOT EXISTS inspections (
                id UUID PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                container_number TEXT NOT NULL,
                plant_id UUID NOT NULL REFERENCES plants(id),
                shipping_line_id UUID NOT NULL REFERENCES shipping_lines(id),
                inspector_id UUID NOT NULL REFERENCES users(id),
                status TEXT NOT NULL CHECK (status IN ('pending', 'approved', 'rejected')),
                inspected_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                data JSONB NOT NULL
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS inspections_inspected_at ON inspections(inspected_at DESC);"#,
            r#"CREATE INDEX IF NOT EXISTS inspections_inspector ON inspections(inspector_id);"#,
            r#"CREATE INDEX IF NOT EXISTS inspections_status ON inspections(status);"#,
            r#"
            CREATE TABLE IF NOT EXISTS photos (
                id UUID PRIMARY KEY,
                inspection_id UUID NOT NULL REFERENCES inspections(id) ON DELETE CASCADE,
                sequence INTEGER NOT NULL,
                data JSONB NOT NULL,
                UNIQUE (inspection_id, sequence)
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id UUID PRIMARY KEY,
                timestamp TIMESTAMPTZ NOT NULL,
                inspection_id UUID NOT NULL,
                actor UUID NOT NULL,
                data JSONB NOT NULL
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS events_timestamp ON events(timestamp DESC);"#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Query(e.to_string()))?;
        }

        Ok(())
    }

    fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, StorageError> {
        serde_json::to_value(value)
            .map_err(|e| StorageError::InvalidData(format!("json serialize error: {}", e)))
    }

    fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, StorageError> {
        serde_json::from_value(value)
            .map_err(|e| StorageError::InvalidData(format!("json deserialize error: {}", e)))
    }

    fn decode<T: serde::de::DeserializeOwned>(row: &sqlx::postgres::PgRow) -> StorageResult<T> {
        let data: Value = row
            .try_get("data")
            .map_err(|e| StorageError::Query(e.to_string()))?;
        Self::from_json(data)
    }

    fn decode_all<T: serde::de::DeserializeOwned>(
        rows: Vec<sqlx::postgres::PgRow>,
    ) -> StorageResult<Vec<T>> {
        rows.iter().map(Self::decode).collect()
    }

    fn parse_status(raw: &str) -> StorageResult<InspectionStatus> {
        raw.parse()
            .map_err(|_| StorageError::InvalidData(format!("unknown status '{raw}'")))
    }

    async fn begin(&self) -> StorageResult<Transaction<'_, Postgres>> {
        self.pool.begin().await.map_err(query_error)
    }

    /// Lock the parent row for the rest of the transaction
    async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        id: &InspectionId,
    ) -> StorageResult<Option<InspectionStatus>> {
        let row = sqlx::query("SELECT status FROM inspections WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(query_error)?;
        match row {
            Some(row) => {
                let status: String = row.try_get("status").map_err(query_error)?;
                Ok(Some(Self::parse_status(&status)?))
            }
            None => Ok(None),
        }
    }

    async fn commit(tx: Transaction<'_, Postgres>) -> StorageResult<()> {
        tx.commit().await.map_err(query_error)
    }
}

fn query_error(e: sqlx::Error) -> StorageError {
    StorageError::Query(e.to_string())
}

/// Constraint violations become conflicts; everything else is a query error
fn write_error(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return StorageError::Conflict(format!("duplicate value: {}", db.message()))
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return StorageError::Conflict(format!("still referenced: {}", db.message()))
            }
            _ => {}
        }
    }
    query_error(e)
}

/// Substring pattern for `LIKE … ESCAPE '\'` that treats `%` and `_` literally
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &InspectionFilter) {
    builder.push(" WHERE TRUE");
    if let Some(q) = filter.search_term() {
        let pattern = contains_pattern(&q);
        builder
            .push(" AND (LOWER(container_number) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(code) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(id) = filter.plant_id {
        builder.push(" AND plant_id = ").push_bind(*id.as_uuid());
    }
    if let Some(id) = filter.shipping_line_id {
        builder.push(" AND shipping_line_id = ").push_bind(*id.as_uuid());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(id) = filter.inspector_id {
        builder.push(" AND inspector_id = ").push_bind(*id.as_uuid());
    }
    if let Some(from) = filter.from {
        builder.push(" AND inspected_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        builder.push(" AND inspected_at <= ").push_bind(to);
    }
}

/// ORDER BY clause matching [`PageRequest::compare`]
fn order_clause(page: &PageRequest) -> String {
    let column = match page.sort {
        SortField::InspectedAt => "inspected_at",
        SortField::ContainerNumber => "container_number COLLATE \"C\"",
        SortField::Status => "status COLLATE \"C\"",
    };
    let direction = match page.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    format!(" ORDER BY {column} {direction}, created_at {direction}")
}

impl Storage for PostgresStorage {}

#[async_trait]
impl InspectionStorage for PostgresStorage {
    async fn insert_inspection(&self, inspection: Inspection) -> StorageResult<()> {
        let data = Self::to_json(&inspection)?;
        sqlx::query(
            r#"
            INSERT INTO inspections
                (id, code, container_number, plant_id, shipping_line_id, inspector_id,
                 status, inspected_at, created_at, data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(inspection.id.as_uuid())
        .bind(inspection.code.as_str())
        .bind(&inspection.container_number)
        .bind(inspection.plant_id.as_uuid())
        .bind(inspection.shipping_line_id.as_uuid())
        .bind(inspection.inspector_id.as_uuid())
        .bind(inspection.status.as_str())
        .bind(inspection.inspected_at)
        .bind(inspection.created_at)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn get_inspection(&self, id: &InspectionId) -> StorageResult<Option<Inspection>> {
        let row = sqlx::query("SELECT data FROM inspections WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn list_inspections(
        &self,
        filter: &InspectionFilter,
        page: &PageRequest,
    ) -> StorageResult<Page<Inspection>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) AS total FROM inspections");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?
            .try_get("total")
            .map_err(query_error)?;

        let mut select = QueryBuilder::new("SELECT data FROM inspections");
        push_filter(&mut select, filter);
        select.push(order_clause(page));
        select
            .push(" LIMIT ")
            .push_bind(i64::from(page.page_size))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(Page::new(Self::decode_all(rows)?, total.max(0) as u64, page))
    }

    async fn find_inspections(&self, filter: &InspectionFilter) -> StorageResult<Vec<Inspection>> {
        let mut select = QueryBuilder::new("SELECT data FROM inspections");
        push_filter(&mut select, filter);
        select.push(" ORDER BY inspected_at DESC");
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        Self::decode_all(rows)
    }

    async fn decide_if_pending(
        &self,
        id: &InspectionId,
        status: InspectionStatus,
        decision: Decision,
    ) -> StorageResult<Guarded<Inspection>> {
        let patch = json!({
            "status": status,
            "updated_at": decision.decided_at,
            "decision": Self::to_json(&decision)?,
        });

        let row = sqlx::query(
            r#"
            UPDATE inspections
            SET status = $2, data = data || $3
            WHERE id = $1 AND status = 'pending'
            RETURNING data
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(patch)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        if let Some(row) = row {
            return Ok(Guarded::Applied(Self::decode(&row)?));
        }

        let current = sqlx::query("SELECT status FROM inspections WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        match current {
            Some(row) => {
                let status: String = row.try_get("status").map_err(query_error)?;
                Ok(Guarded::Blocked(Self::parse_status(&status)?))
            }
            None => Ok(Guarded::Missing),
        }
    }

    async fn set_signature_if_pending(
        &self,
        id: &InspectionId,
        path: &str,
    ) -> StorageResult<Guarded<Option<String>>> {
        let mut tx = self.begin().await?;
        match Self::lock_status(&mut tx, id).await? {
            None => return Ok(Guarded::Missing),
            Some(status) if !status.accepts_evidence() => return Ok(Guarded::Blocked(status)),
            Some(_) => {}
        }

        let previous: Option<String> = sqlx::query(
            "SELECT data->>'signature_path' AS previous FROM inspections WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?
        .try_get("previous")
        .map_err(query_error)?;

        let patch = json!({ "signature_path": path, "updated_at": Utc::now() });
        sqlx::query("UPDATE inspections SET data = data || $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(patch)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        Self::commit(tx).await?;
        Ok(Guarded::Applied(previous))
    }

    async fn delete_inspection(
        &self,
        id: &InspectionId,
    ) -> StorageResult<Option<(Inspection, Vec<Photo>)>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query("SELECT data FROM inspections WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let inspection: Inspection = Self::decode(&row)?;

        let photos = sqlx::query("SELECT data FROM photos WHERE inspection_id = $1 ORDER BY sequence")
            .bind(id.as_uuid())
            .fetch_all(&mut *tx)
            .await
            .map_err(query_error)?;
        let photos: Vec<Photo> = Self::decode_all(photos)?;

        sqlx::query("DELETE FROM inspections WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

        Self::commit(tx).await?;
        Ok(Some((inspection, photos)))
    }
}

#[async_trait]
impl EvidenceStorage for PostgresStorage {
    async fn insert_photos_if_pending(
        &self,
        inspection_id: &InspectionId,
        photos: Vec<Photo>,
    ) -> StorageResult<Guarded<Vec<Photo>>> {
        let mut tx = self.begin().await?;
        match Self::lock_status(&mut tx, inspection_id).await? {
            None => return Ok(Guarded::Missing),
            Some(status) if !status.accepts_evidence() => return Ok(Guarded::Blocked(status)),
            Some(_) => {}
        }

        let last: i32 = sqlx::query(
            "SELECT COALESCE(MAX(sequence), 0) AS last FROM photos WHERE inspection_id = $1",
        )
        .bind(inspection_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?
        .try_get("last")
        .map_err(query_error)?;

        let mut stored = Vec::with_capacity(photos.len());
        for (offset, mut photo) in photos.into_iter().enumerate() {
            photo.inspection_id = *inspection_id;
            photo.sequence = last.max(0) as u32 + offset as u32 + 1;
            sqlx::query(
                "INSERT INTO photos (id, inspection_id, sequence, data) VALUES ($1, $2, $3, $4)",
            )
            .bind(photo.id.as_uuid())
            .bind(inspection_id.as_uuid())
            .bind(photo.sequence as i32)
            .bind(Self::to_json(&photo)?)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
            stored.push(photo);
        }

        Self::commit(tx).await?;
        Ok(Guarded::Applied(stored))
    }

    async fn list_photos(&self, inspection_id: &InspectionId) -> StorageResult<Vec<Photo>> {
        let rows = sqlx::query("SELECT data FROM photos WHERE inspection_id = $1 ORDER BY sequence")
            .bind(inspection_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        Self::decode_all(rows)
    }

    async fn delete_photo_unless_approved(
        &self,
        inspection_id: &InspectionId,
        photo_id: &PhotoId,
    ) -> StorageResult<Guarded<Option<Photo>>> {
        let mut tx = self.begin().await?;
        match Self::lock_status(&mut tx, inspection_id).await? {
            None => return Ok(Guarded::Missing),
            Some(status) if status.locks_evidence() => return Ok(Guarded::Blocked(status)),
            Some(_) => {}
        }

        let row = sqlx::query(
            "DELETE FROM photos WHERE id = $1 AND inspection_id = $2 RETURNING data",
        )
        .bind(photo_id.as_uuid())
        .bind(inspection_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_error)?;
        let photo = row.as_ref().map(Self::decode).transpose()?;

        Self::commit(tx).await?;
        Ok(Guarded::Applied(photo))
    }
}

#[async_trait]
impl PlantStorage for PostgresStorage {
    async fn get_plant(&self, id: &PlantId) -> StorageResult<Option<Plant>> {
        let row = sqlx::query("SELECT data FROM plants WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn list_plants(&self) -> StorageResult<Vec<Plant>> {
        let rows = sqlx::query("SELECT data FROM plants ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        Self::decode_all(rows)
    }

    async fn upsert_plant(&self, plant: Plant) -> StorageResult<()> {
        let data = Self::to_json(&plant)?;
        sqlx::query(
            r#"
            INSERT INTO plants (id, code, name, data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                code = EXCLUDED.code,
                name = EXCLUDED.name,
                data = EXCLUDED.data
            "#,
        )
        .bind(plant.id.as_uuid())
        .bind(&plant.code)
        .bind(&plant.name)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn delete_plant(&self, id: &PlantId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM plants WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ShippingLineStorage for PostgresStorage {
    async fn get_shipping_line(&self, id: &ShippingLineId) -> StorageResult<Option<ShippingLine>> {
        let row = sqlx::query("SELECT data FROM shipping_lines WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn list_shipping_lines(&self) -> StorageResult<Vec<ShippingLine>> {
        let rows = sqlx::query("SELECT data FROM shipping_lines ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        Self::decode_all(rows)
    }

    async fn upsert_shipping_line(&self, line: ShippingLine) -> StorageResult<()> {
        let data = Self::to_json(&line)?;
        sqlx::query(
            r#"
            INSERT INTO shipping_lines (id, code, name, data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                code = EXCLUDED.code,
                name = EXCLUDED.name,
                data = EXCLUDED.data
            "#,
        )
        .bind(line.id.as_uuid())
        .bind(&line.code)
        .bind(&line.name)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn delete_shipping_line(&self, id: &ShippingLineId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM shipping_lines WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStorage for PostgresStorage {
    async fn get_user(&self, id: &UserId) -> StorageResult<Option<User>> {
        let row = sqlx::query("SELECT data FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn list_users(&self, include_inactive: bool) -> StorageResult<Vec<User>> {
        let rows = sqlx::query("SELECT data FROM users WHERE active OR $1 ORDER BY name")
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        Self::decode_all(rows)
    }

    async fn upsert_user(&self, user: User) -> StorageResult<()> {
        let data = Self::to_json(&user)?;
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, active, data)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                active = EXCLUDED.active,
                data = EXCLUDED.data
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.is_active())
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn patch_user(
        &self,
        id: &UserId,
        patch: &UserPatch,
        at: DateTime<Utc>,
    ) -> StorageResult<Option<User>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query("SELECT data FROM users WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut user: User = Self::decode(&row)?;
        patch.apply(&mut user, at);

        sqlx::query("UPDATE users SET email = $2, name = $3, active = $4, data = $5 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(&user.email)
            .bind(&user.name)
            .bind(user.is_active())
            .bind(Self::to_json(&user)?)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
        Self::commit(tx).await?;
        Ok(Some(user))
    }

    async fn touch_last_seen(&self, id: &UserId, at: DateTime<Utc>) -> StorageResult<Option<User>> {
        let row = sqlx::query(
            "UPDATE users SET data = jsonb_set(data, '{last_seen_at}', $2) WHERE id = $1 RETURNING data",
        )
        .bind(id.as_uuid())
        .bind(Self::to_json(&at)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn delete_user(&self, id: &UserId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EventStorage for PostgresStorage {
    async fn record_event(&self, event: InspectionEventEnvelope) -> StorageResult<()> {
        let data = Self::to_json(&event)?;
        sqlx::query(
            r#"
            INSERT INTO events (id, timestamp, inspection_id, actor, data)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.id)
        .bind(event.timestamp)
        .bind(event.event.inspection_id().as_uuid())
        .bind(event.actor.as_uuid())
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn list_events(&self, limit: usize) -> StorageResult<Vec<InspectionEventEnvelope>> {
        let rows = sqlx::query("SELECT data FROM events ORDER BY timestamp DESC LIMIT $1")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        Self::decode_all(rows)
    }
}
