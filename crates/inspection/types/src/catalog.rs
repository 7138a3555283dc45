//! Reference data: plants, shipping lines and user accounts

use crate::ids::{PlantId, ShippingLineId, UserId};
use crate::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inspection site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    pub id: PlantId,
    /// Unique short code
    pub code: String,
    pub name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plant {
    pub fn new(code: String, name: String, location: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PlantId::generate(),
            code,
            name,
            location,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Carrier owning the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingLine {
    pub id: ShippingLineId,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShippingLine {
    pub fn new(code: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: ShippingLineId::generate(),
            code,
            name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Account status; inactive users cannot call the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(UserStatus::Active),
            "inactive" => Some(UserStatus::Inactive),
            _ => None,
        }
    }
}

/// User account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            name,
            email,
            role,
            status: UserStatus::Active,
            last_seen_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}
