//! Request extractors shared by the handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use inspection_types::{Caller, TypeError, User, UserId};
use std::str::FromStr;
use tracing::warn;

/// Header carrying the authenticated user id, set by the fronting proxy
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated, active account behind a request
///
/// The role always comes from the user catalog, never from the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub caller: Caller,
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated("missing X-User-Id header".to_string()))?
            .to_str()
            .map_err(|_| ApiError::Unauthenticated("unreadable X-User-Id header".to_string()))?;

        let id: UserId = raw
            .trim()
            .parse()
            .map_err(|_| ApiError::Unauthenticated(format!("invalid user id '{raw}'")))?;

        let user = state
            .catalog
            .lookup_account(&id)
            .await?
            .ok_or_else(|| ApiError::Unauthenticated(format!("unknown user {id}")))?;

        if !user.is_active() {
            warn!(user_id = %id, "Request from inactive account refused");
            return Err(ApiError::Forbidden(format!("user {id} is inactive")));
        }

        Ok(Self {
            caller: Caller::new(user.id, user.role),
            user,
        })
    }
}

/// JSON body whose rejections use the API error format
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

/// Parse a path identifier, with or without its display prefix
pub fn parse_id<T>(raw: &str) -> ApiResult<T>
where
    T: FromStr<Err = TypeError>,
{
    raw.parse().map_err(|e: TypeError| ApiError::BadRequest(e.to_string()))
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD`
///
/// A bare date is widened to the start of the day, or to its last second
/// when it is an upper bound.
pub fn parse_date_bound(
    name: &str,
    raw: Option<&str>,
    upper: bool,
) -> ApiResult<Option<DateTime<Utc>>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("{name} must be YYYY-MM-DD or RFC 3339")))?;
    let time = if upper {
        NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        Some(NaiveTime::MIN)
    };
    Ok(time.map(|t| date.and_time(t).and_utc()))
}
