//! Event feed handlers

use crate::api::rest::extract::CurrentUser;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{self, Stream};
use inspection_types::InspectionEventEnvelope;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Largest page of recent events
const MAX_EVENTS: usize = 500;

/// Get events query params
#[derive(Debug, Deserialize)]
pub struct GetEventsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Get recent events, newest first
pub async fn get_events(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<GetEventsQuery>,
) -> ApiResult<Json<Vec<InspectionEventEnvelope>>> {
    let events = state
        .engine
        .recent_events(query.limit.min(MAX_EVENTS))
        .await?;
    Ok(Json(events))
}

/// Stream events via SSE, typed by event name
pub async fn stream_events(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.engine.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(envelope) => {
                let json = serde_json::to_string(&envelope).unwrap_or_default();
                let sse_event = Event::default().event(envelope.event.name()).data(json);
                Some((Ok(sse_event), rx))
            }
            Err(RecvError::Lagged(_)) => {
                // Client lagged behind, continue
                Some((Ok(Event::default().comment("lagged")), rx))
            }
            Err(RecvError::Closed) => None,
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
