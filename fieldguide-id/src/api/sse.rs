//! Server-Sent Events for identification updates
//!
//! Late and background results (submit, refresh, superseded events, first
//! sightings, location advisories) reach clients here.

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    fieldguide_common::sse::create_event_sse_stream("fieldguide-id", &state.event_bus)
}
