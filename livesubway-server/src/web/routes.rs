//! HTTP route handlers.

use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path as UrlPath, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDateTime;
use futures::{Sink, SinkExt, Stream, StreamExt};
use geojson::FeatureCollection;
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::services::ServeDir;
use tracing::{debug, warn};

use crate::broadcast::Event;
use crate::domain::DayType;
use crate::schedule::ScheduleSnapshot;
use crate::shapes::{Shape, build_routes};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
///
/// `map_dir` holds the static map assets served under `/map_files`.
pub fn create_router(state: AppState, map_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/schedule/:day", get(day_schedule))
        .route("/api/shapes/:shape", get(shape))
        .route("/api/routes", get(routes))
        .route("/ws", get(subscribe))
        .nest_service("/map_files", ServeDir::new(map_dir.as_ref()))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Next departures and trips in service, now or at `?at=`.
async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, AppError> {
    let now = match query.at.as_deref() {
        Some(at) => {
            NaiveDateTime::parse_from_str(at, DATETIME_FORMAT).map_err(|e| AppError::BadRequest {
                message: format!("Invalid time {at:?}: {e}"),
            })?
        }
        None => state.clock.now(),
    };

    let snapshot = ScheduleSnapshot::at(&state.table, now);
    let day = state.table.day(snapshot.day_type);

    Ok(Json(StatusResponse::from_snapshot(
        &snapshot,
        day,
        now,
        state.broadcaster.subscriber_count(),
    )))
}

/// The full schedule for one day type (`WKD`, `SAT` or `SUN`).
async fn day_schedule(
    State(state): State<AppState>,
    UrlPath(day): UrlPath<String>,
) -> Result<Json<DayScheduleResponse>, AppError> {
    let day_type = DayType::from_code(&day).map_err(|e| AppError::NotFound {
        message: e.to_string(),
    })?;

    Ok(Json(DayScheduleResponse::from_day(state.table.day(day_type))))
}

/// Points of one shape, by shape ID (e.g. `1..N03R`).
async fn shape(
    State(state): State<AppState>,
    UrlPath(shape_id): UrlPath<String>,
) -> Result<Json<Shape>, AppError> {
    state
        .shapes
        .get(&shape_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            message: format!("Unknown shape {shape_id:?}"),
        })
}

/// One line per route, as a GeoJSON feature collection.
async fn routes(State(state): State<AppState>) -> Json<FeatureCollection> {
    Json(build_routes(&state.shapes))
}

/// Upgrade to a WebSocket streaming every published event as JSON.
async fn subscribe(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let events = state.broadcaster.subscribe();
    ws.on_upgrade(move |socket: WebSocket| {
        let (outgoing, incoming) = socket.split();
        relay(outgoing, incoming, events)
    })
}

/// Forward events to one client as text frames until either side goes away.
async fn relay<S, R, E>(mut outgoing: S, mut incoming: R, mut events: broadcast::Receiver<Arc<Event>>)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    debug!("subscriber connected");

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    let json = match event.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(event = event.name(), error = %e, "failed to encode event");
                            continue;
                        }
                    };
                    if outgoing.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            received = incoming.next() => match received {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("subscriber disconnected");
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        debug!(%status, %message, "request rejected");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{Broadcaster, ChannelBroadcaster, Heartbeat};
    use crate::daemon::Clock;
    use crate::schedule::ScheduleTable;
    use crate::shapes::ShapeSet;
    use chrono::NaiveDate;
    use futures::channel::mpsc;
    use futures::stream;

    struct FixedClock(NaiveDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            self.0
        }
    }

    fn table() -> ScheduleTable {
        let json = r#"{
            "WKD": [
                {"line": "1", "id": "A01WKD_030000_1..S", "init_time": "05:00:00",
                 "trip_time": [["101S", "05:00:00"], ["142S", "05:50:00"]]},
                {"line": "1", "id": "A01WKD_036000_1..S", "init_time": "06:00:00",
                 "trip_time": [["101S", "06:00:00"], ["142S", "06:50:00"]]},
                {"line": "2", "id": "A01WKD_036000_2..S", "init_time": "06:00:00",
                 "trip_time": [["201S", "06:00:00"], ["247S", "07:00:00"]]}
            ],
            "SAT": [],
            "SUN": []
        }"#;
        ScheduleTable::from_reader(json.as_bytes()).unwrap()
    }

    fn shapes() -> ShapeSet {
        let json = r##"{
            "1..N03R": {"sequence": "2", "color": "#EE352E",
                        "points": [[-74.0, 40.5], [-73.75, 40.75]]},
            "1..S03R": {"sequence": "2", "color": "#EE352E",
                        "points": [[-73.75, 40.75], [-74.0, 40.5]]},
            "H..N01R": {"sequence": "1", "points": [[-73.75, 40.5]]}
        }"##;
        ShapeSet::from_reader(json.as_bytes()).unwrap()
    }

    fn update(sent_at: &str) -> Event {
        Event::Update(Heartbeat {
            sent_at: sent_at.to_string(),
        })
    }

    /// Friday 2024-03-15 05:30:00.
    fn state() -> AppState {
        let now = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(5, 30, 0)
            .unwrap();
        AppState::new(
            Arc::new(table()),
            Arc::new(shapes()),
            ChannelBroadcaster::new(4),
            FixedClock(now),
        )
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn status_uses_clock() {
        let Json(status) = status(State(state()), Query(StatusQuery::default()))
            .await
            .unwrap();

        assert_eq!(status.day_type, DayType::Weekday);
        assert_eq!(status.now, "2024-03-15T05:30:00");
        assert_eq!(status.next_index, 1);
        assert_eq!(status.next_departures.len(), 2);
        assert_eq!(status.next_departures[0].id, "A01WKD_036000_1..S");
        assert_eq!(status.active.len(), 1);
        assert_eq!(status.active[0].trip.id, "A01WKD_030000_1..S");
        assert!((status.active[0].progress - 0.6).abs() < 1e-9);
        assert_eq!(status.subscribers, 0);
    }

    #[tokio::test]
    async fn status_at_explicit_time() {
        let query = StatusQuery {
            at: Some("2024-03-16T12:00:00".to_string()),
        };
        let Json(status) = status(State(state()), Query(query)).await.unwrap();

        assert_eq!(status.day_type, DayType::Saturday);
        assert_eq!(status.next_index, 0);
        assert!(status.next_departures.is_empty());
        assert!(status.active.is_empty());
    }

    #[tokio::test]
    async fn status_rejects_bad_time() {
        let query = StatusQuery {
            at: Some("tomorrow".to_string()),
        };
        let err = status(State(state()), Query(query)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn schedule_by_day_code() {
        let Json(day) = day_schedule(State(state()), UrlPath("wkd".to_string()))
            .await
            .unwrap();

        assert_eq!(day.day_type, DayType::Weekday);
        assert_eq!(day.count, 3);
        assert_eq!(day.trips[2].id, "A01WKD_036000_2..S");
    }

    #[tokio::test]
    async fn unknown_day_is_not_found() {
        let err = day_schedule(State(state()), UrlPath("HOL".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn shape_by_id() {
        let Json(shape) = shape(State(state()), UrlPath("1..N03R".to_string()))
            .await
            .unwrap();

        assert_eq!(shape.sequence, 2);
        assert_eq!(shape.points, vec![[-74.0, 40.5], [-73.75, 40.75]]);
    }

    #[tokio::test]
    async fn unknown_shape_is_not_found() {
        let err = shape(State(state()), UrlPath("Z..N99R".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn routes_from_northbound_shapes() {
        let Json(routes) = routes(State(state())).await;

        let lines: Vec<_> = routes
            .features
            .iter()
            .map(|f| {
                (
                    f.property("route_id").and_then(|v| v.as_str()),
                    f.property("color").and_then(|v| v.as_str()),
                )
            })
            .collect();
        assert_eq!(
            lines,
            vec![(Some("1"), Some("#EE352E")), (Some("H"), Some("#2850AD"))]
        );
    }

    #[tokio::test]
    async fn relay_sends_text_frames_past_a_lag() {
        let broadcaster = ChannelBroadcaster::new(1);
        let events = broadcaster.subscribe();

        // Capacity 1: the first event is overwritten before the relay reads it.
        broadcaster.publish(update("2024-03-15T05:59:55")).unwrap();
        broadcaster.publish(update("2024-03-15T06:00:00")).unwrap();
        drop(broadcaster);

        let (outgoing, sent) = mpsc::unbounded();
        relay(outgoing, stream::pending::<Result<Message, axum::Error>>(), events).await;

        let frames: Vec<Message> = sent.collect().await;
        assert_eq!(
            frames,
            vec![Message::Text(
                r#"{"event":"update","data":{"sent_at":"2024-03-15T06:00:00"}}"#.to_string()
            )]
        );
    }

    #[tokio::test]
    async fn relay_stops_when_client_closes() {
        let broadcaster = ChannelBroadcaster::new(4);
        let events = broadcaster.subscribe();
        let (outgoing, sent) = mpsc::unbounded();
        let incoming = stream::iter(vec![
            Ok::<_, axum::Error>(Message::Ping(vec![1])),
            Ok(Message::Close(None)),
        ]);

        relay(outgoing, incoming, events).await;

        assert_eq!(sent.collect::<Vec<Message>>().await, vec![]);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn relay_stops_when_send_fails() {
        let broadcaster = ChannelBroadcaster::new(4);
        let events = broadcaster.subscribe();
        let (outgoing, sent) = mpsc::unbounded::<Message>();
        drop(sent);
        broadcaster.publish(Event::Schedule(vec![])).unwrap();

        relay(outgoing, stream::pending::<Result<Message, axum::Error>>(), events).await;

        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn router_builds() {
        let dir = tempfile::tempdir().unwrap();
        let _router = create_router(state(), dir.path());
    }
}
