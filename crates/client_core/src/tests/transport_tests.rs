use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use shared::{
    domain::{ActivityId, EventId},
    error::ApiError,
    protocol::{Activity, ActivityPayload, Event, EventFields},
};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;

#[derive(Clone, Default)]
struct ServerState {
    put_bodies: Arc<Mutex<Vec<serde_json::Value>>>,
}

async fn spawn_server() -> (String, ServerState) {
    let state = ServerState::default();
    let app = Router::new()
        .route(
            "/api/eventos",
            get(|| async {
                Json(vec![Event {
                    id: EventId(1),
                    fields: EventFields {
                        title: "Tech Talk".into(),
                        ..EventFields::default()
                    },
                    activities: Vec::new(),
                    unique_activities: Vec::new(),
                }])
            }),
        )
        .route(
            "/api/eventos/:event_id",
            get(|Path(event_id): Path<i64>| async move {
                (
                    StatusCode::NOT_FOUND,
                    Json(ApiError::not_found(format!("event {event_id} not found"))),
                )
            })
            .delete(|| async { StatusCode::NO_CONTENT }),
        )
        .route(
            "/api/atividades/:activity_id",
            put(
                |State(state): State<ServerState>,
                 Path(activity_id): Path<i64>,
                 Json(body): Json<serde_json::Value>| async move {
                    state.put_bodies.lock().await.push(body.clone());
                    Json(Activity {
                        id: Some(ActivityId(activity_id)),
                        name: body["nome"].as_str().unwrap_or_default().to_string(),
                        ..Activity::default()
                    })
                },
            ),
        )
        .route("/api/temas", get(|| async { "not json" }))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}/api"), state)
}

#[test]
fn base_url_without_trailing_slash_keeps_api_prefix() {
    let client = RestClient::new("http://localhost:3000/api").expect("client");
    assert_eq!(
        client.endpoint("eventos/3").expect("url").as_str(),
        "http://localhost:3000/api/eventos/3"
    );
    assert!(RestClient::new("not a url").is_err());
}

#[tokio::test]
async fn lists_events_from_json_body() {
    let (base_url, _state) = spawn_server().await;
    let client = RestClient::new(&base_url).expect("client");

    let events = EventStore::list(&client).await.expect("list");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].fields.title, "Tech Talk");
}

#[tokio::test]
async fn non_success_status_carries_server_message() {
    let (base_url, _state) = spawn_server().await;
    let client = RestClient::new(&base_url).expect("client");

    let err = EventStore::get(&client, EventId(9))
        .await
        .expect_err("404");
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("event 9 not found"), "{err}");
}

#[tokio::test]
async fn non_json_content_type_is_a_transport_failure() {
    let (base_url, _state) = spawn_server().await;
    let client = RestClient::new(&base_url).expect("client");

    let err = LookupStore::themes(&client).await.expect_err("text body");
    assert!(matches!(err, ClientError::Transport { .. }));
}

#[tokio::test]
async fn delete_accepts_no_content() {
    let (base_url, _state) = spawn_server().await;
    let client = RestClient::new(&base_url).expect("client");

    EventStore::delete(&client, EventId(4))
        .await
        .expect("delete");
}

#[tokio::test]
async fn child_update_sends_payload_to_collection_path() {
    let (base_url, state) = spawn_server().await;
    let client = RestClient::new(&base_url).expect("client");

    let updated = ChildStore::<Activity>::update(
        &client,
        ActivityId(5),
        &ActivityPayload {
            name: "Keynote".into(),
            ..ActivityPayload::default()
        },
    )
    .await
    .expect("update");

    assert_eq!(updated.id, Some(ActivityId(5)));
    assert_eq!(updated.name, "Keynote");
    let bodies = state.put_bodies.lock().await;
    assert_eq!(bodies[0]["nome"], "Keynote");
    assert!(bodies[0].get("tipo").is_none());
}
