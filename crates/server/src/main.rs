use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::get,
    Json, Router,
};
use server_api::ApiContext;
use shared::{
    domain::{ActivityId, EventId, UniqueActivityId},
    error::{ApiError, ErrorCode},
    protocol::{
        Activity, ActivityPayload, ActivityType, Event, EventFields, Institution,
        ResponsibleParty, TargetAudience, Theme, UniqueActivity, UniqueActivityPayload,
    },
};
use storage::Storage;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

type HttpResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let cors = cors_layer(&settings.cors_origin)?;
    let app = build_router(Arc::new(state)).layer(cors);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, cors_origin = %settings.cors_origin, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = origin.parse()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/eventos", get(http_list_events).post(http_create_event))
        .route(
            "/eventos/:event_id",
            get(http_get_event)
                .put(http_update_event)
                .delete(http_delete_event),
        )
        .route(
            "/eventos/:event_id/atividades",
            get(http_list_event_activities).post(http_create_activity),
        )
        .route(
            "/eventos/:event_id/atividades-unicas",
            get(http_list_event_unique_activities).post(http_create_unique_activity),
        )
        .route("/atividades", get(http_list_activities))
        .route(
            "/atividades/:activity_id",
            get(http_get_activity)
                .put(http_update_activity)
                .delete(http_delete_activity),
        )
        .route("/atividades-unicas", get(http_list_unique_activities))
        .route(
            "/atividades-unicas/:unique_activity_id",
            get(http_get_unique_activity)
                .put(http_update_unique_activity)
                .delete(http_delete_unique_activity),
        )
        .route("/temas", get(http_list_themes))
        .route("/tipos", get(http_list_activity_types))
        .route("/instituicoes", get(http_list_institutions))
        .route("/publicos-alvo", get(http_list_target_audiences))
        .route("/responsaveis", get(http_list_responsible_parties));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(err.code);
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    }
    (status, Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            warn!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_list_events(State(state): State<Arc<AppState>>) -> HttpResult<Json<Vec<Event>>> {
    let events = server_api::list_events(&state.api)
        .await
        .map_err(api_error)?;
    Ok(Json(events))
}

async fn http_get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> HttpResult<Json<Event>> {
    let event = server_api::get_event(&state.api, EventId(event_id))
        .await
        .map_err(api_error)?;
    Ok(Json(event))
}

async fn http_create_event(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<EventFields>,
) -> HttpResult<(StatusCode, Json<Event>)> {
    let event = server_api::create_event(&state.api, fields)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn http_update_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
    Json(fields): Json<EventFields>,
) -> HttpResult<Json<Event>> {
    let event = server_api::update_event(&state.api, EventId(event_id), fields)
        .await
        .map_err(api_error)?;
    Ok(Json(event))
}

async fn http_delete_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> HttpResult<StatusCode> {
    server_api::delete_event(&state.api, EventId(event_id))
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_list_activities(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<Activity>>> {
    let activities = server_api::list_activities(&state.api)
        .await
        .map_err(api_error)?;
    Ok(Json(activities))
}

async fn http_list_event_activities(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> HttpResult<Json<Vec<Activity>>> {
    let activities = server_api::list_event_activities(&state.api, EventId(event_id))
        .await
        .map_err(api_error)?;
    Ok(Json(activities))
}

async fn http_get_activity(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<i64>,
) -> HttpResult<Json<Activity>> {
    let activity = server_api::get_activity(&state.api, ActivityId(activity_id))
        .await
        .map_err(api_error)?;
    Ok(Json(activity))
}

async fn http_create_activity(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
    Json(payload): Json<ActivityPayload>,
) -> HttpResult<(StatusCode, Json<Activity>)> {
    let activity = server_api::create_activity(&state.api, EventId(event_id), payload)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn http_update_activity(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<i64>,
    Json(payload): Json<ActivityPayload>,
) -> HttpResult<Json<Activity>> {
    let activity = server_api::update_activity(&state.api, ActivityId(activity_id), payload)
        .await
        .map_err(api_error)?;
    Ok(Json(activity))
}

async fn http_delete_activity(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<i64>,
) -> HttpResult<StatusCode> {
    server_api::delete_activity(&state.api, ActivityId(activity_id))
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_list_unique_activities(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<UniqueActivity>>> {
    let activities = server_api::list_unique_activities(&state.api)
        .await
        .map_err(api_error)?;
    Ok(Json(activities))
}

async fn http_list_event_unique_activities(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> HttpResult<Json<Vec<UniqueActivity>>> {
    let activities = server_api::list_event_unique_activities(&state.api, EventId(event_id))
        .await
        .map_err(api_error)?;
    Ok(Json(activities))
}

async fn http_get_unique_activity(
    State(state): State<Arc<AppState>>,
    Path(unique_activity_id): Path<i64>,
) -> HttpResult<Json<UniqueActivity>> {
    let activity =
        server_api::get_unique_activity(&state.api, UniqueActivityId(unique_activity_id))
            .await
            .map_err(api_error)?;
    Ok(Json(activity))
}

async fn http_create_unique_activity(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
    Json(payload): Json<UniqueActivityPayload>,
) -> HttpResult<(StatusCode, Json<UniqueActivity>)> {
    let activity = server_api::create_unique_activity(&state.api, EventId(event_id), payload)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn http_update_unique_activity(
    State(state): State<Arc<AppState>>,
    Path(unique_activity_id): Path<i64>,
    Json(payload): Json<UniqueActivityPayload>,
) -> HttpResult<Json<UniqueActivity>> {
    let activity = server_api::update_unique_activity(
        &state.api,
        UniqueActivityId(unique_activity_id),
        payload,
    )
    .await
    .map_err(api_error)?;
    Ok(Json(activity))
}

async fn http_delete_unique_activity(
    State(state): State<Arc<AppState>>,
    Path(unique_activity_id): Path<i64>,
) -> HttpResult<StatusCode> {
    server_api::delete_unique_activity(&state.api, UniqueActivityId(unique_activity_id))
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_list_themes(State(state): State<Arc<AppState>>) -> HttpResult<Json<Vec<Theme>>> {
    let themes = server_api::list_themes(&state.api)
        .await
        .map_err(api_error)?;
    Ok(Json(themes))
}

async fn http_list_activity_types(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<ActivityType>>> {
    let types = server_api::list_activity_types(&state.api)
        .await
        .map_err(api_error)?;
    Ok(Json(types))
}

async fn http_list_institutions(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<Institution>>> {
    let institutions = server_api::list_institutions(&state.api)
        .await
        .map_err(api_error)?;
    Ok(Json(institutions))
}

async fn http_list_target_audiences(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<TargetAudience>>> {
    let audiences = server_api::list_target_audiences(&state.api)
        .await
        .map_err(api_error)?;
    Ok(Json(audiences))
}

async fn http_list_responsible_parties(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<ResponsibleParty>>> {
    let parties = server_api::list_responsible_parties(&state.api)
        .await
        .map_err(api_error)?;
    Ok(Json(parties))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
