//! Dashboard surface: state snapshot, navigation, weather, and calculator.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{footprint, weather, AppState, FootprintForm, Page};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/dashboard", get(snapshot))
        .route("/pages/{page}", post(navigate))
        .route("/weather/refresh", post(refresh_weather))
        .route("/footprint", post(calculate))
}

#[derive(Serialize)]
struct NavigationResponse {
    page: Page,
    heading: String,
}

/// Everything the front end needs to draw the dashboard.
async fn snapshot(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let dashboard = state.dashboard.lock().await;
    let response = Json(&*dashboard).into_response();
    response
}

async fn navigate(Path(page): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let page: Page = match page.parse() {
        Ok(page) => page,
        Err(e) => {
            warn!("Navigation rejected: {}", e);
            return (StatusCode::NOT_FOUND, Json(e.to_string())).into_response();
        }
    };

    let (needs_weather, heading) = {
        let mut dashboard = state.dashboard.lock().await;
        let needs_weather = dashboard.navigate(page);
        (needs_weather, dashboard.heading.clone())
    };

    if needs_weather {
        debug!("Weather page opened, refreshing weather");
        let state = state.clone();
        tokio::spawn(async move {
            weather::refresh_weather(&state).await;
        });
    }

    (StatusCode::OK, Json(NavigationResponse { page, heading })).into_response()
}

async fn refresh_weather(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    info!("POST /weather/refresh");
    Json(weather::refresh_weather(&state).await)
}

async fn calculate(State(state): State<AppState>, Form(form): Form<FootprintForm>) -> impl IntoResponse {
    // ---
    info!("POST /footprint");

    let request = match form.parse() {
        Ok(request) => request,
        Err(e) => {
            warn!("Footprint form rejected: {}", e);
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(e.to_string())).into_response();
        }
    };

    let view = footprint::submit(&state, request).await;
    (StatusCode::OK, Json(view)).into_response()
}
