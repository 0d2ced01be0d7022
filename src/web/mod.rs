//! HTTP surface for Skycast
//!
//! `GET /weather` shows the search form, `POST /weather` runs a lookup and
//! shows the result or an error on the same page. Lookup failures never change
//! the status code; they are rendered into the page.

pub mod view;

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect},
    routing::get,
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::service::WeatherService;
use view::{render_page, WeatherView};

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: WeatherService,
}

impl AppState {
    pub fn new(service: WeatherService) -> Self {
        Self { service }
    }
}

/// Form submitted from the weather page
#[derive(Debug, Deserialize)]
pub struct CityForm {
    #[serde(default)]
    pub city: String,
}

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cached_entries: usize,
}

/// Builds the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/weather") }))
        .route("/weather", get(show_form).post(lookup_weather))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn show_form() -> Html<String> {
    Html(render_page(&WeatherView::empty()))
}

async fn lookup_weather(
    State(state): State<AppState>,
    Form(form): Form<CityForm>,
) -> Html<String> {
    let view = match state.service.lookup(&form.city).await {
        Ok(lookup) => WeatherView::from_weather(
            &form.city,
            &lookup.weather,
            state.service.units(),
            Local::now(),
        ),
        Err(err) => WeatherView {
            city: form.city.trim().to_string(),
            ..WeatherView::error(err.to_string())
        },
    };

    Html(render_page(&view))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_entries: state.service.cache().len(),
    };

    (StatusCode::OK, Json(response))
}
