// src/api.rs
use chrono::Utc;
use serde_json::{json, Value};
use shuttle_axum::axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::feature::{DataMode, FeatureCollection};
use crate::ingest::config::Credentials;
use crate::ingest::fallback::FallbackChain;
use crate::ingest::scheduler::LatestRun;
use crate::ingest::types::SourceId;

/// Which credentials were configured; values never leave the config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyPresence {
    pub firms: bool,
    pub openweather: bool,
}

impl KeyPresence {
    pub fn from_credentials(c: &Credentials) -> Self {
        Self {
            firms: c.firms_map_key().is_some(),
            openweather: c.openweather_api_key().is_some(),
        }
    }

    fn label(&self, source: SourceId) -> &'static str {
        let present = match source {
            SourceId::NasaFirms => self.firms,
            SourceId::OpenWeather => self.openweather,
            _ => return "not_required",
        };
        if present {
            "yes"
        } else {
            "no"
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub latest: LatestRun,
    pub keys: KeyPresence,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/data/{layer}", get(layer_data))
        .route("/api/summary", get(summary))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn layer_data(State(state): State<AppState>, Path(layer): Path<String>) -> Response {
    let Some(source) = SourceId::from_layer(&layer) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid layer specified" })),
        )
            .into_response();
    };

    let latest = state.latest.get();
    let placeholder;
    let collection = match latest.as_deref().and_then(|run| run.collection(source)) {
        Some(c) => c,
        None => {
            placeholder = FallbackChain::empty_step(source, source.trust_tier(), Utc::now());
            &placeholder
        }
    };

    match enriched(collection, state.keys.label(source)) {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::error!(target: "api", layer = %layer, error = %e, "serializing collection");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn summary(State(state): State<AppState>) -> Response {
    match state.latest.get() {
        Some(run) => Json(&run.summary).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No pipeline run yet" })),
        )
            .into_response(),
    }
}

fn enriched(collection: &FeatureCollection, api_key_present: &str) -> serde_json::Result<Value> {
    let mode = collection.data_mode();
    let mut body = serde_json::to_value(collection)?;
    if let Some(meta) = body.get_mut("metadata").and_then(Value::as_object_mut) {
        meta.insert("is_real_data".into(), Value::Bool(mode == DataMode::Live));
        meta.insert("data_mode".into(), Value::from(mode.as_str()));
        meta.insert("api_key_present".into(), Value::from(api_key_present));
    }
    Ok(body)
}
