//! HTTP routes
//!
//! The auxiliary endpoints bypass the command queue and act on the LED
//! state directly under its lock. None of them push a frame except
//! `/api/show`.

use super::websocket;
use crate::command::IngressDispatcher;
use crate::session::ConnectionRegistry;
use crate::strip::SharedStrip;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use pixel_commander_shared::{ErrorReply, Reply, RGB8};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// State shared by every route
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<IngressDispatcher>,
    pub registry: Arc<ConnectionRegistry>,
    pub strip: SharedStrip,
}

type FormParams = Option<Form<HashMap<String, String>>>;
type ApiResponse = (StatusCode, Json<Reply>);

/// Build the full route table
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websocket::upgrade))
        .route("/ping", get(ping).post(ping))
        .route("/api/pixelCount", get(pixel_count))
        .route("/api/setColor", post(set_color))
        .route("/api/clear", get(clear).post(clear))
        .route("/api/setBrightness", post(set_brightness))
        .route("/api/show", post(show))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn respond(reply: Reply) -> ApiResponse {
    let status = match reply {
        Reply::Error(ErrorReply::ShowFailed) => StatusCode::INTERNAL_SERVER_ERROR,
        reply if reply.is_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    (status, Json(reply))
}

/// Non-numeric text reads as 0; out-of-range values saturate
fn channel(params: &HashMap<String, String>, name: &str) -> Option<u8> {
    let raw = params.get(name)?;
    let value = raw.trim().parse::<i64>().unwrap_or(0);
    Some(value.clamp(0, u8::MAX as i64) as u8)
}

async fn ping() -> ApiResponse {
    respond(Reply::Pong)
}

async fn pixel_count(State(state): State<AppState>) -> ApiResponse {
    respond(Reply::PixelCount(state.dispatcher.pixel_count()))
}

async fn set_color(State(state): State<AppState>, params: FormParams) -> ApiResponse {
    let params = params.map(|Form(p)| p).unwrap_or_default();
    let color = match (
        channel(&params, "r"),
        channel(&params, "g"),
        channel(&params, "b"),
    ) {
        (Some(r), Some(g), Some(b)) => RGB8::new(r, g, b),
        _ => return respond(ErrorReply::MissingParams.into()),
    };

    debug!("HTTP setColor {:?}", color);
    state.strip.lock().fill(color);
    respond(Reply::Done)
}

async fn clear(State(state): State<AppState>) -> ApiResponse {
    debug!("HTTP clear");
    state.strip.lock().clear();
    respond(Reply::Done)
}

async fn set_brightness(State(state): State<AppState>, params: FormParams) -> ApiResponse {
    let params = params.map(|Form(p)| p).unwrap_or_default();
    let Some(level) = channel(&params, "brightness") else {
        return respond(ErrorReply::MissingParam.into());
    };

    debug!("HTTP setBrightness {}", level);
    state.strip.lock().set_brightness(level);
    respond(Reply::Done)
}

async fn show(State(state): State<AppState>) -> ApiResponse {
    let result = state.strip.lock().show();
    match result {
        Ok(()) => respond(Reply::Done),
        Err(e) => {
            error!("HTTP show failed: {}", e);
            respond(ErrorReply::ShowFailed.into())
        }
    }
}
