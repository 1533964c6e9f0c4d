use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{preferences::ColorMode, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct ColorModeBody {
    pub mode: ColorMode,
}

pub fn preference_routes() -> Router<AppState> {
    Router::new().route(
        "/preferences/color-mode",
        get(get_color_mode).put(put_color_mode),
    )
}

#[instrument(skip(state))]
pub async fn get_color_mode(State(state): State<AppState>) -> Json<ColorModeBody> {
    Json(ColorModeBody {
        mode: state.preferences.color_mode().await,
    })
}

#[instrument(skip(state))]
pub async fn put_color_mode(
    State(state): State<AppState>,
    Json(body): Json<ColorModeBody>,
) -> Json<ColorModeBody> {
    let mode = state.preferences.set_color_mode(body.mode).await;
    info!(mode = mode.as_str(), "color mode updated");
    Json(ColorModeBody { mode })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::app::build_app;
    use crate::estimator::testing::ScriptedBackend;

    async fn send(state: &AppState, method: Method, body: Option<&str>) -> (StatusCode, String) {
        let req = Request::builder()
            .method(method)
            .uri("/api/v1/preferences/color-mode")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let res = build_app(state.clone()).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn color_mode_defaults_to_light_and_can_be_set() {
        let state = AppState::fake(Arc::new(ScriptedBackend::default())).await;

        let (status, body) = send(&state, Method::GET, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"mode":"light"}"#);

        let (status, body) = send(&state, Method::PUT, Some(r#"{"mode":"dark"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"mode":"dark"}"#);

        let (_, body) = send(&state, Method::GET, None).await;
        assert_eq!(body, r#"{"mode":"dark"}"#);
    }

    #[tokio::test]
    async fn unknown_mode_is_rejected() {
        let state = AppState::fake(Arc::new(ScriptedBackend::default())).await;
        let (status, _) = send(&state, Method::PUT, Some(r#"{"mode":"sepia"}"#)).await;
        assert!(status.is_client_error());
    }
}
