//! API-key check for mutating routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use darkroom_shared::AppError;

use crate::AppState;
use crate::error::ApiError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests whose `X-API-Key` header does not match the configured
/// key.
///
/// When no key is configured the check is disabled; that is the development
/// mode. Applied with `middleware::from_fn_with_state` to the mutating
/// route set only, so derivative serving stays public.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state
        .config
        .auth
        .api_key
        .as_deref()
        .filter(|key| !key.is_empty())
    else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(key) if key == expected => next.run(request).await,
        Some(_) => {
            ApiError(AppError::Unauthorized("invalid API key".into())).into_response()
        }
        None => ApiError(AppError::Unauthorized(
            "missing X-API-Key header".into(),
        ))
        .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::test_support::{test_config, test_state_from};
    use crate::{AppState, create_router};

    fn secured_state(dir: &tempfile::TempDir) -> AppState {
        let mut config = test_config(dir.path());
        config.auth.api_key = Some("secret".into());
        test_state_from(config)
    }

    fn sections_request(key: Option<&str>) -> Request<Body> {
        let builder = Request::builder().uri("/api/v1/sections");
        let builder = match key {
            Some(key) => builder.header("X-API-Key", key),
            None => builder,
        };
        builder.body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = create_router(secured_state(&dir));

        let response = router.oneshot(sections_request(None)).await.expect("send");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_key_is_unauthorized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = create_router(secured_state(&dir));

        let response = router
            .oneshot(sections_request(Some("nope")))
            .await
            .expect("send");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_matching_key_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = create_router(secured_state(&dir));

        let response = router
            .oneshot(sections_request(Some("secret")))
            .await
            .expect("send");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unconfigured_key_disables_check() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let router = create_router(test_state_from(config));

        let response = router.oneshot(sections_request(None)).await.expect("send");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_public_routes_skip_the_check() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = create_router(secured_state(&dir));

        let request = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .expect("request");
        let response = router.oneshot(request).await.expect("send");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
