//! HTTP API route definitions.

use axum::handler::Handler;
use axum::{middleware, routing::get, routing::post, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_person, get_person, home, list_people, metrics_scrape, unmatched, upsert_person,
    AppState,
};
use crate::metrics::track_http;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/metrics", get(metrics_scrape))
        // Person endpoints
        .route("/pessoas", get(list_people))
        .route("/pessoa", post(upsert_person))
        .route("/pessoa/:cpf", get(get_person).delete(delete_person))
        .route_layer(middleware::from_fn(track_http))
        // route_layer skips unrouted requests, so the fallback is tracked itself
        .fallback(unmatched.layer(middleware::from_fn(track_http)))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    use crate::person::PersonRepository;

    fn app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let repo = PersonRepository::new(dir.path().join("crud.db"));
        repo.ensure_schema().unwrap();
        let handle = crate::metrics::install().unwrap();
        (dir, create_router(AppState::new(repo, handle)))
    }

    #[tokio::test]
    async fn root_returns_text() {
        let (_dir, app) = app();

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"API de pessoas");
    }

    #[tokio::test]
    async fn unknown_method_on_person_path_is_rejected() {
        let (_dir, app) = app();

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::PUT)
                    .uri("/pessoa/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_path_is_json_404() {
        let (_dir, app) = app();

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"error":"Not Found"}"#);
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let (_dir, app) = app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
