use axum::{
    middleware,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use super::contacts;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create a minimal router without state (liveness only)
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .layer(TraceLayer::new_for_http())
}

/// Contact API routes, relative to `/api`
fn create_contacts_router() -> Router<AppState> {
    Router::new()
        .route(
            "/contacts",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route(
            "/contacts/{contact_id}",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
}

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Contacts API
        .nest("/api", create_contacts_router())
        .route_layer(middleware::from_fn(metrics_middleware))
        .route_layer(middleware::from_fn(logging_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Full router plus the Prometheus scrape endpoint at `path`
pub fn create_router_with_metrics(
    state: AppState,
    metrics: PrometheusMetrics,
    path: &str,
) -> Router {
    create_router_with_state(state).merge(create_metrics_router(metrics, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, Response, StatusCode};
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    use crate::domain::cache::MockCache;
    use crate::domain::contact::MockContactRepository;
    use crate::domain::{
        Cache, ConditionalCache, Contact, ContactId, ContactRepository, DomainError, ManualClock,
        VersionToken,
    };
    use crate::infrastructure::cache::{InMemoryCache, InMemoryCacheConfig};
    use crate::infrastructure::services::ContactService;
    use crate::infrastructure::storage::InMemoryContactRepository;

    fn stored_contact() -> Contact {
        Contact::new(ContactId::new("c1").unwrap(), "Ada", "Lovelace")
            .unwrap()
            .with_row_version(VersionToken::new(vec![0x01, 0x02]))
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ))
    }

    fn app_with(
        repository: Arc<dyn ContactRepository>,
        cache: Arc<dyn Cache>,
        clock: Arc<ManualClock>,
        user_keys: Vec<String>,
    ) -> Router {
        let service = ContactService::new(repository, ConditionalCache::new(cache.clone(), clock));
        create_router_with_state(AppState::new(Arc::new(service), cache, user_keys))
    }

    fn in_memory_app(repository: Arc<dyn ContactRepository>) -> (Router, Arc<InMemoryCache>) {
        let clock = clock();
        let cache = Arc::new(InMemoryCache::with_clock(
            InMemoryCacheConfig::default(),
            clock.clone(),
        ));
        (app_with(repository, cache.clone(), clock, vec![]), cache)
    }

    fn get(uri: &str, if_none_match: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(token) = if_none_match {
            builder = builder.header(header::IF_NONE_MATCH, token);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn etag(response: &Response<Body>) -> Option<String> {
        response
            .headers()
            .get(header::ETAG)
            .map(|v| v.to_str().unwrap().to_string())
    }

    async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = create_router();

        let response = app.clone().oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/live", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_conditional_get_sequence() {
        let mut repo = MockContactRepository::new();
        repo.expect_get()
            .times(2)
            .returning(|_| Ok(Some(stored_contact())));
        let (app, cache) = in_memory_app(Arc::new(repo));

        // No If-None-Match
        let response = app.clone().oneshot(get("/api/contacts/c1", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(etag(&response).as_deref(), Some("AQI="));
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["id"], "c1");
        assert_eq!(body["firstName"], "Ada");
        assert!(cache.exists("contact-c1-AQI=").await.unwrap());

        // Current token: 304 from the snapshot, store untouched
        let response = app
            .clone()
            .oneshot(get("/api/contacts/c1", Some("AQI=")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(etag(&response).as_deref(), Some("AQI="));
        assert!(body_bytes(response).await.is_empty());

        // Stale token: 200 with the current version
        let response = app
            .oneshot(get("/api/contacts/c1", Some("STALE=")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(etag(&response).as_deref(), Some("AQI="));
        assert!(!body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_conditional_get_not_found_has_empty_body() {
        let mut repo = MockContactRepository::new();
        repo.expect_get().returning(|_| Ok(None));
        let (app, cache) = in_memory_app(Arc::new(repo));

        let response = app
            .oneshot(get("/api/contacts/ghost", Some("AQI=")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(etag(&response).is_none());
        assert!(body_bytes(response).await.is_empty());
        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_conditional_get_invalid_id() {
        let (app, _) = in_memory_app(Arc::new(InMemoryContactRepository::new()));

        let response = app
            .oneshot(get("/api/contacts/bad%20id", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_conditional_get_survives_broken_cache() {
        let mut repo = MockContactRepository::new();
        repo.expect_get()
            .times(1)
            .returning(|_| Ok(Some(stored_contact())));
        let cache = Arc::new(
            MockCache::new()
                .with_read_error("connection refused")
                .with_write_error("connection refused"),
        );
        let app = app_with(Arc::new(repo), cache, clock(), vec![]);

        let response = app
            .oneshot(get("/api/contacts/c1", Some("AQI=")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(etag(&response).as_deref(), Some("AQI="));
    }

    #[tokio::test]
    async fn test_conditional_get_store_failure() {
        let mut repo = MockContactRepository::new();
        repo.expect_get()
            .returning(|_| Err(DomainError::storage("connection reset")));
        let (app, _) = in_memory_app(Arc::new(repo));

        let response = app.oneshot(get("/api/contacts/c1", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_crud_round_trip() {
        let (app, _) = in_memory_app(Arc::new(InMemoryContactRepository::new()));

        let create = Request::post("/api/contacts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"id":"c1","firstName":"Grace","lastName":"Hopper","dateOfBirth":"1906-12-09"}"#,
            ))
            .unwrap();
        let response = app.clone().oneshot(create).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/contacts/c1"
        );
        let created_etag = etag(&response).unwrap();

        let response = app
            .clone()
            .oneshot(get("/api/contacts/c1", Some(&created_etag)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        let update = Request::put("/api/contacts/c1")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::IF_MATCH, created_etag.as_str())
            .body(Body::from(r#"{"jobTitle":"Rear Admiral"}"#))
            .unwrap();
        let response = app.clone().oneshot(update).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated_etag = etag(&response).unwrap();
        assert_ne!(updated_etag, created_etag);

        // Old token no longer matches
        let response = app
            .clone()
            .oneshot(get("/api/contacts/c1", Some(&created_etag)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(etag(&response), Some(updated_etag.clone()));

        // Stale If-Match is rejected
        let stale_update = Request::put("/api/contacts/c1")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::IF_MATCH, created_etag.as_str())
            .body(Body::from(r#"{"company":"Navy"}"#))
            .unwrap();
        let response = app.clone().oneshot(stale_update).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app.clone().oneshot(get("/api/contacts", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["total"], 1);

        let delete = Request::delete("/api/contacts/c1").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let delete = Request::delete("/api/contacts/c1").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(get("/api/contacts/c1", Some(&updated_etag)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_json() {
        let (app, _) = in_memory_app(Arc::new(InMemoryContactRepository::new()));

        let create = Request::post("/api/contacts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"id":"c1"}"#))
            .unwrap();
        let response = app.oneshot(create).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_user_key_enforced_when_configured() {
        let repository = Arc::new(
            InMemoryContactRepository::with_contacts(vec![stored_contact()]).unwrap(),
        );
        let app = app_with(
            repository,
            Arc::new(MockCache::new()),
            clock(),
            vec!["key-1".to_string()],
        );

        let response = app.clone().oneshot(get("/api/contacts/c1", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::get("/api/contacts/c1")
            .header("x-user-key", "wrong")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::get("/api/contacts/c1")
            .header(header::AUTHORIZATION, "Bearer key-1")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Probes stay open
        let response = app.oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_check() {
        let (app, _) = in_memory_app(Arc::new(InMemoryContactRepository::new()));

        let response = app.oneshot(get("/ready", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_check_degraded_cache() {
        let cache = Arc::new(MockCache::new().with_read_error("down"));
        let app = app_with(Arc::new(InMemoryContactRepository::new()), cache, clock(), vec![]);

        let response = app.oneshot(get("/ready", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["status"], "degraded");
    }
}
