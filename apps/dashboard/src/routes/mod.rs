//! # HTTP Routes
//!
//! ```text
//! GET  /health                    health::health
//! GET  /dashboard/sales           sales::list_sales      ?query=&page=
//! GET  /dashboard/sales/create    sales::create_form     catalog for the form
//! POST /dashboard/sales/create    sales::create_sale     → SaleRecorder
//! GET  /dashboard/sales/{id}      sales::show_sale
//! ```

pub mod health;
pub mod sales;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::get;
use axum::Router;

use crate::error::ApiError;
use crate::recorder::NO_IDENTITY_MESSAGE;
use crate::session::Identity;
use crate::state::AppState;

/// Where a successful create-sale submission redirects to.
pub const SALES_PATH: &str = "/dashboard/sales";

/// Builds the dashboard router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(SALES_PATH, get(sales::list_sales))
        .route(
            "/dashboard/sales/create",
            get(sales::create_form).post(sales::create_sale),
        )
        .route("/dashboard/sales/{id}", get(sales::show_sale))
        .with_state(state)
}

/// Read routes require a session; a missing one is a 401.
impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state
            .sessions
            .identify(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized(format!("Authentication error: {NO_IDENTITY_MESSAGE}")))
    }
}

// =============================================================================
// HTTP Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use tally_core::{ItemType, Money};
    use tally_db::{Database, DbConfig};
    use tower::ServiceExt;

    use crate::config::DashboardConfig;
    use crate::session::JwtSessionProvider;

    const SECRET: &str = "test-secret";

    struct TestApp {
        state: AppState,
        token: String,
    }

    async fn test_app() -> TestApp {
        test_app_with(DashboardConfig::default()).await
    }

    async fn test_app_with(config: DashboardConfig) -> TestApp {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user_id = db.users().insert("Ada Admin", "ada@example.com").await.unwrap();
        db.items()
            .insert("Widget", Money::new(dec!(10)), ItemType::ForSale)
            .await
            .unwrap();
        db.items()
            .insert("Flour", Money::new(dec!(4)), ItemType::ForPurchase)
            .await
            .unwrap();

        let sessions = JwtSessionProvider::new(SECRET, 3600);
        let token = sessions.issue_token(user_id, "ada@example.com").unwrap();

        TestApp {
            state: AppState::new(db, Arc::new(sessions), config),
            token,
        }
    }

    /// Minimal application/x-www-form-urlencoded encoder.
    fn urlencode(pairs: &[(&str, &str)]) -> String {
        fn encode(s: &str) -> String {
            s.bytes()
                .map(|b| match b {
                    b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                        (b as char).to_string()
                    }
                    b' ' => "+".to_string(),
                    _ => format!("%{b:02X}"),
                })
                .collect()
        }
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn example_form() -> String {
        urlencode(&[
            ("salesDate", "2024-01-01"),
            ("amount", "20"),
            ("discount", "5"),
            ("total", "15"),
            ("type", "Customer"),
            ("items", r#"[{"itemId":"1","quantity":2,"price":10,"total":20}]"#),
        ])
    }

    fn post_form(body: String, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/dashboard/sales/create")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("tally_session={token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let response = router(app.state).oneshot(get("/health", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_create_sale_redirects_and_persists() {
        let app = test_app().await;
        let response = router(app.state.clone())
            .oneshot(post_form(example_form(), Some(&app.token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], SALES_PATH);

        let listing = router(app.state.clone())
            .oneshot(get(SALES_PATH, Some(&app.token)))
            .await
            .unwrap();
        assert_eq!(listing.status(), StatusCode::OK);
        let body = json(listing).await;
        assert_eq!(body["totalPages"], 1);
        assert_eq!(body["sales"][0]["total"], "15");
        assert_eq!(body["sales"][0]["status"], "Completed");
        assert_eq!(body["sales"][0]["lineCount"], 1);
    }

    #[tokio::test]
    async fn test_create_sale_without_session_is_rejected() {
        let app = test_app().await;
        let response = router(app.state.clone())
            .oneshot(post_form(example_form(), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json(response).await;
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(app.state.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_anonymous_create_is_unauthorized_whatever_the_body() {
        let app = test_app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/dashboard/sales/create")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = router(app.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(response).await["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_create_with_wrong_content_type_is_rejected() {
        let app = test_app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/dashboard/sales/create")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
            .body(Body::from("{}"))
            .unwrap();

        let response = router(app.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(app.state.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_sale_validation_errors() {
        let app = test_app().await;
        let body = urlencode(&[
            ("salesDate", ""),
            ("amount", "20"),
            ("total", "15"),
            ("type", "Vendor"),
            ("items", r#"[{"itemId":"1","quantity":1,"price":0}]"#),
        ]);

        let response = router(app.state.clone())
            .oneshot(post_form(body, Some(&app.token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json(response).await;
        assert_eq!(body["message"], "Missing Fields. Failed to Create Sale.");
        assert_eq!(body["errors"]["salesDate"][0], "Please enter a sales date.");
        assert_eq!(
            body["errors"]["type"][0],
            "Please select a sales type (Customer or Partner)."
        );
        assert_eq!(
            body["errors"]["items"][0],
            "Item 1: Please enter a price greater than 0."
        );
        assert_eq!(app.state.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listing_cache_is_invalidated_by_create() {
        let app = test_app().await;

        let before = router(app.state.clone())
            .oneshot(get(SALES_PATH, Some(&app.token)))
            .await
            .unwrap();
        assert_eq!(json(before).await["sales"].as_array().unwrap().len(), 0);
        assert_eq!(app.state.listing_cache.len().await, 1);

        router(app.state.clone())
            .oneshot(post_form(example_form(), Some(&app.token)))
            .await
            .unwrap();
        assert!(app.state.listing_cache.is_empty().await);

        let after = router(app.state.clone())
            .oneshot(get(SALES_PATH, Some(&app.token)))
            .await
            .unwrap();
        assert_eq!(json(after).await["sales"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_cache_is_bounded() {
        let app = test_app_with(DashboardConfig {
            listing_cache_capacity: 3,
            ..DashboardConfig::default()
        })
        .await;

        for n in 1..=10 {
            let response = router(app.state.clone())
                .oneshot(get(
                    &format!("{SALES_PATH}?query=q{n}&page={n}"),
                    Some(&app.token),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(app.state.listing_cache.len().await, 3);
    }

    #[tokio::test]
    async fn test_show_sale_and_missing_sale() {
        let app = test_app().await;
        router(app.state.clone())
            .oneshot(post_form(example_form(), Some(&app.token)))
            .await
            .unwrap();

        let found = router(app.state.clone())
            .oneshot(get("/dashboard/sales/1", Some(&app.token)))
            .await
            .unwrap();
        assert_eq!(found.status(), StatusCode::OK);
        let body = json(found).await;
        assert_eq!(body["type"], "Customer");
        assert_eq!(body["amount"], "20");
        assert_eq!(body["items"][0]["productId"], 1);
        assert_eq!(body["items"][0]["quantity"], "2");

        let missing = router(app.state.clone())
            .oneshot(get("/dashboard/sales/99", Some(&app.token)))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_form_lists_items_for_sale() {
        let app = test_app().await;
        let response = router(app.state.clone())
            .oneshot(get("/dashboard/sales/create", Some(&app.token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Widget");
    }

    #[tokio::test]
    async fn test_read_routes_require_session() {
        let app = test_app().await;
        let response = router(app.state)
            .oneshot(get(SALES_PATH, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
