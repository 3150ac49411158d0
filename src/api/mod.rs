//! API handlers for Libris REST endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod genres;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
    RequestPartsExt, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{user::UserClaims, PageQuery},
    AppState,
};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Authentication("Missing authorization header".to_string()))?;

        let claims = UserClaims::from_token(bearer.token(), &state.config.auth.jwt_secret)?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Current page
    pub items: Vec<T>,
    /// Total number of matches
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: &PageQuery) -> Self {
        Self {
            items,
            total,
            page: page.page(),
            per_page: page.per_page(),
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        .route("/genres", get(genres::list_genres).post(genres::create_genre))
        .route(
            "/genres/:id",
            get(genres::get_genre)
                .put(genres::update_genre)
                .delete(genres::delete_genre),
        )
        // Loans
        .route("/loans/borrow/:book_id", post(loans::borrow_book))
        .route("/loans/return/:loan_id", post(loans::return_book))
        .route("/loans/my", get(loans::my_loans))
        .route("/loans/remove/:loan_id", axum::routing::delete(loans::remove_loan))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::AppConfig,
        models::Role,
        repository::{memory::MemoryLoanStore, Repository},
        services::Services,
    };

    const BOOK: i64 = 1;

    /// Router over the in-memory loan store; catalog routes would hit a lazy pool
    fn app(store: &MemoryLoanStore) -> (Router, AppConfig) {
        let config = AppConfig::default();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();
        let services =
            Services::new(Repository::new(pool), &config).with_loan_store(Arc::new(store.clone()));
        let state = AppState {
            config: Arc::new(config.clone()),
            services: Arc::new(services),
        };
        (create_router(state), config)
    }

    fn token(config: &AppConfig, user_id: i64, role: Role) -> String {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: format!("user{}", user_id),
            user_id,
            role,
            exp: now + 3600,
            iat: now,
        }
        .create_token(&config.auth.jwt_secret)
        .unwrap()
    }

    async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(&MemoryLoanStore::default());
        let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_loans_require_token() {
        let (app, config) = app(&MemoryLoanStore::with_books(&[(BOOK, 1)]));

        let (status, body) = send(&app, "GET", "/api/v1/loans/my", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Missing authorization header");

        let (status, body) = send(&app, "POST", "/api/v1/loans/borrow/1", Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");

        let mut other = config.clone();
        other.auth.jwt_secret = "another-secret".to_string();
        let forged = token(&other, 1, Role::Admin);
        let (status, _) = send(&app, "POST", "/api/v1/loans/borrow/1", Some(&forged)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_borrow_and_return_over_http() {
        let store = MemoryLoanStore::with_books(&[(BOOK, 1)]);
        let (app, config) = app(&store);
        let reader = token(&config, 7, Role::Reader);

        let (status, body) = send(&app, "GET", "/api/v1/loans/my", Some(&reader)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "You have no borrowed books.");

        let (status, loan) = send(&app, "POST", "/api/v1/loans/borrow/1", Some(&reader)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(loan["user_id"], 7);
        assert_eq!(loan["book_id"], BOOK);
        assert!(loan["actual_return_date"].is_null());
        let loan_id = loan["loan_id"].as_i64().unwrap();

        let (status, body) = send(&app, "POST", "/api/v1/loans/borrow/1", Some(&reader)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No available copies of the book.");

        let (status, body) = send(&app, "POST", "/api/v1/loans/borrow/99", Some(&reader)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Book not found.");

        let uri = format!("/api/v1/loans/return/{}", loan_id);
        let (status, body) = send(&app, "POST", &uri, Some(&reader)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["actual_return_date"].is_null());
        assert_eq!(store.copies(BOOK).await, Some(1));

        let (status, body) = send(&app, "POST", &uri, Some(&reader)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "You already returned this book");

        let (status, body) = send(&app, "GET", "/api/v1/loans/my", Some(&reader)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_return_foreign_loan_is_not_found() {
        let store = MemoryLoanStore::with_books(&[(BOOK, 2)]);
        let (app, config) = app(&store);
        let owner = token(&config, 1, Role::Reader);
        let intruder = token(&config, 2, Role::Reader);

        let (_, loan) = send(&app, "POST", "/api/v1/loans/borrow/1", Some(&owner)).await;
        let uri = format!("/api/v1/loans/return/{}", loan["loan_id"]);

        let (foreign_status, foreign) = send(&app, "POST", &uri, Some(&intruder)).await;
        let (missing_status, missing) =
            send(&app, "POST", "/api/v1/loans/return/999", Some(&intruder)).await;

        assert_eq!(foreign_status, StatusCode::NOT_FOUND);
        assert_eq!(foreign_status, missing_status);
        assert_eq!(foreign["message"], missing["message"]);
        assert_eq!(store.copies(BOOK).await, Some(1));
    }

    #[tokio::test]
    async fn test_loan_limit_over_http() {
        let store = MemoryLoanStore::with_books(&[(BOOK, 10)]);
        let (app, config) = app(&store);
        let reader = token(&config, 3, Role::Reader);

        for _ in 0..5 {
            let (status, _) = send(&app, "POST", "/api/v1/loans/borrow/1", Some(&reader)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(&app, "POST", "/api/v1/loans/borrow/1", Some(&reader)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "You can't borrow more than 5 books at the same time."
        );
        assert_eq!(store.copies(BOOK).await, Some(5));
    }

    #[tokio::test]
    async fn test_remove_loan_is_admin_only() {
        let store = MemoryLoanStore::with_books(&[(BOOK, 1)]);
        let (app, config) = app(&store);
        let reader = token(&config, 4, Role::Reader);
        let admin = token(&config, 5, Role::Admin);

        let (_, loan) = send(&app, "POST", "/api/v1/loans/borrow/1", Some(&reader)).await;
        let uri = format!("/api/v1/loans/remove/{}", loan["loan_id"]);

        let (status, body) = send(&app, "DELETE", &uri, Some(&reader)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access denied. Required roles: admin");

        let (status, body) = send(&app, "DELETE", &uri, Some(&admin)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loan_id"], loan["loan_id"]);
        assert_eq!(store.copies(BOOK).await, Some(1));
        assert_eq!(store.loan_count().await, 0);

        let (status, body) = send(&app, "DELETE", &uri, Some(&admin)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Loan not found.");
    }

    #[tokio::test]
    async fn test_orphaned_loan_return_is_bad_request() {
        let store = MemoryLoanStore::with_books(&[]);
        let loan = store
            .seed_loan(6, 42, Utc::now().date_naive())
            .await;
        let (app, config) = app(&store);
        let reader = token(&config, 6, Role::Reader);

        let uri = format!("/api/v1/loans/return/{}", loan.id);
        let (status, body) = send(&app, "POST", &uri, Some(&reader)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Book not found.");
        assert!(store.loan(loan.id).await.unwrap().is_open());
    }

    #[tokio::test]
    async fn test_genres_listing_is_admin_only() {
        let (app, config) = app(&MemoryLoanStore::default());
        let reader = token(&config, 8, Role::Reader);

        // Rejected before any database access
        let (status, _) = send(&app, "GET", "/api/v1/genres", Some(&reader)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
