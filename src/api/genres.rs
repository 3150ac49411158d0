//! Genre endpoints, all reserved to administrators

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        genre::{Genre, GenreInput},
        Role,
    },
    AppState,
};

use super::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All genres", body = Vec<Genre>),
        (status = 401, description = "Not an administrator"),
        (status = 404, description = "No genres", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_genres(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Genre>>> {
    claims.require_role(Role::ADMINS)?;

    Ok(Json(state.services.catalog.list_genres().await?))
}

#[utoipa::path(
    get,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Genre ID")
    ),
    responses(
        (status = 200, description = "Genre", body = Genre),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Genre>> {
    claims.require_role(Role::ADMINS)?;

    Ok(Json(state.services.catalog.get_genre(id).await?))
}

#[utoipa::path(
    post,
    path = "/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = GenreInput,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 409, description = "Genre already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(genre): Json<GenreInput>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    claims.require_role(Role::ADMINS)?;

    let created = state.services.catalog.create_genre(genre).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Genre ID")
    ),
    request_body = GenreInput,
    responses(
        (status = 200, description = "Genre renamed", body = Genre),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Name already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(genre): Json<GenreInput>,
) -> AppResult<Json<Genre>> {
    claims.require_role(Role::ADMINS)?;

    Ok(Json(state.services.catalog.update_genre(id, genre).await?))
}

#[utoipa::path(
    delete,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Genre ID")
    ),
    responses(
        (status = 200, description = "Deleted genre", body = Genre),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Genre>> {
    claims.require_role(Role::ADMINS)?;

    Ok(Json(state.services.catalog.delete_genre(id).await?))
}
