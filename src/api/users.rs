//! User registration and login endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::user::{LoginRequest, RegisterUser, User},
};

/// Register a student or (with the shared key) an administrator
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "users",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid matricula or missing fields"),
        (status = 403, description = "Invalid administrator key"),
        (status = 409, description = "Matricula or admin name already in use")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in by identifier (matricula for students, name for admins).
/// Pure identity lookup; no password check.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "No user matches this identifier")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<User>> {
    let user = state.services.users.login(&request.identifier).await?;
    Ok(Json(user))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_user(id).await?;
    Ok(Json(user))
}
