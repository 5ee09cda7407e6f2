use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::auth::{AuthSession as AuthSessionSchema, Login, RegisteredUser, Registration};
use crate::domain::auth_session::AuthSession;
use crate::domain::user::NewUser;
use crate::error::{AppError, Result};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

pub async fn register(State(state): State<AppState>, Json(payload): Json<Registration>) -> Result<impl IntoResponse> {
    let new_user = NewUser::validate(&payload.username, &payload.email, &payload.password, &payload.confirm_password)
        .map_err(AppError::BadRequest)?;

    let user = state.account_service.register(new_user).await?;

    let body = RegisteredUser { id: user.id, username: user.username, email: user.email };
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn login(State(state): State<AppState>, Json(payload): Json<Login>) -> Result<impl IntoResponse> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }

    let session = state.account_service.login(&payload.email, &payload.password).await?;
    Ok(Json(map_session(session)))
}

pub async fn logout(auth_user: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    state.account_service.logout(auth_user.user_id);
    StatusCode::NO_CONTENT
}

fn map_session(session: AuthSession) -> AuthSessionSchema {
    AuthSessionSchema { token: session.token, expires_at: session.expires_at }
}
