use std::time::Duration;

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::StoreError,
        repo_types::NewUser,
        username::validate_username,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

// Every registration failure past validation collapses to one message so the
// response does not reveal whether a username or email is already taken.
fn creation_failed() -> ApiError {
    ApiError::BadRequest("User creation failed.".into())
}

fn login_failed() -> ApiError {
    ApiError::BadRequest("Login failed.".into())
}

fn store_timeout(state: &AppState) -> Duration {
    Duration::from_secs(state.config.store_timeout_secs)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_username(&payload.username, &state.profanity).map_err(|e| {
        warn!(username = %payload.username, reason = %e, "username rejected");
        ApiError::from(e)
    })?;

    if payload.password.chars().count() < 8 {
        warn!(username = %payload.username, "password too short");
        return Err(ApiError::BadRequest("Password is too short.".into()));
    }

    let plain = payload.password.clone();
    let hash = match tokio::task::spawn_blocking(move || hash_password(&plain)).await {
        Ok(Ok(h)) => h,
        Ok(Err(e)) => {
            error!(error = %e, "hash_password failed");
            return Err(creation_failed());
        }
        Err(e) => {
            error!(error = %e, "hash task failed");
            return Err(creation_failed());
        }
    };

    let new_user = NewUser {
        username: payload.username.clone(),
        password_hash: hash,
        email: payload.email.clone(),
    };
    let created = tokio::time::timeout(store_timeout(&state), state.store.create_user(new_user));
    let user = match created.await {
        Ok(Ok(u)) => u,
        Ok(Err(StoreError::Duplicate(field))) => {
            warn!(username = %payload.username, field, "duplicate key on registration");
            return Err(creation_failed());
        }
        Ok(Err(e)) => {
            error!(error = %e, "create_user failed");
            return Err(creation_failed());
        }
        Err(_) => {
            error!("create_user timed out");
            return Err(creation_failed());
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.username).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        creation_failed()
    })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created.".into(),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let lookup = tokio::time::timeout(
        store_timeout(&state),
        state.store.find_by_username(&payload.username),
    );
    let user = match lookup.await {
        Ok(Ok(Some(u))) => u,
        Ok(Ok(None)) => {
            warn!(username = %payload.username, "login for unknown user");
            return Err(ApiError::NotFound("User does not exist.".into()));
        }
        Ok(Err(e)) => {
            error!(error = %e, "find_by_username failed");
            return Err(login_failed());
        }
        Err(_) => {
            error!("find_by_username timed out");
            return Err(login_failed());
        }
    };

    let plain = payload.password.clone();
    let hash = user.password_hash.clone();
    let ok = match tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await {
        Ok(Ok(v)) => v,
        Ok(Err(e)) => {
            error!(error = %e, user_id = %user.id, "verify_password failed");
            return Err(login_failed());
        }
        Err(e) => {
            error!(error = %e, "verify task failed");
            return Err(login_failed());
        }
    };

    if !ok {
        warn!(username = %payload.username, user_id = %user.id, "incorrect password");
        return Err(ApiError::BadRequest("Incorrect password.".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.username).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        login_failed()
    })?;

    info!(user_id = %user.id, username = %user.username, "user authenticated");
    Ok(Json(AuthResponse {
        message: "User authenticated.".into(),
        token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_body(username: &str, password: &str) -> Json<RegisterRequest> {
        Json(RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: None,
        })
    }

    fn login_body(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn bad_request_message(err: ApiError) -> String {
        match err {
            ApiError::BadRequest(msg) => msg,
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_rejects_short_username() {
        let state = AppState::fake();
        let err = register(State(state), register_body("ab", "whatever1"))
            .await
            .unwrap_err();
        assert_eq!(bad_request_message(err), "Username is too short.");
    }

    #[tokio::test]
    async fn register_rejects_invalid_symbols_first() {
        let state = AppState::fake();
        let err = register(State(state), register_body("a_b", "whatever1"))
            .await
            .unwrap_err();
        assert_eq!(bad_request_message(err), "Invalid symbols in username");
    }

    #[tokio::test]
    async fn register_rejects_profane_username() {
        let state = AppState::fake();
        let err = register(State(state), register_body("bastard", "whatever1"))
            .await
            .unwrap_err();
        assert_eq!(bad_request_message(err), "Username cannot have profanity.");
    }

    #[tokio::test]
    async fn register_rejects_short_password_before_hashing() {
        let state = AppState::fake();
        let err = register(State(state), register_body("validuser", "short"))
            .await
            .unwrap_err();
        assert_eq!(bad_request_message(err), "Password is too short.");
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let state = AppState::fake();

        let (status, Json(created)) =
            register(State(state.clone()), register_body("validuser", "pw123456"))
                .await
                .expect("register should succeed");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.message, "User created.");

        let keys = JwtKeys::from_ref(&state);
        let claims = keys.verify(&created.token).expect("token verifies");
        assert_eq!(claims.username, "validuser");

        let Json(logged_in) = login(State(state.clone()), login_body("validuser", "pw123456"))
            .await
            .expect("login should succeed");
        assert_eq!(logged_in.message, "User authenticated.");
        let claims = keys.verify(&logged_in.token).expect("token verifies");
        assert_eq!(claims.username, "validuser");
    }

    #[tokio::test]
    async fn duplicate_registration_collapses_to_generic_error() {
        let state = AppState::fake();
        register(State(state.clone()), register_body("validuser", "pw123456"))
            .await
            .expect("first registration succeeds");
        let err = register(State(state), register_body("VALIDUSER", "pw123456"))
            .await
            .unwrap_err();
        assert_eq!(bad_request_message(err), "User creation failed.");
    }

    #[tokio::test]
    async fn login_unknown_user_is_not_found() {
        let state = AppState::fake();
        let err = login(State(state), login_body("nosuchuser", "x"))
            .await
            .unwrap_err();
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "User does not exist."),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_wrong_password_is_bad_request() {
        let state = AppState::fake();
        register(State(state.clone()), register_body("validuser", "pw123456"))
            .await
            .expect("registration succeeds");
        let err = login(State(state), login_body("validuser", "wrongpass"))
            .await
            .unwrap_err();
        assert_eq!(bad_request_message(err), "Incorrect password.");
    }

    #[tokio::test]
    async fn login_matches_username_case_insensitively() {
        let state = AppState::fake();
        register(State(state.clone()), register_body("validuser", "pw123456"))
            .await
            .expect("registration succeeds");
        let Json(resp) = login(State(state), login_body("ValidUser", "pw123456"))
            .await
            .expect("login should succeed");
        assert_eq!(resp.message, "User authenticated.");
    }
}
