use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use tracing::{error, info, instrument, warn};

use crate::{
    state::AppState,
    users::{
        dto::{ErrorResponse, MessageResponse, UserPayload, UserResponse},
        error::RepoError,
        repo::parse_user_id,
        repo_types::User,
        services::{
            is_json_content_type, validate_new_user, CREATE_FAILED, INVALID_BODY,
            INVALID_CONTENT_TYPE,
        },
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn bad_request(error: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

/// Zero-valued 200 in compatible mode, the error's own status in strict mode.
fn degrade(state: &AppState, err: RepoError) -> Response {
    if state.config.strict_status {
        err.into_response()
    } else {
        Json(UserResponse::default()).into_response()
    }
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Response {
    match state.users.list_all().await {
        Ok(users) => {
            let items: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
            Json(items).into_response()
        }
        Err(e) => {
            error!(error = %e, "list users failed");
            if state.config.strict_status {
                e.into_response()
            } else {
                Json(Vec::<UserResponse>::new()).into_response()
            }
        }
    }
}

#[instrument(skip(state, headers, body))]
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_json_content_type(&headers) {
        warn!("invalid content type");
        return bad_request(INVALID_CONTENT_TYPE);
    }

    let payload: UserPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "invalid request body");
            return bad_request(INVALID_BODY);
        }
    };

    let candidate = match validate_new_user(payload) {
        Ok(c) => c,
        Err(msg) => {
            warn!("{msg}");
            return bad_request(msg);
        }
    };

    match state.users.insert(candidate).await {
        Ok(user) => {
            info!(user_id = user.id, "user created");
            Json(MessageResponse {
                message: "User created",
            })
            .into_response()
        }
        Err(RepoError::Conflict) if state.config.strict_status => {
            warn!("create user email conflict");
            (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: CREATE_FAILED,
                }),
            )
                .into_response()
        }
        Err(e @ RepoError::Database(_)) if state.config.strict_status => {
            error!(error = %e, "failed to create user");
            e.into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to create user");
            bad_request(CREATE_FAILED)
        }
    }
}

#[instrument(skip(state))]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let lookup = match parse_user_id(&id) {
        Ok(id) => state.users.get_by_id(id).await,
        Err(e) => Err(e),
    };
    match lookup {
        Ok(user) => {
            info!(user_id = user.id, "user fetched by id");
            Json(UserResponse::from(user)).into_response()
        }
        Err(e) => {
            warn!(error = %e, %id, "failed to fetch user by id");
            degrade(&state, e)
        }
    }
}

/// Compatible mode loads the row (or an empty base when it is missing), copies
/// name and email onto it and saves it; an empty base therefore becomes a new
/// row. Strict mode updates in place and reports a missing id.
#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let strict = state.config.strict_status;

    let loaded = match parse_user_id(&id) {
        Ok(user_id) => state.users.get_by_id(user_id).await,
        Err(e) => Err(e),
    };
    let mut user = match loaded {
        Ok(u) => u,
        Err(RepoError::NotFound) if !strict => User::default(),
        Err(e) => {
            warn!(error = %e, %id, "failed to load user for update");
            return degrade(&state, e);
        }
    };

    let payload: UserPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "error binding update body");
            if strict {
                return bad_request(INVALID_BODY);
            }
            return Json(UserResponse::default()).into_response();
        }
    };

    user.name = payload.name;
    user.email = payload.email;

    match state.users.save(user).await {
        Ok(saved) => {
            info!(user_id = saved.id, "user updated");
            Json(UserResponse::from(saved)).into_response()
        }
        Err(e) => {
            error!(error = %e, %id, "failed to update user");
            degrade(&state, e)
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = match parse_user_id(&id) {
        Ok(id) => state.users.soft_delete(id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => info!(%id, "user deleted"),
        Err(e) => {
            error!(error = %e, %id, "failed to delete user");
            if state.config.strict_status {
                return e.into_response();
            }
        }
    }
    Json(MessageResponse {
        message: "User deleted",
    })
    .into_response()
}
