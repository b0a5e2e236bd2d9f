use axum::{extract::State, http::StatusCode, Json};
use metrics::counter;
use tracing::{error, info, warn};

use clipshare_core::{AccountResponse, Credentials, RegistrationPolicy};
use clipshare_storage::{NewUser, UserError};

use crate::reply::StatusReply;
use crate::router::AppState;

const DUPLICATE_USERNAME_STATUS: &str =
    "unsuccessful registration: user with username already exists";

/// Handles `POST /register`: creates an account and returns the assigned id.
///
/// A duplicate username is answered before the length limits are checked,
/// so a taken name with an overlong password still reports the duplicate.
pub async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AccountResponse>, StatusReply> {
    let users = state.storage().users();

    match users.find_by_username(&credentials.username).await {
        Ok(Some(_)) => {
            counter!("account_requests_total", "endpoint" => "register", "result" => "duplicate")
                .increment(1);
            warn!(stage = "account", username = %credentials.username, "registration rejected: username taken");
            return Err(StatusReply::new(
                StatusCode::BAD_REQUEST,
                DUPLICATE_USERNAME_STATUS,
            ));
        }
        Ok(None) => {}
        Err(err) => return Err(storage_failure("register", err)),
    }

    if let Err(policy_err) = RegistrationPolicy::validate(&credentials) {
        counter!("account_requests_total", "endpoint" => "register", "result" => "rejected")
            .increment(1);
        warn!(stage = "account", username = %credentials.username, reason = %policy_err, "registration rejected");
        return Err(StatusReply::new(
            StatusCode::BAD_REQUEST,
            format!("unsuccessful registration: {policy_err}"),
        ));
    }

    let id = users
        .insert(NewUser {
            username: &credentials.username,
            password: &credentials.password,
            created_at: state.now(),
        })
        .await
        .map_err(|err| match err {
            // The lookup above can lose a race with a concurrent registration.
            UserError::UsernameTaken => {
                counter!("account_requests_total", "endpoint" => "register", "result" => "duplicate")
                    .increment(1);
                StatusReply::new(StatusCode::BAD_REQUEST, DUPLICATE_USERNAME_STATUS)
            }
            other => storage_failure("register", other),
        })?;

    counter!("account_requests_total", "endpoint" => "register", "result" => "ok").increment(1);
    info!(stage = "account", user_id = id, "user registered");
    Ok(Json(AccountResponse { id }))
}

/// Handles `POST /login`: answers the user id when both fields match a stored row.
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AccountResponse>, StatusReply> {
    let record = state
        .storage()
        .users()
        .find_by_credentials(&credentials.username, &credentials.password)
        .await
        .map_err(|err| storage_failure("login", err))?;

    match record {
        Some(user) => {
            counter!("account_requests_total", "endpoint" => "login", "result" => "ok")
                .increment(1);
            info!(stage = "account", user_id = user.id, "login succeeded");
            Ok(Json(AccountResponse { id: user.id }))
        }
        None => {
            counter!("account_requests_total", "endpoint" => "login", "result" => "invalid")
                .increment(1);
            warn!(stage = "account", username = %credentials.username, "login failed");
            Err(StatusReply::new(StatusCode::NOT_FOUND, "not a valid login"))
        }
    }
}

fn storage_failure(endpoint: &'static str, err: UserError) -> StatusReply {
    counter!("account_requests_total", "endpoint" => endpoint, "result" => "error").increment(1);
    error!(stage = "account", endpoint, error = %err, "account storage query failed");
    StatusReply::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "account storage unavailable",
    )
}
