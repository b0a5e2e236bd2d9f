use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use clipshare_core::{AccountResponse, Credentials};

use crate::request::{ApiClient, ClientError};

/// Client for the account endpoints of the clip service.
///
/// Calls go through the verb-level [`ApiClient`], so the base URL and the
/// `authorization` header behave exactly as they do for untyped requests.
#[derive(Clone)]
pub struct AccountClient {
    api: ApiClient,
}

impl AccountClient {
    /// Creates an account client on top of the given request helper.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Registers a new account and returns the assigned user id.
    pub async fn register(
        &self,
        credentials: &Credentials,
    ) -> Result<AccountResponse, AccountError> {
        let payload = serde_json::to_value(credentials)?;
        let response = self.api.post("register", Some(&payload)).await?;

        parse_json(response).await
    }

    /// Checks the credentials against the service and returns the user id.
    pub async fn login(&self, credentials: &Credentials) -> Result<AccountResponse, AccountError> {
        let payload = serde_json::to_value(credentials)?;
        let response = self.api.post("login", Some(&payload)).await?;

        parse_json(response).await
    }
}

/// Errors produced by the typed account calls.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("failed to issue request: {0}")]
    Request(#[from] ClientError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to encode credentials: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

async fn parse_json<T>(response: Response) -> Result<T, AccountError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(AccountError::Status { status, body });
    }

    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;
    use url::Url;

    use super::*;

    fn client_for(server: &MockServer) -> AccountClient {
        let base_url = Url::parse(&server.base_url()).expect("base url");
        AccountClient::new(ApiClient::new(base_url))
    }

    #[tokio::test]
    async fn register_returns_the_assigned_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/register")
                    .json_body(json!({"username": "bob", "password": "pass123"}));
                then.status(200).json_body(json!({"id": 1}));
            })
            .await;

        let response = client_for(&server)
            .register(&Credentials::new("bob", "pass123"))
            .await
            .expect("register");

        mock.assert_async().await;
        assert_eq!(response, AccountResponse { id: 1 });
    }

    #[tokio::test]
    async fn login_returns_the_user_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/login")
                    .json_body(json!({"username": "bob", "password": "pass123"}));
                then.status(200).json_body(json!({"id": 7}));
            })
            .await;

        let response = client_for(&server)
            .login(&Credentials::new("bob", "pass123"))
            .await
            .expect("login");

        mock.assert_async().await;
        assert_eq!(response, AccountResponse { id: 7 });
    }

    #[tokio::test]
    async fn failed_login_carries_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/login");
                then.status(404).json_body(json!({"status": "not a valid login"}));
            })
            .await;

        let err = client_for(&server)
            .login(&Credentials::new("bob", "wrong"))
            .await
            .expect_err("should error");

        match err {
            AccountError::Status { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(body.contains("not a valid login"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_registration_carries_the_service_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/register");
                then.status(400).json_body(json!({
                    "status": "unsuccessful registration: user with username already exists"
                }));
            })
            .await;

        let err = client_for(&server)
            .register(&Credentials::new("bob", "pass123"))
            .await
            .expect_err("should error");

        match err {
            AccountError::Status { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(body.contains("user with username already exists"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn calls_carry_the_helper_authorization_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/login")
                    .header("authorization", "");
                then.status(200).json_body(json!({"id": 3}));
            })
            .await;

        client_for(&server)
            .login(&Credentials::new("bob", "pass123"))
            .await
            .expect("login");

        mock.assert_async().await;
    }
}
