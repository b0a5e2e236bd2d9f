use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use clipshare_core::StatusResponse;

/// Non-success reply carrying the service's `{"status": ...}` body.
///
/// The message strings are pinned by existing front-end code, so handlers
/// pass them through verbatim instead of inventing an error vocabulary.
pub struct StatusReply {
    status: StatusCode,
    body: StatusResponse,
}

impl StatusReply {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            body: StatusResponse::new(message),
        }
    }
}

impl IntoResponse for StatusReply {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response
    }
}
