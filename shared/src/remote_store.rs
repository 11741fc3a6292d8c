//! Requests against the places backend.
//!
//! Two resources: `/user-places` (the persisted selection, fetched and
//! replaced wholesale) and `/places` (the read-only catalog). Decoding an
//! outcome is a plain function so it can be tested without a shell;
//! [`RemoteStore`] builds the requests on the `crux_http` capability.

use crux_http::http::Method;
use crux_http::Response;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{Http, HttpResult, UrlError, ValidatedUrl};
use crate::event::Event;
use crate::model::{ApiConfig, Place};
use crate::{AppError, ErrorKind, CATALOG_PATH, USER_PLACES_PATH};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("server responded with status {status}")]
    Server {
        status: u16,
        message: Option<String>,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// The backend's own message when it sent one, `default` otherwise.
    #[must_use]
    pub fn user_message(&self, default: &str) -> String {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => default.to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout => ErrorKind::Timeout,
            Self::Server { status, .. } => ErrorKind::from_http_status(*status),
            Self::InvalidResponse(_) => ErrorKind::Deserialization,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }
}

impl From<crux_http::Error> for StoreError {
    fn from(e: crux_http::Error) -> Self {
        match e {
            // A 2xx only ends up here when the body could not be read.
            crux_http::Error::Http(e) if e.code.is_success() => Self::InvalidResponse(e.message),
            crux_http::Error::Http(e) => server_error(u16::from(e.code), e.body.as_deref()),
            crux_http::Error::Timeout => Self::Timeout,
            crux_http::Error::Io(message) => Self::Network(message),
            crux_http::Error::Json(message) => Self::InvalidResponse(message),
            crux_http::Error::Url(message) => Self::InvalidRequest(message),
        }
    }
}

impl From<UrlError> for StoreError {
    fn from(e: UrlError) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}

impl From<&StoreError> for AppError {
    fn from(e: &StoreError) -> Self {
        let error = AppError::new(e.kind(), e.to_string());
        match e {
            StoreError::Server {
                status,
                message: Some(message),
            } => error
                .with_context("http_status", status.to_string())
                .with_internal(message.clone()),
            StoreError::Server { status, .. } => {
                error.with_context("http_status", status.to_string())
            }
            _ => error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlacesEnvelope {
    places: Vec<Place>,
}

#[derive(Debug, Serialize)]
struct PlacesPayload<'a> {
    places: &'a [Place],
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Decodes a `{places: [...]}` response.
pub fn decode_places(result: HttpResult) -> Result<Vec<Place>, StoreError> {
    let mut response = accepted(result)?;
    response
        .body_json::<PlacesEnvelope>()
        .map(|envelope| envelope.places)
        .map_err(StoreError::from)
}

/// Decodes the answer to a replace. Any 2xx counts; the body is ignored.
pub fn decode_ack(result: HttpResult) -> Result<(), StoreError> {
    accepted(result).map(|_| ())
}

/// Passes 2xx responses through. `crux_http` already turns 4xx and 5xx into
/// errors, which leaves redirects the shell did not follow.
fn accepted(result: HttpResult) -> Result<Response<Vec<u8>>, StoreError> {
    let response = result.map_err(StoreError::from)?;
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(server_error(
            u16::from(status),
            response.body().map(Vec::as_slice),
        ))
    }
}

fn server_error(status: u16, body: Option<&[u8]>) -> StoreError {
    let message = body
        .and_then(|body| serde_json::from_slice::<ApiErrorResponse>(body).ok())
        .and_then(|e| e.message);
    StoreError::Server { status, message }
}

/// The two selection operations plus the catalog read, bound to the `Http`
/// capability. Every call is a single best-effort round trip; the outcome
/// comes back as an [`Event`] tagged with `request_id`.
pub struct RemoteStore<'a> {
    http: &'a Http<Event>,
    config: &'a ApiConfig,
}

impl<'a> RemoteStore<'a> {
    #[must_use]
    pub fn new(http: &'a Http<Event>, config: &'a ApiConfig) -> Self {
        Self { http, config }
    }

    pub fn fetch_selected(&self, request_id: u64) -> Result<(), StoreError> {
        let url = self.endpoint(USER_PLACES_PATH)?;
        self.http
            .request(Method::Get, url.into_url())
            .header("Accept", "application/json")
            .send(move |result| Event::UserPlacesFetched {
                request_id,
                result: Box::new(result),
            });
        Ok(())
    }

    pub fn replace_selected(&self, request_id: u64, places: &[Place]) -> Result<(), StoreError> {
        let url = self.endpoint(USER_PLACES_PATH)?;
        self.http
            .request(Method::Put, url.into_url())
            .header("Accept", "application/json")
            .body_json(&PlacesPayload { places })
            .map_err(|e| StoreError::InvalidRequest(e.to_string()))?
            .send(move |result| Event::UserPlacesReplaced {
                request_id,
                result: Box::new(result),
            });
        Ok(())
    }

    pub fn fetch_catalog(&self, request_id: u64) -> Result<(), StoreError> {
        let url = self.endpoint(CATALOG_PATH)?;
        self.http
            .request(Method::Get, url.into_url())
            .header("Accept", "application/json")
            .send(move |result| Event::CatalogFetched {
                request_id,
                result: Box::new(result),
            });
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<ValidatedUrl, StoreError> {
        Ok(self.config.endpoint(path)?)
    }
}
