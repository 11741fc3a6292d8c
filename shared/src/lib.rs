// lib.rs - PlacePicker shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod location;
pub mod model;
pub mod remote_store;
pub mod selection;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use location::{format_distance, haversine_distance, sort_by_distance, ValidatedCoordinate};
pub use model::{ApiConfig, Model, Place, PlaceError, PlaceId, PlaceImage};
pub use view::{PlaceItem, ViewModel};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_LOCATION_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REMOVE_AUTO_CONFIRM_MS: u64 = 3_000;
/// Upper bound for every configured timeout and delay.
pub const MAX_TIMEOUT_MS: u64 = 300_000;
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub const USER_PLACES_PATH: &str = "user-places";
pub const CATALOG_PATH: &str = "places";

pub const FETCH_USER_PLACES_FAILED: &str = "Failed to fetch user places";
pub const ADD_PLACE_FAILED: &str = "Could not update places, please try again later";
pub const REMOVE_PLACE_FAILED: &str = "Failed to delete a place";
pub const FETCH_CATALOG_FAILED: &str = "Could not fetch places, please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    NotFound,
    Server,
    Deserialization,
    InvalidRequest,
    Location,
    LocationPermissionDenied,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Server => "SERVER_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Location => "LOCATION_ERROR",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            404 => Self::NotFound,
            408 => Self::Timeout,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }
}

/// Log-side classification of a failure.
///
/// The view never sees this type; it only receives the user message carried
/// by [`PlaceError`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
