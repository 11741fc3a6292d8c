use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::capabilities::{UrlError, ValidatedUrl};
use crate::location::{sort_by_distance, CoordinateError, ValidatedCoordinate};
use crate::selection::Selection;
use crate::{
    DEFAULT_BASE_URL, DEFAULT_LOCATION_TIMEOUT_MS, DEFAULT_REMOVE_AUTO_CONFIRM_MS,
    DEFAULT_REQUEST_TIMEOUT_MS, MAX_TIMEOUT_MS,
};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PlaceId(pub String);

impl PlaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaceImage {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// A point of interest as served by the backend.
///
/// The backend spells the display name `title` and the coordinate `lat`/`lon`;
/// `name`/`latitude`/`longitude` are accepted as well.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Place {
    pub id: PlaceId,
    #[serde(rename = "title", alias = "name")]
    pub name: String,
    #[serde(default)]
    pub image: PlaceImage,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
}

impl Place {
    pub fn coordinate(&self) -> Result<ValidatedCoordinate, CoordinateError> {
        ValidatedCoordinate::new(self.lat, self.lon)
    }
}

/// User-facing failure record. Only the message crosses into the view.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlaceError {
    pub message: String,
}

impl PlaceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] UrlError),
    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },
    #[error("{field} exceeds the maximum of {max}ms")]
    TimeoutTooLong { field: &'static str, max: u64 },
}

/// Backend location and per-operation deadlines, supplied by the shell.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub location_timeout_ms: u64,
    /// `None` disables the automatic confirmation of a pending removal.
    pub remove_auto_confirm_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            location_timeout_ms: DEFAULT_LOCATION_TIMEOUT_MS,
            remove_auto_confirm_ms: Some(DEFAULT_REMOVE_AUTO_CONFIRM_MS),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ValidatedUrl::new(self.base_url.as_str())?;
        check_timeout("request_timeout_ms", self.request_timeout_ms)?;
        check_timeout("location_timeout_ms", self.location_timeout_ms)?;
        if let Some(millis) = self.remove_auto_confirm_ms {
            check_timeout("remove_auto_confirm_ms", millis)?;
        }
        Ok(())
    }

    pub fn endpoint(&self, path: &str) -> Result<ValidatedUrl, UrlError> {
        ValidatedUrl::new(self.join(path))
    }

    /// Absolute URL for a catalog image; absolute sources pass through.
    #[must_use]
    pub fn image_url(&self, src: &str) -> String {
        if src.starts_with("http://") || src.starts_with("https://") {
            src.to_string()
        } else {
            self.join(src)
        }
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn check_timeout(field: &'static str, millis: u64) -> Result<(), ConfigError> {
    if millis == 0 {
        return Err(ConfigError::ZeroTimeout { field });
    }
    if millis > MAX_TIMEOUT_MS {
        return Err(ConfigError::TimeoutTooLong {
            field,
            max: MAX_TIMEOUT_MS,
        });
    }
    Ok(())
}

/// The available-places catalog. Read-only from the client's side.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    places: Vec<Place>,
    sorted: Option<Vec<Place>>,
    request_id: Option<u64>,
    pub is_loading: bool,
    pub error: Option<PlaceError>,
}

impl Catalog {
    pub fn begin_load(&mut self, request_id: u64) {
        self.request_id = Some(request_id);
        self.is_loading = true;
    }

    /// Whether `request_id` is the fetch this catalog is waiting for.
    #[must_use]
    pub fn awaits(&self, request_id: u64) -> bool {
        self.request_id == Some(request_id)
    }

    pub fn load(&mut self, places: Vec<Place>, origin: Option<ValidatedCoordinate>) {
        self.request_id = None;
        self.is_loading = false;
        self.error = None;
        self.sorted = origin.map(|origin| sort_by_distance(origin, &places));
        self.places = places;
    }

    pub fn fail(&mut self, error: PlaceError) {
        self.request_id = None;
        self.is_loading = false;
        self.error = Some(error);
    }

    pub fn sort_from(&mut self, origin: ValidatedCoordinate) {
        self.sorted = Some(sort_by_distance(origin, &self.places));
    }

    /// Places in display order: by distance once a location is known,
    /// server order otherwise.
    #[must_use]
    pub fn places(&self) -> &[Place] {
        self.sorted.as_deref().unwrap_or(&self.places)
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.sorted.is_some()
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: ApiConfig,
    pub initialized: bool,
    pub selection: Selection,
    pub catalog: Catalog,
    pub location: Option<ValidatedCoordinate>,
    pub location_requested: bool,
    next_token: u64,
}

impl Model {
    /// Fresh token for a request or timer. Never zero.
    pub fn next_token(&mut self) -> u64 {
        self.next_token = self.next_token.wrapping_add(1).max(1);
        self.next_token
    }
}
