use serde::{Deserialize, Serialize};
use thiserror::Error;

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;

use crate::{AppError, ErrorKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationOperation {
    /// One-shot position fix. The shell gives up after `timeout_ms`.
    GetCurrentPosition { timeout_ms: u64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("location request timed out")]
    Timeout,
}

impl From<&GeolocationError> for AppError {
    fn from(e: &GeolocationError) -> Self {
        let kind = match e {
            GeolocationError::PermissionDenied => ErrorKind::LocationPermissionDenied,
            GeolocationError::Timeout => ErrorKind::Timeout,
            GeolocationError::Unavailable { .. } => ErrorKind::Location,
        };
        AppError::new(kind, e.to_string())
    }
}

pub type GeolocationResult = Result<Position, GeolocationError>;

impl Operation for GeolocationOperation {
    type Output = GeolocationResult;
}

#[derive(Capability)]
pub struct Geolocation<Ev> {
    context: CapabilityContext<GeolocationOperation, Ev>,
}

impl<Ev> Geolocation<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<GeolocationOperation, Ev>) -> Self {
        Self { context }
    }

    /// Asks the platform for the current position. The shell may never
    /// answer (e.g. a permission prompt left open), so callers must not
    /// gate anything on the callback firing.
    pub fn get_current<F>(&self, timeout_ms: u64, callback: F)
    where
        F: FnOnce(GeolocationResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(GeolocationOperation::GetCurrentPosition { timeout_ms })
                .await;
            context.update_app(callback(result));
        });
    }
}
