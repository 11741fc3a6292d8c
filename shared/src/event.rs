use serde::{Deserialize, Serialize};

use crate::capabilities::{GeolocationResult, HttpResult, TimerOutput};
use crate::model::{ApiConfig, Place};

/// Everything the core reacts to.
///
/// Variants marked `#[serde(skip)]` are produced by capabilities inside the
/// core and cannot be sent by the shell.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub enum Event {
    #[default]
    Noop,

    /// Optional; only honoured before `Initialize`.
    Configure(ApiConfig),
    Initialize,

    RequestAdd(Place),
    RequestRemove(Place),
    CancelRemove,
    ConfirmRemove,
    DismissError,

    #[serde(skip)]
    UserPlacesFetched {
        request_id: u64,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    UserPlacesReplaced {
        request_id: u64,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    CatalogFetched {
        request_id: u64,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    LocationResolved(GeolocationResult),
    #[serde(skip)]
    RemoveTimerElapsed(TimerOutput),
    /// A request's deadline timer fired or was cancelled. The timer id is
    /// the request id.
    #[serde(skip)]
    RequestDeadline(TimerOutput),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::Initialize => "initialize",
            Self::RequestAdd(_) => "request_add",
            Self::RequestRemove(_) => "request_remove",
            Self::CancelRemove => "cancel_remove",
            Self::ConfirmRemove => "confirm_remove",
            Self::DismissError => "dismiss_error",
            Self::UserPlacesFetched { .. } => "user_places_fetched",
            Self::UserPlacesReplaced { .. } => "user_places_replaced",
            Self::CatalogFetched { .. } => "catalog_fetched",
            Self::LocationResolved(_) => "location_resolved",
            Self::RemoveTimerElapsed(_) => "remove_timer_elapsed",
            Self::RequestDeadline(_) => "request_deadline",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::RequestAdd(_)
                | Self::RequestRemove(_)
                | Self::CancelRemove
                | Self::ConfirmRemove
                | Self::DismissError
        )
    }
}
