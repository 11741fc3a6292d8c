use tracing::{debug, error, info, warn};

use crate::capabilities::{Capabilities, GeolocationResult, TimerOutput};
use crate::event::Event;
use crate::location::ValidatedCoordinate;
use crate::model::{Model, Place, PlaceError};
use crate::remote_store::{decode_ack, decode_places, RemoteStore, StoreError};
use crate::selection::Rejected;
use crate::view::ViewModel;
use crate::{AppError, FETCH_CATALOG_FAILED};

#[derive(Default)]
pub struct App;

impl App {
    fn initialize(model: &mut Model, caps: &Capabilities) {
        if model.initialized {
            warn!("initialize received twice, ignoring");
            return;
        }
        model.initialized = true;

        let token = model.next_token();
        match model.selection.begin_fetch(token) {
            Ok(()) => {
                let sent = RemoteStore::new(&caps.http, &model.config).fetch_selected(token);
                match sent {
                    Ok(()) => Self::watch(model, caps, token),
                    Err(e) => Self::user_places_fetched(model, token, Err(e)),
                }
            }
            Err(rejected) => warn!(%rejected, "user places fetch not started"),
        }

        let token = model.next_token();
        model.catalog.begin_load(token);
        let sent = RemoteStore::new(&caps.http, &model.config).fetch_catalog(token);
        match sent {
            Ok(()) => Self::watch(model, caps, token),
            Err(e) => Self::settle_catalog(model, Err(e)),
        }

        if !model.location_requested {
            model.location_requested = true;
            caps.geolocation
                .get_current(model.config.location_timeout_ms, Event::LocationResolved);
        }
    }

    fn request_add(model: &mut Model, caps: &Capabilities, place: Place) {
        let token = model.next_token();
        let id = place.id.clone();
        match model.selection.begin_add(place, token) {
            Ok(updated) => {
                debug!(place_id = %id, token, "persisting add");
                Self::persist(model, caps, token, &updated);
            }
            Err(rejected) => warn!(place_id = %id, %rejected, "add ignored"),
        }
    }

    fn request_remove(model: &mut Model, caps: &Capabilities, place: Place) {
        let id = place.id.clone();
        match model.selection.request_remove(place) {
            Ok(replaced_timer) => {
                if let Some(timer_id) = replaced_timer {
                    caps.timer.cancel(timer_id);
                }
                if let Some(millis) = model.config.remove_auto_confirm_ms {
                    let timer_id = model.next_token();
                    model.selection.attach_timer(timer_id);
                    caps.timer.start(timer_id, millis, Event::RemoveTimerElapsed);
                }
                debug!(place_id = %id, "removal pending");
            }
            Err(rejected) => warn!(place_id = %id, %rejected, "remove request ignored"),
        }
    }

    fn cancel_remove(model: &mut Model, caps: &Capabilities) {
        match model.selection.cancel_remove() {
            Ok(timer) => {
                if let Some(timer_id) = timer {
                    caps.timer.cancel(timer_id);
                }
            }
            Err(rejected) => warn!(%rejected, "cancel ignored"),
        }
    }

    fn confirm_remove(model: &mut Model, caps: &Capabilities) {
        let token = model.next_token();
        match model.selection.begin_remove(token) {
            Ok(updated) => {
                if let Some(timer_id) = model.selection.take_timer() {
                    caps.timer.cancel(timer_id);
                }
                debug!(token, "persisting removal");
                Self::persist(model, caps, token, &updated);
            }
            Err(rejected) if rejected.is_violation() => {
                error!(%rejected, "confirm received with no pending removal");
            }
            Err(rejected) => warn!(%rejected, "confirm ignored"),
        }
    }

    fn remove_timer_elapsed(model: &mut Model, caps: &Capabilities, output: TimerOutput) {
        let TimerOutput::Elapsed { id } = output else {
            debug!(timer_id = output.id(), "removal timer cancelled");
            return;
        };
        if !model.selection.is_current_timer(id) {
            warn!(timer_id = id, "stale removal timer");
            return;
        }
        model.selection.take_timer();
        if model.selection.is_saving() {
            model.selection.defer_confirm();
            info!(timer_id = id, "removal auto-confirm waits for the current save");
            return;
        }
        info!(timer_id = id, "removal auto-confirmed");
        Self::confirm_remove(model, caps);
    }

    fn persist(model: &mut Model, caps: &Capabilities, token: u64, updated: &[Place]) {
        let sent = RemoteStore::new(&caps.http, &model.config).replace_selected(token, updated);
        match sent {
            Ok(()) => Self::watch(model, caps, token),
            Err(e) => Self::settle_mutation(model, caps, token, Err(e)),
        }
    }

    /// Arms the deadline of request `token`. The timer reuses the request id.
    fn watch(model: &Model, caps: &Capabilities, token: u64) {
        caps.timer
            .start(token, model.config.request_timeout_ms, Event::RequestDeadline);
    }

    fn request_deadline(model: &mut Model, caps: &Capabilities, output: TimerOutput) {
        let TimerOutput::Elapsed { id } = output else {
            return;
        };
        let timeout_ms = model.config.request_timeout_ms;

        if model.selection.awaits_fetch(id) {
            warn!(request_id = id, timeout_ms, "user places fetch timed out");
            Self::user_places_fetched(model, id, Err(StoreError::Timeout));
        } else if model.selection.awaits_mutation(id) {
            warn!(request_id = id, timeout_ms, "save timed out");
            Self::settle_mutation(model, caps, id, Err(StoreError::Timeout));
        } else if model.catalog.awaits(id) {
            warn!(request_id = id, timeout_ms, "catalog fetch timed out");
            Self::settle_catalog(model, Err(StoreError::Timeout));
        } else {
            debug!(request_id = id, "deadline passed after the response");
        }
    }

    fn user_places_fetched(
        model: &mut Model,
        request_id: u64,
        result: Result<Vec<Place>, StoreError>,
    ) {
        match model.selection.finish_fetch(request_id, result) {
            Ok(dropped) => {
                if dropped > 0 {
                    warn!(dropped, "server sent duplicate selected places");
                }
                match model.selection.fetch_error() {
                    Some(e) => error!(message = %e.message, "user places fetch failed"),
                    None => info!(count = model.selection.places().len(), "user places loaded"),
                }
            }
            Err(rejected) => warn!(request_id, %rejected, "user places response dropped"),
        }
    }

    fn settle_mutation(
        model: &mut Model,
        caps: &Capabilities,
        token: u64,
        result: Result<(), StoreError>,
    ) {
        let completion = match model.selection.complete_mutation(token, result) {
            Ok(completion) => completion,
            Err(rejected) => {
                warn!(token, %rejected, "save response dropped");
                return;
            }
        };

        match completion.error {
            None => info!(
                kind = completion.kind.as_str(),
                place_id = %completion.place.id,
                count = model.selection.places().len(),
                "selected places saved"
            ),
            Some(e) => {
                let app_error = AppError::from(&e);
                warn!(
                    kind = completion.kind.as_str(),
                    place_id = %completion.place.id,
                    code = app_error.code(),
                    error = %app_error,
                    "selected places not saved"
                );
            }
        }

        if model.selection.take_deferred_confirm() {
            debug!("sending removal held back by the previous save");
            Self::confirm_remove(model, caps);
        }
    }

    fn settle_catalog(model: &mut Model, result: Result<Vec<Place>, StoreError>) {
        match result {
            Ok(places) => {
                info!(count = places.len(), sorted = model.location.is_some(), "catalog loaded");
                model.catalog.load(places, model.location);
            }
            Err(e) => {
                let app_error = AppError::from(&e);
                warn!(code = app_error.code(), error = %app_error, "catalog fetch failed");
                model
                    .catalog
                    .fail(PlaceError::new(e.user_message(FETCH_CATALOG_FAILED)));
            }
        }
    }

    fn location_resolved(model: &mut Model, result: GeolocationResult) {
        let position = match result {
            Ok(position) => position,
            Err(e) => {
                let app_error = AppError::from(&e);
                warn!(code = app_error.code(), error = %app_error, "location unavailable, catalog stays unsorted");
                return;
            }
        };

        match ValidatedCoordinate::new(position.lat, position.lon) {
            Ok(origin) => {
                info!(lat = origin.lat(), lon = origin.lon(), "location resolved");
                model.location = Some(origin);
                model.catalog.sort_from(origin);
            }
            Err(e) => {
                let app_error = AppError::from(e);
                warn!(error = %app_error, "ignoring invalid position");
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), user = event.is_user_initiated(), "update");

        match event {
            Event::Noop => return,

            Event::Configure(config) => {
                if model.initialized {
                    warn!("configure after initialize, ignoring");
                    return;
                }
                if let Err(e) = config.validate() {
                    error!(error = %e, "rejecting invalid configuration");
                    return;
                }
                info!(base_url = %config.base_url, "configured");
                model.config = config;
                return;
            }

            Event::Initialize => Self::initialize(model, caps),
            Event::RequestAdd(place) => Self::request_add(model, caps, place),
            Event::RequestRemove(place) => Self::request_remove(model, caps, place),
            Event::CancelRemove => Self::cancel_remove(model, caps),
            Event::ConfirmRemove => Self::confirm_remove(model, caps),

            Event::DismissError => {
                if !model.selection.dismiss_error() {
                    debug!("no update error to dismiss");
                }
            }

            Event::UserPlacesFetched { request_id, result } => {
                caps.timer.cancel(request_id);
                Self::user_places_fetched(model, request_id, decode_places(*result));
            }

            Event::UserPlacesReplaced { request_id, result } => {
                caps.timer.cancel(request_id);
                Self::settle_mutation(model, caps, request_id, decode_ack(*result));
            }

            Event::CatalogFetched { request_id, result } => {
                caps.timer.cancel(request_id);
                if !model.catalog.awaits(request_id) {
                    warn!(request_id, rejected = %Rejected::Stale, "catalog response dropped");
                    return;
                }
                Self::settle_catalog(model, decode_places(*result));
            }

            Event::LocationResolved(result) => Self::location_resolved(model, result),
            Event::RemoveTimerElapsed(output) => Self::remove_timer_elapsed(model, caps, output),
            Event::RequestDeadline(output) => Self::request_deadline(model, caps, output),
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from_model(model)
    }
}
