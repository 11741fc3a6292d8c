//! The user's selected places and every transition they go through.
//!
//! Changes are persist-then-commit: `begin_*` computes the list that should be
//! persisted and parks it as the in-flight mutation; the list the user sees
//! only changes in [`Selection::complete_mutation`] once the store has
//! acknowledged it. One mutation is in flight at a time.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{Place, PlaceError, PlaceId};
use crate::remote_store::StoreError;
use crate::{ADD_PLACE_FAILED, FETCH_USER_PLACES_FAILED, REMOVE_PLACE_FAILED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("place is already selected")]
    AlreadySelected,
    #[error("place is not in the selected list")]
    NotSelected,
    #[error("another change is still being saved")]
    Saving,
    #[error("selected places have not been loaded yet")]
    NotLoaded,
    #[error("no removal is pending")]
    NothingPending,
    #[error("selected places were already requested")]
    AlreadyFetched,
    #[error("response does not belong to the request in flight")]
    Stale,
}

impl Rejected {
    /// Rejections that can only come from a shell bug rather than from user
    /// timing.
    #[must_use]
    pub const fn is_violation(self) -> bool {
        matches!(self, Self::NothingPending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Remove,
}

impl MutationKind {
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::Add => ADD_PLACE_FAILED,
            Self::Remove => REMOVE_PLACE_FAILED,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InFlightMutation {
    pub token: u64,
    pub kind: MutationKind,
    pub place: Place,
    updated: Vec<Place>,
}

impl InFlightMutation {
    /// The list that becomes current once the store accepts it.
    #[must_use]
    pub fn updated(&self) -> &[Place] {
        &self.updated
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingRemoval {
    pub place: Place,
    /// Auto-confirm timer, while one is running.
    pub timer_id: Option<u64>,
    /// The timer fired while another change was being saved; the removal
    /// goes out once that change settles.
    pub confirm_deferred: bool,
}

/// Outcome of a settled mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub kind: MutationKind,
    pub place: Place,
    pub error: Option<StoreError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum FetchState {
    #[default]
    Idle,
    Loading {
        token: u64,
    },
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    places: Vec<Place>,
    fetch: FetchState,
    fetch_error: Option<PlaceError>,
    update_error: Option<PlaceError>,
    pending: Option<PendingRemoval>,
    in_flight: Option<InFlightMutation>,
}

impl Selection {
    #[must_use]
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    #[must_use]
    pub fn contains(&self, id: &PlaceId) -> bool {
        self.places.iter().any(|p| &p.id == id)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.fetch, FetchState::Loading { .. })
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn fetch_error(&self) -> Option<&PlaceError> {
        self.fetch_error.as_ref()
    }

    #[must_use]
    pub fn update_error(&self) -> Option<&PlaceError> {
        self.update_error.as_ref()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingRemoval> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<&InFlightMutation> {
        self.in_flight.as_ref()
    }

    /// Whether `token` is the initial fetch still in flight.
    #[must_use]
    pub fn awaits_fetch(&self, token: u64) -> bool {
        self.fetch == FetchState::Loading { token }
    }

    /// Whether `token` belongs to the mutation being saved.
    #[must_use]
    pub fn awaits_mutation(&self, token: u64) -> bool {
        self.in_flight.as_ref().is_some_and(|m| m.token == token)
    }

    pub fn begin_fetch(&mut self, token: u64) -> Result<(), Rejected> {
        if self.fetch != FetchState::Idle {
            return Err(Rejected::AlreadyFetched);
        }
        self.fetch = FetchState::Loading { token };
        Ok(())
    }

    /// Settles the initial fetch. Returns how many duplicate entries the
    /// server sent; only the first occurrence of an id is kept.
    pub fn finish_fetch(
        &mut self,
        token: u64,
        result: Result<Vec<Place>, StoreError>,
    ) -> Result<usize, Rejected> {
        if !self.awaits_fetch(token) {
            return Err(Rejected::Stale);
        }

        match result {
            Ok(places) => {
                let received = places.len();
                self.places = dedup_by_id(places);
                self.fetch = FetchState::Loaded;
                Ok(received - self.places.len())
            }
            Err(e) => {
                self.places.clear();
                self.fetch_error = Some(PlaceError::new(e.user_message(FETCH_USER_PLACES_FAILED)));
                self.fetch = FetchState::Failed;
                Ok(0)
            }
        }
    }

    /// Starts persisting `[place] ++ current`. The returned list is what must
    /// be sent to the store.
    pub fn begin_add(&mut self, place: Place, token: u64) -> Result<Vec<Place>, Rejected> {
        if self.contains(&place.id) {
            return Err(Rejected::AlreadySelected);
        }
        self.ensure_can_mutate()?;

        let mut updated = Vec::with_capacity(self.places.len() + 1);
        updated.push(place.clone());
        updated.extend(self.places.iter().cloned());

        Ok(self.park(token, MutationKind::Add, place, updated))
    }

    /// Marks `place` for removal. Replaces any earlier pending removal and
    /// hands back its timer so the caller can cancel it.
    pub fn request_remove(&mut self, place: Place) -> Result<Option<u64>, Rejected> {
        if !self.contains(&place.id) {
            return Err(Rejected::NotSelected);
        }
        let previous = self.pending.replace(PendingRemoval {
            place,
            timer_id: None,
            confirm_deferred: false,
        });
        Ok(previous.and_then(|p| p.timer_id))
    }

    pub fn attach_timer(&mut self, timer_id: u64) {
        if let Some(pending) = self.pending.as_mut() {
            pending.timer_id = Some(timer_id);
        }
    }

    #[must_use]
    pub fn is_current_timer(&self, timer_id: u64) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.timer_id == Some(timer_id))
    }

    /// Detaches the running auto-confirm timer, if any.
    pub fn take_timer(&mut self) -> Option<u64> {
        self.pending.as_mut().and_then(|p| p.timer_id.take())
    }

    /// Holds the confirmation of the pending removal until the mutation in
    /// flight settles. Returns whether there was a removal to hold.
    pub fn defer_confirm(&mut self) -> bool {
        match self.pending.as_mut() {
            Some(pending) => {
                pending.confirm_deferred = true;
                true
            }
            None => false,
        }
    }

    /// Clears the deferred flag. Returns whether it was set.
    pub fn take_deferred_confirm(&mut self) -> bool {
        self.pending
            .as_mut()
            .is_some_and(|p| std::mem::take(&mut p.confirm_deferred))
    }

    /// Clears the pending removal. Returns its timer, if one was running.
    pub fn cancel_remove(&mut self) -> Result<Option<u64>, Rejected> {
        self.pending
            .take()
            .map(|p| p.timer_id)
            .ok_or(Rejected::NothingPending)
    }

    /// Starts persisting the current list without the pending place.
    pub fn begin_remove(&mut self, token: u64) -> Result<Vec<Place>, Rejected> {
        let place = self
            .pending
            .as_ref()
            .map(|p| p.place.clone())
            .ok_or(Rejected::NothingPending)?;
        self.ensure_can_mutate()?;

        let updated: Vec<Place> = self
            .places
            .iter()
            .filter(|p| p.id != place.id)
            .cloned()
            .collect();

        Ok(self.park(token, MutationKind::Remove, place, updated))
    }

    /// Settles the in-flight mutation. On success the parked list becomes
    /// current; on failure the list is left alone and the update error is set.
    pub fn complete_mutation(
        &mut self,
        token: u64,
        result: Result<(), StoreError>,
    ) -> Result<Completion, Rejected> {
        if !self.awaits_mutation(token) {
            return Err(Rejected::Stale);
        }
        let Some(mutation) = self.in_flight.take() else {
            return Err(Rejected::Stale);
        };

        let error = match result {
            Ok(()) => {
                self.places = mutation.updated;
                if mutation.kind == MutationKind::Remove
                    && self
                        .pending
                        .as_ref()
                        .is_some_and(|p| p.place.id == mutation.place.id)
                {
                    self.pending = None;
                }
                None
            }
            Err(e) => {
                self.update_error = Some(PlaceError::new(
                    e.user_message(mutation.kind.default_message()),
                ));
                Some(e)
            }
        };

        Ok(Completion {
            kind: mutation.kind,
            place: mutation.place,
            error,
        })
    }

    /// Clears the update error. Returns whether there was one.
    pub fn dismiss_error(&mut self) -> bool {
        self.update_error.take().is_some()
    }

    fn ensure_can_mutate(&self) -> Result<(), Rejected> {
        if matches!(self.fetch, FetchState::Idle | FetchState::Loading { .. }) {
            return Err(Rejected::NotLoaded);
        }
        if self.in_flight.is_some() {
            return Err(Rejected::Saving);
        }
        Ok(())
    }

    fn park(&mut self, token: u64, kind: MutationKind, place: Place, updated: Vec<Place>) -> Vec<Place> {
        let mutation = InFlightMutation {
            token,
            kind,
            place,
            updated,
        };
        let to_persist = mutation.updated.clone();
        self.in_flight = Some(mutation);
        to_persist
    }
}

fn dedup_by_id(places: Vec<Place>) -> Vec<Place> {
    let mut seen = HashSet::with_capacity(places.len());
    places
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}
