use serde::{Deserialize, Serialize};

use crate::location::{distance_to_place, format_distance};
use crate::model::{Model, Place};

/// One card in either list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlaceItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub image_alt: String,
    /// Present once the user's location is known.
    pub distance_text: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ViewModel {
    pub places: Vec<PlaceItem>,
    pub is_loading: bool,
    /// Initial fetch failure. When set the shell shows it instead of `places`.
    pub error: Option<String>,
    pub error_updating_places: Option<String>,
    pub modal_is_open: bool,
    pub pending_removal: Option<PlaceItem>,
    /// How long the confirmation dialog stays before it confirms itself.
    /// `None` when no auto-confirm timer is running.
    pub auto_confirm_ms: Option<u64>,
    pub is_saving: bool,

    pub available_places: Vec<PlaceItem>,
    pub available_is_loading: bool,
    pub available_error: Option<String>,
}

impl ViewModel {
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        let item = |place: &Place| place_item(model, place);
        let selection = &model.selection;

        Self {
            places: selection.places().iter().map(item).collect(),
            is_loading: selection.is_loading(),
            error: selection.fetch_error().map(|e| e.message.clone()),
            error_updating_places: selection.update_error().map(|e| e.message.clone()),
            modal_is_open: selection.pending().is_some(),
            pending_removal: selection.pending().map(|p| item(&p.place)),
            auto_confirm_ms: selection
                .pending()
                .and_then(|p| p.timer_id)
                .and(model.config.remove_auto_confirm_ms),
            is_saving: selection.is_saving(),

            available_places: model.catalog.places().iter().map(item).collect(),
            available_is_loading: model.catalog.is_loading,
            available_error: model.catalog.error.as_ref().map(|e| e.message.clone()),
        }
    }
}

fn place_item(model: &Model, place: &Place) -> PlaceItem {
    let distance_text = model
        .location
        .and_then(|origin| distance_to_place(origin, place))
        .map(format_distance);

    PlaceItem {
        id: place.id.to_string(),
        name: place.name.clone(),
        description: place.description.clone(),
        image_url: model.config.image_url(&place.image.src),
        image_alt: place.image.alt.clone(),
        distance_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::ValidatedCoordinate;
    use crate::model::{PlaceError, PlaceId, PlaceImage};

    fn place(id: &str, lat: f64) -> Place {
        Place {
            id: PlaceId::new(id),
            name: format!("Place {id}"),
            image: PlaceImage {
                src: format!("{id}.jpg"),
                alt: format!("Photo of {id}"),
            },
            description: String::new(),
            lat,
            lon: 0.0,
        }
    }

    fn model_with_selection(ids: &[&str]) -> Model {
        let mut model = Model::default();
        model.selection.begin_fetch(1).unwrap();
        model
            .selection
            .finish_fetch(1, Ok(ids.iter().map(|id| place(id, 1.0)).collect()))
            .unwrap();
        model
    }

    #[test]
    fn test_empty_model() {
        let view = ViewModel::from_model(&Model::default());
        assert!(view.places.is_empty());
        assert!(!view.is_loading);
        assert!(view.error.is_none());
        assert!(!view.modal_is_open);
        assert!(view.auto_confirm_ms.is_none());
    }

    #[test]
    fn test_loading_flag() {
        let mut model = Model::default();
        model.selection.begin_fetch(1).unwrap();
        assert!(ViewModel::from_model(&model).is_loading);
    }

    #[test]
    fn test_place_items() {
        let model = model_with_selection(&["b", "a"]);
        let view = ViewModel::from_model(&model);
        let ids: Vec<&str> = view.places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(view.places[0].image_url, "http://localhost:3000/b.jpg");
        assert_eq!(view.places[0].image_alt, "Photo of b");
        assert!(view.places[0].distance_text.is_none());
    }

    #[test]
    fn test_distance_text_once_located() {
        let mut model = model_with_selection(&["a"]);
        model.location = Some(ValidatedCoordinate::new(0.0, 0.0).unwrap());
        let view = ViewModel::from_model(&model);
        assert_eq!(view.places[0].distance_text.as_deref(), Some("111 km"));
    }

    #[test]
    fn test_pending_removal_opens_modal() {
        let mut model = model_with_selection(&["a"]);
        model.selection.request_remove(place("a", 1.0)).unwrap();
        let view = ViewModel::from_model(&model);
        assert!(view.modal_is_open);
        assert_eq!(view.pending_removal.map(|p| p.id), Some("a".to_string()));
        assert!(view.auto_confirm_ms.is_none());
    }

    #[test]
    fn test_auto_confirm_follows_running_timer() {
        let mut model = model_with_selection(&["a"]);
        model.selection.request_remove(place("a", 1.0)).unwrap();
        model.selection.attach_timer(7);
        assert_eq!(
            ViewModel::from_model(&model).auto_confirm_ms,
            Some(crate::DEFAULT_REMOVE_AUTO_CONFIRM_MS)
        );

        model.selection.take_timer();
        assert!(ViewModel::from_model(&model).auto_confirm_ms.is_none());
        assert!(ViewModel::from_model(&model).modal_is_open);
    }

    #[test]
    fn test_catalog_fields() {
        let mut model = Model::default();
        model.catalog.is_loading = true;
        assert!(ViewModel::from_model(&model).available_is_loading);

        model.catalog.fail(PlaceError::new("Could not fetch places, please try again later."));
        let view = ViewModel::from_model(&model);
        assert!(!view.available_is_loading);
        assert_eq!(
            view.available_error.as_deref(),
            Some("Could not fetch places, please try again later.")
        );
    }
}
