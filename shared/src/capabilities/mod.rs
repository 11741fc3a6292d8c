mod geolocation;
mod http;
mod timer;

pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationResult, Position,
};
pub use self::http::{Http, HttpResult, UrlError, ValidatedUrl};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub geolocation: Geolocation<Event>,
    pub timer: Timer<Event>,
    pub render: Render<Event>,
}
