mod http;
mod kv;

pub use self::http::{
    Http, HttpError, HttpHeaders, HttpMethod, HttpOperation, HttpRequest, HttpResponse,
    HttpResult, RequestBuilder, RequestPath,
};
pub use self::kv::{Kv, KvError, KvOperation, KvOutput, KvResult};

// Crux's built-in Render capability provides everything needed to trigger
// view updates.
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

pub type AppHttp = Http<Event>;
pub type AppKv = Kv<Event>;
pub type AppRender = Render<Event>;

#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Storage error: {0}")]
    Kv(#[from] KvError),
}

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub kv: Kv<Event>,
    pub render: Render<Event>,
}

impl Capabilities {
    #[must_use]
    pub fn http(&self) -> &AppHttp {
        &self.http
    }

    #[must_use]
    pub fn kv(&self) -> &AppKv {
        &self.kv
    }

    #[must_use]
    pub fn render(&self) -> &AppRender {
        &self.render
    }
}
