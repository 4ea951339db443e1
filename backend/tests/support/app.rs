//! Full application wiring over the in-memory backend.
//!
//! Integration tests under `backend/tests/` compile as separate crates, so
//! they share this builder through `#[path]` includes instead of repeating
//! the route list.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use mockable::DefaultClock;

use marketplace::Trace;
use marketplace::domain::{IdentityService, MarketplaceService, MutationGateway};
use marketplace::inbound::http::listings::{
    create_listing, delete_listing, edit_listing, favorite_listing, list_listings,
    unfavorite_listing,
};
use marketplace::inbound::http::state::HttpState;
use marketplace::inbound::http::users::{login, logout, signup};
use marketplace::inbound::ws;
use marketplace::inbound::ws::state::{OriginPolicy, WsState};
use marketplace::outbound::memory::MemoryBackend;

/// Memory backend plus the states the handlers read.
pub struct TestBackend {
    pub memory: MemoryBackend,
    pub http: HttpState,
    pub ws: WsState,
    key: Key,
}

impl TestBackend {
    pub fn new(origins: OriginPolicy) -> Self {
        let memory = MemoryBackend::new(Arc::new(DefaultClock));
        let marketplace = Arc::new(MarketplaceService::new(
            memory.listings.clone(),
            memory.profiles.clone(),
        ));
        let http = HttpState::new(
            marketplace.clone(),
            Arc::new(MutationGateway::new(memory.listings.clone())),
            Arc::new(IdentityService::new(
                memory.auth.clone(),
                memory.profiles.clone(),
            )),
        );
        Self {
            memory,
            http,
            ws: WsState::new(marketplace, origins),
            key: Key::generate(),
        }
    }

    fn session(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build()
    }

    /// The production route table with a plain-HTTP session cookie.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let api = web::scope("/api/v1")
            .wrap(self.session())
            .service(login)
            .service(signup)
            .service(logout)
            .service(list_listings)
            .service(create_listing)
            .service(favorite_listing)
            .service(unfavorite_listing)
            .service(edit_listing)
            .service(delete_listing);
        let feed = web::scope("/ws")
            .wrap(self.session())
            .service(ws::ws_entry);
        App::new()
            .app_data(web::Data::new(self.http.clone()))
            .app_data(web::Data::new(self.ws.clone()))
            .wrap(Trace)
            .service(api)
            .service(feed)
    }
}
