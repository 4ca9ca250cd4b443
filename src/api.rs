use crate::{
    backend_client::{BackendClient, WifiCredentials},
    error::WizardError,
    storage::LocalStorage,
    wizard::{NetworkType, Notification, WizardController},
};
use actix_web::{HttpResponse, Responder, http::StatusCode, web};
use log::{debug, error, warn};
use serde::Deserialize;
use serde_valid::Validate;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Partial update of the wizard form, absent fields are left untouched
#[derive(Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdate {
    pub network_type: Option<NetworkType>,
    #[validate(max_length = 32)]
    pub ssid: Option<String>,
    #[validate(max_length = 63)]
    pub password: Option<String>,
    #[validate(max_length = 45)]
    pub server_ip: Option<String>,
    #[validate(max_length = 17)]
    pub server_mac: Option<String>,
}

impl FieldUpdate {
    fn apply<S>(self, controller: &mut WizardController<S>)
    where
        S: LocalStorage,
    {
        if let Some(network_type) = self.network_type {
            controller.set_network_type(network_type);
        }
        if let Some(ssid) = self.ssid {
            controller.set_ssid(ssid);
        }
        if let Some(password) = self.password {
            controller.set_password(password);
        }
        if let Some(server_ip) = self.server_ip {
            controller.set_server_ip(server_ip);
        }
        if let Some(server_mac) = self.server_mac {
            controller.set_server_mac(server_mac);
        }
    }
}

pub struct Api<Backend, Storage>
where
    Backend: BackendClient,
    Storage: LocalStorage,
{
    pub backend: Backend,
    pub wizard: Arc<Mutex<WizardController<Storage>>>,
    pub forward_config: bool,
}

impl<Backend, Storage> Api<Backend, Storage>
where
    Backend: BackendClient + 'static,
    Storage: LocalStorage + 'static,
{
    pub fn new(backend: Backend, wizard: WizardController<Storage>, forward_config: bool) -> Self {
        Api {
            backend,
            wizard: Arc::new(Mutex::new(wizard)),
            forward_config,
        }
    }

    pub fn routes(cfg: &mut web::ServiceConfig) {
        cfg.route("/setup", web::get().to(Self::view))
            .route("/setup/fields", web::post().to(Self::update_fields))
            .route("/setup/next", web::post().to(Self::next_step))
            .route("/setup/back", web::post().to(Self::previous_step))
            .route("/setup/submit", web::post().to(Self::submit))
            .route(
                "/setup/notifications/{id}",
                web::delete().to(Self::dismiss_notification),
            )
            .route("/network/status", web::get().to(Self::network_status))
            .route("/network/wifi", web::post().to(Self::connect_wifi))
            .route("/network/scan", web::get().to(Self::scan_devices))
            .route("/version", web::get().to(Self::version));
    }

    pub async fn view(api: web::Data<Self>) -> impl Responder {
        debug!("view() called");
        api.respond(StatusCode::OK)
    }

    pub async fn update_fields(
        body: web::Json<FieldUpdate>,
        api: web::Data<Self>,
    ) -> impl Responder {
        debug!("update_fields() called");

        let update = body.into_inner();

        if let Err(e) = update.validate() {
            warn!("update_fields rejected: {e}");
            return HttpResponse::BadRequest().body(e.to_string());
        }

        match api.wizard() {
            Ok(mut wizard) => {
                update.apply(&mut wizard);
                HttpResponse::Ok().json(wizard.view())
            }
            Err(e) => internal_error(e),
        }
    }

    pub async fn next_step(api: web::Data<Self>) -> impl Responder {
        debug!("next_step() called");

        match api.wizard() {
            Ok(mut wizard) => {
                if !wizard.next_step() {
                    debug!("already on last step");
                }
                HttpResponse::Ok().json(wizard.view())
            }
            Err(e) => internal_error(e),
        }
    }

    pub async fn previous_step(api: web::Data<Self>) -> impl Responder {
        debug!("previous_step() called");

        match api.wizard() {
            Ok(mut wizard) => {
                if !wizard.previous_step() {
                    debug!("already on first step");
                }
                HttpResponse::Ok().json(wizard.view())
            }
            Err(e) => internal_error(e),
        }
    }

    pub async fn submit(api: web::Data<Self>) -> impl Responder {
        debug!("submit() called");

        let result = match api.wizard() {
            Ok(mut wizard) => wizard.submit(),
            Err(e) => return internal_error(e),
        };

        let setup = match result {
            Ok((setup, _)) => setup,
            Err(WizardError::Validation(_)) => return api.respond(StatusCode::BAD_REQUEST),
            Err(e) => {
                error!("submit failed: {e:#}");
                return api.respond(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        if !api.forward_config {
            return api.respond(StatusCode::OK);
        }

        let forwarded = match serde_json::to_value(&setup) {
            Ok(config) => api.backend.save_network_config(config).await,
            Err(e) => Err(e.into()),
        };

        match forwarded {
            Ok(_) => api.respond(StatusCode::OK),
            Err(e) => {
                let e = WizardError::Transport(e);
                error!("forwarding setup failed: {e:#}");

                if let Ok(mut wizard) = api.wizard() {
                    wizard.notify(Notification::error(
                        "Error",
                        "The settings could not be sent to the server.",
                    ));
                }
                api.respond(StatusCode::BAD_GATEWAY)
            }
        }
    }

    pub async fn dismiss_notification(
        path: web::Path<Uuid>,
        api: web::Data<Self>,
    ) -> impl Responder {
        debug!("dismiss_notification() called");

        let mut wizard = match api.wizard() {
            Ok(wizard) => wizard,
            Err(e) => return internal_error(e),
        };

        if wizard.dismiss_notification(path.into_inner()) {
            HttpResponse::Ok().json(wizard.view())
        } else {
            HttpResponse::NotFound().finish()
        }
    }

    pub async fn network_status(api: web::Data<Self>) -> impl Responder {
        debug!("network_status() called");
        HttpResponse::Ok().json(api.backend.check_network().await)
    }

    pub async fn connect_wifi(
        body: web::Json<WifiCredentials>,
        api: web::Data<Self>,
    ) -> impl Responder {
        debug!("connect_wifi() called: {body:?}");

        match api.backend.connect_to_wifi(body.into_inner()).await {
            Ok(response) => HttpResponse::Ok().json(response),
            Err(e) => {
                let e = WizardError::Transport(e);
                HttpResponse::BadGateway().body(e.to_string())
            }
        }
    }

    pub async fn scan_devices(api: web::Data<Self>) -> impl Responder {
        debug!("scan_devices() called");
        HttpResponse::Ok().json(api.backend.scan_for_devices().await)
    }

    pub async fn version() -> impl Responder {
        HttpResponse::Ok().body(env!("CARGO_PKG_VERSION"))
    }

    fn wizard(&self) -> Result<MutexGuard<'_, WizardController<Storage>>, WizardError> {
        self.wizard
            .lock()
            .map_err(|_| WizardError::StateUnavailable)
    }

    fn respond(&self, status: StatusCode) -> HttpResponse {
        match self.wizard() {
            Ok(mut wizard) => HttpResponse::build(status).json(wizard.view()),
            Err(e) => internal_error(e),
        }
    }
}

fn internal_error(e: WizardError) -> HttpResponse {
    error!("{e:#}");
    HttpResponse::InternalServerError().body(e.to_string())
}
