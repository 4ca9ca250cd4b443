use actix_cors::Cors;
use actix_files::Files;
use actix_server::ServerHandle;
use actix_web::{App, HttpServer, web::Data};
use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use log::{debug, error, info, warn};
use setup_wizard::{
    api::Api,
    backend_client::BackendGateway,
    config::AppConfig,
    reload::ReloadScheduler,
    storage::FileStorage,
    wizard::{NetworkSetup, WizardController},
};
use std::io::Write;
use tokio::signal::unix::{SignalKind, signal};

type UiApi = Api<BackendGateway<FileStorage>, FileStorage>;

enum ShutdownReason {
    Reload,
    Shutdown,
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownReason::Reload => write!(f, "reloading with new settings"),
            ShutdownReason::Shutdown => write!(f, "shutting down"),
        }
    }
}

#[actix_web::main]
async fn main() {
    if let Err(e) = run().await {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    initialize();

    let config = AppConfig::get();
    let storage = FileStorage::new(&config.storage.data_dir);
    let backend = BackendGateway::new(&config.backend.base_url, storage.clone())
        .context("failed to create backend gateway")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    while let ShutdownReason::Reload =
        run_until_shutdown(&backend, &storage, &mut sigterm).await?
    {}

    Ok(())
}

fn initialize() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));
}

async fn run_until_shutdown(
    backend: &BackendGateway<FileStorage>,
    storage: &FileStorage,
    sigterm: &mut tokio::signal::unix::Signal,
) -> Result<ShutdownReason> {
    info!("starting server");

    match NetworkSetup::load(storage) {
        Ok(Some(setup)) => info!("stored network setup: {:?}", setup.network_type),
        Ok(None) => info!("no stored network setup, starting first-run wizard"),
        Err(e) => warn!("failed to read stored network setup: {e:#}"),
    }

    // reloads scheduled in this session must not outlive it
    let (reload, mut reload_rx) = ReloadScheduler::new();
    let wizard = WizardController::new(storage.clone(), reload.clone());
    let api = UiApi::new(
        backend.clone(),
        wizard,
        AppConfig::get().backend.forward_config,
    );

    let (server_handle, server_task) = run_server(api)?;

    let reason = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            debug!("ctrl-c received");
            ShutdownReason::Shutdown
        },
        _ = sigterm.recv() => {
            debug!("SIGTERM received");
            ShutdownReason::Shutdown
        },
        _ = reload_rx.recv() => {
            debug!("reload requested");
            ShutdownReason::Reload
        },
        result = server_task => {
            match result {
                Ok(Ok(())) => debug!("server stopped normally"),
                Ok(Err(e)) => error!("server stopped with error: {e}"),
                Err(e) => error!("server task panicked: {e}"),
            }
            ShutdownReason::Shutdown
        },
    };

    info!("{reason}");

    reload.cancel_pending();
    server_handle.stop(true).await;

    Ok(reason)
}

fn run_server(
    api: UiApi,
) -> Result<(
    ServerHandle,
    tokio::task::JoinHandle<Result<(), std::io::Error>>,
)> {
    let config = AppConfig::get();
    let ui_port = config.ui.port;
    let static_dir = config.ui.static_dir.clone();
    let api = Data::new(api);

    if !static_dir.is_dir() {
        warn!("static directory {static_dir:?} not found, serving api only");
    }

    let server = HttpServer::new(move || {
        let app = App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_header()
                    .allowed_methods(vec!["GET", "POST", "DELETE"])
                    .max_age(3600),
            )
            .app_data(api.clone())
            .configure(UiApi::routes);

        if static_dir.is_dir() {
            app.service(Files::new("/static", &static_dir).index_file("index.html"))
        } else {
            app
        }
    })
    .bind(format!("0.0.0.0:{ui_port}"))
    .context("failed to bind server")?
    .disable_signals()
    .run();

    Ok((server.handle(), tokio::spawn(server)))
}
