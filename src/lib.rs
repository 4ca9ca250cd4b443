pub mod api;
pub mod backend_client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod reload;
pub mod storage;
pub mod wizard;

pub use error::WizardError;
