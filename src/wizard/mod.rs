//! First-run setup wizard
//!
//! The wizard walks through three fixed steps (network test, settings,
//! device scan), keeps the form fields of the current session and persists
//! them on submit. Everything here is synchronous; the HTTP layer owns the
//! controller and talks to the backend around it.

pub mod controller;
pub mod model;
pub mod notification;

pub use controller::{WizardController, WizardView, validate};
pub use model::{InputField, NetworkSetup, NetworkType, SetupState, Step};
pub use notification::{Notification, NotificationStatus, Notifications};
