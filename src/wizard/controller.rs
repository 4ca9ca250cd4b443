use super::{
    model::{InputField, NetworkSetup, NetworkType, SetupState, Step},
    notification::{Notification, Notifications},
};
use crate::{
    error::WizardError,
    reload::{RELOAD_DELAY, ReloadScheduler, ScheduledReload},
    storage::LocalStorage,
};
use log::{error, info};
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// Check the state against the rules that must hold before it is persisted
pub fn validate(state: &SetupState) -> Result<(), WizardError> {
    if state.network_type == NetworkType::Wifi
        && (state.ssid.is_empty() || state.password.is_empty())
    {
        return Err(WizardError::Validation(
            "network name and password are required for wifi".to_string(),
        ));
    }

    Ok(())
}

/// Read-only projection of the wizard for the front end
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub step: Step,
    pub step_title: &'static str,
    pub inputs: Vec<InputField>,
    pub network_type: NetworkType,
    pub ssid: String,
    pub password_set: bool,
    pub server_ip: String,
    pub server_mac: String,
    pub notifications: Vec<Notification>,
}

/// Drives one wizard session: step position, form fields and submit
pub struct WizardController<S>
where
    S: LocalStorage,
{
    state: SetupState,
    storage: S,
    reload: ReloadScheduler,
    notifications: Notifications,
}

impl<S> WizardController<S>
where
    S: LocalStorage,
{
    pub fn new(storage: S, reload: ReloadScheduler) -> Self {
        Self {
            state: SetupState::default(),
            storage,
            reload,
            notifications: Notifications::default(),
        }
    }

    pub fn state(&self) -> &SetupState {
        &self.state
    }

    #[cfg(test)]
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn set_network_type(&mut self, network_type: NetworkType) {
        self.state.network_type = network_type;
    }

    pub fn set_ssid(&mut self, ssid: impl Into<String>) {
        self.state.ssid = ssid.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.state.password = password.into();
    }

    pub fn set_server_ip(&mut self, server_ip: impl Into<String>) {
        self.state.server_ip = server_ip.into();
    }

    pub fn set_server_mac(&mut self, server_mac: impl Into<String>) {
        self.state.server_mac = server_mac.into();
    }

    /// Advance one step, returns false on the last step
    pub fn next_step(&mut self) -> bool {
        match self.state.step.next() {
            Some(step) => {
                self.state.step = step;
                true
            }
            None => false,
        }
    }

    /// Go back one step, returns false on the first step
    pub fn previous_step(&mut self) -> bool {
        match self.state.step.previous() {
            Some(step) => {
                self.state.step = step;
                true
            }
            None => false,
        }
    }

    /// Validate and persist the setup, then schedule the reload
    ///
    /// Nothing is written if validation fails and no reload is scheduled if
    /// writing fails. Either way an error notification is pushed.
    pub fn submit(&mut self) -> Result<(NetworkSetup, ScheduledReload), WizardError> {
        if let Err(e) = validate(&self.state) {
            info!("submit rejected: {e}");
            self.notify(Notification::error(
                "Error",
                "Please enter the network name and password.",
            ));
            return Err(e);
        }

        let setup = NetworkSetup::from(&self.state);

        if let Err(e) = setup.store(&self.storage) {
            error!("setup error: {e:#}");
            self.notify(Notification::error(
                "Error",
                "An error occurred while saving the settings.",
            ));
            return Err(WizardError::Persistence(e));
        }

        self.notify(Notification::success(
            "Settings saved",
            "The system will restart with the new settings.",
        ));

        Ok((setup, self.reload.schedule(RELOAD_DELAY)))
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn dismiss_notification(&mut self, id: Uuid) -> bool {
        self.notifications.dismiss(id)
    }

    pub fn view(&mut self) -> WizardView {
        let notifications = self.notifications.active(Instant::now()).to_vec();

        WizardView {
            step: self.state.step,
            step_title: self.state.step.title(),
            inputs: self.state.step.inputs(self.state.network_type),
            network_type: self.state.network_type,
            ssid: self.state.ssid.clone(),
            password_set: !self.state.password.is_empty(),
            server_ip: self.state.server_ip.clone(),
            server_mac: self.state.server_mac.clone(),
            notifications,
        }
    }
}
