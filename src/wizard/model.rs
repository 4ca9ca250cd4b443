use crate::storage::{LocalStorage, NETWORK_SETUP_KEY};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Wizard steps, in the only order they can be visited
#[derive(Clone, Copy, Debug, Default, Deserialize_repr, Eq, PartialEq, Serialize_repr)]
#[repr(u8)]
pub enum Step {
    #[default]
    NetworkTest = 1,
    Settings = 2,
    DeviceScan = 3,
}

impl Step {
    pub fn next(self) -> Option<Self> {
        match self {
            Step::NetworkTest => Some(Step::Settings),
            Step::Settings => Some(Step::DeviceScan),
            Step::DeviceScan => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            Step::NetworkTest => None,
            Step::Settings => Some(Step::NetworkTest),
            Step::DeviceScan => Some(Step::Settings),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::NetworkTest => "Network connection test",
            Step::Settings => "Network settings",
            Step::DeviceScan => "Device scan",
        }
    }

    /// Form inputs shown on this step, in display order
    ///
    /// Only the settings step takes input; wifi credentials are asked for
    /// only when the wifi network type is selected.
    pub fn inputs(self, network_type: NetworkType) -> Vec<InputField> {
        match (self, network_type) {
            (Step::Settings, NetworkType::Ethernet) => vec![
                InputField::NetworkType,
                InputField::ServerIp,
                InputField::ServerMac,
            ],
            (Step::Settings, NetworkType::Wifi) => vec![
                InputField::NetworkType,
                InputField::Ssid,
                InputField::Password,
                InputField::ServerIp,
                InputField::ServerMac,
            ],
            (Step::NetworkTest | Step::DeviceScan, _) => vec![],
        }
    }
}

/// Form input the front end renders for the current step
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InputField {
    NetworkType,
    Ssid,
    Password,
    ServerIp,
    ServerMac,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    #[default]
    Ethernet,
    Wifi,
}

/// Form state of one wizard session
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SetupState {
    pub step: Step,
    pub network_type: NetworkType,
    pub ssid: String,
    pub password: String,
    pub server_ip: String,
    pub server_mac: String,
}

/// Persisted subset of [`SetupState`], read by the device on boot
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSetup {
    pub network_type: NetworkType,
    pub ssid: String,
    pub password: String,
    pub server_ip: String,
    pub server_mac: String,
}

impl From<&SetupState> for NetworkSetup {
    fn from(state: &SetupState) -> Self {
        Self {
            network_type: state.network_type,
            ssid: state.ssid.clone(),
            password: state.password.clone(),
            server_ip: state.server_ip.clone(),
            server_mac: state.server_mac.clone(),
        }
    }
}

impl NetworkSetup {
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize network setup")
    }

    pub fn decode(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse network setup")
    }

    /// Load the setup stored by a previous wizard session, if any
    pub fn load<S: LocalStorage>(storage: &S) -> Result<Option<Self>> {
        storage
            .get_item(NETWORK_SETUP_KEY)?
            .map(|json| Self::decode(&json))
            .transpose()
    }

    pub fn store<S: LocalStorage>(&self, storage: &S) -> Result<()> {
        storage.set_item(NETWORK_SETUP_KEY, &self.encode()?)
    }
}
