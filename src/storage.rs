use anyhow::{Context, Result, ensure};
use std::{
    fs,
    io::ErrorKind,
    path::PathBuf,
};

/// Key of the persisted network setup written by the wizard
pub const NETWORK_SETUP_KEY: &str = "networkSetup";

/// Key of the bearer token used for backend requests (provisioned externally)
pub const AUTH_TOKEN_KEY: &str = "AGENT_API_KEY";

/// Durable key-value store shared by the wizard and the backend gateway
pub trait LocalStorage {
    /// Read the value stored under `key`, `None` if there is none
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Create or overwrite the value stored under `key`
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// File backed storage: every key is a file in `dir`
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn item_path(&self, key: &str) -> Result<PathBuf> {
        ensure!(!key.is_empty(), "storage key is empty");
        ensure!(
            !key.contains(['/', '\\']) && key != "." && key != "..",
            "invalid storage key: {key}"
        );

        Ok(self.dir.join(key))
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key)?;

        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context(format!("failed to read {path:?}")),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key)?;
        let tmp_path = self.dir.join(format!(".{key}.tmp"));

        fs::create_dir_all(&self.dir)
            .context(format!("failed to create storage directory {:?}", self.dir))?;
        fs::write(&tmp_path, value).context(format!("failed to write {tmp_path:?}"))?;
        fs::rename(&tmp_path, &path)
            .context(format!("failed to rename {tmp_path:?} to {path:?}"))
    }
}
