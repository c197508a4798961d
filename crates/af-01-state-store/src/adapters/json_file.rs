use crate::codec;
use crate::domain::{AttesterRecord, RewardsSnapshot};
use crate::error::PersistenceError;
use crate::ports::{Decoded, StatePersistence};
use shared_types::{now_millis, NetworkName};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

const ATTESTERS_FILE: &str = "attesters.json";
const REWARDS_FILE: &str = "rewards.json";

/// JSON-file persistence, one directory per network.
///
/// Layout: `<root>/<network>/attesters.json` and `<root>/<network>/rewards.json`.
/// Writes go through a temp file and a rename so a crash mid-write never
/// leaves a truncated file behind.
pub struct JsonFilePersistence {
    root: PathBuf,
}

impl JsonFilePersistence {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn attesters_path(&self, network: &NetworkName) -> PathBuf {
        self.root.join(network.as_str()).join(ATTESTERS_FILE)
    }

    pub fn rewards_path(&self, network: &NetworkName) -> PathBuf {
        self.root.join(network.as_str()).join(REWARDS_FILE)
    }

    fn read_optional(path: &Path) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!("[store] Read {} ({} bytes)", path.display(), content.len());
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[store] No existing state file at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(PersistenceError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Move an unreadable file aside so the next flush does not overwrite it.
    fn quarantine(path: &Path) {
        let target = path.with_extension(format!("json.corrupt-{}", now_millis()));
        match std::fs::rename(path, &target) {
            Ok(()) => error!(
                "[store] Corrupt state file moved to {}",
                target.display()
            ),
            Err(e) => error!(
                "[store] Failed to quarantine corrupt state file {}: {}",
                path.display(),
                e
            ),
        }
    }

    fn write_atomic(path: &Path, content: &str) -> Result<(), PersistenceError> {
        use std::io::Write;

        let io_err = |e: std::io::Error| PersistenceError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let temp_path = path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(content.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        std::fs::rename(&temp_path, path).map_err(io_err)?;
        Ok(())
    }

    fn load_with<T>(
        path: &Path,
        decode: impl FnOnce(&str, &str) -> Result<Decoded<T>, PersistenceError>,
    ) -> Result<Decoded<T>, PersistenceError> {
        let Some(raw) = Self::read_optional(path)? else {
            return Ok(Decoded::default());
        };
        match decode(&path.display().to_string(), &raw) {
            Err(err @ PersistenceError::Corrupt { .. }) => {
                Self::quarantine(path);
                Err(err)
            }
            other => other,
        }
    }
}

impl StatePersistence for JsonFilePersistence {
    fn load_attesters(
        &self,
        network: &NetworkName,
    ) -> Result<Decoded<AttesterRecord>, PersistenceError> {
        Self::load_with(&self.attesters_path(network), |path, raw| {
            codec::decode_attesters(network, path, raw)
        })
    }

    fn save_attesters(
        &self,
        network: &NetworkName,
        records: &[AttesterRecord],
    ) -> Result<(), PersistenceError> {
        let content = codec::encode_attesters(records)?;
        Self::write_atomic(&self.attesters_path(network), &content)
    }

    fn load_rewards(
        &self,
        network: &NetworkName,
    ) -> Result<Decoded<RewardsSnapshot>, PersistenceError> {
        Self::load_with(&self.rewards_path(network), |path, raw| {
            codec::decode_rewards(network, path, raw)
        })
    }

    fn save_rewards(
        &self,
        network: &NetworkName,
        snapshots: &[RewardsSnapshot],
    ) -> Result<(), PersistenceError> {
        let content = codec::encode_rewards(snapshots)?;
        Self::write_atomic(&self.rewards_path(network), &content)
    }
}
