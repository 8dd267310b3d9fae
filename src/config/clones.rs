use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };
use std::collections::BTreeMap;
use std::fs;
use std::path::{ Path, PathBuf };
use thiserror::Error;
use log::{ info, warn };

pub const LOYALTY_CORE_FILE: &str = "loyalty-core.json";
pub const CLONES_DIR: &str = "clones";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Owner record. The security key is only ever compared, never sent back out.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LoyaltyCore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing)]
    pub security_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CloneConfig {
    pub name: String,
    pub role: String,
    pub model: String,
    pub temperature: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CloneConfig {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        model: impl Into<String>,
        temperature: f64
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            model: model.into(),
            temperature,
            extra: Map::new(),
        }
    }

    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Read-only configuration of the clone orchestrator, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    loyalty: LoyaltyCore,
    clones: BTreeMap<String, CloneConfig>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl OrchestratorConfig {
    /// Loads `loyalty-core.json` and `clones/*.json` from `dir`. Missing
    /// inputs yield empty records; any unreadable or malformed file fails the
    /// whole load. Clone files are applied in path order, so for duplicate
    /// names the lexicographically last file wins.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();

        let loyalty_path = dir.join(LOYALTY_CORE_FILE);
        let loyalty = if loyalty_path.is_file() {
            read_json::<LoyaltyCore>(&loyalty_path)?
        } else {
            warn!("No loyalty core at '{}', using an empty record", loyalty_path.display());
            LoyaltyCore::default()
        };

        let clones_dir = dir.join(CLONES_DIR);
        let mut paths = Vec::new();
        if clones_dir.is_dir() {
            let entries = fs::read_dir(&clones_dir).map_err(|source| ConfigError::Io {
                path: clones_dir.clone(),
                source,
            })?;
            for entry in entries {
                let entry = entry.map_err(|source| ConfigError::Io {
                    path: clones_dir.clone(),
                    source,
                })?;
                let path = entry.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                    paths.push(path);
                }
            }
        } else {
            warn!("No clones directory at '{}'", clones_dir.display());
        }
        paths.sort();

        let mut config = Self { loyalty, clones: BTreeMap::new() };
        for path in paths {
            let clone: CloneConfig = read_json(&path)?;
            info!("Loaded clone '{}' from {}", clone.name, path.display());
            config.insert(clone);
        }

        info!(
            "Orchestrator config loaded from '{}': {} clone(s)",
            dir.display(),
            config.clones.len()
        );
        Ok(config)
    }

    pub fn from_parts<I>(loyalty: LoyaltyCore, clones: I) -> Self
        where I: IntoIterator<Item = CloneConfig>
    {
        let mut config = Self { loyalty, clones: BTreeMap::new() };
        for clone in clones {
            config.insert(clone);
        }
        config
    }

    fn insert(&mut self, clone: CloneConfig) {
        let key = clone.key();
        if let Some(previous) = self.clones.insert(key.clone(), clone) {
            warn!("Clone '{}' redefined; replacing definition named '{}'", key, previous.name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&CloneConfig> {
        self.clones.get(&name.to_lowercase())
    }

    pub fn clones(&self) -> &BTreeMap<String, CloneConfig> {
        &self.clones
    }

    pub fn clone_names(&self) -> Vec<String> {
        self.clones.keys().cloned().collect()
    }

    pub fn loyalty(&self) -> &LoyaltyCore {
        &self.loyalty
    }
}
