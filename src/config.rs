//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults (builtin kinds, root kind `scroll`)
//! 2. Global config: `$XDG_CONFIG_HOME/blotree/blotree.toml`
//! 3. Local config: `<dir>/.blotree.toml`
//! 4. Environment variables: `BLOTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::registry::builtin_definitions;
use crate::domain::{Definition, Registry};
use crate::errors::{TreeError, TreeResult};

/// Raw settings for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub root_kind: Option<String>,
    pub kinds: Option<Vec<Definition>>,
    pub disabled: Option<Vec<String>>,
}

/// Unified configuration for a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Kind of the root container
    pub root_kind: String,
    /// Kind names left out of the registry
    pub disabled: Vec<String>,
    /// Registered node kinds
    pub kinds: Vec<Definition>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_kind: "scroll".into(),
            disabled: vec![],
            kinds: builtin_definitions(),
        }
    }
}

/// Get the XDG config directory for blotree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "blotree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("blotree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".blotree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> TreeResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| TreeError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| TreeError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for pattern in overlay {
            if let Some(negated) = pattern.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(pattern.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Merge kind definitions by name: overlay entries replace same-named ones,
    /// new names are appended in overlay order.
    pub fn merge_kinds(base: &[Definition], overlay: &[Definition]) -> Vec<Definition> {
        let mut result = base.to_vec();
        for definition in overlay {
            match result.iter_mut().find(|d| d.name == definition.name) {
                Some(existing) => *existing = definition.clone(),
                None => result.push(definition.clone()),
            }
        }
        result
    }

    /// Merge overlay config onto self (base).
    ///
    /// - root kind: overlay wins if Some
    /// - kinds: merged by name
    /// - disabled: union with negation support
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            root_kind: overlay
                .root_kind
                .clone()
                .unwrap_or_else(|| self.root_kind.clone()),
            kinds: overlay
                .kinds
                .as_ref()
                .map(|o| Self::merge_kinds(&self.kinds, o))
                .unwrap_or_else(|| self.kinds.clone()),
            disabled: overlay
                .disabled
                .as_ref()
                .map(|o| Self::merge_array(&self.disabled, o))
                .unwrap_or_else(|| self.disabled.clone()),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    ///
    /// The builtin kinds are only a starting point; a global `kinds` list is
    /// the full baseline.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            root_kind: global
                .root_kind
                .clone()
                .unwrap_or_else(|| self.root_kind.clone()),
            kinds: global.kinds.clone().unwrap_or_else(|| self.kinds.clone()),
            disabled: global
                .disabled
                .clone()
                .unwrap_or_else(|| self.disabled.clone()),
        }
    }

    /// Load settings with layered precedence from the XDG global file,
    /// `<local_dir>/.blotree.toml` and `BLOTREE_*` variables.
    pub fn load(local_dir: Option<&Path>) -> TreeResult<Self> {
        let global = global_config_path();
        Self::load_from(global.as_deref(), local_dir)
    }

    /// Like [`Settings::load`] with an explicit global config file.
    #[instrument(level = "debug")]
    pub fn load_from(global_path: Option<&Path>, local_dir: Option<&Path>) -> TreeResult<Self> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Load global config (REPLACES defaults)
        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                let raw = load_raw_settings(global_path)?;
                current = current.apply_global(&raw);
            }
        }

        // 3. Load and merge local config
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Apply environment variables (replaces - explicit override)
        Self::apply_env_overrides(current)
    }

    /// Apply BLOTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> TreeResult<Self> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("BLOTREE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("disabled")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("root_kind") {
            settings.root_kind = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("disabled") {
            settings.disabled = val;
        }

        Ok(settings)
    }

    /// Build the kind registry, leaving out disabled kinds.
    ///
    /// The root kind must be registered and able to hold children.
    pub fn registry(&self) -> TreeResult<Registry> {
        let enabled = self.kinds.iter().filter(|definition| {
            let disabled = self.disabled.contains(&definition.name);
            if disabled {
                debug!("kind {} disabled", definition.name);
            }
            !disabled
        });
        let registry = Registry::from_definitions(enabled.cloned())?;
        match registry.query(&self.root_kind) {
            Some(root) if root.variant.is_container() => Ok(registry),
            Some(_) => Err(TreeError::Config {
                message: format!("root kind {} cannot hold children", self.root_kind),
            }),
            None => Err(TreeError::Config {
                message: format!("root kind {} is not registered", self.root_kind),
            }),
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> TreeResult<String> {
        toml::to_string_pretty(self).map_err(|e| TreeError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# blotree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/blotree/blotree.toml  (defines your baseline)
#   Local:  <dir>/.blotree.toml             (document-specific additions)
#   Env:    BLOTREE_* environment variables  (explicit overrides)
#
# Global `kinds` REPLACE the builtin kinds; local `kinds` are merged by name.
# Local `disabled` UNIONS with global; use "!name" to re-enable a kind.

# Kind of the root container
# root_kind = "scroll"

# disabled = ["image"]

# [[kinds]]
# name = "underline"
# tag = "U"
# scope = "inline"
# variant = "format"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> TreeError {
    TreeError::Config {
        message: e.to_string(),
    }
}
