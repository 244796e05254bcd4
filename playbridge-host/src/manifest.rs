//! Content manifest: which externals a piece of content expects.
//!
//! Requirements come from two places: the keys of `environment.external`
//! and global scripts whose module path contains a known keyword segment.

use crate::error::{BridgeError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Maps a module path segment to the external it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleKeyword {
    pub keyword: &'static str,
    pub external: &'static str,
}

pub const DEFAULT_MODULE_KEYWORDS: &[ModuleKeyword] = &[
    ModuleKeyword {
        keyword: "coe",
        external: "coe",
    },
    ModuleKeyword {
        keyword: "coe-messages",
        external: "coe",
    },
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentManifest {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub global_scripts: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Environment {
    /// External name → declared version or options. Only the keys matter here.
    #[serde(default)]
    pub external: BTreeMap<String, Value>,
}

impl ContentManifest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BridgeError::Manifest(e.to_string()))
    }

    /// Required externals using [`DEFAULT_MODULE_KEYWORDS`].
    pub fn required_externals(&self) -> BTreeSet<String> {
        self.required_externals_with(DEFAULT_MODULE_KEYWORDS)
    }

    pub fn required_externals_with(&self, keywords: &[ModuleKeyword]) -> BTreeSet<String> {
        let mut required: BTreeSet<String> =
            self.environment.external.keys().cloned().collect();

        for script in &self.global_scripts {
            for segment in script.split('/') {
                if let Some(kw) = keywords.iter().find(|kw| kw.keyword == segment) {
                    required.insert(kw.external.to_string());
                }
            }
        }
        required
    }
}
