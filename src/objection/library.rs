//! Theme-keyed objection library. The default theme is loaded eagerly at
//! startup so the common case never pays a disk round-trip mid-call;
//! other themes load lazily on first use and are cached thereafter.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, VoicebotError};
use crate::objection::entry::ObjectionEntry;

pub struct ObjectionLibrary {
    root: PathBuf,
    default_theme: String,
    cache: RwLock<HashMap<String, Arc<Vec<ObjectionEntry>>>>,
}

impl ObjectionLibrary {
    /// Load the default theme eagerly; other themes are read from
    /// `<root>/<theme>.json` on first request.
    pub fn load(root: impl Into<PathBuf>, default_theme: &str) -> Result<Self> {
        let root = root.into();
        let library = Self { root, default_theme: default_theme.to_string(), cache: RwLock::new(HashMap::new()) };
        library.theme(default_theme)?;
        Ok(library)
    }

    pub fn theme(&self, theme: &str) -> Result<Arc<Vec<ObjectionEntry>>> {
        if let Some(entries) = self.cache.read().get(theme) {
            return Ok(Arc::clone(entries));
        }
        let entries = Arc::new(self.read_theme_file(theme)?);
        self.cache.write().insert(theme.to_string(), Arc::clone(&entries));
        Ok(entries)
    }

    pub fn default_theme_entries(&self) -> Arc<Vec<ObjectionEntry>> {
        self.cache
            .read()
            .get(&self.default_theme)
            .cloned()
            .expect("default theme was loaded eagerly in load()")
    }

    fn read_theme_file(&self, theme: &str) -> Result<Vec<ObjectionEntry>> {
        let path = self.path_for(theme);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            VoicebotError::InvalidConfiguration {
                field: format!("objection_theme.{theme}"),
                reason: format!("cannot read {}: {e}", path.display()),
            }
        })?;
        serde_json::from_str(&text).map_err(|e| VoicebotError::InvalidConfiguration {
            field: format!("objection_theme.{theme}"),
            reason: format!("malformed json: {e}"),
        })
    }

    fn path_for(&self, theme: &str) -> PathBuf {
        self.root.join(format!("{theme}.json"))
    }
}
