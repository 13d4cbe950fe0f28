use super::category::{CategoryConfigEntry, CategoryRecord, UserFieldPolicy};
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read category config '{path}': '{source}'")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed category config '{origin}': '{source}'")]
    Malformed {
        origin: String,
        source: serde_json::Error,
    },
}

/// One layer of category configuration.
#[derive(Debug, Clone, Default)]
pub enum ConfigSource {
    /// The layer does not exist. Loading it yields no categories.
    #[default]
    Absent,
    /// A JSON list of category records. `origin` names the source in error messages.
    Json { origin: String, text: String },
    /// Records that were already decoded.
    Records(Vec<CategoryRecord>),
}

impl ConfigSource {
    pub fn json(text: impl Into<String>) -> Self {
        ConfigSource::Json {
            origin: "<inline>".to_string(),
            text: text.into(),
        }
    }

    /// Reads a JSON config file. A file that does not exist is an absent source, any
    /// other read failure is an error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(text) => Ok(ConfigSource::Json {
                origin: path.display().to_string(),
                text,
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Ok(ConfigSource::Absent)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ConfigSource::Absent)
    }

    fn into_records(self) -> Result<Vec<CategoryRecord>, ConfigError> {
        match self {
            ConfigSource::Absent => Ok(Vec::new()),
            ConfigSource::Json { origin, text } => serde_json::from_str(&text)
                .map_err(|source| ConfigError::Malformed { origin, source }),
            ConfigSource::Records(records) => Ok(records),
        }
    }
}

/// The merged, read-only category configuration of a client.
#[derive(Debug, Clone, Default)]
pub struct CategoryConfigStore {
    entries: Vec<CategoryConfigEntry>,
    index: HashMap<String, usize>,
    has_user_source: bool,
}

impl CategoryConfigStore {
    /// Loads and merges the cache and user layers, importing user-only fields.
    pub fn load(cache: ConfigSource, user: ConfigSource) -> Result<Self, ConfigError> {
        Self::load_with(cache, user, UserFieldPolicy::default())
    }

    /// Loads and merges the cache and user layers.
    ///
    /// Categories only one layer knows are taken verbatim. Categories both layers know are
    /// merged with the user side winning (see [`CategoryConfigEntry`]). The resulting order
    /// is cache order followed by the user-only categories in user order.
    ///
    /// # Returns
    ///
    /// * `Ok(CategoryConfigStore)` - The merged configuration.
    /// * `Err(ConfigError)` - A present source could not be read or decoded.
    pub fn load_with(
        cache: ConfigSource,
        user: ConfigSource,
        policy: UserFieldPolicy,
    ) -> Result<Self, ConfigError> {
        let has_user_source = !user.is_absent();

        let mut store = Self {
            has_user_source,
            ..Self::default()
        };

        for entry in unique_entries(cache.into_records()?) {
            store.push(entry);
        }

        for user_entry in unique_entries(user.into_records()?) {
            match store.index.get(user_entry.name()).copied() {
                Some(position) => store.entries[position].merge(user_entry, policy),
                None => store.push(user_entry),
            }
        }

        tracing::debug!(
            categories = store.entries.len(),
            has_user_source,
            "category configuration loaded"
        );

        Ok(store)
    }

    fn push(&mut self, entry: CategoryConfigEntry) {
        self.index.insert(entry.name().to_string(), self.entries.len());
        self.entries.push(entry);
    }

    /// Whether a user layer was supplied at all (even an empty one).
    pub fn has_user_source(&self) -> bool {
        self.has_user_source
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CategoryConfigEntry> {
        self.entries.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Looks a category up by its canonical name.
    pub fn get(&self, name: &str) -> Option<&CategoryConfigEntry> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    /// Looks a category up by its `cli_name`. The first match in store order wins.
    pub fn get_by_alias(&self, cli_name: &str) -> Option<&CategoryConfigEntry> {
        self.entries
            .iter()
            .find(|entry| entry.cli_name() == Some(cli_name))
    }

    /// Looks a category up by canonical name first, then by alias.
    pub fn resolve(&self, name_or_alias: &str) -> Option<&CategoryConfigEntry> {
        self.get(name_or_alias)
            .or_else(|| self.get_by_alias(name_or_alias))
    }

    /// Translates user-facing keys into API field names for `category`.
    ///
    /// Every `(key, value)` pair whose value is truthy is emitted under each API field
    /// whose `param` equals `key`. Keys without a matching field are dropped.
    ///
    /// Without a user layer, or for a category the store does not know, the fields are
    /// returned unchanged so raw API field names keep working.
    pub fn remap(&self, category: &str, fields: &Map<String, Value>) -> Map<String, Value> {
        if !self.has_user_source {
            return fields.clone();
        }

        let Some(entry) = self.get(category) else {
            tracing::debug!(category, "no configuration for category, fields passed through");
            return fields.clone();
        };

        let mut out = Map::new();

        for (key, value) in fields {
            if !is_truthy(value) {
                continue;
            }

            let mut matched = false;
            for api_name in entry.api_names_for(key) {
                out.insert(api_name.to_string(), value.clone());
                matched = true;
            }

            if !matched {
                tracing::debug!(category, key = %key, "dropping field without a matching param");
            }
        }

        out
    }
}

/// Turns records into entries, keeping the first record of every name.
fn unique_entries(records: Vec<CategoryRecord>) -> Vec<CategoryConfigEntry> {
    let mut seen = std::collections::HashSet::new();

    records
        .into_iter()
        .filter(|record| seen.insert(record.name.clone()))
        .map(CategoryConfigEntry::from)
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
