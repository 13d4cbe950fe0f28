use serde::Deserialize;
use std::collections::BTreeMap;

/// Metadata of one category field.
///
/// The API field name is the key under which the descriptor is stored, `param` is the
/// key users write. Every member is optional so user overrides can carry just the part
/// they change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldDescriptor {
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl FieldDescriptor {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: Some(param.into()),
            ..Self::default()
        }
    }

    /// Lays `over` on top of `self`, member by member.
    fn overlay(&self, over: &FieldDescriptor) -> FieldDescriptor {
        FieldDescriptor {
            param: over.param.clone().or_else(|| self.param.clone()),
            help: over.help.clone().or_else(|| self.help.clone()),
            kind: over.kind.clone().or_else(|| self.kind.clone()),
        }
    }
}

/// A category as written in a config source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
    #[serde(default)]
    pub cli_name: Option<String>,
    #[serde(default)]
    pub params: Option<BTreeMap<String, FieldDescriptor>>,
}

/// What happens to fields a user override defines but the cache does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserFieldPolicy {
    /// Add them to the merged entry.
    #[default]
    Import,
    /// Ignore them. Older releases merged this way.
    Drop,
}

/// One category of the merged configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryConfigEntry {
    name: String,
    cli_name: Option<String>,
    fields: BTreeMap<String, FieldDescriptor>,
}

impl From<CategoryRecord> for CategoryConfigEntry {
    fn from(record: CategoryRecord) -> Self {
        Self {
            name: record.name,
            cli_name: record.cli_name,
            fields: record.params.unwrap_or_default(),
        }
    }
}

impl CategoryConfigEntry {
    /// The canonical API name (e.g. `C__CATG__MODEL`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The short alias (e.g. `g.model`).
    pub fn cli_name(&self) -> Option<&str> {
        self.cli_name.as_deref()
    }

    /// Field descriptors keyed by API field name.
    pub fn fields(&self) -> &BTreeMap<String, FieldDescriptor> {
        &self.fields
    }

    pub fn field(&self, api_name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(api_name)
    }

    /// API field names whose `param` is `key`.
    pub fn api_names_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(_, field)| field.param.as_deref() == Some(key))
            .map(|(api_name, _)| api_name.as_str())
    }

    /// Merges a user override into this (cache) entry.
    ///
    /// A non-empty user `cli_name` replaces the cached one. Fields known to both are
    /// overlaid member by member with the user side winning. Fields only the user
    /// defines are handled according to `policy`.
    pub(crate) fn merge(&mut self, user: CategoryConfigEntry, policy: UserFieldPolicy) {
        if let Some(cli_name) = user.cli_name.filter(|name| !name.is_empty()) {
            self.cli_name = Some(cli_name);
        }

        for (api_name, user_field) in user.fields {
            match self.fields.get_mut(&api_name) {
                Some(cached) => *cached = cached.overlay(&user_field),
                None if policy == UserFieldPolicy::Import => {
                    self.fields.insert(api_name, user_field);
                }
                None => {
                    tracing::debug!(
                        category = %self.name,
                        field = %api_name,
                        "dropping user field unknown to the cache"
                    );
                }
            }
        }
    }
}
