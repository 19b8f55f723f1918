#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative in-memory content catalog for the seed scanner.
//!
//! The catalog is a read-only snapshot of the host's content definitions,
//! loaded once per session from a TOML document and threaded explicitly into
//! every system through the [`ContentCatalog`] trait.

use std::{
    collections::{btree_map::Entry, BTreeMap},
    fs,
    path::{Path, PathBuf},
};

use seed_scanner_core::{
    ApplianceId, ApplianceRecord, ContentCatalog, SettingId, SettingRecord, UnlockId,
    UnlockPackId, UnlockPackRecord, UnlockRecord,
};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a catalog document.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The catalog document is not valid TOML for the expected schema.
    #[error("failed to parse catalog document")]
    Parse(#[from] toml::de::Error),
    /// Two records of the same kind share an identifier.
    #[error("duplicate {kind} identifier {id}")]
    DuplicateId {
        /// Kind of record that was duplicated.
        kind: &'static str,
        /// Identifier that appeared more than once.
        id: i32,
    },
    /// A record names an unlock pack that the catalog does not define.
    #[error("{referenced_by} references unknown unlock pack {pack}")]
    UnknownUnlockPack {
        /// Pack identifier that could not be resolved.
        pack: UnlockPackId,
        /// Description of the referencing record.
        referenced_by: String,
    },
}

/// Serialised layout of a catalog document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogDocument {
    default_unlock_pack: Option<UnlockPackId>,
    references: References,
    settings: Vec<SettingRecord>,
    unlock_packs: Vec<UnlockPackRecord>,
    unlocks: Vec<UnlockRecord>,
    appliances: Vec<ApplianceRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct References {
    customer_count_exceptions: Vec<UnlockId>,
}

/// Read-only snapshot of content definitions keyed by identifier.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    default_unlock_pack: Option<UnlockPackId>,
    customer_count_exceptions: Vec<UnlockId>,
    settings: BTreeMap<SettingId, SettingRecord>,
    unlock_packs: BTreeMap<UnlockPackId, UnlockPackRecord>,
    unlocks: BTreeMap<UnlockId, UnlockRecord>,
    appliances: BTreeMap<ApplianceId, ApplianceRecord>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = toml::from_str(contents)?;
        Self::from_document(document)
    }

    /// Reads and parses the catalog stored at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Adds an unlock definition, rejecting duplicates.
    pub fn insert_unlock(&mut self, record: UnlockRecord) -> Result<(), CatalogError> {
        insert_unique(&mut self.unlocks, record.id, record, "unlock", |id| id.get())
    }

    /// Adds an appliance definition, rejecting duplicates.
    pub fn insert_appliance(&mut self, record: ApplianceRecord) -> Result<(), CatalogError> {
        insert_unique(&mut self.appliances, record.id, record, "appliance", |id| {
            id.get()
        })
    }

    /// Adds a restaurant setting, rejecting duplicates.
    pub fn insert_setting(&mut self, record: SettingRecord) -> Result<(), CatalogError> {
        insert_unique(&mut self.settings, record.id, record, "setting", |id| id.get())
    }

    /// Adds an unlock pack, rejecting duplicates.
    pub fn insert_unlock_pack(&mut self, record: UnlockPackRecord) -> Result<(), CatalogError> {
        insert_unique(&mut self.unlock_packs, record.id, record, "unlock pack", |id| {
            id.get()
        })
    }

    fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for record in document.unlocks {
            catalog.insert_unlock(record)?;
        }
        for record in document.appliances {
            catalog.insert_appliance(record)?;
        }
        for record in document.unlock_packs {
            catalog.insert_unlock_pack(record)?;
        }
        for record in document.settings {
            catalog.insert_setting(record)?;
        }
        catalog.customer_count_exceptions = document.references.customer_count_exceptions;
        catalog.default_unlock_pack = document.default_unlock_pack;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if let Some(pack) = self.default_unlock_pack {
            if !self.unlock_packs.contains_key(&pack) {
                return Err(CatalogError::UnknownUnlockPack {
                    pack,
                    referenced_by: "default_unlock_pack".to_owned(),
                });
            }
        }

        for setting in self.settings.values() {
            if let Some(pack) = setting.unlock_pack {
                if !self.unlock_packs.contains_key(&pack) {
                    return Err(CatalogError::UnknownUnlockPack {
                        pack,
                        referenced_by: format!("setting {}", setting.id),
                    });
                }
            }
        }

        for pack in self.unlock_packs.values() {
            for entry in &pack.entries {
                if !self.unlocks.contains_key(&entry.unlock) {
                    tracing::warn!(
                        pack = pack.id.get(),
                        unlock = entry.unlock.get(),
                        "unlock pack entry references an unknown unlock"
                    );
                }
            }
        }

        Ok(())
    }
}

fn insert_unique<K: Ord + Copy, V>(
    map: &mut BTreeMap<K, V>,
    key: K,
    value: V,
    kind: &'static str,
    raw: impl Fn(K) -> i32,
) -> Result<(), CatalogError> {
    match map.entry(key) {
        Entry::Occupied(_) => Err(CatalogError::DuplicateId { kind, id: raw(key) }),
        Entry::Vacant(slot) => {
            let _ = slot.insert(value);
            Ok(())
        }
    }
}

impl ContentCatalog for Catalog {
    fn unlock(&self, id: UnlockId) -> Option<&UnlockRecord> {
        self.unlocks.get(&id)
    }

    fn appliance(&self, id: ApplianceId) -> Option<&ApplianceRecord> {
        self.appliances.get(&id)
    }

    fn setting(&self, id: SettingId) -> Option<&SettingRecord> {
        self.settings.get(&id)
    }

    fn unlock_pack(&self, id: UnlockPackId) -> Option<&UnlockPackRecord> {
        self.unlock_packs.get(&id)
    }

    fn default_unlock_pack(&self) -> Option<&UnlockPackRecord> {
        self.default_unlock_pack
            .and_then(|id| self.unlock_packs.get(&id))
    }

    fn unlocks(&self) -> Vec<&UnlockRecord> {
        self.unlocks.values().collect()
    }

    fn appliances(&self) -> Vec<&ApplianceRecord> {
        self.appliances.values().collect()
    }

    fn settings(&self) -> Vec<&SettingRecord> {
        self.settings.values().collect()
    }

    fn customer_count_exceptions(&self) -> &[UnlockId] {
        &self.customer_count_exceptions
    }
}

/// Query helpers used by adapters to resolve user input against a catalog.
pub mod query {
    use seed_scanner_core::{ContentCatalog, SettingRecord, UnlockRecord};

    /// Dishes that can start a run, in identifier order.
    #[must_use]
    pub fn starting_dishes(catalog: &dyn ContentCatalog) -> Vec<&UnlockRecord> {
        catalog
            .unlocks()
            .into_iter()
            .filter(|unlock| unlock.is_starting_dish())
            .collect()
    }

    /// Resolves a setting by numeric identifier or case-insensitive name.
    #[must_use]
    pub fn find_setting<'c>(catalog: &'c dyn ContentCatalog, needle: &str) -> Option<&'c SettingRecord> {
        let needle = needle.trim();
        catalog.settings().into_iter().find(|setting| {
            setting.id.to_string() == needle || setting.name.eq_ignore_ascii_case(needle)
        })
    }

    /// Resolves a starting dish by numeric identifier or case-insensitive name.
    #[must_use]
    pub fn find_starting_dish<'c>(
        catalog: &'c dyn ContentCatalog,
        needle: &str,
    ) -> Option<&'c UnlockRecord> {
        let needle = needle.trim();
        starting_dishes(catalog).into_iter().find(|dish| {
            dish.id.to_string() == needle || dish.name.eq_ignore_ascii_case(needle)
        })
    }
}
