//! Process-wide registry of versioned functions.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use once_cell::sync::Lazy;

use crate::error::{Result, VersionError};
use crate::identity::Identity;
use crate::variants::VariantDirectory;

struct Entry {
    directory: Arc<dyn VariantDirectory>,
    pin: Option<String>,
}

/// Mapping from identity to its variant directory, plus the process-wide
/// variant pins.
///
/// One registration per identity, enforced at bind time. Registration is
/// expected to finish during single-threaded startup before concurrent
/// dispatch begins; the map itself additionally keeps concurrent
/// registration of distinct keys safe.
pub struct Registry {
    entries: DashMap<Identity, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Bind a directory under its identity. The first binding wins; a
    /// second attempt under the same identity is an error and leaves the
    /// existing binding untouched.
    pub fn bind(&self, directory: Arc<dyn VariantDirectory>) -> Result<()> {
        let identity = directory.identity().clone();
        match self.entries.entry(identity.clone()) {
            MapEntry::Occupied(_) => Err(VersionError::DuplicateRegistration(identity)),
            MapEntry::Vacant(slot) => {
                tracing::debug!(target: "vfn::registry", "registered versioned function {}", identity);
                slot.insert(Entry { directory, pin: None });
                Ok(())
            }
        }
    }

    /// Directory bound to `identity`, if any. A missing key is not an
    /// error here; callers decide whether it is one.
    pub fn lookup(&self, identity: &Identity) -> Option<Arc<dyn VariantDirectory>> {
        self.entries.get(identity).map(|entry| entry.directory.clone())
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.entries.contains_key(identity)
    }

    /// All registered identities, in no particular order.
    pub fn identities(&self) -> Vec<Identity> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Process-wide pinned variant for `identity`, if one is set.
    ///
    /// Dispatch consults the pin only after the calling thread's scope
    /// stack yields nothing: an active scope always wins over the pin.
    pub fn pinned_variant(&self, identity: &Identity) -> Option<String> {
        self.entries.get(identity).and_then(|entry| entry.pin.clone())
    }

    /// Pin `identity` to a variant process-wide, or clear the pin with
    /// `None` (an empty name also clears).
    ///
    /// Unknown names are rejected here rather than at the next dispatch.
    pub fn pin(&self, identity: &Identity, name: Option<&str>) -> Result<()> {
        let mut entry = self
            .entries
            .get_mut(identity)
            .ok_or_else(|| VersionError::NotRegistered(identity.clone()))?;
        match name.filter(|n| !n.is_empty()) {
            Some(n) => {
                if !entry.directory.has_variant(n) {
                    return Err(VersionError::UnknownVariant {
                        identity: identity.clone(),
                        name: n.to_string(),
                    });
                }
                tracing::debug!(target: "vfn::registry", "pinned {} to version {}", identity, n);
                entry.pin = Some(n.to_string());
            }
            None => {
                tracing::debug!(target: "vfn::registry", "cleared pin for {}", identity);
                entry.pin = None;
            }
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("identities", &self.identities()).finish()
    }
}

static GLOBAL_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

/// Shared handle to the process-global registry used by
/// [`versioned`](crate::dispatch::versioned).
pub fn global() -> Arc<Registry> {
    GLOBAL_REGISTRY.clone()
}
