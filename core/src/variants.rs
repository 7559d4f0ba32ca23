//! Variant sets: the implementations registered for one versioned function.

use std::fmt;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::error::{Result, VersionError};
use crate::identity::Identity;

/// A selectable implementation of a versioned function.
pub type VariantFn<A, R> = Arc<dyn Fn(A) -> R + Send + Sync>;

/// Name-level view of a variant set, independent of the function signature.
///
/// The registry stores sets behind this trait so that functions with
/// different signatures share one map; scope entry and pinning validate
/// version names through it without ever touching the typed callables.
pub trait VariantDirectory: Send + Sync {
    fn identity(&self) -> &Identity;

    /// True for declared variant names and for the original's bare name.
    fn has_variant(&self, name: &str) -> bool;

    /// Declared variant names in registration order (the bare original
    /// name is implicit and not listed).
    fn variant_names(&self) -> Vec<String>;

    fn default_variant(&self) -> Option<String>;
}

/// Per-function record: the original implementation, its named variants in
/// registration order, and the optional default variant name.
///
/// Created once at registration; variants may still be added afterwards
/// (typically while the program is wiring itself up), never removed.
pub struct VariantSet<A, R> {
    identity: Identity,
    base_name: String,
    original: VariantFn<A, R>,
    state: RwLock<SetState<A, R>>,
}

struct SetState<A, R> {
    variants: IndexMap<String, VariantFn<A, R>>,
    default_name: Option<String>,
}

impl<A, R> VariantSet<A, R> {
    pub(crate) fn new(identity: Identity, base_name: impl Into<String>, original: VariantFn<A, R>) -> Self {
        Self {
            identity,
            base_name: base_name.into(),
            original,
            state: RwLock::new(SetState {
                variants: IndexMap::new(),
                default_name: None,
            }),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Bare name of the original implementation. Requesting it by name
    /// resolves to the original, so it behaves like an implicit variant.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Add `imp` under `name`.
    ///
    /// Re-adding the identical callable under the same name is a no-op;
    /// any other reuse of a taken name (including the original's bare
    /// name) is an error.
    pub fn register_variant(&self, name: &str, imp: VariantFn<A, R>) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if let Some(existing) = state.variants.get(name) {
            if Arc::ptr_eq(existing, &imp) {
                return Ok(());
            }
        }
        if name == self.base_name || state.variants.contains_key(name) {
            return Err(VersionError::DuplicateVariant {
                identity: self.identity.clone(),
                name: name.to_string(),
            });
        }
        state.variants.insert(name.to_string(), imp);
        Ok(())
    }

    /// Record `name` as the variant used when no override or pin applies.
    pub fn set_default(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if name != self.base_name && !state.variants.contains_key(name) {
            return Err(VersionError::UnknownVariant {
                identity: self.identity.clone(),
                name: name.to_string(),
            });
        }
        state.default_name = Some(name.to_string());
        Ok(())
    }

    /// Resolve a requested version name (or none) to an implementation.
    ///
    /// Absent and empty names select the default variant, falling back to
    /// the original when no default was declared; the original's bare name
    /// always selects the original.
    pub fn resolve(&self, name: Option<&str>) -> Result<VariantFn<A, R>> {
        let state = self.state.read().unwrap();
        let effective = match name.filter(|n| !n.is_empty()) {
            Some(n) => Some(n),
            None => state.default_name.as_deref(),
        };
        match effective {
            None => Ok(self.original.clone()),
            Some(n) if n == self.base_name => Ok(self.original.clone()),
            Some(n) => state.variants.get(n).cloned().ok_or_else(|| VersionError::UnknownVariant {
                identity: self.identity.clone(),
                name: n.to_string(),
            }),
        }
    }
}

impl<A: 'static, R: 'static> VariantDirectory for VariantSet<A, R> {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn has_variant(&self, name: &str) -> bool {
        name == self.base_name || self.state.read().unwrap().variants.contains_key(name)
    }

    fn variant_names(&self) -> Vec<String> {
        self.state.read().unwrap().variants.keys().cloned().collect()
    }

    fn default_variant(&self) -> Option<String> {
        self.state.read().unwrap().default_name.clone()
    }
}

impl<A, R> fmt::Debug for VariantSet<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().unwrap();
        f.debug_struct("VariantSet")
            .field("identity", &self.identity)
            .field("base_name", &self.base_name)
            .field("variants", &state.variants.keys().collect::<Vec<_>>())
            .field("default_name", &state.default_name)
            .finish()
    }
}
