//! Override scopes: force chosen versions for the current thread.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::with_stack;
use crate::error::{Result, VersionError};
use crate::identity::Identity;
use crate::registry::{self, Registry};

/// One override specification: make `identity` resolve to `version` while
/// the scope is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideSpec {
    pub(crate) identity: Identity,
    pub(crate) version: String,
}

impl OverrideSpec {
    pub fn new(identity: impl Into<Identity>, version: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            version: version.into(),
        }
    }
}

impl From<(&str, &str)> for OverrideSpec {
    fn from((identity, version): (&str, &str)) -> Self {
        Self::new(identity, version)
    }
}

/// Reference to one registered variant: its owning identity plus the
/// version name. Produced by variant registration and by
/// [`Versioned::select`](crate::dispatch::Versioned::select); usable
/// directly as an override specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRef {
    identity: Identity,
    version: String,
}

impl VariantRef {
    pub(crate) fn new(identity: Identity, version: String) -> Self {
        Self { identity, version }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl From<VariantRef> for OverrideSpec {
    fn from(vref: VariantRef) -> Self {
        Self {
            identity: vref.identity,
            version: vref.version,
        }
    }
}

impl From<&VariantRef> for OverrideSpec {
    fn from(vref: &VariantRef) -> Self {
        Self {
            identity: vref.identity.clone(),
            version: vref.version.clone(),
        }
    }
}

/// A reusable set of override specifications, entered either as a guarded
/// block ([`enter`](Self::enter)) or wrapped around a call
/// ([`run`](Self::run)).
#[derive(Debug)]
pub struct VersionScope {
    registry: Arc<Registry>,
    overrides: Vec<OverrideSpec>,
}

impl VersionScope {
    /// Scope validated against the process-global registry.
    pub fn new<I, S>(overrides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OverrideSpec>,
    {
        Self::with_registry(registry::global(), overrides)
    }

    pub fn with_registry<I, S>(registry: Arc<Registry>, overrides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OverrideSpec>,
    {
        Self {
            registry,
            overrides: overrides.into_iter().map(Into::into).collect(),
        }
    }

    /// Push a frame populated from the specifications.
    ///
    /// Every requested identity and version is validated before any caller
    /// code can run. A failed validation pops the frame again: stack depth
    /// is unchanged when this returns an error.
    pub fn enter(&self) -> Result<ScopeGuard> {
        with_stack(|stack| stack.push());
        if let Err(err) = self.populate() {
            let _ = with_stack(|stack| stack.pop());
            return Err(err);
        }
        tracing::trace!(target: "vfn::context", "entered scope with {} override(s)", self.overrides.len());
        Ok(ScopeGuard {
            _not_send: PhantomData,
        })
    }

    fn populate(&self) -> Result<()> {
        for spec in &self.overrides {
            let directory = self
                .registry
                .lookup(&spec.identity)
                .ok_or_else(|| VersionError::NotRegistered(spec.identity.clone()))?;
            if !directory.has_variant(&spec.version) {
                return Err(VersionError::UnknownVariant {
                    identity: spec.identity.clone(),
                    name: spec.version.clone(),
                });
            }
            with_stack(|stack| {
                stack.top_mut().map(|top| {
                    top.insert(spec.identity.clone(), spec.version.clone());
                })
            })?;
        }
        Ok(())
    }

    /// Decorator form: enter, call `f`, pop on every exit path including
    /// unwinding panics.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
        let _guard = self.enter()?;
        Ok(f())
    }
}

/// Pops exactly one override frame when dropped.
///
/// `!Send`: frames belong to the thread that entered the scope.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard {
    _not_send: PhantomData<*mut ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Err(err) = with_stack(|stack| stack.pop()) {
            // Drop cannot propagate; an unbalanced enter/exit only shows up here
            tracing::error!(target: "vfn::context", "scope guard dropped on empty context stack: {}", err);
        }
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard").finish()
    }
}
