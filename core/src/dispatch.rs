//! Versioned function handles: registration builders and call-time
//! dispatch.

use std::fmt;
use std::sync::Arc;

use crate::context;
use crate::error::Result;
use crate::identity::{self, Identity};
use crate::registry::{self, Registry};
use crate::scope::{OverrideSpec, VariantRef};
use crate::variants::{VariantFn, VariantSet};

/// Dispatch-capable handle to one versioned function.
///
/// Cloning is cheap and every clone dispatches against the same variant
/// set. Resolution is recomputed on every call, in order: the calling
/// thread's active scopes, the registry's process-wide pin, the set's
/// declared default, the original.
pub struct Versioned<A, R> {
    set: Arc<VariantSet<A, R>>,
    registry: Arc<Registry>,
}

impl<A, R> Clone for Versioned<A, R> {
    fn clone(&self) -> Self {
        Self {
            set: self.set.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<A: 'static, R: 'static> Versioned<A, R> {
    /// Register `original` under the identity derived from `module` and
    /// `name`, against an explicit registry handle.
    ///
    /// `module` is typically `module_path!()`; `name` is the function's
    /// qualified name within it (`"Matrix::multiply"` or just
    /// `"normalize"`).
    pub fn register<F>(registry: Arc<Registry>, module: &str, name: &str, original: F) -> Result<Self>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let id = Identity::derive(module, name);
        let base_name = name.rsplit("::").next().unwrap_or(name);
        let set = Arc::new(VariantSet::new(id, base_name, Arc::new(original) as VariantFn<A, R>));
        registry.bind(set.clone())?;
        Ok(Self { set, registry })
    }

    /// Identity key this function is registered under.
    pub fn identity(&self) -> &Identity {
        self.set.identity()
    }

    /// Register a variant whose version name is derived from `fn_name` by
    /// stripping the base function's name: `foo_v2` on base `foo` becomes
    /// version `v2`.
    pub fn variant<F>(&self, fn_name: &str, imp: F) -> Result<VariantRef>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let name = identity::variant_name(self.set.base_name(), fn_name)?;
        self.variant_named(&name, imp)
    }

    /// Register a variant under an explicit version name.
    pub fn variant_named<F>(&self, name: &str, imp: F) -> Result<VariantRef>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.set.register_variant(name, Arc::new(imp))?;
        tracing::debug!(target: "vfn::dispatch", "registered variant {} for {}", name, self.identity());
        Ok(VariantRef::new(self.identity().clone(), name.to_string()))
    }

    /// Register a variant (derived name, as [`variant`](Self::variant))
    /// and declare it the default in one step.
    pub fn default_variant<F>(&self, fn_name: &str, imp: F) -> Result<VariantRef>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let vref = self.variant(fn_name, imp)?;
        self.set.set_default(vref.version())?;
        Ok(vref)
    }

    /// Declare the variant used when no override or pin applies. The
    /// original's bare name selects the original.
    pub fn set_default(&self, name: &str) -> Result<()> {
        self.set.set_default(name)
    }

    /// Override specification selecting variant `name` of this function,
    /// for use in a [`VersionScope`](crate::scope::VersionScope).
    pub fn select(&self, name: &str) -> OverrideSpec {
        OverrideSpec::new(self.identity().clone(), name)
    }

    /// Override specification selecting the original implementation.
    pub fn select_original(&self) -> OverrideSpec {
        OverrideSpec::new(self.identity().clone(), self.set.base_name())
    }

    /// Dispatch one call: resolve the active variant, invoke it with
    /// `args`, and hand its return value back untouched.
    ///
    /// Nothing is cached between calls; the active context is consulted
    /// every time.
    pub fn call(&self, args: A) -> Result<R> {
        let id = self.set.identity();
        let version = context::active_version(id).or_else(|| self.registry.pinned_variant(id));
        let imp = self.set.resolve(version.as_deref())?;
        tracing::trace!(
            target: "vfn::dispatch",
            "dispatching {} via {}",
            id,
            version.as_deref().unwrap_or("<default>")
        );
        Ok(imp(args))
    }
}

impl<A, R> fmt::Debug for Versioned<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Versioned").field("set", &self.set).finish()
    }
}

/// Register a versioned function with the process-global registry.
pub fn versioned<A, R, F>(module: &str, name: &str, original: F) -> Result<Versioned<A, R>>
where
    A: 'static,
    R: 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    Versioned::register(registry::global(), module, name, original)
}
