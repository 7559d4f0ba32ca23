//! Identity keys and naming rules for versioned functions.

use std::fmt;

use crate::error::{Result, VersionError};

/// Stable string key identifying one versioned function in the registry.
///
/// Keys keep the last two path components of the qualified name so that
/// `Matrix::multiply` stays readable without dragging the full crate path
/// along; free functions are keyed as `<module>::<name>` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive an identity from a module path and a qualified function name.
    ///
    /// The last two `::` components of `qualified_name` win; a bare name is
    /// prefixed with the last component of `module_path` instead.
    pub fn derive(module_path: &str, qualified_name: &str) -> Self {
        let parts: Vec<&str> = qualified_name.split("::").filter(|s| !s.is_empty()).collect();
        match parts.len() {
            0 => Self(last_component(module_path).to_string()),
            1 => {
                let module = last_component(module_path);
                if module.is_empty() {
                    Self(parts[0].to_string())
                } else {
                    Self(format!("{}::{}", module, parts[0]))
                }
            }
            n => Self(format!("{}::{}", parts[n - 2], parts[n - 1])),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn last_component(path: &str) -> &str {
    path.rsplit("::").find(|s| !s.is_empty()).unwrap_or("")
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Identity {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Compute a variant's version name from its function name.
///
/// The variant function must extend the base function's name; the base
/// prefix is stripped and leading `_` separators trimmed, so `foo_v2` on
/// base `foo` yields `v2` and `barAlgoV1` on base `barAlgo` yields `V1`.
pub fn variant_name(base: &str, variant_fn: &str) -> Result<String> {
    let convention_err = || VersionError::NamingConvention {
        base: base.to_string(),
        variant: variant_fn.to_string(),
    };
    let rest = variant_fn.strip_prefix(base).ok_or_else(|| convention_err())?;
    let name = rest.trim_start_matches('_');
    if name.is_empty() {
        return Err(convention_err());
    }
    Ok(name.to_string())
}
