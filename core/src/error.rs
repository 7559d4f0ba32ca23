use thiserror::Error;

use crate::identity::Identity;

/// Errors raised by registration, scope entry, and dispatch.
///
/// Every kind indicates a configuration or usage bug, not a transient
/// condition: nothing here is retried or recovered from, and failures from
/// an invoked variant itself are never wrapped in these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// An identity was registered a second time. The first registration
    /// stays intact.
    #[error("already registered function {0}")]
    DuplicateRegistration(Identity),

    /// A variant name was reused within one set with a different
    /// implementation.
    #[error("variant '{name}' already registered for {identity}")]
    DuplicateVariant { identity: Identity, name: String },

    /// A requested variant name does not exist for an identity.
    #[error("version {name} not defined for {identity}")]
    UnknownVariant { identity: Identity, name: String },

    /// A variant function's name does not derive a version name from its
    /// base function's name.
    #[error("variant function '{variant}' does not extend base name '{base}'")]
    NamingConvention { base: String, variant: String },

    /// Pop or top was attempted on a thread whose context stack is empty.
    #[error("version context stack is empty")]
    EmptyStack,

    /// A scope specification or pin referenced an identity with no
    /// registration.
    #[error("no versioned function registered under {0}")]
    NotRegistered(Identity),
}

pub type Result<T> = std::result::Result<T, VersionError>;
