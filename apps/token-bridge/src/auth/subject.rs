//! Mapping from external subject ids to local subject ids.
//!
//! The default strategy derives a name-based UUID (v5, RFC 4122 §4.3) from
//! the external id under a fixed namespace, so the same external user always
//! maps to the same local id without a registration round trip. The
//! pass-through strategy only works when the provider already issues
//! UUID-shaped ids.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::errors::ExchangeError;

/// Namespace used for derivation unless `SUBJECT_NAMESPACE` overrides it.
///
/// Changing it remaps every user, so treat it as permanent once deployed.
pub const DEFAULT_SUBJECT_NAMESPACE: Uuid = Uuid::from_u128(0x0b5e_7a1d_4c2f_5e8a_9d3b_6f10_2c47_a9e1);

/// Identifier placed in the `sub` claim of session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalSubjectId(Uuid);

impl LocalSubjectId {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for LocalSubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hyphenated lowercase, the form the data backend stores.
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectMapping {
    /// UUID v5 of the external id under `namespace`
    Derived { namespace: Uuid },
    /// External id used as-is; must already be a UUID
    PassThrough,
}

impl Default for SubjectMapping {
    fn default() -> Self {
        Self::Derived {
            namespace: DEFAULT_SUBJECT_NAMESPACE,
        }
    }
}

impl SubjectMapping {
    /// Compute the local id. Pure: identical input always yields identical output.
    pub fn local_subject_id(&self, external_id: &str) -> Result<LocalSubjectId, ExchangeError> {
        if external_id.is_empty() {
            return Err(ExchangeError::missing_identity("external subject is empty"));
        }

        match self {
            SubjectMapping::Derived { namespace } => Ok(LocalSubjectId(Uuid::new_v5(
                namespace,
                external_id.as_bytes(),
            ))),
            SubjectMapping::PassThrough => Uuid::parse_str(external_id)
                .map(LocalSubjectId)
                .map_err(|_| {
                    ExchangeError::missing_identity(
                        "external subject is not a valid local identifier",
                    )
                }),
        }
    }
}

impl FromStr for SubjectMapping {
    type Err = String;

    /// Parses `derived` or `passthrough` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "derived" | "uuid5" | "v5" => Ok(Self::default()),
            "passthrough" | "pass-through" => Ok(Self::PassThrough),
            other => Err(format!(
                "unknown subject mapping '{other}', expected 'derived' or 'passthrough'"
            )),
        }
    }
}
