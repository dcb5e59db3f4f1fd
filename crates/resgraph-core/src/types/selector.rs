//! # Component Selectors
//!
//! What a dependency *requested*, before resolution picked a component.
//!
//! Selectors have their own compact encoding: a 1-byte discriminant followed
//! by the postcard-encoded fields of that variant.
//!
//! | tag | variant                 | fields                          |
//! |-----|-------------------------|---------------------------------|
//! | 1   | build-internal project  | path                            |
//! | 2   | module                  | group, module, version          |
//! | 3   | library variant         | path, library?, variant?        |
//! | 4   | binary variant          | reserved, rejected on decode    |

use super::{ComponentId, GraphError, require_non_empty};
use crate::primitives::{
    SELECTOR_BINARY_RESERVED, SELECTOR_BUILD, SELECTOR_LIBRARY, SELECTOR_MODULE,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A requested version: an exact version or a `prefix+` range.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionConstraint(String);

impl VersionConstraint {
    pub fn new(constraint: impl Into<String>) -> Result<Self, GraphError> {
        require_non_empty(constraint.into(), "version constraint").map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a concrete version against this constraint.
    #[must_use]
    pub fn accepts(&self, version: &str) -> bool {
        match self.0.strip_suffix('+') {
            Some(prefix) => version.starts_with(prefix),
            None => self.0 == version,
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What was requested. Exactly one variant is populated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentSelector {
    /// Another project of the owning build.
    Build { path: String },
    /// An external module coordinate.
    Module {
        group: String,
        module: String,
        version: VersionConstraint,
    },
    /// A named library variant of a sub-component.
    Library {
        path: String,
        library: Option<String>,
        variant: Option<String>,
    },
}

impl ComponentSelector {
    pub fn build(path: impl Into<String>) -> Result<Self, GraphError> {
        Ok(Self::Build {
            path: require_non_empty(path.into(), "project path")?,
        })
    }

    pub fn module(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, GraphError> {
        Ok(Self::Module {
            group: require_non_empty(group.into(), "module group")?,
            module: require_non_empty(module.into(), "module name")?,
            version: VersionConstraint::new(version)?,
        })
    }

    /// A library selector. `library` and `variant` may be absent, never empty.
    pub fn library(
        path: impl Into<String>,
        library: Option<String>,
        variant: Option<String>,
    ) -> Result<Self, GraphError> {
        Ok(Self::Library {
            path: require_non_empty(path.into(), "project path")?,
            library: library
                .map(|name| require_non_empty(name, "library name"))
                .transpose()?,
            variant: variant
                .map(|name| require_non_empty(name, "variant name"))
                .transpose()?,
        })
    }

    /// The narrowest selector that picks exactly `id`.
    #[must_use]
    pub fn exact(id: &ComponentId) -> Self {
        match id {
            ComponentId::Module(module) => Self::Module {
                group: module.group().to_string(),
                module: module.module().to_string(),
                version: VersionConstraint(module.version().to_string()),
            },
            ComponentId::Project(project) => Self::Build {
                path: project.path().to_string(),
            },
        }
    }

    /// Whether a selected component satisfies this request.
    #[must_use]
    pub fn matches(&self, id: &ComponentId) -> bool {
        match (self, id) {
            (
                Self::Module {
                    group,
                    module,
                    version,
                },
                ComponentId::Module(selected),
            ) => {
                selected.group() == group
                    && selected.module() == module
                    && version.accepts(selected.version())
            }
            (Self::Build { path } | Self::Library { path, .. }, ComponentId::Project(project)) => {
                project.path() == path
            }
            _ => false,
        }
    }

    /// Discriminant written ahead of the encoded fields.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Self::Build { .. } => SELECTOR_BUILD,
            Self::Module { .. } => SELECTOR_MODULE,
            Self::Library { .. } => SELECTOR_LIBRARY,
        }
    }
}

impl fmt::Display for ComponentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build { path } => write!(f, "project {path}"),
            Self::Module {
                group,
                module,
                version,
            } => write!(f, "{group}:{module}:{version}"),
            Self::Library {
                path,
                library,
                variant,
            } => {
                write!(f, "project {path}")?;
                if let Some(library) = library {
                    write!(f, " library '{library}'")?;
                }
                if let Some(variant) = variant {
                    write!(f, " variant '{variant}'")?;
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// CODEC
// =============================================================================

fn encode_fields<T: Serialize>(fields: &T, out: &mut Vec<u8>) -> Result<(), GraphError> {
    let bytes =
        postcard::to_stdvec(fields).map_err(|e| GraphError::SerializationError(e.to_string()))?;
    out.extend_from_slice(&bytes);
    Ok(())
}

fn take_fields<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<(T, &'a [u8]), GraphError> {
    postcard::take_from_bytes(bytes).map_err(|e| {
        GraphError::DeserializationError(format!("Failed to decode selector fields: {}", e))
    })
}

/// Append the encoding of `selector` to `out`.
pub fn encode_selector(selector: &ComponentSelector, out: &mut Vec<u8>) -> Result<(), GraphError> {
    out.push(selector.tag());
    match selector {
        ComponentSelector::Build { path } => encode_fields(&(path,), out),
        ComponentSelector::Module {
            group,
            module,
            version,
        } => encode_fields(&(group, module, version.as_str()), out),
        ComponentSelector::Library {
            path,
            library,
            variant,
        } => encode_fields(&(path, library, variant), out),
    }
}

/// Decode one selector from the front of `bytes`, returning the remainder.
pub fn decode_selector(bytes: &[u8]) -> Result<(ComponentSelector, &[u8]), GraphError> {
    let (&tag, rest) = bytes.split_first().ok_or_else(|| {
        GraphError::DeserializationError("Missing selector discriminant".to_string())
    })?;

    match tag {
        SELECTOR_BUILD => {
            let ((path,), rest) = take_fields::<(String,)>(rest)?;
            Ok((ComponentSelector::build(path)?, rest))
        }
        SELECTOR_MODULE => {
            let ((group, module, version), rest) = take_fields::<(String, String, String)>(rest)?;
            Ok((ComponentSelector::module(group, module, version)?, rest))
        }
        SELECTOR_LIBRARY => {
            let ((path, library, variant), rest) =
                take_fields::<(String, Option<String>, Option<String>)>(rest)?;
            Ok((ComponentSelector::library(path, library, variant)?, rest))
        }
        SELECTOR_BINARY_RESERVED => Err(GraphError::UnsupportedSelector(tag)),
        other => Err(GraphError::UnsupportedSelector(other)),
    }
}
