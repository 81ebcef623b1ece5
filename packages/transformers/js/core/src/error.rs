use std::fmt;

use serde::Serialize;

use crate::utils::SourceLocation;

/// Failures the hoisting transform can surface. Anything not listed here is
/// handled locally by skipping the construct.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum HoistError {
  /// The tree is not a recognized AST model/version.
  UnsupportedAst { ast_type: String, version: u32 },
  /// An import specifier of a shape the transform cannot express, e.g. a
  /// string-named binding that is not identifier-shaped.
  UnknownImportConstruct { loc: Option<SourceLocation> },
  /// An export specifier or declaration of an unexpressible shape.
  UnknownExportConstruct { loc: Option<SourceLocation> },
  /// An import or re-export declaration had no matching dependency on the
  /// asset. A prior pass is expected to have created one.
  MissingDependency {
    specifier: String,
    loc: Option<SourceLocation>,
  },
}

impl fmt::Display for HoistError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      HoistError::UnsupportedAst { ast_type, version } => {
        write!(f, "unsupported AST: {} v{}", ast_type, version)
      }
      HoistError::UnknownImportConstruct { .. } => write!(f, "unknown import construct"),
      HoistError::UnknownExportConstruct { .. } => write!(f, "unknown export construct"),
      HoistError::MissingDependency { specifier, .. } => {
        write!(f, "no dependency found for specifier {:?}", specifier)
      }
    }
  }
}

impl std::error::Error for HoistError {}
