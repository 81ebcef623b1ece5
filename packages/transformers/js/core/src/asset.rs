use std::path::PathBuf;

use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use sha_1::{Digest, Sha1};
use swc_core::ecma::atoms::JsWord;

use crate::symbol::Symbols;
use crate::utils::SourceLocation;

/// One module as seen by the bundler. The hoisting transform mutates `meta`,
/// `symbols`, and the dependency list in place; everything else is caller
/// owned.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
  pub id: String,
  pub file_path: PathBuf,
  /// False for third-party code; unreferenced import specifiers are skipped
  /// in that case.
  pub is_source: bool,
  pub env: Environment,
  pub meta: AssetMeta,
  pub symbols: Option<Symbols>,
  pub dependencies: Vec<Dependency>,
}

impl Asset {
  pub fn new(id: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
    Asset {
      id: id.into(),
      file_path: file_path.into(),
      is_source: true,
      env: Environment::default(),
      meta: AssetMeta::default(),
      symbols: None,
      dependencies: Vec::new(),
    }
  }

  pub fn ensure_symbols(&mut self) -> &mut Symbols {
    self.symbols.get_or_insert_with(Symbols::new)
  }

  pub fn add_dependency(&mut self, dependency: Dependency) {
    self.dependencies.push(dependency);
  }

  pub fn dependency(&self, specifier: &JsWord) -> Option<&Dependency> {
    self
      .dependencies
      .iter()
      .find(|dep| dep.specifier == *specifier)
  }

  pub fn dependency_mut(&mut self, specifier: &JsWord) -> Option<&mut Dependency> {
    self
      .dependencies
      .iter_mut()
      .find(|dep| dep.specifier == *specifier)
  }

  /// The file name component of the asset path, used for the self-dependency
  /// created when export resolution bails out.
  pub fn file_name(&self) -> String {
    self
      .file_path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
  #[serde(rename = "isES6Module")]
  pub is_es6_module: bool,
  #[serde(rename = "isCommonJS")]
  pub is_commonjs: bool,
  pub should_wrap: bool,
  pub resolve_exports_bailed_out: bool,
  pub exports_identifier: Option<JsWord>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
  pub context: EnvironmentContext,
  pub source_type: SourceType,
}

impl Environment {
  pub fn is_node(&self) -> bool {
    self.context.is_node()
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvironmentContext {
  #[default]
  Browser,
  WebWorker,
  ServiceWorker,
  Node,
  ElectronMain,
  ElectronRenderer,
}

impl EnvironmentContext {
  pub fn is_node(&self) -> bool {
    matches!(
      self,
      EnvironmentContext::Node | EnvironmentContext::ElectronMain | EnvironmentContext::ElectronRenderer
    )
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
  #[default]
  Module,
  Script,
}

/// Determines when a dependency should load. Dynamic `import()` dependencies
/// are `Lazy`; everything the transform touches otherwise is `Sync`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  #[default]
  Sync,
  Parallel,
  Lazy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecifierType {
  #[default]
  Esm,
  CommonJS,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyMeta {
  /// Set when a conditional or nested `require` means the imported module's
  /// execution order cannot be determined statically.
  pub should_wrap: bool,
  pub has_default_import: bool,
  #[serde(rename = "isCommonJS")]
  pub is_commonjs: bool,
}

/// A declared reference from one asset to another, identified by the original
/// module specifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
  pub specifier: JsWord,
  pub specifier_type: SpecifierType,
  pub priority: Priority,
  pub loc: Option<SourceLocation>,
  pub meta: DependencyMeta,
  pub symbols: Option<Symbols>,
}

impl Dependency {
  pub fn new(specifier: JsWord) -> Self {
    Dependency {
      specifier,
      specifier_type: SpecifierType::Esm,
      priority: Priority::Sync,
      loc: None,
      meta: DependencyMeta::default(),
      symbols: None,
    }
  }

  pub fn new_async(specifier: JsWord) -> Self {
    Dependency {
      priority: Priority::Lazy,
      ..Dependency::new(specifier)
    }
  }

  pub fn is_async(&self) -> bool {
    self.priority == Priority::Lazy
  }

  pub fn ensure_symbols(&mut self) -> &mut Symbols {
    self.symbols.get_or_insert_with(Symbols::new)
  }

  /// A stable id derived from the dependency identity, usable inside mangled
  /// identifiers.
  pub fn id(&self) -> String {
    let mut hasher = Sha1::new();
    hasher.update(self.specifier.as_bytes());
    hasher.update([self.priority as u8]);
    let hash = hasher.finalize();
    HEXLOWER.encode(&hash[..8])
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_dependency_id_is_stable() {
    let a = Dependency::new("./foo".into());
    let b = Dependency::new("./foo".into());
    assert_eq!(a.id(), b.id());
    assert_eq!(a.id().len(), 16);
  }

  #[test]
  fn test_dependency_id_varies_with_identity() {
    let sync = Dependency::new("./foo".into());
    let lazy = Dependency::new_async("./foo".into());
    let other = Dependency::new("./bar".into());
    assert_ne!(sync.id(), lazy.id());
    assert_ne!(sync.id(), other.id());
  }

  #[test]
  fn test_dependency_lookup_prefers_first_match() {
    let mut asset = Asset::new("a", "/src/a.js");
    asset.add_dependency(Dependency::new("./m".into()));
    asset.add_dependency(Dependency::new_async("./m".into()));

    let dep = asset.dependency(&"./m".into()).unwrap();
    assert!(!dep.is_async());
  }

  #[test]
  fn test_environment_is_node() {
    let mut env = Environment::default();
    assert!(!env.is_node());
    env.context = EnvironmentContext::Node;
    assert!(env.is_node());
    env.context = EnvironmentContext::ElectronMain;
    assert!(env.is_node());
  }
}
