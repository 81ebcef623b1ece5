mod asset;
mod collect;
mod error;
mod hoist;
mod symbol;
#[cfg(test)]
mod test_utils;
mod utils;

use serde::Serialize;
use swc_core::{
  common::{sync::Lrc, Mark, SourceMap},
  ecma::{
    ast::Module,
    atoms::JsWord,
    visit::{FoldWith, VisitWith},
  },
};

pub use asset::{
  Asset, AssetMeta, Dependency, DependencyMeta, Environment, EnvironmentContext, Priority,
  SourceType, SpecifierType,
};
pub use collect::{Collect, DynamicImport, Export, Import};
pub use error::HoistError;
pub use hoist::Hoist;
pub use symbol::{Symbol, SymbolFlags, Symbols};
pub use utils::SourceLocation;

use symbol::SymbolFlags as Flags;
use utils::{is_valid_identifier, to_identifier};

pub const AST_TYPE: &str = "swc";
pub const AST_VERSION: u32 = 9;

/// A parsed module plus the hygiene marks the resolver pass applied to it.
/// The transform only accepts trees tagged with the model/version it was
/// built against.
pub struct ModuleAst {
  pub ast_type: String,
  pub version: u32,
  pub module: Module,
  pub unresolved_mark: Mark,
  pub global_mark: Mark,
  pub source_map: Lrc<SourceMap>,
}

impl ModuleAst {
  pub fn new(
    module: Module,
    unresolved_mark: Mark,
    global_mark: Mark,
    source_map: Lrc<SourceMap>,
  ) -> Self {
    ModuleAst {
      ast_type: AST_TYPE.into(),
      version: AST_VERSION,
      module,
      unresolved_mark,
      global_mark,
      source_map,
    }
  }
}

/// Summary of one hoisting run, shaped for the plugin layer that assembles
/// the final asset graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoistResult {
  pub is_esm: bool,
  #[serde(rename = "isCommonJS")]
  pub is_commonjs: bool,
  pub should_wrap: bool,
  pub static_cjs_exports: bool,
  pub exports_identifier: JsWord,
  /// Specifiers whose target module must itself be wrapped because a
  /// require for it was conditional or nested.
  pub wrapped_dependencies: Vec<JsWord>,
  /// Own exports the module reads back through `exports.K`.
  pub self_references: Vec<JsWord>,
}

/// Rewrites one module for concatenation into a flat bundle. Mutates the
/// asset's metadata, symbol table, and dependency symbol tables in place and
/// returns the rewritten tree.
///
/// Must run inside the same `GLOBALS` scope that created the marks in `ast`.
pub fn hoist(asset: &mut Asset, ast: ModuleAst) -> Result<(Module, HoistResult), HoistError> {
  if ast.ast_type != AST_TYPE || ast.version != AST_VERSION {
    return Err(HoistError::UnsupportedAst {
      ast_type: ast.ast_type,
      version: ast.version,
    });
  }

  let ModuleAst {
    module,
    unresolved_mark,
    global_mark,
    source_map,
    ..
  } = ast;

  let module_id = to_identifier(&asset.id);
  let exports_name: JsWord = format!("${}$exports", module_id).into();
  asset.ensure_symbols();
  asset.meta.exports_identifier = Some(exports_name.clone());

  let mut collect = Collect::new(source_map, unresolved_mark, global_mark);
  module.visit_with(&mut collect);

  // A module that presents neither convention is CommonJS by default.
  if !collect.is_esm && !collect.is_cjs {
    collect.is_cjs = true;
    let symbols = asset.ensure_symbols();
    if !symbols.has_export_symbol(&"*".into()) {
      symbols.set("*".into(), exports_name.clone(), None, Flags::empty());
    }
  }

  asset.meta.is_es6_module = collect.is_esm;
  asset.meta.is_commonjs = collect.is_cjs;
  asset.meta.should_wrap = collect.should_wrap;
  asset.meta.resolve_exports_bailed_out = collect.resolve_exports_bailed_out;

  if collect.resolve_exports_bailed_out {
    // The exports namespace escapes static analysis; a self-dependency keeps
    // the whole namespace alive through tree shaking.
    let specifier: JsWord = format!("./{}", asset.file_name()).into();
    let mut dep = Dependency::new(specifier);
    dep.specifier_type = SpecifierType::CommonJS;
    dep
      .ensure_symbols()
      .set("*".into(), "@exports".into(), None, Flags::empty());
    asset.add_dependency(dep);
  }

  apply_dynamic_imports(asset, &collect, &module_id);

  let mut hoist = Hoist::new(&collect, asset);
  let module = module.fold_with(&mut hoist);
  let wrapped_dependencies = std::mem::take(&mut hoist.wrapped_dependencies);
  let mut self_references = std::mem::take(&mut hoist.self_references);
  let error = hoist.error.take();
  drop(hoist);
  if let Some(error) = error {
    return Err(error);
  }

  if collect.should_wrap {
    asset.meta.should_wrap = true;
    asset.meta.is_commonjs = true;
    asset.meta.is_es6_module = false;
    let symbols = asset.ensure_symbols();
    symbols.set("*".into(), exports_name.clone(), None, Flags::empty());
  } else if asset.meta.is_commonjs {
    let symbols = asset.ensure_symbols();
    if asset.meta.resolve_exports_bailed_out {
      // Only the namespace survives a bail-out.
      symbols.retain(|exported, _| *exported == JsWord::from("*"));
      symbols.set("*".into(), exports_name.clone(), None, Flags::empty());
    } else if !symbols.has_export_symbol(&"*".into()) {
      symbols.set("*".into(), exports_name.clone(), None, Flags::empty());
    }
  }

  if let Some(symbols) = &asset.symbols {
    self_references.retain(|name| symbols.has_export_symbol(name));
  }

  let result = HoistResult {
    is_esm: asset.meta.is_es6_module,
    is_commonjs: asset.meta.is_commonjs,
    should_wrap: asset.meta.should_wrap,
    static_cjs_exports: !asset.meta.resolve_exports_bailed_out,
    exports_identifier: exports_name,
    wrapped_dependencies,
    self_references,
  };

  Ok((module, result))
}

/// Applies the pre-scan's dynamic `import()` analysis to the dependency
/// symbol tables.
fn apply_dynamic_imports(asset: &mut Asset, collect: &Collect, module_id: &str) {
  for (source, analysis) in &collect.dynamic_imports {
    let dep = match asset.dependency_mut(source) {
      Some(dep) => dep,
      None => continue,
    };
    let dep_id = dep.id();

    let members = match analysis {
      DynamicImport::Members(members)
        if members.iter().all(|(name, _)| is_valid_identifier(name)) =>
      {
        Some(members)
      }
      DynamicImport::Members(_) | DynamicImport::Namespace => None,
      DynamicImport::Candidate(_) => continue,
    };

    match members {
      Some(members) => {
        for (member, loc) in members {
          let local: JsWord = format!(
            "${}$importAsync${}${}",
            module_id,
            dep_id,
            to_identifier(member)
          )
          .into();
          let symbols = dep.ensure_symbols();
          if symbols.get(member).is_none() {
            symbols.set(member.clone(), local, Some(loc.clone()), Flags::empty());
          }
        }
      }
      None => {
        dep.meta.is_commonjs = true;
        let local: JsWord = format!("${}$require${}", module_id, to_identifier(source)).into();
        let symbols = dep.ensure_symbols();
        if symbols.get(&"*".into()).is_none() {
          symbols.set("*".into(), local, None, Flags::empty());
        }
      }
    }
  }
}
