use std::collections::HashSet;

use indexmap::IndexMap;
use swc_core::{
  common::DUMMY_SP,
  ecma::{
    ast::{
      AssignExpr, AssignOp, AssignPat, AssignTarget, BinExpr, BinaryOp, BindingIdent, BlockStmt,
      CallExpr, Callee, ClassDecl, CondExpr, Decl, DefaultDecl, DoWhileStmt, Expr, ExprOrSpread,
      ExprStmt, FnDecl, ForInStmt, ForOfStmt, ForStmt, Function, Ident, IdentName, IfStmt,
      ImportDecl, ImportSpecifier, KeyValuePatProp, KeyValueProp, Lit, MemberExpr, MemberProp,
      Module, ModuleDecl, ModuleExportName, ModuleItem, Null, ObjectLit, ObjectPatProp, Pat, Prop,
      PropName, PropOrSpread, ReturnStmt, SimpleAssignTarget, Stmt, Str, SwitchStmt, TryStmt,
      UnaryOp, VarDecl, VarDeclKind, VarDeclarator, WhileStmt,
    },
    atoms::JsWord,
    utils::member_expr,
    visit::{Fold, FoldWith},
  },
};

use crate::asset::Asset;
use crate::collect::Collect;
use crate::error::HoistError;
use crate::symbol::SymbolFlags;
use crate::utils::{
  is_marked, is_unresolved, is_valid_identifier, match_member_prop, match_str, to_identifier,
  SourceLocation,
};

/// Second pass: rewrites one module for concatenation. Renames top-level
/// bindings to module-unique identifiers, replaces import/export/CommonJS
/// constructs with the `$parcel$*` placeholders, and wraps the body in a
/// closure when the pre-scan decided static rewriting is unsafe.
pub struct Hoist<'a> {
  module_id: String,
  collect: &'a Collect,
  asset: &'a mut Asset,
  module_items: Vec<ModuleItem>,
  hoisted_imports: IndexMap<JsWord, ModuleItem>,
  post_stmts: Vec<ModuleItem>,
  export_decls: HashSet<JsWord>,
  registered_exports: HashSet<JsWord>,
  pub exports_referenced: bool,
  pub cjs_exports_reassigned: bool,
  pub wrapped_dependencies: Vec<JsWord>,
  pub self_references: Vec<JsWord>,
  pub error: Option<HoistError>,
  in_function_scope: usize,
  this_scope: usize,
  in_conditional: usize,
  in_nested_stmt: usize,
}

impl<'a> Hoist<'a> {
  pub fn new(collect: &'a Collect, asset: &'a mut Asset) -> Self {
    Hoist {
      module_id: to_identifier(&asset.id),
      collect,
      asset,
      module_items: Vec::new(),
      hoisted_imports: IndexMap::new(),
      post_stmts: Vec::new(),
      export_decls: HashSet::new(),
      registered_exports: HashSet::new(),
      exports_referenced: false,
      cjs_exports_reassigned: false,
      wrapped_dependencies: Vec::new(),
      self_references: Vec::new(),
      error: None,
      in_function_scope: 0,
      this_scope: 0,
      in_conditional: 0,
      in_nested_stmt: 0,
    }
  }

  fn err(&mut self, error: HoistError) {
    if self.error.is_none() {
      self.error = Some(error);
    }
  }

  fn loc(&self, span: swc_core::common::Span) -> SourceLocation {
    SourceLocation::from(&self.collect.source_map, span)
  }

  // Naming scheme. Every identifier this transform introduces either begins
  // with the asset prefix or is one of the fixed runtime placeholders.

  pub fn exports_name(&self) -> JsWord {
    format!("${}$exports", self.module_id).into()
  }

  fn cjs_exports_name(&self) -> JsWord {
    format!("${}$cjs_exports", self.module_id).into()
  }

  fn export_name(&self, exported: &JsWord) -> JsWord {
    format!("${}$export${}", self.module_id, to_identifier(exported)).into()
  }

  fn var_name(&self, sym: &JsWord) -> JsWord {
    format!("${}$var${}", self.module_id, sym).into()
  }

  fn import_name(&self, dep_id: &str, local: &JsWord) -> JsWord {
    format!("${}$import${}${}", self.module_id, dep_id, to_identifier(local)).into()
  }

  fn namespace_import_name(&self, dep_id: &str) -> JsWord {
    format!("${}$import${}", self.module_id, dep_id).into()
  }

  fn dep_id(&self, source: &JsWord) -> Option<String> {
    self.asset.dependency(source).map(|dep| dep.id())
  }

  /// The local name a reference to an import binding resolves to. Duplicate
  /// imports of the same name share the first binding's slot.
  fn import_local_name(&self, id: &swc_core::ecma::ast::Id) -> Option<JsWord> {
    let import = self.collect.imports.get(id)?;
    let dep_id = self.dep_id(&import.source)?;
    if import.specifier == *"*" {
      return Some(self.namespace_import_name(&dep_id));
    }

    if let Some(dep) = self.asset.dependency(&import.source) {
      if let Some(symbol) = dep
        .symbols
        .as_ref()
        .and_then(|symbols| symbols.get(&import.specifier))
      {
        return Some(symbol.local.clone());
      }
    }

    let canonical = self
      .collect
      .canonical_import(&import.source, &import.specifier)
      .map(|(canonical_id, _)| canonical_id.0.clone())
      .unwrap_or_else(|| id.0.clone());
    Some(self.import_name(&dep_id, &canonical))
  }

  // Node builders for the small fixed set of generated shapes.

  fn ident(sym: JsWord) -> Ident {
    Ident::new_no_ctxt(sym, DUMMY_SP)
  }

  fn str_lit(value: JsWord) -> Expr {
    Expr::Lit(Lit::Str(Str {
      span: DUMMY_SP,
      value,
      raw: None,
    }))
  }

  fn null_lit() -> Expr {
    Expr::Lit(Lit::Null(Null { span: DUMMY_SP }))
  }

  fn parcel_require_call(&self, source: &JsWord) -> Expr {
    Expr::Call(CallExpr {
      callee: Callee::Expr(Box::new(Expr::Ident(Self::ident("$parcel$require".into())))),
      args: vec![
        ExprOrSpread {
          spread: None,
          expr: Box::new(Self::str_lit(self.asset.id.as_str().into())),
        },
        ExprOrSpread {
          spread: None,
          expr: Box::new(Self::str_lit(source.clone())),
        },
      ],
      ..Default::default()
    })
  }

  fn parcel_require_resolve_call(&self, source: &JsWord) -> Expr {
    Expr::Call(CallExpr {
      callee: Callee::Expr(Box::new(Expr::Ident(Self::ident(
        "$parcel$require$resolve".into(),
      )))),
      args: vec![
        ExprOrSpread {
          spread: None,
          expr: Box::new(Self::str_lit(self.asset.id.as_str().into())),
        },
        ExprOrSpread {
          spread: None,
          expr: Box::new(Self::str_lit(source.clone())),
        },
      ],
      ..Default::default()
    })
  }

  fn thunk(local: JsWord) -> Expr {
    Expr::Fn(swc_core::ecma::ast::FnExpr {
      ident: None,
      function: Box::new(Function {
        params: vec![],
        body: Some(BlockStmt {
          stmts: vec![Stmt::Return(ReturnStmt {
            span: DUMMY_SP,
            arg: Some(Box::new(Expr::Ident(Self::ident(local)))),
          })],
          ..Default::default()
        }),
        ..Default::default()
      }),
    })
  }

  /// `$parcel$export($<id>$exports, "name", value);`
  ///
  /// Inside a wrapped body the registration targets the closure-local
  /// `exports` object instead; the asset-level var is only assigned once the
  /// closure returns.
  fn parcel_export_stmt(&mut self, exported: &JsWord, value: Expr) -> ModuleItem {
    let target = if self.collect.should_wrap {
      Self::ident("exports".into())
    } else {
      self.exports_referenced = true;
      Self::ident(self.exports_name())
    };
    ModuleItem::Stmt(Stmt::Expr(ExprStmt {
      span: DUMMY_SP,
      expr: Box::new(Expr::Call(CallExpr {
        callee: Callee::Expr(Box::new(Expr::Ident(Self::ident("$parcel$export".into())))),
        args: vec![
          ExprOrSpread {
            spread: None,
            expr: Box::new(Expr::Ident(target)),
          },
          ExprOrSpread {
            spread: None,
            expr: Box::new(Self::str_lit(exported.clone())),
          },
          ExprOrSpread {
            spread: None,
            expr: Box::new(value),
          },
        ],
        ..Default::default()
      })),
    }))
  }

  fn var_decl(name: JsWord, init: Option<Expr>) -> ModuleItem {
    ModuleItem::Stmt(Stmt::Decl(Decl::Var(Box::new(VarDecl {
      kind: VarDeclKind::Var,
      decls: vec![VarDeclarator {
        span: DUMMY_SP,
        name: Pat::Ident(Self::ident(name).into()),
        init: init.map(Box::new),
        definite: false,
      }],
      ..Default::default()
    }))))
  }

  fn hoist_require(&mut self, source: &JsWord) {
    if !self.hoisted_imports.contains_key(source) {
      let call = self.parcel_require_call(source);
      self.hoisted_imports.insert(
        source.clone(),
        ModuleItem::Stmt(Stmt::Expr(ExprStmt {
          span: DUMMY_SP,
          expr: Box::new(call),
        })),
      );
    }
  }

  /// The rewrite target for a free `module.exports`.
  fn module_exports_expr(&mut self) -> Expr {
    self.asset.meta.is_commonjs = true;
    self.exports_referenced = true;
    let exports_name = self.exports_name();
    let symbols = self.asset.ensure_symbols();
    if !symbols.has_export_symbol(&"*".into()) {
      symbols.set("*".into(), exports_name.clone(), None, SymbolFlags::empty());
    }
    Expr::Ident(Self::ident(exports_name))
  }

  /// The rewrite target for a free `exports` reference: the namespace object,
  /// unless `exports` itself was reassigned somewhere in the module.
  fn cjs_exports_expr(&mut self) -> Expr {
    self.asset.meta.is_commonjs = true;
    if self.cjs_exports_reassigned {
      Expr::Ident(Self::ident(self.cjs_exports_name()))
    } else {
      self.exports_referenced = true;
      Expr::Ident(Self::ident(self.exports_name()))
    }
  }

  fn record_self_reference(&mut self, exported: &JsWord) {
    if !self.self_references.contains(exported) {
      self.self_references.push(exported.clone());
    }
  }

  fn is_free(&self, ident: &Ident) -> bool {
    is_unresolved(ident, self.collect.unresolved_mark)
  }

  /// `exports.K = …` or `module.exports.K = …` with a statically known K.
  fn match_cjs_export_target(&self, member: &MemberExpr) -> Option<JsWord> {
    let prop = match_member_prop(&member.prop)?;
    match &*member.obj {
      Expr::Ident(obj) if self.is_free(obj) && obj.sym == *"exports" => Some(prop),
      Expr::Member(inner) => {
        if let Expr::Ident(obj) = &*inner.obj {
          if self.is_free(obj)
            && obj.sym == *"module"
            && matches!(match_member_prop(&inner.prop), Some(ref p) if *p == *"exports")
          {
            return Some(prop);
          }
        }
        None
      }
      _ => None,
    }
  }

  /// Registers the `$parcel$export` call and symbol entry for a CommonJS
  /// export; returns the export identifier.
  fn register_cjs_export(&mut self, exported: &JsWord, loc: SourceLocation) -> JsWord {
    self.asset.meta.is_commonjs = true;
    let export_id = self.export_name(exported);
    if self.registered_exports.insert(exported.clone()) {
      let stmt = self.parcel_export_stmt(exported, Self::thunk(export_id.clone()));
      self.post_stmts.push(stmt);
    }

    if *exported != *"default" && *exported != *"*" {
      let export_id = export_id.clone();
      let exported = exported.clone();
      let symbols = self.asset.ensure_symbols();
      if !symbols.has_export_symbol(&exported) {
        symbols.set(exported, export_id, Some(loc), SymbolFlags::empty());
      }
    }

    export_id
  }

  /// Replaces a whole `exports.K = rhs;` statement with
  /// `var $<id>$export$K = rhs;` on the first assignment.
  fn try_cjs_export_stmt(&mut self, stmt: &Stmt) -> Option<Vec<ModuleItem>> {
    if self.collect.should_wrap {
      return None;
    }

    let expr_stmt = match stmt {
      Stmt::Expr(expr_stmt) => expr_stmt,
      _ => return None,
    };
    let assign = match &*expr_stmt.expr {
      Expr::Assign(assign) if assign.op == AssignOp::Assign => assign,
      _ => return None,
    };
    let member = match &assign.left {
      AssignTarget::Simple(SimpleAssignTarget::Member(member)) => member,
      _ => return None,
    };
    let exported = self.match_cjs_export_target(member)?;
    if !is_valid_identifier(&exported) || self.export_decls.contains(&exported) {
      return None;
    }

    let loc = self.loc(member.span);
    let export_id = self.register_cjs_export(&exported, loc);
    self.export_decls.insert(exported);
    let rhs = assign.right.clone().fold_with(self);
    Some(vec![Self::var_decl(export_id, Some(*rhs))])
  }

  fn handle_import(&mut self, import: ImportDecl) {
    let source = import.src.value.clone();
    let loc = self.loc(import.span);
    let position = match self
      .asset
      .dependencies
      .iter()
      .position(|dep| dep.specifier == source)
    {
      Some(position) => position,
      None => {
        self.err(HoistError::MissingDependency {
          specifier: source.to_string(),
          loc: Some(loc),
        });
        return;
      }
    };
    let dep_id = self.asset.dependencies[position].id();
    self.asset.dependencies[position].ensure_symbols();

    for specifier in &import.specifiers {
      let (local, imported) = match specifier {
        ImportSpecifier::Named(named) => {
          let imported = match &named.imported {
            Some(ModuleExportName::Ident(ident)) => ident.sym.clone(),
            Some(ModuleExportName::Str(s)) => {
              if !is_valid_identifier(&s.value) && s.value != *"default" && s.value != *"*" {
                self.err(HoistError::UnknownImportConstruct {
                  loc: Some(self.loc(s.span)),
                });
                continue;
              }
              s.value.clone()
            }
            None => named.local.sym.clone(),
          };
          (&named.local, imported)
        }
        ImportSpecifier::Default(default) => (&default.local, "default".into()),
        ImportSpecifier::Namespace(namespace) => (&namespace.local, "*".into()),
      };

      let local_id = local.to_id();
      let referenced = self.collect.referenced.contains(&local_id)
        || self.collect.exports.contains_key(&local_id);
      if !referenced && !self.asset.is_source {
        continue;
      }

      let spec_loc = self.loc(local.span);
      // A binding whose only use is a re-export may be elided downstream.
      let is_weak = self.collect.exports.contains_key(&local_id)
        && !self.collect.referenced.contains(&local_id);
      let flags = if is_weak {
        SymbolFlags::IS_WEAK
      } else {
        SymbolFlags::empty()
      };

      if imported == *"*" {
        if self.collect.non_static_access.contains_key(&local_id) {
          let local_name = self.namespace_import_name(&dep_id);
          let dep = &mut self.asset.dependencies[position];
          let symbols = dep.ensure_symbols();
          if symbols.get(&"*".into()).is_none() {
            symbols.set("*".into(), local_name, Some(spec_loc), flags);
          }
        } else if let Some(accesses) = self.collect.static_access.get(&local_id) {
          // Every use is a static member access; record one symbol per member
          // and skip the namespace object entirely.
          let accesses = accesses.clone();
          for (member, member_loc) in accesses {
            let local_name = self.import_name(&dep_id, &member);
            let dep = &mut self.asset.dependencies[position];
            let symbols = dep.ensure_symbols();
            if symbols.get(&member).is_none() {
              symbols.set(member, local_name, Some(member_loc), SymbolFlags::empty());
            }
          }
        }
        continue;
      }

      if imported == *"default" {
        self.asset.dependencies[position].meta.has_default_import = true;
      }

      let canonical = self
        .collect
        .canonical_import(&source, &imported)
        .map(|(canonical_id, _)| canonical_id.0.clone())
        .unwrap_or_else(|| local_id.0.clone());
      let local_name = self.import_name(&dep_id, &canonical);
      let dep = &mut self.asset.dependencies[position];
      let symbols = dep.ensure_symbols();
      if symbols.get(&imported).is_none() {
        symbols.set(imported, local_name, Some(spec_loc), flags);
      }
    }

    self.hoist_require(&source);
  }

  fn handle_export_decl(&mut self, export: swc_core::ecma::ast::ExportDecl) {
    let mut names = Vec::new();
    match &export.decl {
      Decl::Var(var) => {
        for declarator in &var.decls {
          crate::utils::collect_pat_bindings(&declarator.name, &mut names);
        }
      }
      Decl::Fn(FnDecl { ident, .. }) | Decl::Class(ClassDecl { ident, .. }) => {
        names.push(ident.clone());
      }
      _ => {}
    }

    let decl = export.decl.fold_with(self);
    self.module_items.push(ModuleItem::Stmt(Stmt::Decl(decl)));

    for ident in names {
      let exported = match self.collect.exports.get(&ident.to_id()) {
        Some(export) => export.exported.clone(),
        None => ident.sym.clone(),
      };
      // Wrapped bodies keep their binding names; the thunk closes over them.
      let local = if self.collect.should_wrap {
        ident.sym.clone()
      } else {
        self.export_name(&exported)
      };
      let stmt = self.parcel_export_stmt(&exported, Self::thunk(local.clone()));
      self.module_items.push(stmt);

      let loc = self.loc(ident.span);
      let symbols = self.asset.ensure_symbols();
      if !symbols.has_export_symbol(&exported) {
        symbols.set(exported, local, Some(loc), SymbolFlags::empty());
      }
    }
  }

  fn handle_export_named(&mut self, export: swc_core::ecma::ast::NamedExport) {
    use swc_core::ecma::ast::ExportSpecifier;

    let export_name_of = |name: &ModuleExportName, hoist: &mut Self| -> Option<JsWord> {
      match name {
        ModuleExportName::Ident(ident) => Some(ident.sym.clone()),
        ModuleExportName::Str(s) => {
          if is_valid_identifier(&s.value) || s.value == *"default" {
            Some(s.value.clone())
          } else {
            hoist.err(HoistError::UnknownExportConstruct {
              loc: Some(hoist.loc(s.span)),
            });
            None
          }
        }
      }
    };

    match &export.src {
      None => {
        for specifier in &export.specifiers {
          let spec = match specifier {
            ExportSpecifier::Named(spec) => spec,
            _ => {
              self.err(HoistError::UnknownExportConstruct {
                loc: Some(self.loc(export.span)),
              });
              continue;
            }
          };
          let local = match &spec.orig {
            ModuleExportName::Ident(ident) => ident,
            ModuleExportName::Str(s) => {
              self.err(HoistError::UnknownExportConstruct {
                loc: Some(self.loc(s.span)),
              });
              continue;
            }
          };
          let exported = match &spec.exported {
            Some(name) => match export_name_of(name, self) {
              Some(name) => name,
              None => continue,
            },
            None => local.sym.clone(),
          };

          let local_id = local.to_id();
          let local_name = if self.collect.imports.contains_key(&local_id) {
            // Re-export of an import; reuse the import slot.
            match self.import_local_name(&local_id) {
              Some(name) => name,
              None => continue,
            }
          } else if self.collect.should_wrap {
            // No renames inside a wrapped body.
            local.sym.clone()
          } else if let Some(known) = self.collect.exports.get(&local_id) {
            self.export_name(&known.exported)
          } else {
            self.export_name(&exported)
          };

          let stmt = self.parcel_export_stmt(&exported, Self::thunk(local_name.clone()));
          self.module_items.push(stmt);

          let loc = self.loc(spec.span);
          let symbols = self.asset.ensure_symbols();
          if !symbols.has_export_symbol(&exported) {
            symbols.set(exported, local_name, Some(loc), SymbolFlags::empty());
          }
        }
      }
      Some(src) => {
        let source = src.value.clone();
        let loc = self.loc(export.span);
        let position = match self
          .asset
          .dependencies
          .iter()
          .position(|dep| dep.specifier == source)
        {
          Some(position) => position,
          None => {
            self.err(HoistError::MissingDependency {
              specifier: source.to_string(),
              loc: Some(loc),
            });
            return;
          }
        };
        let dep_id = self.asset.dependencies[position].id();

        for specifier in &export.specifiers {
          let (imported, exported, spec_span) = match specifier {
            ExportSpecifier::Named(spec) => {
              let imported = match export_name_of(&spec.orig, self) {
                Some(name) => name,
                None => continue,
              };
              let exported = match &spec.exported {
                Some(name) => match export_name_of(name, self) {
                  Some(name) => name,
                  None => continue,
                },
                None => imported.clone(),
              };
              (imported, exported, spec.span)
            }
            ExportSpecifier::Namespace(spec) => {
              let exported = match export_name_of(&spec.name, self) {
                Some(name) => name,
                None => continue,
              };
              ("*".into(), exported, spec.span)
            }
            ExportSpecifier::Default(spec) => {
              ("default".into(), spec.exported.sym.clone(), spec.exported.span)
            }
          };

          let spec_loc = self.loc(spec_span);
          let local_name = if imported == *"*" {
            self.namespace_import_name(&dep_id)
          } else {
            let dep = &self.asset.dependencies[position];
            dep
              .symbols
              .as_ref()
              .and_then(|symbols| symbols.get(&imported))
              .map(|symbol| symbol.local.clone())
              .unwrap_or_else(|| self.import_name(&dep_id, &imported))
          };

          {
            let dep = &mut self.asset.dependencies[position];
            let symbols = dep.ensure_symbols();
            if symbols.get(&imported).is_none() {
              symbols.set(
                imported,
                local_name.clone(),
                Some(spec_loc.clone()),
                SymbolFlags::IS_WEAK,
              );
            }
          }

          let stmt =
            self.parcel_export_stmt(&exported, Expr::Ident(Self::ident(local_name.clone())));
          self.module_items.push(stmt);

          let symbols = self.asset.ensure_symbols();
          if !symbols.has_export_symbol(&exported) {
            symbols.set(exported, local_name, Some(spec_loc), SymbolFlags::empty());
          }
        }

        self.hoist_require(&source);
      }
    }
  }

  fn handle_export_all(&mut self, export: swc_core::ecma::ast::ExportAll) {
    let source = export.src.value.clone();
    let loc = self.loc(export.span);
    let position = match self
      .asset
      .dependencies
      .iter()
      .position(|dep| dep.specifier == source)
    {
      Some(position) => position,
      None => {
        self.err(HoistError::MissingDependency {
          specifier: source.to_string(),
          loc: Some(loc),
        });
        return;
      }
    };

    {
      let dep = &mut self.asset.dependencies[position];
      let symbols = dep.ensure_symbols();
      if symbols.get(&"*".into()).is_none() {
        symbols.set("*".into(), "*".into(), Some(loc), SymbolFlags::IS_WEAK);
      }
    }

    // $parcel$exportWildcard($<id>$exports, $parcel$require(id, source));
    // Emitted among the hoisted imports, in source-relative order.
    let target = if self.collect.should_wrap {
      Self::ident("exports".into())
    } else {
      self.exports_referenced = true;
      Self::ident(self.exports_name())
    };
    let require = self.parcel_require_call(&source);
    let stmt = ModuleItem::Stmt(Stmt::Expr(ExprStmt {
      span: DUMMY_SP,
      expr: Box::new(Expr::Call(CallExpr {
        callee: Callee::Expr(Box::new(Expr::Ident(Self::ident(
          "$parcel$exportWildcard".into(),
        )))),
        args: vec![
          ExprOrSpread {
            spread: None,
            expr: Box::new(Expr::Ident(target)),
          },
          ExprOrSpread {
            spread: None,
            expr: Box::new(require),
          },
        ],
        ..Default::default()
      })),
    }));
    if self.collect.should_wrap {
      // The copy needs the closure-local exports object, so it stays in the
      // body instead of the hoisted import block above the wrapper.
      self.module_items.push(stmt);
    } else {
      self
        .hoisted_imports
        .insert(format!("*:{}", source).into(), stmt);
    }
  }

  fn record_default_symbol(&mut self, identifier: JsWord, loc: SourceLocation) {
    let symbols = self.asset.ensure_symbols();
    if !symbols.has_export_symbol(&"default".into()) {
      symbols.set("default".into(), identifier, Some(loc), SymbolFlags::empty());
    }
  }

  fn handle_export_default_decl(&mut self, export: swc_core::ecma::ast::ExportDefaultDecl) {
    let loc = self.loc(export.span);
    match export.decl {
      DefaultDecl::Fn(fn_expr) => match fn_expr.ident {
        Some(ident) => {
          let identifier = if self.collect.should_wrap {
            ident.sym.clone()
          } else {
            match self.collect.exports.get(&ident.to_id()) {
              Some(known) => self.export_name(&known.exported),
              None => self.export_name(&"default".into()),
            }
          };
          let decl = FnDecl {
            ident,
            declare: false,
            function: fn_expr.function,
          }
          .fold_with(self);
          self.module_items.push(ModuleItem::Stmt(Stmt::Decl(Decl::Fn(decl))));
          let stmt = self.parcel_export_stmt(&"default".into(), Self::thunk(identifier.clone()));
          self.module_items.push(stmt);
          self.record_default_symbol(identifier, loc);
        }
        None => {
          let identifier = self.export_name(&"default".into());
          let init = Expr::Fn(swc_core::ecma::ast::FnExpr {
            ident: None,
            function: fn_expr.function,
          })
          .fold_with(self);
          self
            .module_items
            .push(Self::var_decl(identifier.clone(), Some(init)));
          let stmt = self.parcel_export_stmt(&"default".into(), Self::thunk(identifier.clone()));
          self.module_items.push(stmt);
          self.record_default_symbol(identifier, loc);
        }
      },
      DefaultDecl::Class(class_expr) => match class_expr.ident {
        Some(ident) => {
          let identifier = if self.collect.should_wrap {
            ident.sym.clone()
          } else {
            match self.collect.exports.get(&ident.to_id()) {
              Some(known) => self.export_name(&known.exported),
              None => self.export_name(&"default".into()),
            }
          };
          let decl = ClassDecl {
            ident,
            declare: false,
            class: class_expr.class,
          }
          .fold_with(self);
          self
            .module_items
            .push(ModuleItem::Stmt(Stmt::Decl(Decl::Class(decl))));
          let stmt = self.parcel_export_stmt(&"default".into(), Self::thunk(identifier.clone()));
          self.module_items.push(stmt);
          self.record_default_symbol(identifier, loc);
        }
        None => {
          let identifier = self.export_name(&"default".into());
          let init = Expr::Class(swc_core::ecma::ast::ClassExpr {
            ident: None,
            class: class_expr.class,
          })
          .fold_with(self);
          self
            .module_items
            .push(Self::var_decl(identifier.clone(), Some(init)));
          let stmt = self.parcel_export_stmt(&"default".into(), Self::thunk(identifier.clone()));
          self.module_items.push(stmt);
          self.record_default_symbol(identifier, loc);
        }
      },
      DefaultDecl::TsInterfaceDecl(_) => {
        self.err(HoistError::UnknownExportConstruct { loc: Some(loc) });
      }
    }
  }

  fn handle_export_default_expr(&mut self, export: swc_core::ecma::ast::ExportDefaultExpr) {
    let loc = self.loc(export.span);
    let renamed_binding = match &*export.expr {
      Expr::Ident(ident) if !self.is_free(ident) => {
        let id = ident.to_id();
        if self.collect.imports.contains_key(&id) {
          // The default value is an imported binding; reuse its slot.
          self.import_local_name(&id)
        } else if self.collect.should_wrap {
          self.collect.exports.get(&id).map(|_| ident.sym.clone())
        } else {
          self
            .collect
            .exports
            .get(&id)
            .map(|known| self.export_name(&known.exported))
        }
      }
      _ => None,
    };

    let identifier = match renamed_binding {
      Some(identifier) => {
        // The binding itself is renamed wherever it is declared; the export
        // statement disappears.
        identifier
      }
      None => {
        let identifier = self.export_name(&"default".into());
        let init = export.expr.fold_with(self);
        self
          .module_items
          .push(Self::var_decl(identifier.clone(), Some(*init)));
        identifier
      }
    };

    let stmt = self.parcel_export_stmt(&"default".into(), Self::thunk(identifier.clone()));
    self.module_items.push(stmt);
    self.record_default_symbol(identifier, loc);
  }

  fn handle_module_decl(&mut self, decl: ModuleDecl) {
    match decl {
      ModuleDecl::Import(import) => self.handle_import(import),
      ModuleDecl::ExportDecl(export) => self.handle_export_decl(export),
      ModuleDecl::ExportNamed(export) => self.handle_export_named(export),
      ModuleDecl::ExportDefaultDecl(export) => self.handle_export_default_decl(export),
      ModuleDecl::ExportDefaultExpr(export) => self.handle_export_default_expr(export),
      ModuleDecl::ExportAll(export) => self.handle_export_all(export),
      _ => {}
    }
  }

  fn fold_member(&mut self, member: MemberExpr) -> Expr {
    if !self.collect.should_wrap {
      let prop = match_member_prop(&member.prop);

      // module.bundle.root
      if let Expr::Member(inner) = &*member.obj {
        if let Expr::Ident(obj) = &*inner.obj {
          if self.is_free(obj)
            && obj.sym == *"module"
            && matches!(match_member_prop(&inner.prop), Some(ref p) if *p == *"bundle")
            && matches!(prop, Some(ref p) if *p == *"root")
          {
            return Expr::Ident(Self::ident("parcelRequire".into()));
          }
        }
      }

      if let Expr::Ident(obj) = &*member.obj {
        if self.is_free(obj) && obj.sym == *"module" {
          if let Some(prop) = &prop {
            match &**prop {
              "exports" => return self.module_exports_expr(),
              "id" => return Self::str_lit(self.asset.id.as_str().into()),
              "hot" => return Self::null_lit(),
              "require" if !self.asset.env.is_node() => return Self::null_lit(),
              "bundle" => return Expr::Ident(Self::ident("parcelRequire".into())),
              _ => {}
            }
          }
          return Expr::Member(member.fold_children_with(self));
        }

        // Reading back one of the module's own exports.
        if self.is_free(obj) && obj.sym == *"exports" {
          if let Some(prop) = &prop {
            self.record_self_reference(prop);
          }
          return Expr::Member(member.fold_children_with(self));
        }

        // Namespace import member access: rewrite to a per-member import.
        let obj_id = obj.to_id();
        if let Some(import) = self.collect.imports.get(&obj_id) {
          if import.specifier == *"*"
            && !self.collect.non_static_access.contains_key(&obj_id)
          {
            if let (Some(member_name), Some(dep_id)) = (&prop, self.dep_id(&import.source)) {
              let local_name = self.import_name(&dep_id, member_name);
              let member_loc = self.loc(member.span);
              let source = import.source.clone();
              if let Some(dep) = self.asset.dependency_mut(&source) {
                let symbols = dep.ensure_symbols();
                if symbols.get(member_name).is_none() {
                  symbols.set(
                    member_name.clone(),
                    local_name.clone(),
                    Some(member_loc),
                    SymbolFlags::empty(),
                  );
                }
              }
              return Expr::Ident(Ident::new_no_ctxt(local_name, member.span));
            }
          }
        }
      }

      // module.exports.K read
      if let Expr::Member(inner) = &*member.obj {
        if let Expr::Ident(obj) = &*inner.obj {
          if self.is_free(obj)
            && obj.sym == *"module"
            && matches!(match_member_prop(&inner.prop), Some(ref p) if *p == *"exports")
          {
            if let Some(prop) = &prop {
              self.record_self_reference(prop);
            }
            let obj = self.module_exports_expr();
            return Expr::Member(MemberExpr {
              span: member.span,
              obj: Box::new(obj),
              prop: member.prop.fold_with(self),
            });
          }
        }
      }
    }

    Expr::Member(member.fold_children_with(self))
  }

  fn fold_call(&mut self, call: CallExpr) -> Expr {
    // require.resolve("source")
    if let Callee::Expr(callee) = &call.callee {
      if let Expr::Member(member) = &**callee {
        if let Expr::Ident(obj) = &*member.obj {
          if obj.sym == *"require"
            && self.is_free(obj)
            && matches!(match_member_prop(&member.prop), Some(ref p) if *p == *"resolve")
            && call.args.len() == 1
          {
            if let Some((source, _)) = match_str(&call.args[0].expr) {
              if self.asset.dependency(&source).is_some() {
                return self.parcel_require_resolve_call(&source);
              }
            }
          }
        }
      }

      // require("source")
      if let Expr::Ident(ident) = &**callee {
        if ident.sym == *"require" && self.is_free(ident) && call.args.len() == 1 {
          if let Some((source, _)) = match_str(&call.args[0].expr) {
            if let Some(position) = self
              .asset
              .dependencies
              .iter()
              .position(|dep| dep.specifier == source)
            {
              if !self.asset.dependencies[position].is_async() {
                self.asset.meta.is_commonjs = true;
              }

              // Call order is only statically known for an unconditional
              // top-level require.
              let top_level = self.in_function_scope == 0
                && self.in_conditional == 0
                && self.in_nested_stmt == 0;
              if !top_level {
                self.asset.dependencies[position].meta.should_wrap = true;
                if !self.wrapped_dependencies.contains(&source) {
                  self.wrapped_dependencies.push(source.clone());
                }
              }

              return self.parcel_require_call(&source);
            }
            // Unknown specifier: leave the call alone.
          }
        }
      }
    }

    // import("source")
    if let Callee::Import(_) = call.callee {
      if call.args.len() == 1 {
        if let Some((source, _)) = match_str(&call.args[0].expr) {
          if self.asset.dependency(&source).is_some() {
            return self.parcel_require_call(&source);
          }
        }
      }
    }

    Expr::Call(call.fold_children_with(self))
  }

  fn wrap_module(&mut self, span: swc_core::common::Span) -> Vec<ModuleItem> {
    let body_stmts: Vec<Stmt> = std::mem::take(&mut self.module_items)
      .into_iter()
      .filter_map(|item| match item {
        ModuleItem::Stmt(stmt) => Some(stmt),
        ModuleItem::ModuleDecl(_) => None,
      })
      .collect();

    let mut stmts = Vec::with_capacity(body_stmts.len() + 3);
    // var exports = this;
    stmts.push(Stmt::Decl(Decl::Var(Box::new(VarDecl {
      decls: vec![VarDeclarator {
        span: DUMMY_SP,
        name: Pat::Ident(Self::ident("exports".into()).into()),
        init: Some(Box::new(Expr::This(swc_core::ecma::ast::ThisExpr {
          span: DUMMY_SP,
        }))),
        definite: false,
      }],
      ..Default::default()
    }))));
    // var module = {exports: this};
    stmts.push(Stmt::Decl(Decl::Var(Box::new(VarDecl {
      decls: vec![VarDeclarator {
        span: DUMMY_SP,
        name: Pat::Ident(Self::ident("module".into()).into()),
        init: Some(Box::new(Expr::Object(ObjectLit {
          span: DUMMY_SP,
          props: vec![PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
            key: PropName::Ident(IdentName::new("exports".into(), DUMMY_SP)),
            value: Box::new(Expr::This(swc_core::ecma::ast::ThisExpr { span: DUMMY_SP })),
          })))],
        }))),
        definite: false,
      }],
      ..Default::default()
    }))));
    stmts.extend(body_stmts);
    // return module.exports;
    stmts.push(Stmt::Return(ReturnStmt {
      span: DUMMY_SP,
      arg: Some(Box::new(Expr::Member(member_expr!(
        Default::default(),
        DUMMY_SP,
        module.exports
      )))),
    }));

    let closure = Expr::Fn(swc_core::ecma::ast::FnExpr {
      ident: None,
      function: Box::new(Function {
        params: vec![],
        body: Some(BlockStmt {
          stmts,
          ..Default::default()
        }),
        ..Default::default()
      }),
    });
    let wrapper = Expr::Call(CallExpr {
      callee: Callee::Expr(Box::new(Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj: Box::new(closure),
        prop: MemberProp::Ident(IdentName::new("call".into(), DUMMY_SP)),
      }))),
      args: vec![ExprOrSpread {
        spread: None,
        expr: Box::new(Expr::Object(ObjectLit {
          span: DUMMY_SP,
          props: vec![],
        })),
      }],
      ..Default::default()
    });

    let mut items: Vec<ModuleItem> =
      std::mem::take(&mut self.hoisted_imports).into_values().collect();
    if self.collect.is_esm {
      // exports.__esModule = true;
      items.push(ModuleItem::Stmt(Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(Expr::Assign(AssignExpr {
          span: DUMMY_SP,
          op: AssignOp::Assign,
          left: AssignTarget::Simple(SimpleAssignTarget::Member(MemberExpr {
            span: DUMMY_SP,
            obj: Box::new(Expr::Ident(Self::ident("exports".into()))),
            prop: MemberProp::Ident(IdentName::new("__esModule".into(), DUMMY_SP)),
          })),
          right: Box::new(Expr::Lit(Lit::Bool(swc_core::ecma::ast::Bool {
            span: DUMMY_SP,
            value: true,
          }))),
        })),
      })));
    }

    let mut wrapper_item = Self::var_decl(self.exports_name(), Some(wrapper));
    if let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) = &mut wrapper_item {
      var.span = span;
    }
    items.push(wrapper_item);
    items
  }
}

fn is_use_strict(stmt: &Stmt) -> bool {
  if let Stmt::Expr(expr_stmt) = stmt {
    if let Expr::Lit(Lit::Str(s)) = &*expr_stmt.expr {
      return s.value == *"use strict";
    }
  }
  false
}

impl<'a> Fold for Hoist<'a> {
  fn fold_module(&mut self, node: Module) -> Module {
    let mut node = node;
    let body = std::mem::take(&mut node.body);
    for item in body {
      match item {
        ModuleItem::ModuleDecl(decl) => self.handle_module_decl(decl),
        ModuleItem::Stmt(stmt) => {
          if is_use_strict(&stmt) {
            continue;
          }

          if let Some(items) = self.try_cjs_export_stmt(&stmt) {
            self.module_items.extend(items);
          } else {
            let stmt = stmt.fold_with(self);
            self.module_items.push(ModuleItem::Stmt(stmt));
          }
        }
      }

      if !self.post_stmts.is_empty() {
        self.module_items.append(&mut self.post_stmts);
      }
    }

    if self.collect.should_wrap {
      node.body = self.wrap_module(node.span);
      return node;
    }

    let mut items = Vec::new();
    if self.exports_referenced {
      items.push(Self::var_decl(
        self.exports_name(),
        Some(Expr::Object(ObjectLit {
          span: DUMMY_SP,
          props: vec![],
        })),
      ));
    }
    items.extend(std::mem::take(&mut self.hoisted_imports).into_values());
    if self.cjs_exports_reassigned {
      items.push(Self::var_decl(self.cjs_exports_name(), None));
    }
    items.append(&mut self.module_items);
    node.body = items;
    node
  }

  fn fold_ident(&mut self, node: Ident) -> Ident {
    let id = node.to_id();

    if self.collect.imports.contains_key(&id) {
      if let Some(local_name) = self.import_local_name(&id) {
        return Ident::new(local_name, node.span, node.ctxt);
      }
      return node;
    }

    if !self.collect.should_wrap {
      if let Some(export) = self.collect.exports.get(&id) {
        return Ident::new(self.export_name(&export.exported), node.span, node.ctxt);
      }
    }

    if !self.collect.should_wrap
      && is_marked(node.ctxt, self.collect.global_mark)
      && !node.sym.starts_with(&format!("${}", self.module_id))
    {
      return Ident::new(self.var_name(&node.sym), node.span, node.ctxt);
    }

    node
  }

  fn fold_expr(&mut self, node: Expr) -> Expr {
    match node {
      Expr::Member(member) => self.fold_member(member),
      Expr::Call(call) => self.fold_call(call),
      Expr::Unary(unary) if unary.op == UnaryOp::TypeOf && !self.collect.should_wrap => {
        if let Expr::Ident(ident) = &*unary.arg {
          if self.is_free(ident) {
            if ident.sym == *"module" {
              return Self::str_lit("object".into());
            }
            if ident.sym == *"require" {
              return Self::str_lit("function".into());
            }
          }
        }
        Expr::Unary(unary.fold_children_with(self))
      }
      Expr::This(this) => {
        if !self.collect.should_wrap && self.this_scope == 0 {
          if self.asset.meta.is_commonjs {
            self.exports_referenced = true;
            return Expr::Ident(Ident::new_no_ctxt(self.exports_name(), this.span));
          }
          return Expr::Ident(Ident::new_no_ctxt("undefined".into(), this.span));
        }
        Expr::This(this)
      }
      Expr::Ident(ident) => {
        if self.is_free(&ident) && !self.collect.should_wrap {
          if ident.sym == *"exports" {
            return self.cjs_exports_expr();
          }
          if ident.sym == *"global" {
            return Expr::Ident(Ident::new_no_ctxt("$parcel$global".into(), ident.span));
          }
        }
        Expr::Ident(self.fold_ident(ident))
      }
      _ => node.fold_children_with(self),
    }
  }

  fn fold_assign_expr(&mut self, node: AssignExpr) -> AssignExpr {
    if self.collect.should_wrap || node.op != AssignOp::Assign {
      return node.fold_children_with(self);
    }

    match &node.left {
      AssignTarget::Simple(SimpleAssignTarget::Ident(binding))
        if self.is_free(&binding.id) && binding.id.sym == *"exports" =>
      {
        // exports = rhs: rebind the local `exports` variable, not the
        // namespace object.
        self.cjs_exports_reassigned = true;
        self.asset.meta.is_commonjs = true;
        let right = node.right.fold_with(self);
        return AssignExpr {
          span: node.span,
          op: node.op,
          left: AssignTarget::Simple(SimpleAssignTarget::Ident(BindingIdent::from(
            Self::ident(self.cjs_exports_name()),
          ))),
          right,
        };
      }
      AssignTarget::Simple(SimpleAssignTarget::Member(member)) => {
        let member = member.clone();
        if let Some(exported) = self.match_cjs_export_target(&member) {
          if is_valid_identifier(&exported) {
            // exports.K = $<id>$export$K = rhs
            let loc = self.loc(member.span);
            let export_id = self.register_cjs_export(&exported, loc);
            if self.export_decls.insert(exported.clone()) {
              // First sighting was not a whole statement: hoist a bare decl.
              self.module_items.push(Self::var_decl(export_id.clone(), None));
            }
            self.exports_referenced = true;
            let right = node.right.fold_with(self);
            return AssignExpr {
              span: node.span,
              op: node.op,
              left: AssignTarget::Simple(SimpleAssignTarget::Member(MemberExpr {
                span: member.span,
                obj: Box::new(Expr::Ident(Self::ident(self.exports_name()))),
                prop: member.prop.clone(),
              })),
              right: Box::new(Expr::Assign(AssignExpr {
                span: DUMMY_SP,
                op: AssignOp::Assign,
                left: AssignTarget::Simple(SimpleAssignTarget::Ident(BindingIdent::from(
                  Self::ident(export_id),
                ))),
                right,
              })),
            };
          }
        }

        // Everything else goes through the member rewrites, including
        // `module.exports = rhs` which deliberately stays a plain assignment
        // to the exports object.
        let folded = self.fold_member(member);
        let left = match folded {
          Expr::Ident(ident) => AssignTarget::Simple(SimpleAssignTarget::Ident(ident.into())),
          Expr::Member(member) => AssignTarget::Simple(SimpleAssignTarget::Member(member)),
          _ => node.left.clone().fold_children_with(self),
        };
        let right = node.right.fold_with(self);
        return AssignExpr {
          span: node.span,
          op: node.op,
          left,
          right,
        };
      }
      _ => {}
    }

    node.fold_children_with(self)
  }

  fn fold_prop(&mut self, node: Prop) -> Prop {
    match node {
      Prop::Shorthand(ident) => {
        let key = IdentName::new(ident.sym.clone(), ident.span);
        let folded = self.fold_expr(Expr::Ident(ident));
        match folded {
          Expr::Ident(new_ident) if new_ident.sym == key.sym => Prop::Shorthand(new_ident),
          value => Prop::KeyValue(KeyValueProp {
            key: PropName::Ident(key),
            value: Box::new(value),
          }),
        }
      }
      _ => node.fold_children_with(self),
    }
  }

  fn fold_object_pat_prop(&mut self, node: ObjectPatProp) -> ObjectPatProp {
    match node {
      ObjectPatProp::Assign(assign) => {
        let key_sym = assign.key.id.sym.clone();
        let folded = self.fold_ident(assign.key.id.clone());
        let value = assign.value.map(|value| value.fold_with(self));
        if folded.sym == key_sym {
          ObjectPatProp::Assign(swc_core::ecma::ast::AssignPatProp {
            span: assign.span,
            key: folded.into(),
            value,
          })
        } else {
          // Shorthand would change the object key; expand to key: value.
          let pat = match value {
            Some(default) => Pat::Assign(AssignPat {
              span: assign.span,
              left: Box::new(Pat::Ident(folded.into())),
              right: default,
            }),
            None => Pat::Ident(folded.into()),
          };
          ObjectPatProp::KeyValue(KeyValuePatProp {
            key: PropName::Ident(IdentName::new(key_sym, assign.span)),
            value: Box::new(pat),
          })
        }
      }
      _ => node.fold_children_with(self),
    }
  }

  fn fold_function(&mut self, node: Function) -> Function {
    self.in_function_scope += 1;
    self.this_scope += 1;
    let node = node.fold_children_with(self);
    self.this_scope -= 1;
    self.in_function_scope -= 1;
    node
  }

  fn fold_arrow_expr(
    &mut self,
    node: swc_core::ecma::ast::ArrowExpr,
  ) -> swc_core::ecma::ast::ArrowExpr {
    self.in_function_scope += 1;
    let node = node.fold_children_with(self);
    self.in_function_scope -= 1;
    node
  }

  fn fold_constructor(
    &mut self,
    node: swc_core::ecma::ast::Constructor,
  ) -> swc_core::ecma::ast::Constructor {
    self.in_function_scope += 1;
    self.this_scope += 1;
    let node = node.fold_children_with(self);
    self.this_scope -= 1;
    self.in_function_scope -= 1;
    node
  }

  fn fold_getter_prop(
    &mut self,
    node: swc_core::ecma::ast::GetterProp,
  ) -> swc_core::ecma::ast::GetterProp {
    self.in_function_scope += 1;
    self.this_scope += 1;
    let node = node.fold_children_with(self);
    self.this_scope -= 1;
    self.in_function_scope -= 1;
    node
  }

  fn fold_setter_prop(
    &mut self,
    node: swc_core::ecma::ast::SetterProp,
  ) -> swc_core::ecma::ast::SetterProp {
    self.in_function_scope += 1;
    self.this_scope += 1;
    let node = node.fold_children_with(self);
    self.this_scope -= 1;
    self.in_function_scope -= 1;
    node
  }

  fn fold_bin_expr(&mut self, node: BinExpr) -> BinExpr {
    match node.op {
      BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing => {
        self.in_conditional += 1;
        let node = node.fold_children_with(self);
        self.in_conditional -= 1;
        node
      }
      _ => node.fold_children_with(self),
    }
  }

  fn fold_cond_expr(&mut self, node: CondExpr) -> CondExpr {
    self.in_conditional += 1;
    let node = node.fold_children_with(self);
    self.in_conditional -= 1;
    node
  }

  fn fold_if_stmt(&mut self, node: IfStmt) -> IfStmt {
    self.in_nested_stmt += 1;
    let node = node.fold_children_with(self);
    self.in_nested_stmt -= 1;
    node
  }

  fn fold_while_stmt(&mut self, node: WhileStmt) -> WhileStmt {
    self.in_nested_stmt += 1;
    let node = node.fold_children_with(self);
    self.in_nested_stmt -= 1;
    node
  }

  fn fold_do_while_stmt(&mut self, node: DoWhileStmt) -> DoWhileStmt {
    self.in_nested_stmt += 1;
    let node = node.fold_children_with(self);
    self.in_nested_stmt -= 1;
    node
  }

  fn fold_for_stmt(&mut self, node: ForStmt) -> ForStmt {
    self.in_nested_stmt += 1;
    let node = node.fold_children_with(self);
    self.in_nested_stmt -= 1;
    node
  }

  fn fold_for_in_stmt(&mut self, node: ForInStmt) -> ForInStmt {
    self.in_nested_stmt += 1;
    let node = node.fold_children_with(self);
    self.in_nested_stmt -= 1;
    node
  }

  fn fold_for_of_stmt(&mut self, node: ForOfStmt) -> ForOfStmt {
    self.in_nested_stmt += 1;
    let node = node.fold_children_with(self);
    self.in_nested_stmt -= 1;
    node
  }

  fn fold_switch_stmt(&mut self, node: SwitchStmt) -> SwitchStmt {
    self.in_nested_stmt += 1;
    let node = node.fold_children_with(self);
    self.in_nested_stmt -= 1;
    node
  }

  fn fold_try_stmt(&mut self, node: TryStmt) -> TryStmt {
    self.in_nested_stmt += 1;
    let node = node.fold_children_with(self);
    self.in_nested_stmt -= 1;
    node
  }

  fn fold_block_stmt(&mut self, node: BlockStmt) -> BlockStmt {
    self.in_nested_stmt += 1;
    let node = node.fold_children_with(self);
    self.in_nested_stmt -= 1;
    node
  }
}
