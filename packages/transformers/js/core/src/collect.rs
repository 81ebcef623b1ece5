use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use swc_core::{
  common::{sync::Lrc, Mark, SourceMap, Span},
  ecma::{
    ast::{
      AssignExpr, AssignOp, AssignTarget, AssignTargetPat, CallExpr, Callee, ClassDecl, Decl,
      DefaultDecl, Expr, ExportSpecifier, FnDecl, Id, Ident, MemberExpr, MemberProp, Module,
      ModuleDecl, ModuleExportName, ModuleItem, ObjectPat, ObjectPatProp, Pat, Prop, PropName,
      ReturnStmt, UnaryOp, UpdateExpr, VarDeclarator,
    },
    atoms::JsWord,
    visit::{Visit, VisitWith},
  },
};

use crate::utils::{
  collect_pat_bindings, is_unresolved, match_member_prop, match_str, SourceLocation,
};

/// A single imported binding: where it comes from and which exported name it
/// refers to (`"default"` and `"*"` for default and namespace imports).
#[derive(Clone, Debug)]
pub struct Import {
  pub source: JsWord,
  pub specifier: JsWord,
  pub loc: SourceLocation,
}

/// A locally declared binding that the module exports.
#[derive(Clone, Debug)]
pub struct Export {
  pub exported: JsWord,
  pub loc: SourceLocation,
}

/// Statically derived shape of a dynamic `import()` continuation.
#[derive(Clone, Debug)]
pub enum DynamicImport {
  /// Only the listed members are accessed.
  Members(Vec<(JsWord, SourceLocation)>),
  /// Bound to a namespace variable; resolved after the walk once all
  /// references to the binding are known.
  Candidate(Id),
  /// The namespace escapes; the whole module must be retained.
  Namespace,
}

/// First pass over the module. Classifies it (ES module vs CommonJS vs
/// needs-wrap), registers import/export bindings before the body walk so that
/// references ahead of their declaration resolve, and records the reference
/// bookkeeping the hoisting fold consults.
pub struct Collect {
  pub source_map: Lrc<SourceMap>,
  pub unresolved_mark: Mark,
  pub global_mark: Mark,
  pub is_esm: bool,
  pub is_cjs: bool,
  pub should_wrap: bool,
  pub resolve_exports_bailed_out: bool,
  pub imports: IndexMap<Id, Import>,
  pub exports: IndexMap<Id, Export>,
  pub referenced: HashSet<Id>,
  pub static_access: HashMap<Id, Vec<(JsWord, SourceLocation)>>,
  pub non_static_access: HashMap<Id, Vec<Span>>,
  pub non_const_bindings: HashSet<Id>,
  pub dynamic_imports: IndexMap<JsWord, DynamicImport>,
  dynamic_import_shapes: IndexMap<JsWord, Vec<DynamicImport>>,
  handled_dynamic_imports: HashSet<Span>,
  in_function: usize,
}

impl Collect {
  pub fn new(source_map: Lrc<SourceMap>, unresolved_mark: Mark, global_mark: Mark) -> Self {
    Collect {
      source_map,
      unresolved_mark,
      global_mark,
      is_esm: false,
      is_cjs: false,
      should_wrap: false,
      resolve_exports_bailed_out: false,
      imports: IndexMap::new(),
      exports: IndexMap::new(),
      referenced: HashSet::new(),
      static_access: HashMap::new(),
      non_static_access: HashMap::new(),
      non_const_bindings: HashSet::new(),
      dynamic_imports: IndexMap::new(),
      dynamic_import_shapes: IndexMap::new(),
      handled_dynamic_imports: HashSet::new(),
      in_function: 0,
    }
  }

  pub fn is_const(&self, id: &Id) -> bool {
    !self.non_const_bindings.contains(id)
  }

  /// The canonical local for a (source, imported) pair: the first import that
  /// bound it. Duplicate imports of the same name share one slot.
  pub fn canonical_import(&self, source: &JsWord, specifier: &JsWord) -> Option<(&Id, &Import)> {
    self
      .imports
      .iter()
      .find(|(_, import)| import.source == *source && import.specifier == *specifier)
  }

  fn loc(&self, span: Span) -> SourceLocation {
    SourceLocation::from(&self.source_map, span)
  }

  fn visit_ref_ident(&mut self, ident: &Ident) {
    let id = ident.to_id();
    self.referenced.insert(id.clone());
    self.non_static_access.entry(id).or_default().push(ident.span);

    if is_unresolved(ident, self.unresolved_mark) {
      match &*ident.sym {
        // A module reference the CJS rewriter cannot see through.
        "module" => {
          self.is_cjs = true;
          self.should_wrap = true;
        }
        // `exports` outside the safe contexts: the namespace escapes.
        "exports" => {
          self.is_cjs = true;
          self.resolve_exports_bailed_out = true;
        }
        _ => {}
      }
    }
  }

  fn is_free_module_exports(&self, member: &MemberExpr) -> bool {
    if let Expr::Ident(obj) = &*member.obj {
      obj.sym == *"module"
        && is_unresolved(obj, self.unresolved_mark)
        && matches!(match_member_prop(&member.prop), Some(ref prop) if *prop == *"exports")
    } else {
      false
    }
  }

  fn visit_member(&mut self, member: &MemberExpr) {
    let prop = match_member_prop(&member.prop);
    match &*member.obj {
      Expr::Ident(obj) if is_unresolved(obj, self.unresolved_mark) && obj.sym == *"module" => {
        self.is_cjs = true;
        if prop.is_none() {
          // `module[expr]` is not a static access.
          self.should_wrap = true;
        }
      }
      Expr::Ident(obj) if is_unresolved(obj, self.unresolved_mark) && obj.sym == *"exports" => {
        self.is_cjs = true;
        if prop.is_none() {
          self.resolve_exports_bailed_out = true;
        }
      }
      Expr::Ident(obj) => {
        let id = obj.to_id();
        self.referenced.insert(id.clone());
        match &prop {
          Some(name) => {
            let loc = self.loc(member.span);
            self
              .static_access
              .entry(id)
              .or_default()
              .push((name.clone(), loc));
          }
          None => {
            self.non_static_access.entry(id).or_default().push(obj.span);
          }
        }
      }
      Expr::Member(inner) if self.is_free_module_exports(inner) => {
        self.is_cjs = true;
        if prop.is_none() {
          self.resolve_exports_bailed_out = true;
        }
      }
      _ => {
        member.obj.visit_with(self);
      }
    }

    if let MemberProp::Computed(computed) = &member.prop {
      if match_str(&computed.expr).is_none() {
        computed.expr.visit_with(self);
      }
    }
  }

  fn mark_assign_pat_target(&mut self, pat: &Pat) {
    match pat {
      Pat::Ident(binding) => {
        self.non_const_bindings.insert(binding.id.to_id());
        self.visit_ref_ident(&binding.id);
      }
      Pat::Expr(expr) => match &**expr {
        Expr::Member(member) => self.visit_member(member),
        other => other.visit_with(self),
      },
      Pat::Assign(assign) => {
        self.mark_assign_pat_target(&assign.left);
        assign.right.visit_with(self);
      }
      Pat::Array(arr) => {
        for elem in arr.elems.iter().flatten() {
          self.mark_assign_pat_target(elem);
        }
      }
      Pat::Object(obj) => {
        for prop in &obj.props {
          match prop {
            ObjectPatProp::KeyValue(kv) => self.mark_assign_pat_target(&kv.value),
            ObjectPatProp::Assign(assign) => {
              self.non_const_bindings.insert(assign.key.id.to_id());
              if let Some(value) = &assign.value {
                value.visit_with(self);
              }
            }
            ObjectPatProp::Rest(rest) => self.mark_assign_pat_target(&rest.arg),
          }
        }
      }
      Pat::Rest(rest) => self.mark_assign_pat_target(&rest.arg),
      Pat::Invalid(_) => {}
    }
  }

  fn object_pat_members(&self, pat: &ObjectPat) -> Option<Vec<(JsWord, SourceLocation)>> {
    let mut members = Vec::new();
    for prop in &pat.props {
      match prop {
        ObjectPatProp::KeyValue(kv) => match &kv.key {
          PropName::Ident(name) => {
            members.push((name.sym.clone(), self.loc(name.span)));
          }
          _ => return None,
        },
        ObjectPatProp::Assign(assign) => {
          members.push((assign.key.id.sym.clone(), self.loc(assign.key.id.span)));
        }
        ObjectPatProp::Rest(_) => return None,
      }
    }
    Some(members)
  }

  fn record_dynamic_import(&mut self, source: JsWord, shape: DynamicImport) {
    self
      .dynamic_import_shapes
      .entry(source)
      .or_insert_with(Vec::new)
      .push(shape);
  }

  fn callback_shape(&mut self, callback: Option<&Expr>) -> DynamicImport {
    let param = match callback {
      Some(Expr::Arrow(arrow)) => arrow.params.first(),
      Some(Expr::Fn(fn_expr)) => fn_expr.function.params.first().map(|param| &param.pat),
      _ => return DynamicImport::Namespace,
    };

    match param {
      None => DynamicImport::Members(Vec::new()),
      Some(Pat::Object(obj)) => match self.object_pat_members(obj) {
        Some(members) => DynamicImport::Members(members),
        None => DynamicImport::Namespace,
      },
      Some(Pat::Ident(binding)) => DynamicImport::Candidate(binding.id.to_id()),
      Some(_) => DynamicImport::Namespace,
    }
  }

  fn register_module_decl(&mut self, decl: &ModuleDecl, defaults: &mut Vec<(Id, Export)>) {
    match decl {
      ModuleDecl::Import(import) => {
        self.is_esm = true;
        for specifier in &import.specifiers {
          use swc_core::ecma::ast::ImportSpecifier;
          match specifier {
            ImportSpecifier::Named(named) => {
              let imported = match &named.imported {
                Some(ModuleExportName::Ident(ident)) => ident.sym.clone(),
                Some(ModuleExportName::Str(s)) => s.value.clone(),
                None => named.local.sym.clone(),
              };
              self.imports.insert(
                named.local.to_id(),
                Import {
                  source: import.src.value.clone(),
                  specifier: imported,
                  loc: self.loc(named.span),
                },
              );
            }
            ImportSpecifier::Default(default) => {
              self.imports.insert(
                default.local.to_id(),
                Import {
                  source: import.src.value.clone(),
                  specifier: "default".into(),
                  loc: self.loc(default.span),
                },
              );
            }
            ImportSpecifier::Namespace(namespace) => {
              self.imports.insert(
                namespace.local.to_id(),
                Import {
                  source: import.src.value.clone(),
                  specifier: "*".into(),
                  loc: self.loc(namespace.span),
                },
              );
            }
          }
        }
      }
      ModuleDecl::ExportDecl(export) => {
        self.is_esm = true;
        match &export.decl {
          Decl::Var(var) => {
            let mut bindings = Vec::new();
            for declarator in &var.decls {
              collect_pat_bindings(&declarator.name, &mut bindings);
            }
            for ident in bindings {
              let loc = self.loc(ident.span);
              let exported = ident.sym.clone();
              self.exports.insert(ident.to_id(), Export { exported, loc });
            }
          }
          Decl::Fn(FnDecl { ident, .. }) | Decl::Class(ClassDecl { ident, .. }) => {
            let loc = self.loc(ident.span);
            let exported = ident.sym.clone();
            self.exports.insert(ident.to_id(), Export { exported, loc });
          }
          _ => {}
        }
      }
      ModuleDecl::ExportNamed(named) => {
        self.is_esm = true;
        if named.src.is_none() {
          for specifier in &named.specifiers {
            if let ExportSpecifier::Named(spec) = specifier {
              if let ModuleExportName::Ident(local) = &spec.orig {
                let exported = match &spec.exported {
                  Some(ModuleExportName::Ident(ident)) => ident.sym.clone(),
                  Some(ModuleExportName::Str(s)) => s.value.clone(),
                  None => local.sym.clone(),
                };
                let loc = self.loc(spec.span);
                self
                  .exports
                  .entry(local.to_id())
                  .or_insert(Export { exported, loc });
              }
            }
          }
        }
      }
      ModuleDecl::ExportDefaultDecl(default_decl) => {
        self.is_esm = true;
        let ident = match &default_decl.decl {
          DefaultDecl::Fn(fn_expr) => fn_expr.ident.as_ref(),
          DefaultDecl::Class(class_expr) => class_expr.ident.as_ref(),
          DefaultDecl::TsInterfaceDecl(_) => None,
        };
        if let Some(ident) = ident {
          let loc = self.loc(ident.span);
          defaults.push((
            ident.to_id(),
            Export {
              exported: "default".into(),
              loc,
            },
          ));
        }
      }
      ModuleDecl::ExportDefaultExpr(default_expr) => {
        self.is_esm = true;
        if let Expr::Ident(ident) = &*default_expr.expr {
          if !is_unresolved(ident, self.unresolved_mark) {
            // `export default foo` counts as a real reference to foo.
            self.referenced.insert(ident.to_id());
            let loc = self.loc(ident.span);
            defaults.push((
              ident.to_id(),
              Export {
                exported: "default".into(),
                loc,
              },
            ));
          }
        }
      }
      ModuleDecl::ExportAll(_) => {
        self.is_esm = true;
      }
      _ => {}
    }
  }

  fn finalize(&mut self) {
    let shapes = std::mem::take(&mut self.dynamic_import_shapes);
    for (source, shapes) in shapes {
      let mut members: IndexMap<JsWord, SourceLocation> = IndexMap::new();
      let mut namespace = false;
      for shape in shapes {
        match shape {
          DynamicImport::Namespace => namespace = true,
          DynamicImport::Members(list) => {
            for (name, loc) in list {
              members.entry(name).or_insert(loc);
            }
          }
          DynamicImport::Candidate(id) => {
            // "eval is evil": only extract members when the binding is
            // constant, every reference is a static access, and the module
            // is not wrapped.
            if self.should_wrap
              || self.non_const_bindings.contains(&id)
              || self.non_static_access.contains_key(&id)
            {
              namespace = true;
            } else if let Some(accesses) = self.static_access.get(&id) {
              for (name, loc) in accesses {
                members.entry(name.clone()).or_insert(loc.clone());
              }
            }
          }
        }
      }

      let resolved = if namespace {
        DynamicImport::Namespace
      } else {
        DynamicImport::Members(members.into_iter().collect())
      };
      self.dynamic_imports.insert(source, resolved);
    }
  }
}

impl Visit for Collect {
  fn visit_module(&mut self, node: &Module) {
    let mut defaults = Vec::new();
    for item in &node.body {
      if let ModuleItem::ModuleDecl(decl) = item {
        self.register_module_decl(decl, &mut defaults);
      }
    }
    for (id, export) in defaults {
      self.exports.entry(id).or_insert(export);
    }

    node.visit_children_with(self);
    self.finalize();
  }

  fn visit_expr(&mut self, node: &Expr) {
    match node {
      Expr::Unary(unary) if unary.op == UnaryOp::TypeOf => {
        if let Expr::Ident(ident) = &*unary.arg {
          if is_unresolved(ident, self.unresolved_mark) {
            if ident.sym == *"module" {
              // `typeof module` guards are safe; they never force a wrap.
              self.is_cjs = true;
              return;
            }
            if ident.sym == *"require" {
              return;
            }
          }
        }
        unary.visit_children_with(self);
      }
      Expr::Member(member) => self.visit_member(member),
      Expr::Ident(ident) => self.visit_ref_ident(ident),
      _ => node.visit_children_with(self),
    }
  }

  fn visit_prop(&mut self, node: &Prop) {
    if let Prop::Shorthand(ident) = node {
      self.visit_ref_ident(ident);
    } else {
      node.visit_children_with(self);
    }
  }

  fn visit_assign_expr(&mut self, node: &AssignExpr) {
    if node.op == AssignOp::Assign {
      if let Expr::Await(await_expr) = &*node.right {
        if let Expr::Call(call) = &*await_expr.arg {
          if matches!(call.callee, Callee::Import(_)) && call.args.len() == 1 {
            if let Some((source, _)) = match_str(&call.args[0].expr) {
              if let AssignTarget::Pat(AssignTargetPat::Object(obj)) = &node.left {
                let shape = match self.object_pat_members(obj) {
                  Some(members) => DynamicImport::Members(members),
                  None => DynamicImport::Namespace,
                };
                self.record_dynamic_import(source, shape);
                self.handled_dynamic_imports.insert(call.span);
              }
            }
          }
        }
      }
    }

    match &node.left {
      AssignTarget::Simple(simple) => {
        use swc_core::ecma::ast::SimpleAssignTarget;
        match simple {
          SimpleAssignTarget::Ident(binding) => {
            self.non_const_bindings.insert(binding.id.to_id());
            if is_unresolved(&binding.id, self.unresolved_mark) && binding.id.sym == *"exports" {
              // `exports = …` is one of the safe contexts.
              self.is_cjs = true;
            }
          }
          SimpleAssignTarget::Member(member) => self.visit_member(member),
          other => other.visit_children_with(self),
        }
      }
      AssignTarget::Pat(pat) => match pat {
        AssignTargetPat::Array(arr) => {
          for elem in arr.elems.iter().flatten() {
            self.mark_assign_pat_target(elem);
          }
        }
        AssignTargetPat::Object(obj) => {
          for prop in &obj.props {
            match prop {
              ObjectPatProp::KeyValue(kv) => self.mark_assign_pat_target(&kv.value),
              ObjectPatProp::Assign(assign) => {
                self.non_const_bindings.insert(assign.key.id.to_id());
                if let Some(value) = &assign.value {
                  value.visit_with(self);
                }
              }
              ObjectPatProp::Rest(rest) => self.mark_assign_pat_target(&rest.arg),
            }
          }
        }
        AssignTargetPat::Invalid(_) => {}
      },
    }

    node.right.visit_with(self);
  }

  fn visit_update_expr(&mut self, node: &UpdateExpr) {
    if let Expr::Ident(ident) = &*node.arg {
      self.non_const_bindings.insert(ident.to_id());
      self.visit_ref_ident(ident);
    } else {
      node.visit_children_with(self);
    }
  }

  fn visit_call_expr(&mut self, node: &CallExpr) {
    if let Callee::Expr(callee) = &node.callee {
      if let Expr::Ident(ident) = &**callee {
        if ident.sym == *"eval" && is_unresolved(ident, self.unresolved_mark) {
          // A visible eval can observe or replace the lexical environment.
          self.is_cjs = true;
          self.should_wrap = true;
        }
      }

      // import("source").then(callback)
      if let Expr::Member(member) = &**callee {
        if let Expr::Call(inner) = &*member.obj {
          if matches!(inner.callee, Callee::Import(_))
            && inner.args.len() == 1
            && matches!(match_member_prop(&member.prop), Some(ref prop) if *prop == *"then")
          {
            if let Some((source, _)) = match_str(&inner.args[0].expr) {
              let shape = self.callback_shape(node.args.first().map(|arg| &*arg.expr));
              self.record_dynamic_import(source, shape);
              self.handled_dynamic_imports.insert(inner.span);
            }
          }
        }
      }
    }

    if let Callee::Import(_) = node.callee {
      if node.args.len() == 1 && !self.handled_dynamic_imports.contains(&node.span) {
        if let Some((source, _)) = match_str(&node.args[0].expr) {
          self.record_dynamic_import(source, DynamicImport::Namespace);
        }
      }
    }

    node.visit_children_with(self);
  }

  fn visit_var_declarator(&mut self, node: &VarDeclarator) {
    if let Some(init) = &node.init {
      if let Expr::Await(await_expr) = &**init {
        if let Expr::Call(call) = &*await_expr.arg {
          if matches!(call.callee, Callee::Import(_)) && call.args.len() == 1 {
            if let Some((source, _)) = match_str(&call.args[0].expr) {
              let shape = match &node.name {
                Pat::Object(obj) => match self.object_pat_members(obj) {
                  Some(members) => DynamicImport::Members(members),
                  None => DynamicImport::Namespace,
                },
                Pat::Ident(binding) => DynamicImport::Candidate(binding.id.to_id()),
                _ => DynamicImport::Namespace,
              };
              self.record_dynamic_import(source, shape);
              self.handled_dynamic_imports.insert(call.span);
            }
          }
        }
      }
    }

    node.visit_children_with(self);
  }

  fn visit_return_stmt(&mut self, node: &ReturnStmt) {
    if self.in_function == 0 {
      self.is_cjs = true;
      self.should_wrap = true;
    }

    node.visit_children_with(self);
  }

  fn visit_function(&mut self, node: &swc_core::ecma::ast::Function) {
    self.in_function += 1;
    node.visit_children_with(self);
    self.in_function -= 1;
  }

  fn visit_arrow_expr(&mut self, node: &swc_core::ecma::ast::ArrowExpr) {
    self.in_function += 1;
    node.visit_children_with(self);
    self.in_function -= 1;
  }

  fn visit_constructor(&mut self, node: &swc_core::ecma::ast::Constructor) {
    self.in_function += 1;
    node.visit_children_with(self);
    self.in_function -= 1;
  }

  fn visit_getter_prop(&mut self, node: &swc_core::ecma::ast::GetterProp) {
    self.in_function += 1;
    node.visit_children_with(self);
    self.in_function -= 1;
  }

  fn visit_setter_prop(&mut self, node: &swc_core::ecma::ast::SetterProp) {
    self.in_function += 1;
    node.visit_children_with(self);
    self.in_function -= 1;
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::test_utils::run_collect;

  #[test]
  fn test_classifies_es_module() {
    let collect = run_collect("import {x} from './a'; export const y = x + 1;");
    assert!(collect.is_esm);
    assert!(!collect.is_cjs);
    assert!(!collect.should_wrap);
    assert_eq!(collect.imports.len(), 1);
    assert_eq!(collect.exports.len(), 1);
  }

  #[test]
  fn test_classifies_cjs_static_exports() {
    let collect = run_collect("exports.foo = 1;");
    assert!(!collect.is_esm);
    assert!(collect.is_cjs);
    assert!(!collect.should_wrap);
    assert!(!collect.resolve_exports_bailed_out);
  }

  #[test]
  fn test_free_exports_reference_bails_out() {
    let collect = run_collect("someFn(exports);");
    assert!(collect.is_cjs);
    assert!(collect.resolve_exports_bailed_out);
  }

  #[test]
  fn test_computed_exports_access_bails_out() {
    let collect = run_collect("exports[key] = 1;");
    assert!(collect.resolve_exports_bailed_out);

    let collect = run_collect("module.exports[key] = 1;");
    assert!(collect.resolve_exports_bailed_out);
  }

  #[test]
  fn test_static_module_exports_does_not_bail_out() {
    let collect = run_collect("module.exports.foo = 1; module.exports['bar'] = 2;");
    assert!(collect.is_cjs);
    assert!(!collect.resolve_exports_bailed_out);
    assert!(!collect.should_wrap);
  }

  #[test]
  fn test_top_level_return_wraps() {
    let collect = run_collect("if (cond) { return; } exports.foo = 1;");
    assert!(collect.is_cjs);
    assert!(collect.should_wrap);
  }

  #[test]
  fn test_return_inside_function_does_not_wrap() {
    let collect = run_collect("function f() { return 1; } exports.f = f;");
    assert!(!collect.should_wrap);
  }

  #[test]
  fn test_eval_wraps() {
    let collect = run_collect("eval('x');");
    assert!(collect.is_cjs);
    assert!(collect.should_wrap);
  }

  #[test]
  fn test_shadowed_eval_does_not_wrap() {
    let collect = run_collect("function run(eval) { eval('x'); }");
    assert!(!collect.should_wrap);
  }

  #[test]
  fn test_bare_module_reference_wraps() {
    let collect = run_collect("someFn(module);");
    assert!(collect.is_cjs);
    assert!(collect.should_wrap);
  }

  #[test]
  fn test_typeof_module_does_not_wrap() {
    let collect = run_collect("if (typeof module === 'object') { exports.foo = 1; }");
    assert!(collect.is_cjs);
    assert!(!collect.should_wrap);
  }

  #[test]
  fn test_static_module_member_does_not_wrap() {
    let collect = run_collect("module.hot; module.id; module['id'];");
    assert!(collect.is_cjs);
    assert!(!collect.should_wrap);
  }

  #[test]
  fn test_dynamic_import_destructured_await() {
    let collect = run_collect("async function go() { let {a, b} = await import('./m'); }");
    match collect.dynamic_imports.get(&JsWord::from("./m")) {
      Some(DynamicImport::Members(members)) => {
        let names: Vec<_> = members.iter().map(|(name, _)| name.clone()).collect();
        assert_eq!(names, vec![JsWord::from("a"), JsWord::from("b")]);
      }
      other => panic!("expected members, got {:?}", other),
    }
  }

  #[test]
  fn test_dynamic_import_then_object_pattern() {
    let collect = run_collect("import('./m').then(({a}) => a());");
    match collect.dynamic_imports.get(&JsWord::from("./m")) {
      Some(DynamicImport::Members(members)) => {
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].0, JsWord::from("a"));
      }
      other => panic!("expected members, got {:?}", other),
    }
  }

  #[test]
  fn test_dynamic_import_namespace_with_static_accesses() {
    let collect = run_collect("import('./m').then(ns => ns.x + ns.y);");
    match collect.dynamic_imports.get(&JsWord::from("./m")) {
      Some(DynamicImport::Members(members)) => {
        let names: Vec<_> = members.iter().map(|(name, _)| name.clone()).collect();
        assert_eq!(names, vec![JsWord::from("x"), JsWord::from("y")]);
      }
      other => panic!("expected members, got {:?}", other),
    }
  }

  #[test]
  fn test_dynamic_import_escaping_namespace() {
    let collect = run_collect("import('./m').then(ns => someFn(ns));");
    assert!(matches!(
      collect.dynamic_imports.get(&JsWord::from("./m")),
      Some(DynamicImport::Namespace)
    ));
  }

  #[test]
  fn test_bare_dynamic_import_is_namespace() {
    let collect = run_collect("let promise = import('./m');");
    assert!(matches!(
      collect.dynamic_imports.get(&JsWord::from("./m")),
      Some(DynamicImport::Namespace)
    ));
  }

  #[test]
  fn test_non_const_bindings() {
    let collect = run_collect("let a = 1; a = 2; let b = 3; b++; const c = 4; c;");
    let ids: Vec<_> = collect
      .non_const_bindings
      .iter()
      .map(|(sym, _)| sym.clone())
      .collect();
    assert!(ids.contains(&JsWord::from("a")));
    assert!(ids.contains(&JsWord::from("b")));
    assert!(!ids.contains(&JsWord::from("c")));
  }

  #[test]
  fn test_namespace_static_access_tracking() {
    let collect = run_collect("import * as ns from './m'; console.log(ns.x, ns.y);");
    let (id, import) = collect
      .imports
      .iter()
      .find(|(_, import)| import.specifier == *"*")
      .expect("namespace import");
    assert_eq!(import.source, JsWord::from("./m"));
    assert!(!collect.non_static_access.contains_key(id));
    let accesses = collect.static_access.get(id).expect("static accesses");
    let names: Vec<_> = accesses.iter().map(|(name, _)| name.clone()).collect();
    assert_eq!(names, vec![JsWord::from("x"), JsWord::from("y")]);
  }

  #[test]
  fn test_escaping_namespace_import() {
    let collect = run_collect("import * as ns from './m'; someFn(ns);");
    let (id, _) = collect
      .imports
      .iter()
      .find(|(_, import)| import.specifier == *"*")
      .expect("namespace import");
    assert!(collect.non_static_access.contains_key(id));
  }

  #[test]
  fn test_shorthand_object_property_counts_as_reference() {
    let collect = run_collect("import * as ns from './m'; let o = {ns};");
    let (id, _) = collect
      .imports
      .iter()
      .find(|(_, import)| import.specifier == *"*")
      .expect("namespace import");
    assert!(collect.non_static_access.contains_key(id));
  }
}
