use serde::{Deserialize, Serialize};
use swc_core::{
  common::{Mark, SourceMap, Span, SyntaxContext},
  ecma::{
    ast::{Callee, ComputedPropName, Expr, Ident, Lit, MemberProp, ObjectPatProp, Pat},
    atoms::JsWord,
  },
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
  pub start_line: usize,
  pub start_col: usize,
  pub end_line: usize,
  pub end_col: usize,
}

impl SourceLocation {
  pub fn from(source_map: &SourceMap, span: Span) -> Self {
    if span.lo.is_dummy() || span.hi.is_dummy() {
      return SourceLocation {
        start_line: 1,
        start_col: 1,
        end_line: 1,
        end_col: 1,
      };
    }

    let start = source_map.lookup_char_pos(span.lo);
    let end = source_map.lookup_char_pos(span.hi);
    // SWC columns are 0-based, tools expect 1-based.
    SourceLocation {
      start_line: start.line,
      start_col: start.col_display + 1,
      end_line: end.line,
      end_col: end.col_display + 1,
    }
  }
}

/// Walks the context's mark chain looking for `mark`.
pub fn is_marked(ctxt: SyntaxContext, mark: Mark) -> bool {
  let mut ctxt = ctxt;
  loop {
    let m = ctxt.remove_mark();
    if m == Mark::root() {
      return false;
    }

    if m == mark {
      return true;
    }
  }
}

/// True when the identifier resolves to nothing in the module, i.e. it was
/// tagged by the resolver with the unresolved mark.
pub fn is_unresolved(ident: &Ident, unresolved_mark: Mark) -> bool {
  is_marked(ident.ctxt, unresolved_mark)
}

pub fn match_str(node: &Expr) -> Option<(JsWord, Span)> {
  match node {
    Expr::Lit(Lit::Str(s)) => Some((s.value.clone(), s.span)),
    Expr::Tpl(tpl) if tpl.quasis.len() == 1 && tpl.exprs.is_empty() => tpl.quasis[0]
      .cooked
      .clone()
      .map(|value| (value.into(), tpl.span)),
    _ => None,
  }
}

/// The statically known property name of a member access, covering both
/// `obj.prop` and `obj["prop"]`.
pub fn match_member_prop(prop: &MemberProp) -> Option<JsWord> {
  match prop {
    MemberProp::Ident(name) => Some(name.sym.clone()),
    MemberProp::Computed(ComputedPropName { expr, .. }) => match_str(expr).map(|(sym, _)| sym),
    MemberProp::PrivateName(_) => None,
  }
}

/// Matches `require("source")` where `require` is unbound, returning the
/// source specifier.
pub fn match_require(node: &Expr, unresolved_mark: Mark) -> Option<JsWord> {
  if let Expr::Call(call) = node {
    if let Callee::Expr(callee) = &call.callee {
      if let Expr::Ident(ident) = &**callee {
        if ident.sym == *"require"
          && is_unresolved(ident, unresolved_mark)
          && call.args.len() == 1
          && call.args[0].spread.is_none()
        {
          return match_str(&call.args[0].expr).map(|(sym, _)| sym);
        }
      }
    }
  }

  None
}

/// Matches a dynamic `import("source")` call.
pub fn match_dynamic_import(node: &Expr) -> Option<JsWord> {
  if let Expr::Call(call) = node {
    if let Callee::Import(_) = call.callee {
      if call.args.len() == 1 && call.args[0].spread.is_none() {
        return match_str(&call.args[0].expr).map(|(sym, _)| sym);
      }
    }
  }

  None
}

/// Normalizes an opaque asset id into something that can be embedded in an
/// identifier.
pub fn to_identifier(id: &str) -> String {
  id.chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
        c
      } else {
        '$'
      }
    })
    .collect()
}

pub fn is_valid_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
    _ => return false,
  }

  chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Collects every identifier bound by a pattern, in source order.
pub fn collect_pat_bindings(pat: &Pat, out: &mut Vec<Ident>) {
  match pat {
    Pat::Ident(ident) => out.push(ident.id.clone()),
    Pat::Array(arr) => {
      for elem in arr.elems.iter().flatten() {
        collect_pat_bindings(elem, out);
      }
    }
    Pat::Object(obj) => {
      for prop in &obj.props {
        match prop {
          ObjectPatProp::KeyValue(kv) => collect_pat_bindings(&kv.value, out),
          ObjectPatProp::Assign(assign) => out.push(assign.key.id.clone()),
          ObjectPatProp::Rest(rest) => collect_pat_bindings(&rest.arg, out),
        }
      }
    }
    Pat::Rest(rest) => collect_pat_bindings(&rest.arg, out),
    Pat::Assign(assign) => collect_pat_bindings(&assign.left, out),
    Pat::Expr(_) | Pat::Invalid(_) => {}
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_to_identifier() {
    assert_eq!(to_identifier("04fe4eee"), "04fe4eee");
    assert_eq!(to_identifier("src/foo.js"), "src$foo$js");
    assert_eq!(to_identifier("a-b"), "a$b");
  }

  #[test]
  fn test_is_valid_identifier() {
    assert!(is_valid_identifier("foo"));
    assert!(is_valid_identifier("_foo$1"));
    assert!(!is_valid_identifier("1foo"));
    assert!(!is_valid_identifier("a-b"));
    assert!(!is_valid_identifier(""));
  }
}
