use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use swc_core::ecma::atoms::JsWord;

use crate::utils::SourceLocation;

bitflags! {
  #[derive(Clone, Copy, Debug, PartialEq, Eq)]
  pub struct SymbolFlags: u8 {
    /// The symbol only passes through this module; tree shaking may elide it.
    const IS_WEAK = 1 << 0;
  }
}

impl Serialize for SymbolFlags {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    self.bits().serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for SymbolFlags {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    Ok(SymbolFlags::from_bits_truncate(u8::deserialize(
      deserializer,
    )?))
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
  /// The name this symbol has in the emitted code.
  pub local: JsWord,
  pub loc: Option<SourceLocation>,
  pub flags: SymbolFlags,
}

impl Symbol {
  pub fn is_weak(&self) -> bool {
    self.flags.contains(SymbolFlags::IS_WEAK)
  }
}

/// Maps outward-facing export names to local symbols. The key `"*"` names the
/// module's full namespace object, `"default"` its default export; every other
/// key is a plain identifier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Symbols {
  symbols: IndexMap<JsWord, Symbol>,
}

impl Symbols {
  pub fn new() -> Self {
    Symbols {
      symbols: IndexMap::new(),
    }
  }

  pub fn set(
    &mut self,
    exported: JsWord,
    local: JsWord,
    loc: Option<SourceLocation>,
    flags: SymbolFlags,
  ) {
    self.symbols.insert(exported, Symbol { local, loc, flags });
  }

  pub fn get(&self, exported: &JsWord) -> Option<&Symbol> {
    self.symbols.get(exported)
  }

  pub fn has_export_symbol(&self, exported: &JsWord) -> bool {
    self.symbols.contains_key(exported)
  }

  pub fn has_local_symbol(&self, local: &JsWord) -> bool {
    self.symbols.values().any(|sym| sym.local == *local)
  }

  pub fn exported_symbols(&self) -> impl Iterator<Item = (&JsWord, &Symbol)> {
    self.symbols.iter()
  }

  pub fn retain<F>(&mut self, f: F)
  where
    F: FnMut(&JsWord, &mut Symbol) -> bool,
  {
    self.symbols.retain(f);
  }

  pub fn delete(&mut self, exported: &JsWord) -> Option<Symbol> {
    self.symbols.shift_remove(exported)
  }

  pub fn is_empty(&self) -> bool {
    self.symbols.is_empty()
  }

  pub fn len(&self) -> usize {
    self.symbols.len()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_reverse_lookup() {
    let mut symbols = Symbols::new();
    symbols.set("foo".into(), "$a$export$foo".into(), None, SymbolFlags::empty());
    symbols.set("*".into(), "$a$exports".into(), None, SymbolFlags::empty());

    assert!(symbols.has_export_symbol(&"foo".into()));
    assert!(symbols.has_local_symbol(&"$a$exports".into()));
    assert!(!symbols.has_local_symbol(&"foo".into()));
  }

  #[test]
  fn test_set_overwrites_and_keeps_order() {
    let mut symbols = Symbols::new();
    symbols.set("a".into(), "$m$export$a".into(), None, SymbolFlags::empty());
    symbols.set("b".into(), "$m$export$b".into(), None, SymbolFlags::IS_WEAK);
    symbols.set("a".into(), "$m$export$a2".into(), None, SymbolFlags::empty());

    let names: Vec<_> = symbols.exported_symbols().map(|(k, _)| k.clone()).collect();
    assert_eq!(names, vec![JsWord::from("a"), JsWord::from("b")]);
    assert_eq!(symbols.get(&"a".into()).unwrap().local, JsWord::from("$m$export$a2"));
    assert!(symbols.get(&"b".into()).unwrap().is_weak());
  }
}
