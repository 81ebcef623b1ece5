use swc_core::{
  common::{sync::Lrc, FileName, Globals, Mark, SourceMap, DUMMY_SP, GLOBALS},
  ecma::{
    ast::{EsVersion, Module},
    codegen::to_code,
    parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax},
    transforms::base::resolver,
    visit::{VisitMutWith, VisitWith},
  },
};

use crate::asset::Asset;
use crate::collect::Collect;
use crate::error::HoistError;
use crate::{hoist, HoistResult, ModuleAst};

pub struct RunTestContext {
  pub source_map: Lrc<SourceMap>,
  pub unresolved_mark: Mark,
  pub global_mark: Mark,
}

/// Parses `code`, applies the resolver, runs `f` on the module, and returns
/// the printed output together with whatever `f` produced.
pub fn run_with_transformation<F, R>(code: &str, f: F) -> (String, R)
where
  F: FnOnce(RunTestContext, &mut Module) -> R,
{
  GLOBALS.set(&Globals::new(), || {
    let source_map = Lrc::new(SourceMap::default());
    let source_file = source_map.new_source_file(FileName::Anon.into(), code.to_string());

    let lexer = Lexer::new(
      Syntax::Es(EsSyntax {
        allow_return_outside_function: true,
        ..Default::default()
      }),
      EsVersion::latest(),
      StringInput::from(&*source_file),
      None,
    );
    let mut parser = Parser::new_from(lexer);
    let mut module = parser.parse_module().expect("failed to parse module");

    let unresolved_mark = Mark::new();
    let global_mark = Mark::new();
    module.visit_mut_with(&mut resolver(unresolved_mark, global_mark, false));

    let context = RunTestContext {
      source_map: source_map.clone(),
      unresolved_mark,
      global_mark,
    };
    let result = f(context, &mut module);

    (to_code(&module), result)
  })
}

pub fn run_collect(code: &str) -> Collect {
  let (_, collect) = run_with_transformation(code, |context, module| {
    let mut collect = Collect::new(
      context.source_map.clone(),
      context.unresolved_mark,
      context.global_mark,
    );
    module.visit_with(&mut collect);
    collect
  });
  collect
}

pub fn empty_module() -> Module {
  Module {
    span: DUMMY_SP,
    body: Vec::new(),
    shebang: None,
  }
}

pub fn try_run_hoist(code: &str, asset: &mut Asset) -> Result<(String, HoistResult), HoistError> {
  let (output, result) = run_with_transformation(code, |context, module| {
    let ast = ModuleAst::new(
      std::mem::replace(module, empty_module()),
      context.unresolved_mark,
      context.global_mark,
      context.source_map,
    );
    match hoist(asset, ast) {
      Ok((new_module, result)) => {
        *module = new_module;
        Ok(result)
      }
      Err(error) => Err(error),
    }
  });
  result.map(|result| (output, result))
}

pub fn run_hoist(code: &str, asset: &mut Asset) -> (String, HoistResult) {
  try_run_hoist(code, asset).expect("hoist failed")
}
