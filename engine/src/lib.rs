pub mod block;
pub mod codegen;
pub mod context;
pub mod error;
pub mod kinds;
pub mod parser;
pub mod registry;
pub mod runtime_value;
pub mod stdlib;
pub mod workspace;

pub use block::Block;
pub use codegen::{Expr, Generated, Program, Stmt};
pub use context::{Context, EscapeMode};
pub use error::{EngineError, Result, SlotKind};
pub use kinds::BlockKind;
pub use parser::Parser;
pub use registry::Registry;
pub use runtime_value::RuntimeValue;
pub use workspace::{Execution, Workspace};

/// Parse a JSON program with the built-in kinds.
pub fn parse_program(json: &str) -> Result<Workspace> {
    Parser::new(&Registry::standard()).parse_json(json)
}

/// Parse and run a JSON program against the given initial bindings.
pub fn execute_program(
    json: &str,
    globals: impl IntoIterator<Item = (String, RuntimeValue)>,
) -> Result<Execution> {
    parse_program(json)?.run(globals)
}

/// Parse a JSON program and render its generated source.
pub fn generate_program(json: &str) -> Result<String> {
    let program = parse_program(json)?.compile()?;
    Ok(codegen::emit::emit_program(&program))
}
