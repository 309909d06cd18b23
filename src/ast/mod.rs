pub mod literals;
pub mod node;
pub mod operators;
pub mod span;
pub mod types;

pub use literals::Literal;
pub use node::{Node, NodeKind, TypeName};
pub use operators::{BinaryOp, UnaryOp};
pub use span::{NodeId, NodeIdGen, Span};
pub use types::Type;
