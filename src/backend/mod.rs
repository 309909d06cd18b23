pub mod asm;
pub mod codegen;

pub use asm::{AsmWriter, Location, Reg};
pub use codegen::{BackEndGenerator, DefaultGenerator};
