//! Module for the APIs for the executable code in JVM.
mod builder;
mod instruction;
mod label;
mod max_stack;
mod method_body;

pub use builder::CodeBuilder;
pub use instruction::{Instruction, opcodes};
pub use label::Label;
pub(crate) use max_stack::{max_locals, max_stack};
pub use method_body::{ExceptionHandler, MethodBody};
