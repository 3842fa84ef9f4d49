use std::collections::HashSet;

use crate::{jvm::references::ClassRef, macros::see_jvm_spec};

use super::{Instruction, Label};

/// The body of a method.
#[doc = see_jvm_spec!(4, 7, 3)]
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBody {
    /// The maximum number of values on the operand stack of the method.
    pub max_stack: u16,
    /// The maximum number of local variables in the method.
    pub max_locals: u16,
    /// The executable instructions, with [`Instruction::Label`] marking jump targets.
    pub instructions: Vec<Instruction>,
    /// The exception handlers table.
    pub exception_table: Vec<ExceptionHandler>,
}

/// An entry in the exception table.
#[doc = see_jvm_spec!(4, 7, 3)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// The start of the protected range, inclusive.
    pub start: Label,
    /// The end of the protected range, exclusive.
    pub end: Label,
    /// The start of the handler.
    pub handler: Label,
    /// The type of the exception to catch, `None` for catching all exceptions.
    pub catch_type: Option<ClassRef>,
}

impl MethodBody {
    /// Returns the labels defined in the body.
    #[must_use]
    pub fn labels(&self) -> HashSet<Label> {
        self.instructions
            .iter()
            .filter_map(|it| match it {
                Instruction::Label(label) => Some(*label),
                _ => None,
            })
            .collect()
    }

    /// Returns the instructions without the label markers.
    pub fn opcodes(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions
            .iter()
            .filter(|it| !matches!(it, Instruction::Label(_)))
    }
}
