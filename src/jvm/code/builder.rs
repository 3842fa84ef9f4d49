use crate::jvm::{
    ConstantValue,
    bytecode::GenerationError,
    references::{ClassRef, FieldRef, MethodRef},
};

#[allow(clippy::enum_glob_use)]
use super::opcodes::*;
use super::{ExceptionHandler, Instruction, Label, MethodBody, max_locals, max_stack};

/// Incrementally assembles a [`MethodBody`].
///
/// ```
/// use proxetta::jvm::code::{CodeBuilder, opcodes::*};
///
/// let mut code = CodeBuilder::new();
/// let done = code.new_label();
/// code.var(ILOAD, 1)
///     .jump(IFEQ, done)
///     .int(42)
///     .simple(IRETURN)
///     .mark(done)
///     .int(0)
///     .simple(IRETURN);
/// let body = code.build(2).unwrap();
/// assert_eq!(body.max_stack, 1);
/// assert_eq!(body.max_locals, 2);
/// ```
#[derive(Debug, Default)]
pub struct CodeBuilder {
    instructions: Vec<Instruction>,
    exception_table: Vec<ExceptionHandler>,
    next_label: u32,
}

impl CodeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a label that is not yet placed in the code.
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Places `label` at the current position.
    pub fn mark(&mut self, label: Label) -> &mut Self {
        self.push(Instruction::Label(label))
    }

    /// Appends an instruction.
    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    /// Appends an instruction without operands.
    pub fn simple(&mut self, opcode: u8) -> &mut Self {
        self.push(Instruction::Simple(opcode))
    }

    /// Appends the shortest instruction pushing the `int` constant `value`.
    pub fn int(&mut self, value: i32) -> &mut Self {
        match value {
            -1..=5 => {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let opcode = (i32::from(ICONST_0) + value) as u8;
                self.simple(opcode)
            }
            -128..=127 => self.push(Instruction::Int {
                opcode: BIPUSH,
                operand: value,
            }),
            -32768..=32767 => self.push(Instruction::Int {
                opcode: SIPUSH,
                operand: value,
            }),
            _ => self.ldc(ConstantValue::Integer(value)),
        }
    }

    /// Appends a load or a store of a local variable.
    pub fn var(&mut self, opcode: u8, slot: u16) -> &mut Self {
        self.push(Instruction::Var { opcode, slot })
    }

    /// Appends `new`, `anewarray`, `checkcast` or `instanceof`.
    pub fn type_insn(&mut self, opcode: u8, class: impl Into<String>) -> &mut Self {
        self.push(Instruction::Type {
            opcode,
            class: ClassRef::new(class),
        })
    }

    /// Appends a field access.
    pub fn field(&mut self, opcode: u8, field: FieldRef) -> &mut Self {
        self.push(Instruction::Field { opcode, field })
    }

    /// Appends a method invocation.
    pub fn invoke(&mut self, opcode: u8, method: MethodRef) -> &mut Self {
        self.push(Instruction::Method { opcode, method })
    }

    /// Appends a jump to `target`.
    pub fn jump(&mut self, opcode: u8, target: Label) -> &mut Self {
        self.push(Instruction::Jump { opcode, target })
    }

    /// Appends `ldc` of `value`.
    pub fn ldc(&mut self, value: ConstantValue) -> &mut Self {
        self.push(Instruction::Ldc(value))
    }

    /// Adds an entry to the exception table.
    pub fn try_catch(&mut self, handler: ExceptionHandler) -> &mut Self {
        self.exception_table.push(handler);
        self
    }

    /// Returns the instructions appended so far.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Finishes the body, computing `max_stack` and `max_locals`.
    /// `argument_words` is the number of local variable slots taken by the arguments,
    /// including `this` for instance methods.
    ///
    /// # Errors
    /// Returns an error if a jump targets an undefined label, if the stack underflows, or if
    /// two paths reach an instruction with different stack depths.
    pub fn build(self, argument_words: u16) -> Result<MethodBody, GenerationError> {
        let max_stack = max_stack(&self.instructions, &self.exception_table)?;
        let max_locals = max_locals(&self.instructions, argument_words);
        Ok(MethodBody {
            max_stack,
            max_locals,
            instructions: self.instructions,
            exception_table: self.exception_table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_labels_are_distinct() {
        let mut code = CodeBuilder::new();
        let first = code.new_label();
        let second = code.new_label();
        assert_ne!(first, second);
    }

    #[test]
    fn int_constants_use_shortest_form() {
        let mut code = CodeBuilder::new();
        code.int(-1).int(5).int(6).int(-129).int(40_000);
        assert_eq!(
            code.instructions(),
            [
                Instruction::Simple(ICONST_M1),
                Instruction::Simple(ICONST_5),
                Instruction::Int {
                    opcode: BIPUSH,
                    operand: 6
                },
                Instruction::Int {
                    opcode: SIPUSH,
                    operand: -129
                },
                Instruction::Ldc(ConstantValue::Integer(40_000)),
            ]
        );
    }

    #[test]
    fn build_computes_limits() {
        let mut code = CodeBuilder::new();
        code.var(ALOAD, 0)
            .var(ASTORE, 3)
            .simple(LCONST_1)
            .simple(LCONST_1)
            .simple(LADD)
            .simple(LRETURN);
        let body = code.build(1).unwrap();
        assert_eq!(body.max_stack, 4);
        assert_eq!(body.max_locals, 4);
    }
}
