//! Computation of `max_stack` and `max_locals` for a list of instructions.
use std::collections::HashMap;

use crate::{jvm::bytecode::GenerationError, types::method_descriptor::MethodDescriptor};

#[allow(clippy::enum_glob_use)]
use super::opcodes::*;
use super::{ExceptionHandler, Instruction, Label};

/// Computes the maximum depth of the operand stack by following every path through the code.
///
/// # Errors
/// Returns an error if a jump targets an undefined label, if an instruction pops from an empty
/// stack, or if two paths reach the same instruction with different stack depths.
pub(crate) fn max_stack(
    instructions: &[Instruction],
    exception_table: &[ExceptionHandler],
) -> Result<u16, GenerationError> {
    let label_positions: HashMap<Label, usize> = instructions
        .iter()
        .enumerate()
        .filter_map(|(idx, insn)| match insn {
            Instruction::Label(label) => Some((*label, idx)),
            _ => None,
        })
        .collect();
    let position_of = |label: &Label| {
        label_positions
            .get(label)
            .copied()
            .ok_or_else(|| GenerationError::other(format!("Undefined label {label}")))
    };

    let mut depths: Vec<Option<i32>> = vec![None; instructions.len()];
    let mut worklist = Vec::new();
    enqueue(&mut depths, &mut worklist, 0, 0)?;
    for handler in exception_table {
        let idx = position_of(&handler.handler)?;
        enqueue(&mut depths, &mut worklist, idx, 1)?;
    }

    let mut max = 0;
    while let Some(idx) = worklist.pop() {
        let depth = depths[idx].unwrap_or_default();
        let insn = &instructions[idx];
        let after = depth + stack_effect(insn);
        if after < 0 {
            return Err(GenerationError::other(format!(
                "Stack underflow at `{insn}` (instruction {idx})"
            )));
        }
        max = max.max(after).max(depth);

        match insn {
            Instruction::Jump {
                opcode: JSR,
                target,
            } => {
                enqueue(&mut depths, &mut worklist, position_of(target)?, after)?;
                enqueue(&mut depths, &mut worklist, idx + 1, depth)?;
                continue;
            }
            Instruction::Jump { target, .. } => {
                enqueue(&mut depths, &mut worklist, position_of(target)?, after)?;
            }
            Instruction::TableSwitch {
                default, targets, ..
            } => {
                for target in targets.iter().chain(std::iter::once(default)) {
                    enqueue(&mut depths, &mut worklist, position_of(target)?, after)?;
                }
            }
            Instruction::LookupSwitch { default, pairs } => {
                for target in pairs.iter().map(|(_, it)| it).chain(std::iter::once(default)) {
                    enqueue(&mut depths, &mut worklist, position_of(target)?, after)?;
                }
            }
            _ => {}
        }
        if !insn.is_terminal() {
            enqueue(&mut depths, &mut worklist, idx + 1, after)?;
        }
    }
    u16::try_from(max).map_err(|_| GenerationError::out_of_range("max_stack exceeds 65535"))
}

fn enqueue(
    depths: &mut [Option<i32>],
    worklist: &mut Vec<usize>,
    idx: usize,
    depth: i32,
) -> Result<(), GenerationError> {
    let Some(slot) = depths.get_mut(idx) else {
        // Falling off the end of the code is left to the verifier.
        return Ok(());
    };
    match *slot {
        Some(known) if known == depth => Ok(()),
        Some(known) => Err(GenerationError::other(format!(
            "Inconsistent stack depth at instruction {idx}: {known} and {depth}"
        ))),
        None => {
            *slot = Some(depth);
            worklist.push(idx);
            Ok(())
        }
    }
}

/// Computes the number of local variable slots used by the arguments and the instructions.
pub(crate) fn max_locals(instructions: &[Instruction], argument_words: u16) -> u16 {
    instructions
        .iter()
        .filter_map(|insn| match insn {
            Instruction::Var { opcode, slot } => Some(slot.saturating_add(var_words(*opcode))),
            Instruction::Iinc { slot, .. } => Some(slot.saturating_add(1)),
            _ => None,
        })
        .fold(argument_words, u16::max)
}

fn invocation_effect(descriptor: &MethodDescriptor, has_receiver: bool) -> i32 {
    let popped = i32::from(descriptor.parameters_words()) + i32::from(has_receiver);
    i32::from(descriptor.return_type.words()) - popped
}

/// Returns the net change of the stack depth caused by the instruction.
fn stack_effect(insn: &Instruction) -> i32 {
    match insn {
        Instruction::Label(_) | Instruction::Iinc { .. } => 0,
        Instruction::Simple(opcode) => simple_effect(*opcode),
        Instruction::Int { opcode, .. } => i32::from(*opcode != NEWARRAY),
        Instruction::Var { opcode, .. } => match *opcode {
            LLOAD | DLOAD => 2,
            ILOAD | FLOAD | ALOAD => 1,
            LSTORE | DSTORE => -2,
            ISTORE | FSTORE | ASTORE => -1,
            _ => 0,
        },
        Instruction::Type { opcode, .. } => i32::from(*opcode == NEW),
        Instruction::Field { opcode, field } => {
            let words = i32::from(field.field_type.words());
            match *opcode {
                GETSTATIC => words,
                PUTSTATIC => -words,
                GETFIELD => words - 1,
                _ => -words - 1,
            }
        }
        Instruction::Method { opcode, method } => {
            invocation_effect(&method.descriptor, *opcode != INVOKESTATIC)
        }
        Instruction::InvokeDynamic { descriptor, .. } => invocation_effect(descriptor, false),
        Instruction::Jump { opcode, .. } => match *opcode {
            IFEQ..=IFLE | IFNULL | IFNONNULL => -1,
            IF_ICMPEQ..=IF_ACMPNE => -2,
            JSR => 1,
            _ => 0,
        },
        Instruction::Ldc(value) => i32::from(value.words()),
        Instruction::TableSwitch { .. } | Instruction::LookupSwitch { .. } => -1,
        Instruction::MultiANewArray { dimensions, .. } => 1 - i32::from(*dimensions),
    }
}

const fn simple_effect(opcode: u8) -> i32 {
    match opcode {
        ACONST_NULL..=ICONST_5 | FCONST_0..=FCONST_2 | DUP | DUP_X1 | DUP_X2 | I2L | I2D
        | F2L | F2D => 1,
        LCONST_0 | LCONST_1 | DCONST_0 | DCONST_1 | DUP2 | DUP2_X1 | DUP2_X2 => 2,
        IALOAD | FALOAD | AALOAD..=SALOAD | POP | MONITORENTER | MONITOREXIT | ATHROW
        | IRETURN | FRETURN | ARETURN | L2I | L2F | D2I | D2F | FCMPL | FCMPG => -1,
        // int and float operands take one word, long and double take two
        IADD..=DREM => {
            if (opcode - IADD) % 2 == 0 {
                -1
            } else {
                -2
            }
        }
        ISHL..=LUSHR => -1,
        IAND | IOR | IXOR => -1,
        LAND | LOR | LXOR | POP2 | LRETURN | DRETURN => -2,
        IASTORE | FASTORE | AASTORE..=SASTORE | LCMP | DCMPL | DCMPG => -3,
        LASTORE | DASTORE => -4,
        _ => 0,
    }
}
