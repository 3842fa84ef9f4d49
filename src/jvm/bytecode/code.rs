use std::{
    collections::{BTreeSet, HashMap, HashSet},
    io::{self, Read, Write},
};

use itertools::Itertools;

use super::{
    ClassElement, FromReader, GenerationError, ParseError, ParsingContext, ToWriter,
    attribute::AttributeInfo,
    reader_utils::{BytecodeReader, read_byte_chunk},
    write_length,
};
use crate::{
    jvm::{
        ConstantValue,
        class::{ConstantPool, constant_pool::Entry},
        code::{ExceptionHandler, Instruction, Label, MethodBody, opcodes::*},
    },
    macros::see_jvm_spec,
};

/// The raw representation of the `Code` attribute.
#[doc = see_jvm_spec!(4, 7, 3)]
#[derive(Debug)]
pub(super) struct Code {
    max_stack: u16,
    max_locals: u16,
    code: Vec<u8>,
    exception_table: Vec<ExceptionTableEntry>,
    attributes: Vec<AttributeInfo>,
}

#[derive(Debug)]
struct ExceptionTableEntry {
    start_pc: u16,
    end_pc: u16,
    handler_pc: u16,
    catch_type: u16,
}

impl FromReader for Code {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let max_stack = reader.decode_value()?;
        let max_locals = reader.decode_value()?;
        let code_length: u32 = reader.decode_value()?;
        let code_length = usize::try_from(code_length)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let code = read_byte_chunk(reader, code_length)?;
        let exception_table_length: u16 = reader.decode_value()?;
        let exception_table = (0..exception_table_length)
            .map(|_| ExceptionTableEntry::from_reader(reader))
            .collect::<io::Result<_>>()?;
        let attributes_count: u16 = reader.decode_value()?;
        let attributes = (0..attributes_count)
            .map(|_| AttributeInfo::from_reader(reader))
            .collect::<io::Result<_>>()?;
        Ok(Self {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }
}

impl ToWriter for Code {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError> {
        writer.write_all(&self.max_stack.to_be_bytes())?;
        writer.write_all(&self.max_locals.to_be_bytes())?;
        write_length::<u32>(writer, self.code.len())?;
        writer.write_all(&self.code)?;
        write_length::<u16>(writer, self.exception_table.len())?;
        for entry in &self.exception_table {
            entry.to_writer(writer)?;
        }
        self.attributes.to_writer(writer)?;
        Ok(())
    }
}

impl FromReader for ExceptionTableEntry {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            start_pc: reader.decode_value()?,
            end_pc: reader.decode_value()?,
            handler_pc: reader.decode_value()?,
            catch_type: reader.decode_value()?,
        })
    }
}

impl ToWriter for ExceptionTableEntry {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError> {
        writer.write_all(&self.start_pc.to_be_bytes())?;
        writer.write_all(&self.end_pc.to_be_bytes())?;
        writer.write_all(&self.handler_pc.to_be_bytes())?;
        writer.write_all(&self.catch_type.to_be_bytes())?;
        Ok(())
    }
}

impl ClassElement for MethodBody {
    type Raw = Code;

    fn from_raw(raw: Self::Raw, ctx: &ParsingContext) -> Result<Self, ParseError> {
        let Code {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes: _,
        } = raw;
        let decoded = decode_instructions(&code, &ctx.constant_pool)?;

        let exception_table: Vec<ExceptionHandler> = exception_table
            .into_iter()
            .map(|entry| {
                let catch_type = match entry.catch_type {
                    0 => None,
                    idx => Some(ctx.constant_pool.get_class_ref(idx)?),
                };
                Ok(ExceptionHandler {
                    start: Label(u32::from(entry.start_pc)),
                    end: Label(u32::from(entry.end_pc)),
                    handler: Label(u32::from(entry.handler_pc)),
                    catch_type,
                })
            })
            .collect::<Result<_, ParseError>>()?;

        let mut targets = BTreeSet::new();
        for (_, insn) in &decoded {
            match insn {
                Instruction::Jump { target, .. } => {
                    targets.insert(*target);
                }
                Instruction::TableSwitch {
                    default, targets: t, ..
                } => {
                    targets.insert(*default);
                    targets.extend(t.iter().copied());
                }
                Instruction::LookupSwitch { default, pairs } => {
                    targets.insert(*default);
                    targets.extend(pairs.iter().map(|(_, it)| *it));
                }
                _ => {}
            }
        }
        for handler in &exception_table {
            targets.extend([handler.start, handler.end, handler.handler]);
        }

        let mut instructions = Vec::with_capacity(decoded.len() + targets.len());
        let mut pending = targets.into_iter().peekable();
        for (pc, insn) in decoded {
            while let Some(label) = pending.next_if(|it| it.0 <= pc) {
                if label.0 < pc {
                    return Err(ParseError::malform(format!(
                        "{label} does not point to the start of an instruction"
                    )));
                }
                instructions.push(Instruction::Label(label));
            }
            instructions.push(insn);
        }
        let code_length = u32::try_from(code.len()).map_err(ParseError::malform)?;
        for label in pending {
            if label.0 != code_length {
                return Err(ParseError::malform(format!("{label} is out of the code")));
            }
            instructions.push(Instruction::Label(label));
        }

        Ok(MethodBody {
            max_stack,
            max_locals,
            instructions,
            exception_table,
        })
    }

    fn into_raw(self, cp: &mut ConstantPool) -> Result<Self::Raw, GenerationError> {
        let (code, label_pcs) = assemble(self.instructions, cp)?;
        let pc_of = |label: &Label| -> Result<u16, GenerationError> {
            let pc = label_pcs
                .get(label)
                .ok_or_else(|| GenerationError::other(format!("Undefined label {label}")))?;
            Ok(u16::try_from(*pc)?)
        };
        let exception_table = self
            .exception_table
            .into_iter()
            .map(|handler| -> Result<_, GenerationError> {
                Ok(ExceptionTableEntry {
                    start_pc: pc_of(&handler.start)?,
                    end_pc: pc_of(&handler.end)?,
                    handler_pc: pc_of(&handler.handler)?,
                    catch_type: handler
                        .catch_type
                        .map(|it| cp.put_class_ref(it))
                        .transpose()?
                        .unwrap_or(0),
                })
            })
            .try_collect()?;
        Ok(Code {
            max_stack: self.max_stack,
            max_locals: self.max_locals,
            code,
            exception_table,
            attributes: Vec::new(),
        })
    }
}

fn decode_instructions(
    code: &[u8],
    cp: &ConstantPool,
) -> Result<Vec<(u32, Instruction)>, ParseError> {
    let mut reader = code;
    let mut result = Vec::new();
    while !reader.is_empty() {
        let pc = u32::try_from(code.len() - reader.len()).map_err(ParseError::malform)?;
        let insn = decode_instruction(&mut reader, pc, cp)?;
        result.push((pc, insn));
    }
    Ok(result)
}

#[allow(clippy::too_many_lines)]
fn decode_instruction(
    reader: &mut &[u8],
    pc: u32,
    cp: &ConstantPool,
) -> Result<Instruction, ParseError> {
    let label = |offset: i32| -> Result<Label, ParseError> {
        let target = i64::from(pc) + i64::from(offset);
        u32::try_from(target)
            .map(Label)
            .map_err(|_| ParseError::malform(format!("Jump target {target} is out of the code")))
    };
    let opcode: u8 = reader.decode_value()?;
    let insn = match opcode {
        NOP..=DCONST_1
        | IALOAD..=SALOAD
        | IASTORE..=LXOR
        | I2L..=DCMPG
        | IRETURN..=RETURN
        | ARRAYLENGTH
        | ATHROW
        | MONITORENTER
        | MONITOREXIT => Instruction::Simple(opcode),
        BIPUSH => Instruction::Int {
            opcode,
            operand: i32::from(reader.decode_value::<i8>()?),
        },
        SIPUSH => Instruction::Int {
            opcode,
            operand: i32::from(reader.decode_value::<i16>()?),
        },
        NEWARRAY => Instruction::Int {
            opcode,
            operand: i32::from(reader.decode_value::<u8>()?),
        },
        LDC => {
            let index: u8 = reader.decode_value()?;
            Instruction::Ldc(cp.get_constant_value(u16::from(index))?)
        }
        LDC_W | LDC2_W => Instruction::Ldc(cp.get_constant_value(reader.decode_value()?)?),
        ILOAD..=ALOAD | ISTORE..=ASTORE | RET => Instruction::Var {
            opcode,
            slot: u16::from(reader.decode_value::<u8>()?),
        },
        ILOAD_0..=ALOAD_3 => Instruction::Var {
            opcode: ILOAD + (opcode - ILOAD_0) / 4,
            slot: u16::from((opcode - ILOAD_0) % 4),
        },
        ISTORE_0..=ASTORE_3 => Instruction::Var {
            opcode: ISTORE + (opcode - ISTORE_0) / 4,
            slot: u16::from((opcode - ISTORE_0) % 4),
        },
        IINC => Instruction::Iinc {
            slot: u16::from(reader.decode_value::<u8>()?),
            increment: i16::from(reader.decode_value::<i8>()?),
        },
        WIDE => {
            let wide_opcode: u8 = reader.decode_value()?;
            match wide_opcode {
                IINC => Instruction::Iinc {
                    slot: reader.decode_value()?,
                    increment: reader.decode_value()?,
                },
                ILOAD..=ALOAD | ISTORE..=ASTORE | RET => Instruction::Var {
                    opcode: wide_opcode,
                    slot: reader.decode_value()?,
                },
                unexpected => {
                    return Err(ParseError::malform(format!(
                        "Invalid opcode {unexpected:#04x} after wide"
                    )));
                }
            }
        }
        IFEQ..=JSR | IFNULL | IFNONNULL => Instruction::Jump {
            opcode,
            target: label(i32::from(reader.decode_value::<i16>()?))?,
        },
        GOTO_W | JSR_W => Instruction::Jump {
            opcode: if opcode == GOTO_W { GOTO } else { JSR },
            target: label(reader.decode_value()?)?,
        },
        TABLESWITCH => {
            skip_switch_padding(reader, pc)?;
            let default = label(reader.decode_value()?)?;
            let low: i32 = reader.decode_value()?;
            let high: i32 = reader.decode_value()?;
            let count = i64::from(high) - i64::from(low) + 1;
            if count <= 0 || count * 4 > reader.len() as i64 {
                return Err(ParseError::malform("Invalid bounds of tableswitch"));
            }
            let targets = (low..=high)
                .map(|_| label(reader.decode_value()?))
                .collect::<Result<_, _>>()?;
            Instruction::TableSwitch {
                low,
                default,
                targets,
            }
        }
        LOOKUPSWITCH => {
            skip_switch_padding(reader, pc)?;
            let default = label(reader.decode_value()?)?;
            let npairs: i32 = reader.decode_value()?;
            if npairs < 0 || i64::from(npairs) * 8 > reader.len() as i64 {
                return Err(ParseError::malform("Invalid number of lookupswitch pairs"));
            }
            let pairs = (0..npairs)
                .map(|_| {
                    let key: i32 = reader.decode_value()?;
                    Ok((key, label(reader.decode_value()?)?))
                })
                .collect::<Result<_, ParseError>>()?;
            Instruction::LookupSwitch { default, pairs }
        }
        GETSTATIC..=PUTFIELD => Instruction::Field {
            opcode,
            field: cp.get_field_ref(reader.decode_value()?)?,
        },
        INVOKEVIRTUAL..=INVOKESTATIC => Instruction::Method {
            opcode,
            method: cp.get_method_ref(reader.decode_value()?)?,
        },
        INVOKEINTERFACE => {
            let method = cp.get_method_ref(reader.decode_value()?)?;
            let _count: u8 = reader.decode_value()?;
            let _zero: u8 = reader.decode_value()?;
            Instruction::Method { opcode, method }
        }
        INVOKEDYNAMIC => {
            let index = reader.decode_value()?;
            let _zero: u16 = reader.decode_value()?;
            let &Entry::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } = cp
                .get_entry(index)
                .ok_or_else(|| ParseError::malform(format!("Bad constant pool index {index}")))?
            else {
                return Err(ParseError::malform(
                    "invokedynamic must refer to a CONSTANT_InvokeDynamic",
                ));
            };
            let (name, descriptor) = cp.get_name_and_type(name_and_type_index)?;
            Instruction::InvokeDynamic {
                bootstrap_method_attr_index,
                name: name.to_owned(),
                descriptor: descriptor.parse().map_err(ParseError::malform)?,
            }
        }
        NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => Instruction::Type {
            opcode,
            class: cp.get_class_ref(reader.decode_value()?)?,
        },
        MULTIANEWARRAY => Instruction::MultiANewArray {
            class: cp.get_class_ref(reader.decode_value()?)?,
            dimensions: reader.decode_value()?,
        },
        unexpected => {
            return Err(ParseError::malform(format!(
                "Invalid opcode {unexpected:#04x} at {pc}"
            )));
        }
    };
    Ok(insn)
}

/// Returns the number of padding bytes after a switch opcode at `pc`.
const fn switch_padding(pc: usize) -> usize {
    (4 - (pc + 1) % 4) % 4
}

fn skip_switch_padding(reader: &mut &[u8], pc: u32) -> Result<(), ParseError> {
    let padding = switch_padding(pc as usize);
    read_byte_chunk(reader, padding)?;
    Ok(())
}

/// An instruction with its constants resolved against the constant pool.
enum Encoded {
    Label(Label),
    /// Instructions whose encoding does not depend on their position.
    Fixed(Vec<u8>),
    Jump {
        opcode: u8,
        target: Label,
    },
    TableSwitch {
        low: i32,
        default: Label,
        targets: Vec<Label>,
    },
    LookupSwitch {
        default: Label,
        pairs: Vec<(i32, Label)>,
    },
}

impl Encoded {
    fn size(&self, pc: usize, widened: bool) -> usize {
        match self {
            Self::Label(_) => 0,
            Self::Fixed(bytes) => bytes.len(),
            Self::Jump { .. } if !widened => 3,
            Self::Jump {
                opcode: GOTO | JSR,
                ..
            } => 5,
            // inverted condition over a goto_w
            Self::Jump { .. } => 8,
            Self::TableSwitch { targets, .. } => 1 + switch_padding(pc) + 12 + 4 * targets.len(),
            Self::LookupSwitch { pairs, .. } => 1 + switch_padding(pc) + 8 + 8 * pairs.len(),
        }
    }
}

fn encode(insn: Instruction, cp: &mut ConstantPool) -> Result<Encoded, GenerationError> {
    let with_index = |opcode: u8, index: u16| {
        let mut bytes = vec![opcode];
        bytes.extend(index.to_be_bytes());
        bytes
    };
    let bytes = match insn {
        Instruction::Label(label) => return Ok(Encoded::Label(label)),
        Instruction::Jump { opcode, target } => return Ok(Encoded::Jump { opcode, target }),
        Instruction::TableSwitch {
            low,
            default,
            targets,
        } => {
            if targets.is_empty() {
                return Err(GenerationError::other("tableswitch without targets"));
            }
            return Ok(Encoded::TableSwitch {
                low,
                default,
                targets,
            });
        }
        Instruction::LookupSwitch { default, mut pairs } => {
            pairs.sort_by_key(|(key, _)| *key);
            return Ok(Encoded::LookupSwitch { default, pairs });
        }
        Instruction::Simple(opcode) => vec![opcode],
        Instruction::Int {
            opcode: BIPUSH,
            operand,
        } => vec![BIPUSH, i8::try_from(operand)?.to_be_bytes()[0]],
        Instruction::Int {
            opcode: SIPUSH,
            operand,
        } => {
            let mut bytes = vec![SIPUSH];
            bytes.extend(i16::try_from(operand)?.to_be_bytes());
            bytes
        }
        Instruction::Int { opcode, operand } => vec![opcode, u8::try_from(operand)?],
        Instruction::Var { opcode, slot } if is_load_or_store(opcode) && slot <= 3 => {
            #[allow(clippy::cast_possible_truncation)]
            let slot = slot as u8;
            let short = if opcode <= ALOAD {
                ILOAD_0 + (opcode - ILOAD) * 4 + slot
            } else {
                ISTORE_0 + (opcode - ISTORE) * 4 + slot
            };
            vec![short]
        }
        Instruction::Var { opcode, slot } => match u8::try_from(slot) {
            Ok(slot) => vec![opcode, slot],
            Err(_) => {
                let mut bytes = vec![WIDE, opcode];
                bytes.extend(slot.to_be_bytes());
                bytes
            }
        },
        Instruction::Iinc { slot, increment } => {
            match (u8::try_from(slot), i8::try_from(increment)) {
                (Ok(slot), Ok(increment)) => vec![IINC, slot, increment.to_be_bytes()[0]],
                _ => {
                    let mut bytes = vec![WIDE, IINC];
                    bytes.extend(slot.to_be_bytes());
                    bytes.extend(increment.to_be_bytes());
                    bytes
                }
            }
        }
        Instruction::Type { opcode, class } => with_index(opcode, cp.put_class_ref(class)?),
        Instruction::Field { opcode, field } => with_index(opcode, cp.put_field_ref(field)?),
        Instruction::Method {
            opcode: INVOKEINTERFACE,
            method,
        } => {
            let count = u8::try_from(method.descriptor.parameters_words() + 1)?;
            let mut bytes = with_index(INVOKEINTERFACE, cp.put_method_ref(method)?);
            bytes.extend([count, 0]);
            bytes
        }
        Instruction::Method { opcode, method } => with_index(opcode, cp.put_method_ref(method)?),
        Instruction::InvokeDynamic { name, .. } => {
            return Err(GenerationError::other(format!(
                "invokedynamic `{name}` requires a BootstrapMethods attribute"
            )));
        }
        Instruction::Ldc(ConstantValue::Dynamic { name, .. }) => {
            return Err(GenerationError::other(format!(
                "Dynamic constant `{name}` requires a BootstrapMethods attribute"
            )));
        }
        Instruction::Ldc(value) => {
            let wide = value.words() == 2;
            let index = cp.put_constant_value(value)?;
            match u8::try_from(index) {
                _ if wide => with_index(LDC2_W, index),
                Ok(index) => vec![LDC, index],
                Err(_) => with_index(LDC_W, index),
            }
        }
        Instruction::MultiANewArray { class, dimensions } => {
            let mut bytes = with_index(MULTIANEWARRAY, cp.put_class_ref(class)?);
            bytes.push(dimensions);
            bytes
        }
    };
    Ok(Encoded::Fixed(bytes))
}

/// Computes the offset of every encoded instruction and the position of every label.
fn layout(
    encoded: &[Encoded],
    widened: &HashSet<usize>,
) -> Result<(Vec<usize>, HashMap<Label, usize>), GenerationError> {
    let mut offsets = Vec::with_capacity(encoded.len());
    let mut labels = HashMap::new();
    let mut pc = 0;
    for (idx, item) in encoded.iter().enumerate() {
        offsets.push(pc);
        if let Encoded::Label(label) = item {
            if labels.insert(*label, pc).is_some() {
                return Err(GenerationError::other(format!("{label} is placed twice")));
            }
        }
        pc += item.size(pc, widened.contains(&idx));
    }
    offsets.push(pc);
    Ok((offsets, labels))
}

fn relative_offset(from: usize, to: usize) -> Result<i32, GenerationError> {
    let offset = i64::try_from(to)? - i64::try_from(from)?;
    Ok(i32::try_from(offset)?)
}

/// Encodes the instructions into the bytes of a `Code` attribute.
/// Jumps whose target is out of the range of a 16-bit offset are widened.
fn assemble(
    instructions: Vec<Instruction>,
    cp: &mut ConstantPool,
) -> Result<(Vec<u8>, HashMap<Label, usize>), GenerationError> {
    let encoded: Vec<Encoded> = instructions
        .into_iter()
        .map(|it| encode(it, cp))
        .try_collect()?;

    let mut widened = HashSet::new();
    let (offsets, labels) = loop {
        let (offsets, labels) = layout(&encoded, &widened)?;
        let mut changed = false;
        for (idx, item) in encoded.iter().enumerate() {
            if let Encoded::Jump { target, .. } = item {
                let target_pc = labels
                    .get(target)
                    .ok_or_else(|| GenerationError::other(format!("Undefined label {target}")))?;
                let offset = relative_offset(offsets[idx], *target_pc)?;
                if i16::try_from(offset).is_err() && widened.insert(idx) {
                    changed = true;
                }
            }
        }
        if !changed {
            break (offsets, labels);
        }
    };

    let code_length = offsets.last().copied().unwrap_or_default();
    if code_length > usize::from(u16::MAX) {
        return Err(GenerationError::out_of_range(format!(
            "The code is {code_length} bytes long, exceeding the limit of 65535 bytes"
        )));
    }

    let mut code = Vec::with_capacity(code_length);
    let target_of = |label: &Label| {
        labels
            .get(label)
            .copied()
            .ok_or_else(|| GenerationError::other(format!("Undefined label {label}")))
    };
    for (idx, item) in encoded.into_iter().enumerate() {
        let pc = offsets[idx];
        match item {
            Encoded::Label(_) => {}
            Encoded::Fixed(bytes) => code.extend(bytes),
            Encoded::Jump { opcode, target } => {
                let target = target_of(&target)?;
                if !widened.contains(&idx) {
                    code.push(opcode);
                    code.extend(i16::try_from(relative_offset(pc, target)?)?.to_be_bytes());
                } else if let Some(inverted) = invert_condition(opcode) {
                    code.push(inverted);
                    code.extend(8i16.to_be_bytes());
                    code.push(GOTO_W);
                    code.extend(relative_offset(pc + 3, target)?.to_be_bytes());
                } else {
                    code.push(if opcode == JSR { JSR_W } else { GOTO_W });
                    code.extend(relative_offset(pc, target)?.to_be_bytes());
                }
            }
            Encoded::TableSwitch {
                low,
                default,
                targets,
            } => {
                code.push(TABLESWITCH);
                code.extend(std::iter::repeat_n(0, switch_padding(pc)));
                code.extend(relative_offset(pc, target_of(&default)?)?.to_be_bytes());
                let high = i32::try_from(i64::from(low) + i64::try_from(targets.len())? - 1)?;
                code.extend(low.to_be_bytes());
                code.extend(high.to_be_bytes());
                for target in &targets {
                    code.extend(relative_offset(pc, target_of(target)?)?.to_be_bytes());
                }
            }
            Encoded::LookupSwitch { default, pairs } => {
                code.push(LOOKUPSWITCH);
                code.extend(std::iter::repeat_n(0, switch_padding(pc)));
                code.extend(relative_offset(pc, target_of(&default)?)?.to_be_bytes());
                write_length::<i32>(&mut code, pairs.len())?;
                for (key, target) in &pairs {
                    code.extend(key.to_be_bytes());
                    code.extend(relative_offset(pc, target_of(target)?)?.to_be_bytes());
                }
            }
        }
    }
    Ok((code, labels))
}
