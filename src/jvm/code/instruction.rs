use std::fmt::Display;

use itertools::Itertools;

use crate::{
    jvm::{
        ConstantValue,
        references::{ClassRef, FieldRef, MethodRef},
    },
    macros::see_jvm_spec,
    types::method_descriptor::MethodDescriptor,
};

use super::Label;

/// An instruction in a method body.
///
/// Instructions refer to constants directly instead of through constant pool indices, and to
/// jump targets through [`Label`]s. Short and wide encodings of the same operation share one
/// variant, e.g., `aload_0` and `wide aload 0` are both [`Instruction::Var`] with opcode
/// [`ALOAD`](opcodes::ALOAD).
#[doc = see_jvm_spec!(6, 5)]
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Marks the position of a [`Label`]. Occupies no bytes.
    Label(Label),
    /// An instruction without operands, e.g., `iadd` or `areturn`.
    Simple(u8),
    /// `bipush`, `sipush` and `newarray`.
    Int {
        /// The opcode.
        opcode: u8,
        /// The immediate value, or the array type code for `newarray`.
        operand: i32,
    },
    /// Loads and stores of local variables and `ret`.
    Var {
        /// The opcode, one of `iload` to `aload`, `istore` to `astore`, or `ret`.
        opcode: u8,
        /// The index of the local variable.
        slot: u16,
    },
    /// `iinc`.
    Iinc {
        /// The index of the local variable.
        slot: u16,
        /// The value to add.
        increment: i16,
    },
    /// `new`, `anewarray`, `checkcast` and `instanceof`.
    Type {
        /// The opcode.
        opcode: u8,
        /// The class or array type operand.
        class: ClassRef,
    },
    /// `getstatic`, `putstatic`, `getfield` and `putfield`.
    Field {
        /// The opcode.
        opcode: u8,
        /// The field being accessed.
        field: FieldRef,
    },
    /// `invokevirtual`, `invokespecial`, `invokestatic` and `invokeinterface`.
    Method {
        /// The opcode.
        opcode: u8,
        /// The method being invoked.
        method: MethodRef,
    },
    /// `invokedynamic`.
    InvokeDynamic {
        /// The index of the bootstrap method in the `BootstrapMethods` attribute.
        bootstrap_method_attr_index: u16,
        /// The name of the call site.
        name: String,
        /// The descriptor of the call site.
        descriptor: MethodDescriptor,
    },
    /// Conditional and unconditional jumps, including `jsr`.
    /// `goto_w` and `jsr_w` are represented by `goto` and `jsr`.
    Jump {
        /// The opcode.
        opcode: u8,
        /// The jump target.
        target: Label,
    },
    /// `ldc`, `ldc_w` and `ldc2_w`.
    Ldc(ConstantValue),
    /// `tableswitch`.
    TableSwitch {
        /// The lowest key.
        low: i32,
        /// The default target.
        default: Label,
        /// The targets for the keys `low`, `low + 1`, and so on.
        targets: Vec<Label>,
    },
    /// `lookupswitch`.
    LookupSwitch {
        /// The default target.
        default: Label,
        /// The keys and their targets.
        pairs: Vec<(i32, Label)>,
    },
    /// `multianewarray`.
    MultiANewArray {
        /// The array type.
        class: ClassRef,
        /// The number of dimensions to create.
        dimensions: u8,
    },
}

impl Instruction {
    /// Returns the opcode of the instruction, or `None` for [`Instruction::Label`].
    #[must_use]
    pub fn opcode(&self) -> Option<u8> {
        #[allow(clippy::enum_glob_use)]
        use opcodes::*;
        match self {
            Self::Label(_) => None,
            Self::Simple(opcode)
            | Self::Int { opcode, .. }
            | Self::Var { opcode, .. }
            | Self::Type { opcode, .. }
            | Self::Field { opcode, .. }
            | Self::Method { opcode, .. }
            | Self::Jump { opcode, .. } => Some(*opcode),
            Self::Iinc { .. } => Some(IINC),
            Self::InvokeDynamic { .. } => Some(INVOKEDYNAMIC),
            Self::Ldc(value) if value.words() == 2 => Some(LDC2_W),
            Self::Ldc(_) => Some(LDC),
            Self::TableSwitch { .. } => Some(TABLESWITCH),
            Self::LookupSwitch { .. } => Some(LOOKUPSWITCH),
            Self::MultiANewArray { .. } => Some(MULTIANEWARRAY),
        }
    }

    /// Returns `true` if the instruction returns from the method, with or without a value.
    #[must_use]
    pub const fn is_return(&self) -> bool {
        matches!(self, Self::Simple(opcodes::IRETURN..=opcodes::RETURN))
    }

    /// Returns `true` if the control never falls through to the next instruction.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Simple(opcodes::IRETURN..=opcodes::RETURN | opcodes::ATHROW)
                | Self::Jump {
                    opcode: opcodes::GOTO,
                    ..
                }
                | Self::Var {
                    opcode: opcodes::RET,
                    ..
                }
                | Self::TableSwitch { .. }
                | Self::LookupSwitch { .. }
        )
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mnemonic = self.opcode().map_or("", opcodes::mnemonic);
        match self {
            Self::Label(label) => write!(f, "{label}:"),
            Self::Simple(_) => write!(f, "{mnemonic}"),
            Self::Int { operand, .. } => write!(f, "{mnemonic} {operand}"),
            Self::Var { slot, .. } => write!(f, "{mnemonic} {slot}"),
            Self::Iinc { slot, increment } => write!(f, "{mnemonic} {slot} {increment}"),
            Self::Type { class, .. } => write!(f, "{mnemonic} {class}"),
            Self::Field { field, .. } => write!(f, "{mnemonic} {field}"),
            Self::Method { method, .. } => write!(f, "{mnemonic} {method}"),
            Self::InvokeDynamic {
                bootstrap_method_attr_index,
                name,
                descriptor,
            } => write!(
                f,
                "{mnemonic} #{bootstrap_method_attr_index}:{name}{descriptor}"
            ),
            Self::Jump { target, .. } => write!(f, "{mnemonic} {target}"),
            Self::Ldc(value) => write!(f, "{mnemonic} {value}"),
            Self::TableSwitch {
                low,
                default,
                targets,
            } => write!(
                f,
                "{mnemonic} {{ {}, default: {default} }}",
                targets
                    .iter()
                    .enumerate()
                    .map(|(i, target)| format!("{}: {target}", i64::from(*low) + i as i64))
                    .join(", ")
            ),
            Self::LookupSwitch { default, pairs } => write!(
                f,
                "{mnemonic} {{ {}, default: {default} }}",
                pairs
                    .iter()
                    .map(|(key, target)| format!("{key}: {target}"))
                    .join(", ")
            ),
            Self::MultiANewArray { class, dimensions } => {
                write!(f, "{mnemonic} {class} {dimensions}")
            }
        }
    }
}

/// The opcodes of the JVM instructions.
///
/// See the [JVM Specification §7](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-7.html)
/// for more information.
#[allow(missing_docs)]
pub mod opcodes {
    pub const NOP: u8 = 0x00;
    pub const ACONST_NULL: u8 = 0x01;
    pub const ICONST_M1: u8 = 0x02;
    pub const ICONST_0: u8 = 0x03;
    pub const ICONST_1: u8 = 0x04;
    pub const ICONST_2: u8 = 0x05;
    pub const ICONST_3: u8 = 0x06;
    pub const ICONST_4: u8 = 0x07;
    pub const ICONST_5: u8 = 0x08;
    pub const LCONST_0: u8 = 0x09;
    pub const LCONST_1: u8 = 0x0a;
    pub const FCONST_0: u8 = 0x0b;
    pub const FCONST_1: u8 = 0x0c;
    pub const FCONST_2: u8 = 0x0d;
    pub const DCONST_0: u8 = 0x0e;
    pub const DCONST_1: u8 = 0x0f;
    pub const BIPUSH: u8 = 0x10;
    pub const SIPUSH: u8 = 0x11;
    pub const LDC: u8 = 0x12;
    pub const LDC_W: u8 = 0x13;
    pub const LDC2_W: u8 = 0x14;
    pub const ILOAD: u8 = 0x15;
    pub const LLOAD: u8 = 0x16;
    pub const FLOAD: u8 = 0x17;
    pub const DLOAD: u8 = 0x18;
    pub const ALOAD: u8 = 0x19;
    pub const ILOAD_0: u8 = 0x1a;
    pub const ALOAD_3: u8 = 0x2d;
    pub const IALOAD: u8 = 0x2e;
    pub const LALOAD: u8 = 0x2f;
    pub const FALOAD: u8 = 0x30;
    pub const DALOAD: u8 = 0x31;
    pub const AALOAD: u8 = 0x32;
    pub const BALOAD: u8 = 0x33;
    pub const CALOAD: u8 = 0x34;
    pub const SALOAD: u8 = 0x35;
    pub const ISTORE: u8 = 0x36;
    pub const LSTORE: u8 = 0x37;
    pub const FSTORE: u8 = 0x38;
    pub const DSTORE: u8 = 0x39;
    pub const ASTORE: u8 = 0x3a;
    pub const ISTORE_0: u8 = 0x3b;
    pub const ASTORE_3: u8 = 0x4e;
    pub const IASTORE: u8 = 0x4f;
    pub const LASTORE: u8 = 0x50;
    pub const FASTORE: u8 = 0x51;
    pub const DASTORE: u8 = 0x52;
    pub const AASTORE: u8 = 0x53;
    pub const BASTORE: u8 = 0x54;
    pub const CASTORE: u8 = 0x55;
    pub const SASTORE: u8 = 0x56;
    pub const POP: u8 = 0x57;
    pub const POP2: u8 = 0x58;
    pub const DUP: u8 = 0x59;
    pub const DUP_X1: u8 = 0x5a;
    pub const DUP_X2: u8 = 0x5b;
    pub const DUP2: u8 = 0x5c;
    pub const DUP2_X1: u8 = 0x5d;
    pub const DUP2_X2: u8 = 0x5e;
    pub const SWAP: u8 = 0x5f;
    pub const IADD: u8 = 0x60;
    pub const LADD: u8 = 0x61;
    pub const FADD: u8 = 0x62;
    pub const DADD: u8 = 0x63;
    pub const ISUB: u8 = 0x64;
    pub const DREM: u8 = 0x73;
    pub const INEG: u8 = 0x74;
    pub const LNEG: u8 = 0x75;
    pub const FNEG: u8 = 0x76;
    pub const DNEG: u8 = 0x77;
    pub const ISHL: u8 = 0x78;
    pub const LUSHR: u8 = 0x7d;
    pub const IAND: u8 = 0x7e;
    pub const LAND: u8 = 0x7f;
    pub const IOR: u8 = 0x80;
    pub const LOR: u8 = 0x81;
    pub const IXOR: u8 = 0x82;
    pub const LXOR: u8 = 0x83;
    pub const IINC: u8 = 0x84;
    pub const I2L: u8 = 0x85;
    pub const I2F: u8 = 0x86;
    pub const I2D: u8 = 0x87;
    pub const L2I: u8 = 0x88;
    pub const L2F: u8 = 0x89;
    pub const L2D: u8 = 0x8a;
    pub const F2I: u8 = 0x8b;
    pub const F2L: u8 = 0x8c;
    pub const F2D: u8 = 0x8d;
    pub const D2I: u8 = 0x8e;
    pub const D2L: u8 = 0x8f;
    pub const D2F: u8 = 0x90;
    pub const I2B: u8 = 0x91;
    pub const I2C: u8 = 0x92;
    pub const I2S: u8 = 0x93;
    pub const LCMP: u8 = 0x94;
    pub const FCMPL: u8 = 0x95;
    pub const FCMPG: u8 = 0x96;
    pub const DCMPL: u8 = 0x97;
    pub const DCMPG: u8 = 0x98;
    pub const IFEQ: u8 = 0x99;
    pub const IFNE: u8 = 0x9a;
    pub const IFLT: u8 = 0x9b;
    pub const IFGE: u8 = 0x9c;
    pub const IFGT: u8 = 0x9d;
    pub const IFLE: u8 = 0x9e;
    pub const IF_ICMPEQ: u8 = 0x9f;
    pub const IF_ICMPNE: u8 = 0xa0;
    pub const IF_ICMPLT: u8 = 0xa1;
    pub const IF_ICMPGE: u8 = 0xa2;
    pub const IF_ICMPGT: u8 = 0xa3;
    pub const IF_ICMPLE: u8 = 0xa4;
    pub const IF_ACMPEQ: u8 = 0xa5;
    pub const IF_ACMPNE: u8 = 0xa6;
    pub const GOTO: u8 = 0xa7;
    pub const JSR: u8 = 0xa8;
    pub const RET: u8 = 0xa9;
    pub const TABLESWITCH: u8 = 0xaa;
    pub const LOOKUPSWITCH: u8 = 0xab;
    pub const IRETURN: u8 = 0xac;
    pub const LRETURN: u8 = 0xad;
    pub const FRETURN: u8 = 0xae;
    pub const DRETURN: u8 = 0xaf;
    pub const ARETURN: u8 = 0xb0;
    pub const RETURN: u8 = 0xb1;
    pub const GETSTATIC: u8 = 0xb2;
    pub const PUTSTATIC: u8 = 0xb3;
    pub const GETFIELD: u8 = 0xb4;
    pub const PUTFIELD: u8 = 0xb5;
    pub const INVOKEVIRTUAL: u8 = 0xb6;
    pub const INVOKESPECIAL: u8 = 0xb7;
    pub const INVOKESTATIC: u8 = 0xb8;
    pub const INVOKEINTERFACE: u8 = 0xb9;
    pub const INVOKEDYNAMIC: u8 = 0xba;
    pub const NEW: u8 = 0xbb;
    pub const NEWARRAY: u8 = 0xbc;
    pub const ANEWARRAY: u8 = 0xbd;
    pub const ARRAYLENGTH: u8 = 0xbe;
    pub const ATHROW: u8 = 0xbf;
    pub const CHECKCAST: u8 = 0xc0;
    pub const INSTANCEOF: u8 = 0xc1;
    pub const MONITORENTER: u8 = 0xc2;
    pub const MONITOREXIT: u8 = 0xc3;
    pub const WIDE: u8 = 0xc4;
    pub const MULTIANEWARRAY: u8 = 0xc5;
    pub const IFNULL: u8 = 0xc6;
    pub const IFNONNULL: u8 = 0xc7;
    pub const GOTO_W: u8 = 0xc8;
    pub const JSR_W: u8 = 0xc9;

    /// The `atype` operand of `newarray` for each primitive element type.
    pub mod array_type {
        pub const T_BOOLEAN: u8 = 4;
        pub const T_CHAR: u8 = 5;
        pub const T_FLOAT: u8 = 6;
        pub const T_DOUBLE: u8 = 7;
        pub const T_BYTE: u8 = 8;
        pub const T_SHORT: u8 = 9;
        pub const T_INT: u8 = 10;
        pub const T_LONG: u8 = 11;
    }

    /// Returns the mnemonic of the opcode, or `"<invalid>"` for unassigned values.
    #[must_use]
    pub fn mnemonic(opcode: u8) -> &'static str {
        MNEMONICS
            .get(usize::from(opcode))
            .copied()
            .unwrap_or("<invalid>")
    }

    /// Returns the inverse of a conditional jump, e.g., `ifne` for `ifeq`.
    /// Returns `None` if the opcode is not a conditional jump.
    #[must_use]
    pub const fn invert_condition(opcode: u8) -> Option<u8> {
        match opcode {
            IFEQ..=IF_ACMPNE if (opcode - IFEQ) % 2 == 0 => Some(opcode + 1),
            IFEQ..=IF_ACMPNE => Some(opcode - 1),
            IFNULL => Some(IFNONNULL),
            IFNONNULL => Some(IFNULL),
            _ => None,
        }
    }

    /// Returns `true` if the opcode loads or stores a local variable, `ret` excluded.
    #[must_use]
    pub const fn is_load_or_store(opcode: u8) -> bool {
        matches!(opcode, ILOAD..=ALOAD | ISTORE..=ASTORE)
    }

    /// Returns the number of local variable slots accessed by a load or store.
    #[must_use]
    pub const fn var_words(opcode: u8) -> u16 {
        match opcode {
            LLOAD | DLOAD | LSTORE | DSTORE => 2,
            _ => 1,
        }
    }

    const MNEMONICS: [&str; 202] = [
        "nop", "aconst_null", "iconst_m1", "iconst_0", "iconst_1", "iconst_2", "iconst_3",
        "iconst_4", "iconst_5", "lconst_0", "lconst_1", "fconst_0", "fconst_1", "fconst_2",
        "dconst_0", "dconst_1", "bipush", "sipush", "ldc", "ldc_w", "ldc2_w", "iload", "lload",
        "fload", "dload", "aload", "iload_0", "iload_1", "iload_2", "iload_3", "lload_0",
        "lload_1", "lload_2", "lload_3", "fload_0", "fload_1", "fload_2", "fload_3", "dload_0",
        "dload_1", "dload_2", "dload_3", "aload_0", "aload_1", "aload_2", "aload_3", "iaload",
        "laload", "faload", "daload", "aaload", "baload", "caload", "saload", "istore", "lstore",
        "fstore", "dstore", "astore", "istore_0", "istore_1", "istore_2", "istore_3", "lstore_0",
        "lstore_1", "lstore_2", "lstore_3", "fstore_0", "fstore_1", "fstore_2", "fstore_3",
        "dstore_0", "dstore_1", "dstore_2", "dstore_3", "astore_0", "astore_1", "astore_2",
        "astore_3", "iastore", "lastore", "fastore", "dastore", "aastore", "bastore", "castore",
        "sastore", "pop", "pop2", "dup", "dup_x1", "dup_x2", "dup2", "dup2_x1", "dup2_x2", "swap",
        "iadd", "ladd", "fadd", "dadd", "isub", "lsub", "fsub", "dsub", "imul", "lmul", "fmul",
        "dmul", "idiv", "ldiv", "fdiv", "ddiv", "irem", "lrem", "frem", "drem", "ineg", "lneg",
        "fneg", "dneg", "ishl", "lshl", "ishr", "lshr", "iushr", "lushr", "iand", "land", "ior",
        "lor", "ixor", "lxor", "iinc", "i2l", "i2f", "i2d", "l2i", "l2f", "l2d", "f2i", "f2l",
        "f2d", "d2i", "d2l", "d2f", "i2b", "i2c", "i2s", "lcmp", "fcmpl", "fcmpg", "dcmpl",
        "dcmpg", "ifeq", "ifne", "iflt", "ifge", "ifgt", "ifle", "if_icmpeq", "if_icmpne",
        "if_icmplt", "if_icmpge", "if_icmpgt", "if_icmple", "if_acmpeq", "if_acmpne", "goto",
        "jsr", "ret", "tableswitch", "lookupswitch", "ireturn", "lreturn", "freturn", "dreturn",
        "areturn", "return", "getstatic", "putstatic", "getfield", "putfield", "invokevirtual",
        "invokespecial", "invokestatic", "invokeinterface", "invokedynamic", "new", "newarray",
        "anewarray", "arraylength", "athrow", "checkcast", "instanceof", "monitorenter",
        "monitorexit", "wide", "multianewarray", "ifnull", "ifnonnull", "goto_w", "jsr_w",
    ];
}
