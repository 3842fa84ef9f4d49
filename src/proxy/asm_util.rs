//! Instruction sequences shared by the weavers.

#[allow(clippy::enum_glob_use)]
use crate::jvm::code::opcodes::*;
use crate::{
    jvm::{
        ConstantValue,
        code::CodeBuilder,
        references::{ClassRef, FieldRef, MethodRef},
    },
    types::{
        field_type::{FieldType, PrimitiveType},
        method_descriptor::{MethodDescriptor, ReturnType},
    },
};

use super::{
    signature::{Argument, MethodSignature},
    type_descriptor::{OpcodeTag, TypeDescriptor},
};

pub(crate) const OBJECT: &str = "java/lang/Object";
pub(crate) const CLASS: &str = "java/lang/Class";
const NUMBER: &str = "java/lang/Number";

pub(crate) fn load_opcode(field_type: &FieldType) -> u8 {
    match field_type {
        FieldType::Base(PrimitiveType::Long) => LLOAD,
        FieldType::Base(PrimitiveType::Float) => FLOAD,
        FieldType::Base(PrimitiveType::Double) => DLOAD,
        FieldType::Base(_) => ILOAD,
        FieldType::Object(_) | FieldType::Array(_) => ALOAD,
    }
}

pub(crate) fn store_opcode(field_type: &FieldType) -> u8 {
    match field_type {
        FieldType::Base(PrimitiveType::Long) => LSTORE,
        FieldType::Base(PrimitiveType::Float) => FSTORE,
        FieldType::Base(PrimitiveType::Double) => DSTORE,
        FieldType::Base(_) => ISTORE,
        FieldType::Object(_) | FieldType::Array(_) => ASTORE,
    }
}

pub(crate) fn return_opcode(return_type: &TypeDescriptor) -> u8 {
    match return_type.opcode_tag() {
        OpcodeTag::Void => RETURN,
        OpcodeTag::Long => LRETURN,
        OpcodeTag::Float => FRETURN,
        OpcodeTag::Double => DRETURN,
        OpcodeTag::Object | OpcodeTag::Array => ARETURN,
        OpcodeTag::Byte
        | OpcodeTag::Char
        | OpcodeTag::Short
        | OpcodeTag::Int
        | OpcodeTag::Boolean => IRETURN,
    }
}

fn zero(code: &mut CodeBuilder, primitive: PrimitiveType) {
    match primitive {
        PrimitiveType::Long => code.simple(LCONST_0),
        PrimitiveType::Float => code.simple(FCONST_0),
        PrimitiveType::Double => code.simple(DCONST_0),
        _ => code.simple(ICONST_0),
    };
}

pub(crate) fn method_ref(
    owner: &str,
    name: &str,
    parameters: Vec<FieldType>,
    return_type: ReturnType,
) -> MethodRef {
    MethodRef::new(
        owner,
        name,
        MethodDescriptor {
            parameters_types: parameters,
            return_type,
        },
    )
}

/// Loads the arguments of the method, without `this`.
pub(crate) fn load_arguments(code: &mut CodeBuilder, signature: &MethodSignature) {
    for argument in signature.arguments() {
        load_argument(code, argument);
    }
}

/// Loads `this` unless the method is static, then the arguments.
pub(crate) fn load_this_and_arguments(code: &mut CodeBuilder, signature: &MethodSignature) {
    if !signature.is_static() {
        code.var(ALOAD, 0);
    }
    load_arguments(code, signature);
}

fn load_argument(code: &mut CodeBuilder, argument: &Argument) {
    if let Some(field_type) = argument.type_descriptor.field_type() {
        code.var(load_opcode(field_type), argument.offset);
    }
}

/// Converts the primitive on top of the stack to its wrapper.
pub(crate) fn box_primitive(code: &mut CodeBuilder, primitive: PrimitiveType) {
    let boxed = primitive.boxed_class();
    code.invoke(
        INVOKESTATIC,
        method_ref(
            boxed,
            "valueOf",
            vec![FieldType::Base(primitive)],
            ReturnType::Some(FieldType::object(boxed)),
        ),
    );
}

/// Converts the wrapper object on top of the stack to a primitive. Numbers are converted
/// through `java.lang.Number`, so any numeric wrapper is accepted.
pub(crate) fn unbox_primitive(code: &mut CodeBuilder, primitive: PrimitiveType) {
    let owner = match primitive {
        PrimitiveType::Boolean | PrimitiveType::Char => primitive.boxed_class(),
        _ => NUMBER,
    };
    code.type_insn(CHECKCAST, owner).invoke(
        INVOKEVIRTUAL,
        method_ref(
            owner,
            primitive.unbox_method(),
            Vec::new(),
            ReturnType::Some(FieldType::Base(primitive)),
        ),
    );
}

/// Loads an argument as an object, boxing primitives.
pub(crate) fn load_argument_as_object(code: &mut CodeBuilder, argument: &Argument) {
    load_argument(code, argument);
    if let Some(primitive) = argument.type_descriptor.primitive() {
        box_primitive(code, primitive);
    }
}

/// Stores the object on top of the stack into an argument, unboxing primitives.
pub(crate) fn store_argument_from_object(code: &mut CodeBuilder, argument: &Argument) {
    let Some(field_type) = argument.type_descriptor.field_type() else {
        return;
    };
    match field_type {
        FieldType::Base(primitive) => unbox_primitive(code, *primitive),
        _ => {
            if let Some(name) = field_type.internal_name() {
                code.type_insn(CHECKCAST, name);
            }
        }
    }
    code.var(store_opcode(field_type), argument.offset);
}

/// Pushes the `Class` object of a type. Primitives and `void` use the `TYPE` field of their
/// wrappers.
pub(crate) fn load_class(code: &mut CodeBuilder, type_descriptor: &TypeDescriptor) {
    match type_descriptor.field_type() {
        None => load_primitive_class(code, "java/lang/Void"),
        Some(FieldType::Base(primitive)) => load_primitive_class(code, primitive.boxed_class()),
        Some(field_type) => {
            if let Some(class) = field_type.class_ref() {
                code.ldc(ConstantValue::Class(class));
            }
        }
    }
}

pub(crate) fn load_return_class(code: &mut CodeBuilder, return_type: &ReturnType) {
    match return_type {
        ReturnType::Void => load_primitive_class(code, "java/lang/Void"),
        ReturnType::Some(FieldType::Base(primitive)) => {
            load_primitive_class(code, primitive.boxed_class());
        }
        ReturnType::Some(field_type) => {
            if let Some(class) = field_type.class_ref() {
                code.ldc(ConstantValue::Class(class));
            }
        }
    }
}

fn load_primitive_class(code: &mut CodeBuilder, wrapper: &str) {
    code.field(
        GETSTATIC,
        FieldRef {
            owner: ClassRef::new(wrapper),
            name: "TYPE".to_owned(),
            field_type: FieldType::object(CLASS),
        },
    );
}

/// Turns the value returned by the target method into an object: primitives are boxed and
/// `void` becomes `null`.
pub(crate) fn box_return_value(code: &mut CodeBuilder, return_type: &TypeDescriptor) {
    if return_type.is_void() {
        code.simple(ACONST_NULL);
    } else if let Some(primitive) = return_type.primitive() {
        box_primitive(code, primitive);
    }
}

/// Returns from a method with the return type of `signature`.
///
/// With `from_object`, the value on the stack is the object returned by an advice: it is
/// discarded for `void` methods, cast for reference types and unboxed for primitives, where
/// `null` becomes zero.
pub(crate) fn return_value(code: &mut CodeBuilder, return_type: &TypeDescriptor, from_object: bool) {
    let opcode = return_opcode(return_type);
    if from_object {
        match return_type.field_type() {
            None => {
                code.simple(POP);
            }
            Some(FieldType::Base(primitive)) => {
                let not_null = code.new_label();
                code.simple(DUP).jump(IFNONNULL, not_null).simple(POP);
                zero(code, *primitive);
                code.simple(opcode).mark(not_null);
                unbox_primitive(code, *primitive);
            }
            Some(field_type) => {
                if let Some(name) = field_type.internal_name() {
                    if name != OBJECT {
                        code.type_insn(CHECKCAST, name);
                    }
                }
            }
        }
    }
    code.simple(opcode);
}

/// Casts the object on top of the stack to the return type, or to its wrapper for
/// primitives. Does nothing for `void`.
pub(crate) fn cast_to_return_type(code: &mut CodeBuilder, return_type: &TypeDescriptor) {
    let name = match return_type.field_type() {
        None => return,
        Some(FieldType::Base(primitive)) => primitive.boxed_class().to_owned(),
        Some(field_type) => match field_type.internal_name() {
            Some(name) => name,
            None => return,
        },
    };
    code.type_insn(CHECKCAST, name);
}
