//! Module containing the APIs for the JVM elements.

use std::fmt::Display;

use itertools::Itertools;

use crate::{
    macros::see_jvm_spec,
    types::{field_type::FieldType, method_descriptor::MethodDescriptor},
};

pub mod annotation;
pub mod bytecode;
pub mod class;
pub mod class_loader;
pub mod code;
pub mod field;
pub mod method;
pub mod references;

use annotation::ElementValue;
use code::MethodBody;
use references::ClassRef;

/// A JVM class.
#[doc = see_jvm_spec!(4, 1)]
#[derive(Debug, Clone)]
pub struct Class {
    /// The version of the class file.
    pub version: class::Version,
    /// The access flags of the class.
    pub access_flags: class::AccessFlags,
    /// The binary name of the class (e.g., `org/proxetta/Proxetta`).
    pub binary_name: String,
    /// A reference to the superclass of the class.
    /// The class `java/lang/Object` has no superclass, so this field is `None` for that class.
    pub super_class: Option<ClassRef>,
    /// The interfaces implemented by the class.
    pub interfaces: Vec<ClassRef>,
    /// The fields declared in the class.
    pub fields: Vec<Field>,
    /// The methods declared in the class.
    pub methods: Vec<Method>,
    /// The name of the source file of the class.
    pub source_file: Option<String>,
    /// The inner classes of the class.
    pub inner_classes: Vec<class::InnerClassInfo>,
    /// The generic signature of the class.
    pub signature: Option<String>,
    /// The runtime visible annotations.
    pub runtime_visible_annotations: Vec<Annotation>,
    /// The runtime invisible annotations.
    pub runtime_invisible_annotations: Vec<Annotation>,
}

/// A JVM field.
#[doc = see_jvm_spec!(4, 5)]
#[derive(Debug, Clone)]
pub struct Field {
    /// The access flags of the field.
    pub access_flags: field::AccessFlags,
    /// The name of the field.
    pub name: String,
    /// The class containing the field.
    pub owner: ClassRef,
    /// The type of the field.
    pub field_type: FieldType,
    /// The constant value of the field, if any.
    pub constant_value: Option<ConstantValue>,
    /// The generic signature of the field.
    pub signature: Option<String>,
    /// The runtime visible annotations.
    pub runtime_visible_annotations: Vec<Annotation>,
    /// The runtime invisible annotations.
    pub runtime_invisible_annotations: Vec<Annotation>,
}

/// A JVM method.
#[doc = see_jvm_spec!(4, 6)]
#[derive(Debug, Clone)]
pub struct Method {
    /// The access flags of the method.
    pub access_flags: method::AccessFlags,
    /// The name of the method.
    pub name: String,
    /// The descriptor of the method.
    pub descriptor: MethodDescriptor,
    /// The class containing the method.
    pub owner: ClassRef,
    /// The body of the method if it is not `abstract` or `native`.
    pub body: Option<MethodBody>,
    /// The checked exceptions declared by the method.
    pub exceptions: Vec<ClassRef>,
    /// The generic signature of the method.
    pub signature: Option<String>,
    /// The runtime visible annotations.
    pub runtime_visible_annotations: Vec<Annotation>,
    /// The runtime invisible annotations.
    pub runtime_invisible_annotations: Vec<Annotation>,
    /// The runtime visible annotations on each parameter.
    pub runtime_visible_parameter_annotations: Vec<Vec<Annotation>>,
    /// The runtime invisible annotations on each parameter.
    pub runtime_invisible_parameter_annotations: Vec<Vec<Annotation>>,
    /// The default value of the annotation element declared by this method.
    pub annotation_default: Option<ElementValue>,
}

/// An annotation on a class, a field, a method, or a method parameter.
#[doc = see_jvm_spec!(4, 7, 16)]
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// The type of the annotation.
    pub annotation_type: FieldType,
    /// The names and values of the annotation's elements.
    pub element_value_pairs: Vec<(String, ElementValue)>,
}

/// A string in the JVM bytecode.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub enum JavaString {
    /// A valid UTF-8 string.
    Utf8(String),
    /// A string that is not valid UTF-8, e.g., a string containing unpaired surrogates.
    InvalidUtf8(Vec<u8>),
}

impl From<String> for JavaString {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

impl From<&str> for JavaString {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_owned())
    }
}

impl Display for JavaString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JavaString::Utf8(value) => write!(f, "String(\"{value}\")"),
            JavaString::InvalidUtf8(value) => write!(
                f,
                "String({}) // Invalid UTF-8",
                value.iter().map(|it| format!("0x{it:02X}")).join(" ")
            ),
        }
    }
}

/// A method handle constant.
#[doc = see_jvm_spec!(4, 4, 8)]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MethodHandle {
    /// The `reference_kind` of the handle, from `1` (`REF_getField`) to `9` (`REF_invokeInterface`).
    pub kind: u8,
    /// The class declaring the referenced member.
    pub owner: ClassRef,
    /// The name of the referenced member.
    pub name: String,
    /// The descriptor of the referenced member.
    pub descriptor: String,
    /// Whether the owner is an interface.
    pub is_interface: bool,
}

/// Denotes a compile-time constant value.
#[derive(Debug, PartialEq, Clone)]
pub enum ConstantValue {
    /// The `null` value.
    Null,
    /// A primitive integer value (i.e., `int`, `short`, `char`, `byte`, or `boolean`).
    Integer(i32),
    /// A primitive float value.
    Float(f32),
    /// A primitive long value.
    Long(i64),
    /// A primitive double value.
    Double(f64),
    /// A string literal.
    String(JavaString),
    /// A class literal.
    Class(ClassRef),
    /// A method handle.
    Handle(MethodHandle),
    /// A method type.
    MethodType(MethodDescriptor),
    /// A dynamic constant.
    Dynamic {
        /// The index of the bootstrap method.
        bootstrap_method_attr_index: u16,
        /// The name of the constant.
        name: String,
        /// The descriptor of the constant.
        descriptor: String,
    },
}

impl ConstantValue {
    /// Returns the number of operand stack words the value takes when loaded.
    #[must_use]
    pub fn words(&self) -> u16 {
        match self {
            Self::Long(_) | Self::Double(_) => 2,
            Self::Dynamic { descriptor, .. } if matches!(descriptor.as_str(), "J" | "D") => 2,
            _ => 1,
        }
    }
}

impl Display for ConstantValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Integer(value) => write!(f, "int({value})"),
            ConstantValue::Float(value) => write!(f, "float({value})"),
            ConstantValue::Long(value) => write!(f, "long({value})"),
            ConstantValue::Double(value) => write!(f, "double({value})"),
            ConstantValue::String(value) => value.fmt(f),
            ConstantValue::Class(value) => write!(f, "{value}.class"),
            ConstantValue::Handle(MethodHandle { owner, name, .. }) => {
                write!(f, "MethodHandle({owner}::{name})")
            }
            ConstantValue::MethodType(value) => write!(f, "MethodType({value})"),
            ConstantValue::Dynamic {
                bootstrap_method_attr_index,
                name,
                descriptor,
            } => write!(
                f,
                "Dynamic({bootstrap_method_attr_index}, {name}, {descriptor})"
            ),
        }
    }
}
