use proptest::prelude::*;

use crate::{
    jvm::{
        Class, Method,
        class::{self, Version},
        class_loader::{CachingClassLoader, ClassLoader, class_paths::MemoryClassPath},
        code::{CodeBuilder, opcodes::*},
        method,
        references::ClassRef,
    },
    types::{
        field_type::{FieldType, PrimitiveType},
        method_descriptor::{MethodDescriptor, ReturnType},
    },
};

#[rustfmt::skip]
#[must_use]
pub const fn empty_class_with_version(major: u16, minor: u16) -> [u8;40] {
    [
        0xCA, 0xFE, 0xBA, 0xBE, // Magic
        minor.to_be_bytes()[0], minor.to_be_bytes()[1], // Minor version
        major.to_be_bytes()[0], major.to_be_bytes()[1], // Major version
        // Constant pool
        0x00, 0x03, // Constant pool count 2+1
        0x07, // Tag: Class
        0x00, 0x02, // Name index: 2
        0x01, // Tag: Utf8
        0x00, 0x0A, // Length of string: 10
        0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x57, 0x6F, 0x72, 0x6C, 0x64, // "Helloworld"
        0x00, 0x01, // Access flags: public
        0x00, 0x01, // This class index
        0x00, 0x01, // Super class index
        0x00, 0x00, // Interfaces count
        0x00, 0x00, // Fields count
        0x00, 0x00, // Methods count
        0x00, 0x00, // Attributes count
    ]
}

/// Serializes a class for tests that need class file bytes.
pub(crate) fn class_bytes(class: Class) -> Vec<u8> {
    class.to_bytes().expect("Failed to serialize the class")
}

/// The bytes of a public class without members.
pub(crate) fn empty_class_bytes(name: &str, super_name: &str) -> Vec<u8> {
    class_bytes(Class {
        version: Version::JDK8,
        access_flags: class::AccessFlags::PUBLIC | class::AccessFlags::SUPER,
        binary_name: name.to_owned(),
        super_class: Some(ClassRef::new(super_name)),
        ..Class::default()
    })
}

/// A method whose body returns the default value of its return type, or no body if it is
/// `abstract` or `native`.
pub(crate) fn method_stub(
    owner: &str,
    name: &str,
    descriptor: &str,
    access_flags: method::AccessFlags,
) -> Method {
    let descriptor: MethodDescriptor = descriptor.parse().expect("Invalid descriptor");
    let body = if access_flags.intersects(method::AccessFlags::ABSTRACT | method::AccessFlags::NATIVE) {
        None
    } else {
        let mut code = CodeBuilder::new();
        match &descriptor.return_type {
            ReturnType::Void => code.simple(RETURN),
            ReturnType::Some(FieldType::Base(PrimitiveType::Long)) => {
                code.simple(LCONST_0).simple(LRETURN)
            }
            ReturnType::Some(FieldType::Base(PrimitiveType::Float)) => {
                code.simple(FCONST_0).simple(FRETURN)
            }
            ReturnType::Some(FieldType::Base(PrimitiveType::Double)) => {
                code.simple(DCONST_0).simple(DRETURN)
            }
            ReturnType::Some(FieldType::Base(_)) => code.simple(ICONST_0).simple(IRETURN),
            ReturnType::Some(_) => code.simple(ACONST_NULL).simple(ARETURN),
        };
        let this = u16::from(!access_flags.contains(method::AccessFlags::STATIC));
        Some(
            code.build(descriptor.parameters_words() + this)
                .expect("Failed to build the stub body"),
        )
    };
    Method {
        access_flags,
        name: name.to_owned(),
        descriptor,
        owner: ClassRef::new(owner),
        body,
        exceptions: Vec::new(),
        signature: None,
        runtime_visible_annotations: Vec::new(),
        runtime_invisible_annotations: Vec::new(),
        runtime_visible_parameter_annotations: Vec::new(),
        runtime_invisible_parameter_annotations: Vec::new(),
        annotation_default: None,
    }
}

/// A `java.lang.Object` with the methods the proxies care about.
pub(crate) fn object_class() -> Class {
    let owner = "java/lang/Object";
    let public = method::AccessFlags::PUBLIC;
    Class {
        version: Version::JDK8,
        access_flags: class::AccessFlags::PUBLIC | class::AccessFlags::SUPER,
        binary_name: owner.to_owned(),
        super_class: None,
        methods: vec![
            method_stub(owner, Method::CONSTRUCTOR_NAME, "()V", public),
            method_stub(owner, "hashCode", "()I", public | method::AccessFlags::NATIVE),
            method_stub(owner, "equals", "(Ljava/lang/Object;)Z", public),
            method_stub(owner, "toString", "()Ljava/lang/String;", public),
            method_stub(
                owner,
                "getClass",
                "()Ljava/lang/Class;",
                public | method::AccessFlags::FINAL | method::AccessFlags::NATIVE,
            ),
            method_stub(owner, "clone", "()Ljava/lang/Object;", method::AccessFlags::PROTECTED),
            method_stub(owner, "finalize", "()V", method::AccessFlags::PROTECTED),
        ],
        ..Class::default()
    }
}

/// A loader over the given classes and [`object_class`].
pub(crate) fn test_loader(
    classes: impl IntoIterator<Item = Class>,
) -> CachingClassLoader<MemoryClassPath> {
    let class_path = classes
        .into_iter()
        .chain(std::iter::once(object_class()))
        .map(|it| (it.binary_name.clone(), class_bytes(it)))
        .collect::<MemoryClassPath>();
    ClassLoader::new(vec![class_path]).into_cached()
}

pub(crate) fn arb_class_name() -> impl Strategy<Value = String> {
    let arb_ident = prop::string::string_regex(r"[a-zA-Z][\w\$_]*").expect("The regex is invalid");
    prop::collection::vec(arb_ident, 1..6).prop_map(|v| v.join("/"))
}

pub(crate) fn arb_non_array_field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        any::<PrimitiveType>().prop_map(FieldType::Base),
        arb_class_name()
            .prop_map(ClassRef::new)
            .prop_map(FieldType::Object),
    ]
}

prop_compose! {
    fn arb_array_field_type()(
        t in arb_non_array_field_type(),
        dim in 1..=u8::MAX
    ) -> FieldType {
        FieldType::array_of(t, dim)
    }
}

pub(crate) fn arb_field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![arb_non_array_field_type(), arb_array_field_type()]
}
