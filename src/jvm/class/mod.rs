//! JVM classes and interfaces

pub mod constant_pool;

use std::borrow::Borrow;

use bitflags::bitflags;

use super::{
    Annotation, Class, Field, Method, bytecode::ParseError, method, references::ClassRef,
};
use crate::{
    macros::see_jvm_spec,
    types::{field_type::FieldType, method_descriptor::MethodDescriptor},
};

impl Class {
    /// Gets a method of the class by its name and descriptor.
    #[must_use]
    pub fn get_method<D>(&self, name: &str, descriptor: D) -> Option<&Method>
    where
        D: Borrow<MethodDescriptor>,
    {
        self.methods
            .iter()
            .find(|m| m.name == name && &m.descriptor == descriptor.borrow())
    }

    /// Gets a field of the class by its name and type.
    #[must_use]
    pub fn get_field<T>(&self, name: &str, field_type: T) -> Option<&Field>
    where
        T: Borrow<FieldType>,
    {
        self.fields
            .iter()
            .find(|f| f.name == name && &f.field_type == field_type.borrow())
    }

    /// Creates a [`ClassRef`] referring to the class.
    #[must_use]
    pub fn make_ref(&self) -> ClassRef {
        ClassRef {
            binary_name: self.binary_name.clone(),
        }
    }

    /// Returns `true` if this class is an interface.
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        self.access_flags.contains(AccessFlags::INTERFACE)
    }

    /// Returns `true` if this class is abstract.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.access_flags.contains(AccessFlags::ABSTRACT)
    }

    /// Returns `true` if this class is `final`.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.access_flags.contains(AccessFlags::FINAL)
    }

    /// Returns the constructors declared in the class.
    pub fn constructors(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(|it| it.is_constructor())
    }

    /// Returns the visible annotations followed by the invisible ones.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.runtime_visible_annotations
            .iter()
            .chain(&self.runtime_invisible_annotations)
    }

    /// Returns `true` if a method with the given name and descriptor is declared `private` in
    /// this class.
    #[must_use]
    pub fn is_private_method(&self, name: &str, descriptor: &MethodDescriptor) -> bool {
        self.get_method(name, descriptor)
            .is_some_and(|it| it.access_flags.contains(method::AccessFlags::PRIVATE))
    }
}

impl Default for Class {
    fn default() -> Self {
        Self {
            version: Version::default(),
            access_flags: AccessFlags::empty(),
            binary_name: String::new(),
            super_class: Some(ClassRef::new("java/lang/Object")),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            source_file: None,
            inner_classes: Vec::new(),
            signature: None,
            runtime_visible_annotations: Vec::new(),
            runtime_invisible_annotations: Vec::new(),
        }
    }
}

/// The constant pool of a class file.
#[doc = see_jvm_spec!(4, 4)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    pub(crate) inner: Vec<constant_pool::Slot>,
}

/// The latest major version of class files this crate understands.
pub const MAX_MAJOR_VERSION: u16 = 69;

/// The version of a class file.
#[doc = see_jvm_spec!(4, 1)]
#[derive(Debug, PartialOrd, Ord, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Version {
    major: u16,
    minor: u16,
}

impl Version {
    /// Java 5. Classes of this version are verified by type inference and carry no stack map
    /// frames.
    pub const JDK5: Self = Self {
        major: 49,
        minor: 0,
    };

    /// Java 8.
    pub const JDK8: Self = Self {
        major: 52,
        minor: 0,
    };

    pub(crate) fn from_versions(major: u16, minor: u16) -> Result<Self, ParseError> {
        match (major, minor) {
            (45, _) | (46..=55, 0x0000) | (56..=MAX_MAJOR_VERSION, 0x0000 | 0xFFFF) => {
                Ok(Self { major, minor })
            }
            _ => Err(ParseError::malform(format!("Invalid class version {major}.{minor}"))),
        }
    }

    /// Returns `true` if the class is compiled with preview features enabled.
    #[must_use]
    pub const fn is_preview_enabled(&self) -> bool {
        self.major >= 56 && self.minor == u16::MAX
    }

    /// Returns the major version.
    #[must_use]
    pub const fn major(&self) -> u16 {
        self.major
    }

    /// Returns the minor version.
    #[must_use]
    pub const fn minor(&self) -> u16 {
        self.minor
    }

    /// Returns `true` if the JVM requires `StackMapTable` attributes for classes of this version.
    #[must_use]
    pub const fn requires_stack_map_frames(&self) -> bool {
        self.major > 50
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::JDK5
    }
}

/// The inner classes of a class.
#[doc = see_jvm_spec!(4, 7, 6)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo {
    /// The inner class.
    pub inner_class: ClassRef,
    /// The outer class, `None` for local and anonymous classes.
    pub outer_class: Option<ClassRef>,
    /// The simple name of the inner class, `None` for anonymous classes.
    pub inner_name: Option<String>,
    /// The access flags of the inner class.
    pub access_flags: NestedClassAccessFlags,
}

bitflags! {
    /// The access flags of a [`Class`].
    #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
    pub struct AccessFlags: u16 {
        /// Declared `public`; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Marked `private` in source.
        /// NOTE: The is not mentioned in the JVM Specification. However it is set in some class
        /// files, event for those in the JDK.
        const PRIVATE = 0x0002;
        /// Declared `final`; no subclasses allowed.
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked by the invokespecial instruction.
        const SUPER = 0x0020;
        /// Is an interface, not a class.
        const INTERFACE = 0x0200;
        /// Declared `abstract`; must not be instantiated.
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface.
        const ANNOTATION = 0x2000;
        /// Declared as an enum class.
        const ENUM = 0x4000;
        /// Is a module, not a class or interface.
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// The access flags of a nested class.
    #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
    pub struct NestedClassAccessFlags: u16 {
        /// Marked or implicitly `public` in source.
        const PUBLIC = 0x0001;
        /// Marked `private` in source.
        const PRIVATE = 0x0002;
        /// Marked `protected` in source.
        const PROTECTED = 0x0004;
        /// Marked or implicitly `static` in source.
        const STATIC = 0x0008;
        /// Marked `final` in source.
        const FINAL = 0x0010;
        /// Was an `interface` in source.
        const INTERFACE = 0x0200;
        /// Marked or implicitly `abstract` in source.
        const ABSTRACT = 0x0400;
        /// Declared `synthetic`; not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface.
        const ANNOTATION = 0x2000;
        /// Declared as an enum class.
        const ENUM = 0x4000;
    }
}
