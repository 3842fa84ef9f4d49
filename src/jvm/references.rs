//! References to JVM elements.
use std::fmt::Display;

use crate::types::{
    field_type::FieldType,
    method_descriptor::{MethodDescriptor, ReturnType},
};

use super::Method;

/// A reference to a [`Class`](crate::jvm::Class).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct ClassRef {
    /// The binary name of the class.
    pub binary_name: String,
}

impl ClassRef {
    /// Creates a new [`ClassRef`] from a binary name.
    pub fn new<S: Into<String>>(binary_name: S) -> Self {
        ClassRef {
            binary_name: binary_name.into(),
        }
    }

    /// Returns the package part of the binary name, e.g., `java/lang` for `java/lang/String`.
    /// Returns an empty string for classes in the unnamed package.
    #[must_use]
    pub fn package(&self) -> &str {
        self.binary_name
            .rsplit_once('/')
            .map_or("", |(package, _)| package)
    }

    /// Returns the simple name of the class, e.g., `String` for `java/lang/String`.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.binary_name
            .rsplit_once('/')
            .map_or(self.binary_name.as_str(), |(_, simple)| simple)
    }

    /// Returns the name as written in Java source, e.g., `java.lang.String`.
    #[must_use]
    pub fn java_name(&self) -> String {
        self.binary_name.replace('/', ".")
    }
}

impl Display for ClassRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.binary_name)
    }
}

/// A reference to a [`Field`](crate::jvm::Field).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct FieldRef {
    /// A reference to the class that contains the field.
    pub owner: ClassRef,
    /// The name of the field.
    pub name: String,
    /// The type of the field.
    pub field_type: FieldType,
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

/// A reference to a [`Method`].
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MethodRef {
    /// The reference to the class containing the method.
    pub owner: ClassRef,
    /// The name of the method.
    pub name: String,
    /// The descriptor of the method.
    pub descriptor: MethodDescriptor,
    /// Whether the owner is an interface, i.e., the reference is stored as a
    /// `CONSTANT_InterfaceMethodref`.
    pub is_interface: bool,
}

impl MethodRef {
    /// Creates a reference to a method declared in a class.
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: MethodDescriptor,
    ) -> Self {
        Self {
            owner: ClassRef::new(owner),
            name: name.into(),
            descriptor,
            is_interface: false,
        }
    }

    /// Checks if the method reference refers to a constructor.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == Method::CONSTRUCTOR_NAME
            && matches!(self.descriptor.return_type, ReturnType::Void)
    }

    /// Checks if the method reference refers to a static initializer block.
    #[must_use]
    pub fn is_static_initializer_block(&self) -> bool {
        self.name == Method::CLASS_INITIALIZER_NAME
            && self.descriptor.parameters_types.is_empty()
            && matches!(self.descriptor.return_type, ReturnType::Void)
    }
}

impl Display for MethodRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}{}", self.owner, self.name, self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::arb_class_name;

    use super::*;
    use proptest::prelude::*;

    proptest! {

        #[test]
        fn test_is_constructor(class_name in arb_class_name()) {
            let method = MethodRef::new(class_name, Method::CONSTRUCTOR_NAME, MethodDescriptor::void());
            assert!(method.is_constructor());
        }

        #[test]
        fn test_is_static_initializer_block(class_name in arb_class_name()) {
            let method = MethodRef::new(
                class_name,
                Method::CLASS_INITIALIZER_NAME,
                MethodDescriptor::void(),
            );
            assert!(method.is_static_initializer_block());
        }

        #[test]
        fn package_and_simple_name_rejoin(class_name in arb_class_name()) {
            let class_ref = ClassRef::new(class_name.clone());
            let rejoined = if class_ref.package().is_empty() {
                class_ref.simple_name().to_owned()
            } else {
                format!("{}/{}", class_ref.package(), class_ref.simple_name())
            };
            assert_eq!(rejoined, class_name);
        }
    }

    #[test]
    fn java_name() {
        let class_ref = ClassRef::new("java/util/Map$Entry");
        assert_eq!(class_ref.java_name(), "java.util.Map$Entry");
        assert_eq!(class_ref.package(), "java/util");
        assert_eq!(class_ref.simple_name(), "Map$Entry");
    }
}
