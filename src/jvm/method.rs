//! Methods and their access flags.

use bitflags::bitflags;

use super::{Annotation, Method, references::MethodRef};
use crate::types::method_descriptor::ReturnType;

impl Method {
    /// The name of the constructor methods.
    pub const CONSTRUCTOR_NAME: &'static str = "<init>";
    /// The name of the class initialization method.
    pub const CLASS_INITIALIZER_NAME: &'static str = "<clinit>";

    /// Creates a reference to the method.
    #[must_use]
    pub fn make_ref(&self) -> MethodRef {
        MethodRef {
            owner: self.owner.clone(),
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
            is_interface: false,
        }
    }

    /// Checks if the method is a constructor.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == Self::CONSTRUCTOR_NAME
    }

    /// Checks if the method is a static initializer block.
    #[must_use]
    pub fn is_static_initializer_block(&self) -> bool {
        self.name == Self::CLASS_INITIALIZER_NAME
    }

    /// Checks if the method is `static`.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.access_flags.contains(AccessFlags::STATIC)
    }

    /// Checks if the method returns `void`.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self.descriptor.return_type, ReturnType::Void)
    }

    /// Returns the visible annotations followed by the invisible ones.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.runtime_visible_annotations
            .iter()
            .chain(&self.runtime_invisible_annotations)
    }
}

bitflags! {
    /// The access flags of a [`Method`].
    #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
    pub struct AccessFlags: u16 {
        /// Declared `public`; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared `private`; accessible only within the defining class and other classes belonging to the same nest.
        const PRIVATE = 0x0002;
        /// Declared `protected`; may be accessed within subclasses.
        const PROTECTED = 0x0004;
        /// Declared `static`.
        const STATIC = 0x0008;
        /// Declared `final`; must not be overridden.
        const FINAL = 0x0010;
        /// Declared `synchronized`; invocation is wrapped by a monitor use.
        const SYNCHRONIZED = 0x0020;
        /// A bridge method, generated by the compiler.
        const BRIDGE = 0x0040;
        /// Declared with variable number of arguments.
        const VARARGS = 0x0080;
        /// Declared `native`; implemented in a language other than Java.
        const NATIVE = 0x0100;
        /// Declared `abstract`; no implementation is provided.
        const ABSTRACT = 0x0400;
        /// In a `class` file whose major version number is at least 46 and at most 60; Declared `strictfp`.
        const STRICT = 0x0800;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::method_stub;

    #[test]
    fn constructor_and_initializer() {
        let ctor = method_stub("org/pkg/A", Method::CONSTRUCTOR_NAME, "()V", AccessFlags::PUBLIC);
        assert!(ctor.is_constructor());
        assert!(!ctor.is_static_initializer_block());
        let clinit = method_stub(
            "org/pkg/A",
            Method::CLASS_INITIALIZER_NAME,
            "()V",
            AccessFlags::STATIC,
        );
        assert!(clinit.is_static_initializer_block());
        assert!(clinit.is_static());
        assert!(clinit.is_void());
    }

    #[test]
    fn make_ref() {
        let method = method_stub("org/pkg/A", "run", "(I)J", AccessFlags::PUBLIC);
        let method_ref = method.make_ref();
        assert_eq!(method_ref.owner.binary_name, "org/pkg/A");
        assert_eq!(method_ref.name, "run");
        assert_eq!(method_ref.descriptor, method.descriptor);
        assert!(!method.is_void());
    }
}
