//! Fields and their access flags.

use bitflags::bitflags;

use super::{Field, references::FieldRef};

impl Field {
    /// Creates a reference to the field.
    #[must_use]
    pub fn make_ref(&self) -> FieldRef {
        FieldRef {
            owner: self.owner.clone(),
            name: self.name.clone(),
            field_type: self.field_type.clone(),
        }
    }

    /// Checks if the field is `static`.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.access_flags.contains(AccessFlags::STATIC)
    }
}

bitflags! {
    /// The access flags of a [`Field`].
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
        /// Declared `final`; never directly assigned to after object construction.
        const FINAL = 0x0010;
        /// Declared `volatile`; cannot be cached.
        const VOLATILE = 0x0040;
        /// Declared `transient`; not written or read by a persistent object manager.
        const TRANSIENT = 0x0080;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an element of an `enum` class.
        const ENUM = 0x4000;
    }
}
