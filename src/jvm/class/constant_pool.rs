//! Entries of a class file's constant pool and the slots they occupy.

use std::io::{self, Read};

use crate::{
    jvm::{JavaString, class::ConstantPool},
    macros::see_jvm_spec,
};

/// Index `0` and the slot after a `long` or `double` hold no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    Entry(Entry),
    Padding,
}

impl ConstantPool {
    /// Creates a pool holding only the unusable slot `0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: vec![Slot::Padding],
        }
    }

    /// Reads entries until the pool has `constant_pool_count` slots.
    #[doc = see_jvm_spec!(4, 1)]
    /// # Errors
    /// See [`io::Error`] for more information.
    pub fn from_reader<R>(reader: &mut R, constant_pool_count: u16) -> io::Result<Self>
    where
        R: Read + ?Sized,
    {
        let mut inner = Vec::with_capacity(usize::from(constant_pool_count));
        inner.push(Slot::Padding);
        let mut pool = Self { inner };
        // Entries are kept as read, duplicates included, so indices match the source.
        while pool.count() < constant_pool_count {
            pool.push(Entry::parse(reader)?);
        }
        Ok(pool)
    }

    fn push(&mut self, entry: Entry) {
        let wide = entry.is_wide();
        self.inner.push(Slot::Entry(entry));
        if wide {
            self.inner.push(Slot::Padding);
        }
    }

    /// Gets the entry at `index`, or [`None`] for padding and out-of-bounds indices.
    #[must_use]
    pub fn get_entry(&self, index: u16) -> Option<&Entry> {
        match self.inner.get(usize::from(index)) {
            Some(Slot::Entry(entry)) => Some(entry),
            _ => None,
        }
    }

    /// Appends `entry` and returns its index.
    ///
    /// # Errors
    /// Gives the entry back if it does not fit in the 65535 slots of a pool.
    pub fn put_entry(&mut self, entry: Entry) -> Result<u16, Overflow> {
        let index = self.count();
        let width = if entry.is_wide() { 2 } else { 1 };
        if self.inner.len() + width > usize::from(u16::MAX) {
            return Err(Overflow(entry));
        }
        self.push(entry);
        Ok(index)
    }

    /// Returns the index of an equal entry, appending `entry` if there is none.
    pub(crate) fn put_entry_dedup(&mut self, entry: Entry) -> Result<u16, Overflow> {
        let existing = self
            .inner
            .iter()
            .position(|slot| matches!(slot, Slot::Entry(it) if it == &entry));
        match existing {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "A pool never holds more than u16::MAX slots."
            )]
            Some(index) => Ok(index as u16),
            None => self.put_entry(entry),
        }
    }

    /// The `constant_pool_count` of the class file, i.e., the number of slots including slot `0`.
    #[doc = see_jvm_spec!(4, 1)]
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "A pool never holds more than u16::MAX slots."
    )]
    pub fn count(&self) -> u16 {
        self.inner.len() as u16
    }
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

/// The entry that did not fit in a full [`ConstantPool`].
#[derive(Debug, thiserror::Error)]
#[error("The constant pool is full.")]
pub struct Overflow(pub Entry);

/// An entry in the [`ConstantPool`]. Indices point to other entries of the same pool.
#[doc = see_jvm_spec!(4, 4)]
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Entry {
    /// A string in modified UTF-8.
    Utf8(JavaString),
    /// An `int` constant.
    Integer(i32),
    /// A `float` constant.
    Float(f32),
    /// A `long` constant. Takes two slots.
    Long(i64),
    /// A `double` constant. Takes two slots.
    Double(f64),
    /// A class or array type.
    Class {
        /// The binary name, as a [`Entry::Utf8`].
        name_index: u16,
    },
    /// A `java.lang.String` constant.
    String {
        /// The value, as a [`Entry::Utf8`].
        string_index: u16,
    },
    /// A field of a class.
    FieldRef {
        /// The owner, as a [`Entry::Class`].
        class_index: u16,
        /// Name and descriptor, as a [`Entry::NameAndType`].
        name_and_type_index: u16,
    },
    /// A method of a class.
    MethodRef {
        /// The owner, as a [`Entry::Class`].
        class_index: u16,
        /// Name and descriptor, as a [`Entry::NameAndType`].
        name_and_type_index: u16,
    },
    /// A method of an interface.
    InterfaceMethodRef {
        /// The owner, as a [`Entry::Class`].
        class_index: u16,
        /// Name and descriptor, as a [`Entry::NameAndType`].
        name_and_type_index: u16,
    },
    /// A member name paired with its descriptor.
    NameAndType {
        /// The name, as a [`Entry::Utf8`].
        name_index: u16,
        /// The descriptor, as a [`Entry::Utf8`].
        descriptor_index: u16,
    },
    /// A method handle.
    #[doc = see_jvm_spec!(4, 4, 8)]
    MethodHandle {
        /// One of the `REF_` kinds, from `1` to `9`.
        reference_kind: u8,
        /// The field or method the handle refers to.
        reference_index: u16,
    },
    /// A method type.
    MethodType {
        /// The method descriptor, as a [`Entry::Utf8`].
        descriptor_index: u16,
    },
    /// A constant computed by a bootstrap method.
    #[doc = see_jvm_spec!(4, 4, 10)]
    Dynamic {
        /// Index into the `BootstrapMethods` attribute.
        bootstrap_method_attr_index: u16,
        /// Name and type of the constant, as a [`Entry::NameAndType`].
        name_and_type_index: u16,
    },
    /// The call site of an `invokedynamic` instruction.
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute.
        bootstrap_method_attr_index: u16,
        /// Name and type of the call site, as a [`Entry::NameAndType`].
        name_and_type_index: u16,
    },
}

impl Eq for Entry {}

impl Entry {
    /// Whether the entry takes two slots.
    #[must_use]
    pub const fn is_wide(&self) -> bool {
        matches!(self, Self::Long(_) | Self::Double(_))
    }

    /// The tag byte preceding the entry in a class file.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Utf8(_) => 1,
            Self::Integer(_) => 3,
            Self::Float(_) => 4,
            Self::Long(_) => 5,
            Self::Double(_) => 6,
            Self::Class { .. } => 7,
            Self::String { .. } => 8,
            Self::FieldRef { .. } => 9,
            Self::MethodRef { .. } => 10,
            Self::InterfaceMethodRef { .. } => 11,
            Self::NameAndType { .. } => 12,
            Self::MethodHandle { .. } => 15,
            Self::MethodType { .. } => 16,
            Self::Dynamic { .. } => 17,
            Self::InvokeDynamic { .. } => 18,
        }
    }

    /// The name of the entry kind, e.g., `CONSTANT_Methodref`, for error messages.
    #[must_use]
    pub const fn constant_kind(&self) -> &'static str {
        match self {
            Self::Utf8(_) => "CONSTANT_Utf8",
            Self::Integer(_) => "CONSTANT_Integer",
            Self::Float(_) => "CONSTANT_Float",
            Self::Long(_) => "CONSTANT_Long",
            Self::Double(_) => "CONSTANT_Double",
            Self::Class { .. } => "CONSTANT_Class",
            Self::String { .. } => "CONSTANT_String",
            Self::FieldRef { .. } => "CONSTANT_Fieldref",
            Self::MethodRef { .. } => "CONSTANT_Methodref",
            Self::InterfaceMethodRef { .. } => "CONSTANT_InterfaceMethodref",
            Self::NameAndType { .. } => "CONSTANT_NameAndType",
            Self::MethodHandle { .. } => "CONSTANT_MethodHandle",
            Self::MethodType { .. } => "CONSTANT_MethodType",
            Self::Dynamic { .. } => "CONSTANT_Dynamic",
            Self::InvokeDynamic { .. } => "CONSTANT_InvokeDynamic",
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::jvm::bytecode::constant_pool::tests::{arb_constant_pool_bytes, arb_entry};

    proptest! {

        #[test]
        fn reads_until_count_slots((count, bytes) in arb_constant_pool_bytes()) {
            let mut rest = bytes.as_slice();
            let pool = ConstantPool::from_reader(&mut rest, count).unwrap();
            prop_assert!(rest.is_empty());
            prop_assert_eq!(pool.count(), count);
            // One slot more than written runs out of input.
            prop_assert!(ConstantPool::from_reader(&mut bytes.as_slice(), count + 1).is_err());
        }

        #[test]
        fn dedup_returns_first_index(entry in arb_entry()) {
            let mut constant_pool = ConstantPool::new();
            constant_pool.put_entry(Entry::Integer(7)).unwrap();
            let first = constant_pool.put_entry_dedup(entry.clone()).unwrap();
            let count = constant_pool.count();
            let second = constant_pool.put_entry_dedup(entry).unwrap();
            assert_eq!(first, second);
            assert_eq!(constant_pool.count(), count);
        }
    }

    #[test]
    fn wide_entries_take_two_slots() {
        let mut constant_pool = ConstantPool::new();
        let long_idx = constant_pool.put_entry(Entry::Long(42)).unwrap();
        let int_idx = constant_pool.put_entry(Entry::Integer(42)).unwrap();
        assert_eq!(long_idx, 1);
        assert_eq!(int_idx, 3);
        assert_eq!(constant_pool.count(), 4);
        assert!(constant_pool.get_entry(2).is_none());
        assert_eq!(constant_pool.get_entry(3), Some(&Entry::Integer(42)));
    }

    #[test]
    fn overflow_returns_entry() {
        let mut constant_pool = ConstantPool::new();
        for i in 1..u16::MAX {
            constant_pool.put_entry(Entry::Integer(i32::from(i))).unwrap();
        }
        let Err(Overflow(entry)) = constant_pool.put_entry(Entry::Integer(-1)) else {
            panic!("The constant pool should be full");
        };
        assert_eq!(entry, Entry::Integer(-1));
    }
}
