//! Non-generic JVM field types.

use std::{fmt::Display, str::FromStr};

use itertools::Itertools;

use super::{Descriptor, method_descriptor::InvalidDescriptor};
use crate::{jvm::references::ClassRef, macros::see_jvm_spec};

/// A primitive type in Java.
#[doc = see_jvm_spec!(4, 3, 2)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, derive_more::Display)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum PrimitiveType {
    /// The `boolean` type.
    #[display("boolean")]
    Boolean,
    /// The `char` type.
    #[display("char")]
    Char,
    /// The `float` type.
    #[display("float")]
    Float,
    /// The `double` type.
    #[display("double")]
    Double,
    /// The `byte` type.
    #[display("byte")]
    Byte,
    /// The `short` type.
    #[display("short")]
    Short,
    /// The `int` type.
    #[display("int")]
    Int,
    /// The `long` type.
    #[display("long")]
    Long,
}

impl PrimitiveType {
    /// Returns the descriptor character of the primitive type.
    #[must_use]
    pub const fn descriptor_char(self) -> char {
        match self {
            Self::Boolean => 'Z',
            Self::Char => 'C',
            Self::Float => 'F',
            Self::Double => 'D',
            Self::Byte => 'B',
            Self::Short => 'S',
            Self::Int => 'I',
            Self::Long => 'J',
        }
    }

    /// Returns the binary name of the wrapper class, e.g., `java/lang/Integer` for `int`.
    #[must_use]
    pub const fn boxed_class(self) -> &'static str {
        match self {
            Self::Boolean => "java/lang/Boolean",
            Self::Char => "java/lang/Character",
            Self::Float => "java/lang/Float",
            Self::Double => "java/lang/Double",
            Self::Byte => "java/lang/Byte",
            Self::Short => "java/lang/Short",
            Self::Int => "java/lang/Integer",
            Self::Long => "java/lang/Long",
        }
    }

    /// Returns the name of the method on the wrapper class that unboxes the value,
    /// e.g., `intValue` for `int`.
    #[must_use]
    pub const fn unbox_method(self) -> &'static str {
        match self {
            Self::Boolean => "booleanValue",
            Self::Char => "charValue",
            Self::Float => "floatValue",
            Self::Double => "doubleValue",
            Self::Byte => "byteValue",
            Self::Short => "shortValue",
            Self::Int => "intValue",
            Self::Long => "longValue",
        }
    }

    /// Returns the number of local variable slots or operand stack words a value of this type
    /// occupies.
    #[must_use]
    pub const fn words(self) -> u16 {
        match self {
            Self::Long | Self::Double => 2,
            _ => 1,
        }
    }
}

impl TryFrom<char> for PrimitiveType {
    type Error = InvalidDescriptor;

    fn try_from(descriptor: char) -> Result<Self, Self::Error> {
        match descriptor {
            'Z' => Ok(Self::Boolean),
            'C' => Ok(Self::Char),
            'F' => Ok(Self::Float),
            'D' => Ok(Self::Double),
            'B' => Ok(Self::Byte),
            'S' => Ok(Self::Short),
            'I' => Ok(Self::Int),
            'J' => Ok(Self::Long),
            _ => Err(InvalidDescriptor(descriptor.to_string())),
        }
    }
}

impl Descriptor for PrimitiveType {
    fn descriptor(&self) -> String {
        self.descriptor_char().to_string()
    }
}

/// A field type (non-generic) in Java.
#[doc = see_jvm_spec!(4, 3, 2)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub enum FieldType {
    /// A primitive type.
    Base(PrimitiveType),
    /// A reference type (except arrays).
    Object(ClassRef),
    /// An array type.
    Array(Box<FieldType>),
}

impl FieldType {
    /// Creates an array type with the given type as its elements.
    #[must_use]
    pub fn into_array_type(self) -> Self {
        Self::Array(Box::new(self))
    }

    /// Creates an array type of `dim` dimensions over `element_type`.
    #[must_use]
    pub fn array_of(element_type: FieldType, dim: u8) -> Self {
        (0..dim).fold(element_type, |acc, _| acc.into_array_type())
    }

    /// Creates a reference type of the class with the given binary name.
    #[must_use]
    pub fn object(binary_name: impl Into<String>) -> Self {
        Self::Object(ClassRef::new(binary_name))
    }

    /// Returns the number of local variable slots or operand stack words a value of this type
    /// occupies.
    #[must_use]
    pub const fn words(&self) -> u16 {
        match self {
            Self::Base(it) => it.words(),
            Self::Object(_) | Self::Array(_) => 1,
        }
    }

    /// Returns the name used by `CHECKCAST`, `ANEWARRAY` and class literals for this type.
    /// That is the binary name for classes and the descriptor for arrays.
    /// Returns [`None`] for primitive types.
    #[must_use]
    pub fn internal_name(&self) -> Option<String> {
        match self {
            Self::Base(_) => None,
            Self::Object(ClassRef { binary_name }) => Some(binary_name.clone()),
            Self::Array(_) => Some(self.descriptor()),
        }
    }

    /// Returns the [`ClassRef`] naming this type as seen by `CHECKCAST` or `LDC`.
    #[must_use]
    pub fn class_ref(&self) -> Option<ClassRef> {
        self.internal_name().map(ClassRef::new)
    }

    /// Parses a field type from the beginning of `descriptor` and returns the remaining input.
    pub(crate) fn parse_prefix(descriptor: &str) -> Result<(Self, &str), InvalidDescriptor> {
        let invalid = || InvalidDescriptor(descriptor.to_owned());
        let mut chars = descriptor.chars();
        let prefix = chars.next().ok_or_else(invalid)?;
        if let Ok(p) = PrimitiveType::try_from(prefix) {
            return Ok((Self::Base(p), chars.as_str()));
        }
        match prefix {
            'L' => {
                let binary_name: String = chars.take_while_ref(|c| *c != ';').collect();
                match chars.next() {
                    Some(';') if !binary_name.is_empty() => {
                        Ok((Self::object(binary_name), chars.as_str()))
                    }
                    _ => Err(invalid()),
                }
            }
            '[' => {
                let (element, remaining) =
                    Self::parse_prefix(chars.as_str()).map_err(|_| invalid())?;
                Ok((element.into_array_type(), remaining))
            }
            _ => Err(invalid()),
        }
    }
}

impl Descriptor for FieldType {
    fn descriptor(&self) -> String {
        match self {
            Self::Base(it) => it.descriptor(),
            Self::Object(ClassRef { binary_name }) => format!("L{binary_name};"),
            Self::Array(inner) => format!("[{}", inner.descriptor()),
        }
    }
}

/// Formats the type the way Java source code spells it, e.g., `java.lang.String[]`.
impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base(it) => it.fmt(f),
            Self::Object(ClassRef { binary_name }) => {
                write!(f, "{}", binary_name.replace('/', "."))
            }
            Self::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

impl FromStr for FieldType {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        match Self::parse_prefix(descriptor) {
            Ok((field_type, "")) => Ok(field_type),
            _ => Err(InvalidDescriptor(descriptor.to_owned())),
        }
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::tests::arb_field_type;

    #[test]
    fn parse_primitive_types() {
        for (desc, expected) in [
            ("Z", PrimitiveType::Boolean),
            ("C", PrimitiveType::Char),
            ("F", PrimitiveType::Float),
            ("D", PrimitiveType::Double),
            ("B", PrimitiveType::Byte),
            ("S", PrimitiveType::Short),
            ("I", PrimitiveType::Int),
            ("J", PrimitiveType::Long),
        ] {
            assert_eq!(desc.parse::<FieldType>(), Ok(FieldType::Base(expected)));
        }
    }

    #[test]
    fn void_is_not_a_field_type() {
        assert!(FieldType::from_str("V").is_err());
    }

    #[test]
    fn parse_nested_array() {
        let parsed: FieldType = "[[Ljava/lang/String;".parse().unwrap();
        assert_eq!(
            parsed,
            FieldType::array_of(FieldType::object("java/lang/String"), 2)
        );
        assert_eq!(parsed.to_string(), "java.lang.String[][]");
        assert_eq!(parsed.internal_name().unwrap(), "[[Ljava/lang/String;");
    }

    #[test]
    fn reject_trailing_input() {
        assert!(FieldType::from_str("II").is_err());
        assert!(FieldType::from_str("Ljava/lang/String;I").is_err());
        assert!(FieldType::from_str("L;").is_err());
        assert!(FieldType::from_str("Ljava/lang/String").is_err());
    }

    #[test]
    fn words() {
        assert_eq!(FieldType::Base(PrimitiveType::Long).words(), 2);
        assert_eq!(FieldType::Base(PrimitiveType::Double).words(), 2);
        assert_eq!(FieldType::Base(PrimitiveType::Int).words(), 1);
        assert_eq!(FieldType::object("java/lang/Long").words(), 1);
    }

    proptest! {
        #[test]
        fn descriptor_parses_back(field_type in arb_field_type()) {
            let desc = field_type.descriptor();
            prop_assert_eq!(FieldType::from_str(&desc), Ok(field_type));
        }

        #[test]
        fn boxed_class_lives_in_java_lang(p in any::<PrimitiveType>()) {
            prop_assert!(p.boxed_class().starts_with("java/lang/"));
            prop_assert!(p.unbox_method().ends_with("Value"));
        }
    }
}
