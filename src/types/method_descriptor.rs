//! Non-generic JVM method descriptors.

use std::{fmt::Display, str::FromStr};

use itertools::Itertools;

use super::{Descriptor, field_type::FieldType};
use crate::macros::see_jvm_spec;

/// The descriptor of a method.
/// Consists of the parameters types and the return type.
#[doc = see_jvm_spec!(4, 3, 3)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct MethodDescriptor {
    /// The type of the parameters.
    pub parameters_types: Vec<FieldType>,
    /// The return type.
    pub return_type: ReturnType,
}

/// Denotes the return type of a method.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub enum ReturnType {
    /// The method returns a specific type.
    Some(FieldType),
    /// The return type of the method is `void`.
    Void,
}

impl Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnType::Some(t) => t.fmt(f),
            ReturnType::Void => write!(f, "void"),
        }
    }
}

impl MethodDescriptor {
    /// Creates a descriptor of a method taking no arguments and returning `void`.
    #[must_use]
    pub const fn void() -> Self {
        Self {
            parameters_types: Vec::new(),
            return_type: ReturnType::Void,
        }
    }

    /// Returns the number of local variable slots taken by the parameters, not counting `this`.
    #[must_use]
    pub fn parameters_words(&self) -> u16 {
        self.parameters_types.iter().map(FieldType::words).sum()
    }
}

impl Descriptor for MethodDescriptor {
    fn descriptor(&self) -> String {
        format!(
            "({}){}",
            self.parameters_types
                .iter()
                .map(FieldType::descriptor)
                .join(""),
            self.return_type.descriptor()
        )
    }
}

impl Display for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}

impl FromStr for MethodDescriptor {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDescriptor(descriptor.to_owned());
        let mut remaining = descriptor.strip_prefix('(').ok_or_else(invalid)?;
        let mut parameters_types = Vec::new();
        let return_type = loop {
            if let Some(ret) = remaining.strip_prefix(')') {
                break ReturnType::from_str(ret).map_err(|_| invalid())?;
            }
            let (param, rest) = FieldType::parse_prefix(remaining).map_err(|_| invalid())?;
            parameters_types.push(param);
            remaining = rest;
        };
        Ok(Self {
            parameters_types,
            return_type,
        })
    }
}

/// An error indicating that the descriptor string is invalid.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
#[error("Invalid descriptor: {0}")]
pub struct InvalidDescriptor(pub String);

impl FromStr for ReturnType {
    type Err = InvalidDescriptor;
    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        if descriptor == "V" {
            Ok(ReturnType::Void)
        } else {
            FieldType::from_str(descriptor).map(ReturnType::Some)
        }
    }
}

impl ReturnType {
    /// Returns the number of operand stack words taken by a returned value.
    #[must_use]
    pub const fn words(&self) -> u16 {
        match self {
            ReturnType::Some(it) => it.words(),
            ReturnType::Void => 0,
        }
    }
}

impl Descriptor for ReturnType {
    fn descriptor(&self) -> String {
        match self {
            ReturnType::Some(it) => it.descriptor(),
            ReturnType::Void => "V".to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    use crate::{
        tests::arb_field_type,
        types::field_type::{FieldType, PrimitiveType},
    };

    const MAX_PARAMS: usize = 10;

    fn arb_return_type() -> impl Strategy<Value = ReturnType> {
        prop_oneof![
            Just(ReturnType::Void),
            arb_field_type().prop_map(ReturnType::Some),
        ]
    }

    proptest! {
        #[test]
        fn method_desc_from_str(
            params in prop::collection::vec(arb_field_type(), 0..MAX_PARAMS),
            ret in arb_return_type(),
        ) {
            let descriptor = format!(
                "({}){}",
                params.iter().map(FieldType::descriptor).join(""),
                ret.descriptor()
            );
            let parsed =
                MethodDescriptor::from_str(&descriptor).expect("Failed to parse method descriptor");
            assert_eq!(parsed.descriptor(), descriptor);
            assert_eq!(parsed.return_type, ret);
            assert_eq!(parsed.parameters_types, params);
        }

        #[test]
        fn too_many_return_type(
            params in prop::collection::vec(arb_field_type(), 0..MAX_PARAMS),
            rets in prop::collection::vec(arb_return_type(), 2..5),
        ) {
            let descriptor = format!(
                "({}){}",
                params.iter().map(FieldType::descriptor).join(""),
                rets.iter().map(ReturnType::descriptor).join(""),
            );
            assert!(MethodDescriptor::from_str(&descriptor).is_err());
        }

        #[test]
        fn parameters_words_counts_wide_types(
            params in prop::collection::vec(arb_field_type(), 0..MAX_PARAMS),
        ) {
            let expected: u16 = params
                .iter()
                .map(|it| match it {
                    FieldType::Base(PrimitiveType::Long | PrimitiveType::Double) => 2,
                    _ => 1,
                })
                .sum();
            let desc = MethodDescriptor {
                parameters_types: params,
                return_type: ReturnType::Void,
            };
            assert_eq!(desc.parameters_words(), expected);
        }
    }

    #[test]
    fn empty_desc() {
        let descriptor = "";
        let method_descriptor = MethodDescriptor::from_str(descriptor);
        assert!(method_descriptor.is_err());
    }

    #[test]
    fn incomplete_return_type() {
        let descriptor = "()Ljava/lang";
        let method_descriptor = MethodDescriptor::from_str(descriptor);
        assert!(method_descriptor.is_err());
    }

    #[test]
    fn missing_return_type() {
        let descriptor = "(I)";
        let method_descriptor = MethodDescriptor::from_str(descriptor);
        assert!(method_descriptor.is_err());
    }

    #[test]
    fn missing_semicolon() {
        let descriptor = "(I[Ljava/lang/StringJ)V";
        let method_descriptor = MethodDescriptor::from_str(descriptor);
        assert!(method_descriptor.is_err());
    }

    #[test]
    fn void_parameter_is_rejected() {
        let descriptor = "(V[Ljava/lang/String;J)V";
        let method_descriptor = MethodDescriptor::from_str(descriptor);
        assert_eq!(method_descriptor, Err(InvalidDescriptor(descriptor.to_owned())));
    }
}
