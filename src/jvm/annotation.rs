//! Module for the APIs for the annotation in JVM.
use crate::{
    macros::see_jvm_spec,
    types::{field_type::PrimitiveType, method_descriptor::ReturnType},
};

use super::{Annotation, ConstantValue, JavaString};

/// A value of an annotation field.
#[doc = see_jvm_spec!(4, 7, 16, 1)]
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    /// A constant value in primitive type.
    Primitive(PrimitiveType, ConstantValue),
    /// A constant value in String type.
    String(JavaString),
    /// An enum constant.
    EnumConstant {
        /// The descriptor of the enum type, e.g., `Ljava/lang/annotation/RetentionPolicy;`.
        enum_type_name: String,
        /// The name of the enum constant.
        const_name: String,
    },
    /// A class literal.
    Class {
        /// The descriptor of the class literal.
        return_descriptor: ReturnType,
    },
    /// Another annotation.
    AnnotationInterface(Annotation),
    /// An array of values.
    Array(Vec<ElementValue>),
}

impl Annotation {
    /// The name of the element used when the element name is omitted in source code.
    pub const DEFAULT_ELEMENT_NAME: &'static str = "value";

    /// Gets the value of the element with the given name.
    #[must_use]
    pub fn get_element_value(&self, name: &str) -> Option<&ElementValue> {
        self.element_value_pairs
            .iter()
            .find(|(pair_name, _)| pair_name == name)
            .map(|(_, value)| value)
    }

    /// Gets the value of the `value` element.
    #[must_use]
    pub fn get_value(&self) -> Option<&ElementValue> {
        self.get_element_value(Self::DEFAULT_ELEMENT_NAME)
    }

    /// Checks if the annotation has the given type, named by its binary name
    /// (`org/pkg/Transactional`) or its Java name (`org.pkg.Transactional`).
    #[must_use]
    pub fn is_of_type(&self, type_name: &str) -> bool {
        match self.annotation_type.class_ref() {
            Some(class_ref) => {
                class_ref.binary_name == type_name || class_ref.java_name() == type_name
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::field_type::FieldType;

    fn annotation() -> Annotation {
        Annotation {
            annotation_type: FieldType::object("org/pkg/Transactional"),
            element_value_pairs: vec![
                ("value".to_owned(), ElementValue::String("tx".into())),
                (
                    "timeout".to_owned(),
                    ElementValue::Primitive(PrimitiveType::Int, ConstantValue::Integer(30)),
                ),
            ],
        }
    }

    #[test]
    fn lookup_elements() {
        let annotation = annotation();
        assert_eq!(
            annotation.get_value(),
            Some(&ElementValue::String("tx".into()))
        );
        assert_eq!(
            annotation.get_element_value("timeout"),
            Some(&ElementValue::Primitive(
                PrimitiveType::Int,
                ConstantValue::Integer(30)
            ))
        );
        assert!(annotation.get_element_value("missing").is_none());
    }

    #[test]
    fn type_names() {
        let annotation = annotation();
        assert!(annotation.is_of_type("org/pkg/Transactional"));
        assert!(annotation.is_of_type("org.pkg.Transactional"));
        assert!(!annotation.is_of_type("org.pkg.Other"));
    }
}
