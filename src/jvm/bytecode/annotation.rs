use std::io::{self, Read, Write};

use itertools::Itertools;

use super::{
    ClassElement, FromReader, GenerationError, ParseError, ParsingContext, ToWriter,
    reader_utils::BytecodeReader, write_length,
};
use crate::{
    jvm::{
        Annotation, ConstantValue,
        annotation::ElementValue,
        class::{ConstantPool, constant_pool::Entry},
    },
    macros::see_jvm_spec,
    types::{Descriptor, field_type::PrimitiveType},
};

/// The raw representation of an `annotation` structure.
#[doc = see_jvm_spec!(4, 7, 16)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RawAnnotation {
    type_index: u16,
    element_value_pairs: Vec<(u16, RawElementValue)>,
}

/// The raw representation of an `element_value` structure.
#[doc = see_jvm_spec!(4, 7, 16, 1)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum RawElementValue {
    Const { tag: u8, index: u16 },
    Enum { type_name_index: u16, const_name_index: u16 },
    Class { index: u16 },
    Annotation(RawAnnotation),
    Array(Vec<RawElementValue>),
}

impl FromReader for RawAnnotation {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let type_index = reader.decode_value()?;
        let num_element_value_pairs: u16 = reader.decode_value()?;
        let element_value_pairs = (0..num_element_value_pairs)
            .map(|_| {
                let name_index = reader.decode_value()?;
                let value = RawElementValue::from_reader(reader)?;
                Ok((name_index, value))
            })
            .collect::<io::Result<_>>()?;
        Ok(Self {
            type_index,
            element_value_pairs,
        })
    }
}

impl ToWriter for RawAnnotation {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError> {
        writer.write_all(&self.type_index.to_be_bytes())?;
        write_length::<u16>(writer, self.element_value_pairs.len())?;
        for (name_index, value) in &self.element_value_pairs {
            writer.write_all(&name_index.to_be_bytes())?;
            value.to_writer(writer)?;
        }
        Ok(())
    }
}

impl FromReader for RawElementValue {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let tag: u8 = reader.decode_value()?;
        let value = match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => Self::Const {
                tag,
                index: reader.decode_value()?,
            },
            b'e' => Self::Enum {
                type_name_index: reader.decode_value()?,
                const_name_index: reader.decode_value()?,
            },
            b'c' => Self::Class {
                index: reader.decode_value()?,
            },
            b'@' => Self::Annotation(RawAnnotation::from_reader(reader)?),
            b'[' => {
                let num_values: u16 = reader.decode_value()?;
                let values = (0..num_values)
                    .map(|_| Self::from_reader(reader))
                    .collect::<io::Result<_>>()?;
                Self::Array(values)
            }
            unexpected => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid element value tag {unexpected}"),
                ));
            }
        };
        Ok(value)
    }
}

impl ToWriter for RawElementValue {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError> {
        match self {
            Self::Const { tag, index } => {
                writer.write_all(&[*tag])?;
                writer.write_all(&index.to_be_bytes())?;
            }
            Self::Enum {
                type_name_index,
                const_name_index,
            } => {
                writer.write_all(b"e")?;
                writer.write_all(&type_name_index.to_be_bytes())?;
                writer.write_all(&const_name_index.to_be_bytes())?;
            }
            Self::Class { index } => {
                writer.write_all(b"c")?;
                writer.write_all(&index.to_be_bytes())?;
            }
            Self::Annotation(annotation) => {
                writer.write_all(b"@")?;
                annotation.to_writer(writer)?;
            }
            Self::Array(values) => {
                writer.write_all(b"[")?;
                write_length::<u16>(writer, values.len())?;
                for value in values {
                    value.to_writer(writer)?;
                }
            }
        }
        Ok(())
    }
}

impl ClassElement for Annotation {
    type Raw = RawAnnotation;

    fn from_raw(raw: Self::Raw, ctx: &ParsingContext) -> Result<Self, ParseError> {
        let RawAnnotation {
            type_index,
            element_value_pairs,
        } = raw;
        let annotation_type = ctx
            .constant_pool
            .get_str(type_index)?
            .parse()
            .map_err(ParseError::malform)?;
        let element_value_pairs = element_value_pairs
            .into_iter()
            .map(|(name_index, raw_value)| {
                let element_name = ctx.constant_pool.get_str(name_index)?;
                let element_value = ElementValue::from_raw(raw_value, ctx)?;
                Ok((element_name.to_owned(), element_value))
            })
            .collect::<Result<_, ParseError>>()?;
        Ok(Annotation {
            annotation_type,
            element_value_pairs,
        })
    }

    fn into_raw(self, cp: &mut ConstantPool) -> Result<Self::Raw, GenerationError> {
        let type_index = cp.put_string(self.annotation_type.descriptor())?;
        let element_value_pairs = self
            .element_value_pairs
            .into_iter()
            .map(|(name, value)| -> Result<_, GenerationError> {
                let name_index = cp.put_string(name)?;
                let raw_value = value.into_raw(cp)?;
                Ok((name_index, raw_value))
            })
            .try_collect()?;
        Ok(RawAnnotation {
            type_index,
            element_value_pairs,
        })
    }
}

impl ClassElement for ElementValue {
    type Raw = RawElementValue;

    fn from_raw(raw: Self::Raw, ctx: &ParsingContext) -> Result<Self, ParseError> {
        let cp = &ctx.constant_pool;
        match raw {
            RawElementValue::Const { tag: b's', index } => {
                Ok(Self::String(cp.get_java_string(index)?.clone()))
            }
            RawElementValue::Const { tag, index } => {
                let primitive_type =
                    PrimitiveType::try_from(char::from(tag)).map_err(ParseError::malform)?;
                let value = cp.get_constant_value(index)?;
                let matches_type = matches!(
                    (primitive_type, &value),
                    (
                        PrimitiveType::Boolean
                            | PrimitiveType::Byte
                            | PrimitiveType::Char
                            | PrimitiveType::Short
                            | PrimitiveType::Int,
                        ConstantValue::Integer(_),
                    ) | (PrimitiveType::Long, ConstantValue::Long(_))
                        | (PrimitiveType::Float, ConstantValue::Float(_))
                        | (PrimitiveType::Double, ConstantValue::Double(_))
                );
                if matches_type {
                    Ok(Self::Primitive(primitive_type, value))
                } else {
                    Err(ParseError::malform(format!(
                        "Element value of type {primitive_type} holds {value}"
                    )))
                }
            }
            RawElementValue::Enum {
                type_name_index,
                const_name_index,
            } => Ok(Self::EnumConstant {
                enum_type_name: cp.get_str(type_name_index)?.to_owned(),
                const_name: cp.get_str(const_name_index)?.to_owned(),
            }),
            RawElementValue::Class { index } => Ok(Self::Class {
                return_descriptor: cp.get_str(index)?.parse().map_err(ParseError::malform)?,
            }),
            RawElementValue::Annotation(annotation) => Ok(Self::AnnotationInterface(
                Annotation::from_raw(annotation, ctx)?,
            )),
            RawElementValue::Array(values) => values
                .into_iter()
                .map(|it| Self::from_raw(it, ctx))
                .collect::<Result<_, _>>()
                .map(Self::Array),
        }
    }

    fn into_raw(self, cp: &mut ConstantPool) -> Result<Self::Raw, GenerationError> {
        let raw = match self {
            Self::Primitive(primitive_type, value) => {
                #[allow(clippy::cast_possible_truncation)]
                let tag = primitive_type.descriptor_char() as u8;
                let entry = match value {
                    ConstantValue::Integer(it) => Entry::Integer(it),
                    ConstantValue::Long(it) => Entry::Long(it),
                    ConstantValue::Float(it) => Entry::Float(it),
                    ConstantValue::Double(it) => Entry::Double(it),
                    other => {
                        return Err(GenerationError::other(format!(
                            "{other} is not a valid value for an element of type {primitive_type}"
                        )));
                    }
                };
                RawElementValue::Const {
                    tag,
                    index: cp.put_entry_dedup(entry)?,
                }
            }
            Self::String(value) => RawElementValue::Const {
                tag: b's',
                index: cp.put_java_string(value)?,
            },
            Self::EnumConstant {
                enum_type_name,
                const_name,
            } => RawElementValue::Enum {
                type_name_index: cp.put_string(enum_type_name)?,
                const_name_index: cp.put_string(const_name)?,
            },
            Self::Class { return_descriptor } => RawElementValue::Class {
                index: cp.put_string(return_descriptor.descriptor())?,
            },
            Self::AnnotationInterface(annotation) => {
                RawElementValue::Annotation(annotation.into_raw(cp)?)
            }
            Self::Array(values) => RawElementValue::Array(
                values
                    .into_iter()
                    .map(|it| it.into_raw(cp))
                    .try_collect()?,
            ),
        };
        Ok(raw)
    }
}

/// Parses the content of a `Runtime(In)VisibleAnnotations` attribute.
pub(super) fn parse_annotations(
    reader: &mut &[u8],
    ctx: &ParsingContext,
) -> Result<Vec<Annotation>, ParseError> {
    let num_annotations: u16 = reader.decode_value()?;
    (0..num_annotations)
        .map(|_| {
            let raw = RawAnnotation::from_reader(reader)?;
            Annotation::from_raw(raw, ctx)
        })
        .collect()
}

/// Serializes annotations as the content of a `Runtime(In)VisibleAnnotations` attribute.
pub(super) fn annotations_into_bytes(
    annotations: Vec<Annotation>,
    cp: &mut ConstantPool,
) -> Result<Vec<u8>, GenerationError> {
    let mut bytes = Vec::new();
    write_length::<u16>(&mut bytes, annotations.len())?;
    for annotation in annotations {
        annotation.into_raw(cp)?.to_writer(&mut bytes)?;
    }
    Ok(bytes)
}

/// Parses the content of a `Runtime(In)VisibleParameterAnnotations` attribute.
pub(super) fn parse_parameter_annotations(
    reader: &mut &[u8],
    ctx: &ParsingContext,
) -> Result<Vec<Vec<Annotation>>, ParseError> {
    let num_parameters: u8 = reader.decode_value()?;
    (0..num_parameters)
        .map(|_| parse_annotations(reader, ctx))
        .collect()
}

/// Serializes parameter annotations as the content of a
/// `Runtime(In)VisibleParameterAnnotations` attribute.
pub(super) fn parameter_annotations_into_bytes(
    parameter_annotations: Vec<Vec<Annotation>>,
    cp: &mut ConstantPool,
) -> Result<Vec<u8>, GenerationError> {
    let mut bytes = Vec::new();
    write_length::<u8>(&mut bytes, parameter_annotations.len())?;
    for annotations in parameter_annotations {
        bytes.extend(annotations_into_bytes(annotations, cp)?);
    }
    Ok(bytes)
}

pub(super) fn parse_element_value(
    reader: &mut &[u8],
    ctx: &ParsingContext,
) -> Result<ElementValue, ParseError> {
    let raw = RawElementValue::from_reader(reader)?;
    ElementValue::from_raw(raw, ctx)
}

pub(super) fn element_value_into_bytes(
    value: ElementValue,
    cp: &mut ConstantPool,
) -> Result<Vec<u8>, GenerationError> {
    let mut bytes = Vec::new();
    value.into_raw(cp)?.to_writer(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jvm::class::Version,
        types::{field_type::FieldType, method_descriptor::ReturnType},
    };

    fn context(constant_pool: ConstantPool) -> ParsingContext {
        ParsingContext {
            constant_pool,
            class_version: Version::JDK8,
            current_class_binary_name: "org/pkg/Test".to_owned(),
        }
    }

    #[test]
    fn annotations_survive_the_constant_pool() {
        let annotation = Annotation {
            annotation_type: FieldType::object("org/pkg/Transactional"),
            element_value_pairs: vec![
                ("value".to_owned(), ElementValue::String("tx".into())),
                (
                    "timeout".to_owned(),
                    ElementValue::Primitive(PrimitiveType::Long, ConstantValue::Long(30)),
                ),
                (
                    "policy".to_owned(),
                    ElementValue::EnumConstant {
                        enum_type_name: "Lorg/pkg/Policy;".to_owned(),
                        const_name: "REQUIRED".to_owned(),
                    },
                ),
                (
                    "types".to_owned(),
                    ElementValue::Array(vec![
                        ElementValue::Class {
                            return_descriptor: ReturnType::Void,
                        },
                        ElementValue::Class {
                            return_descriptor: ReturnType::Some(FieldType::object(
                                "java/lang/String",
                            )),
                        },
                    ]),
                ),
            ],
        };
        let mut cp = ConstantPool::new();
        let bytes = annotations_into_bytes(vec![annotation.clone()], &mut cp).unwrap();
        let ctx = context(cp);
        let parsed = parse_annotations(&mut bytes.as_slice(), &ctx).unwrap();
        assert_eq!(parsed, vec![annotation]);
    }

    #[test]
    fn mismatched_primitive_is_rejected() {
        let mut cp = ConstantPool::new();
        let index = cp.put_entry(Entry::Long(1)).unwrap();
        let ctx = context(cp);
        let raw = RawElementValue::Const { tag: b'I', index };
        assert!(ElementValue::from_raw(raw, &ctx).is_err());
    }

    #[test]
    fn invalid_tag() {
        let bytes = [b'x', 0, 1];
        assert!(RawElementValue::from_reader(&mut bytes.as_slice()).is_err());
    }
}
