use std::io::{self, Read, Write};

use itertools::Itertools;

use super::{
    ClassElement, FromReader, GenerationError, ParseError, ParsingContext, ToWriter,
    annotation::{
        annotations_into_bytes, element_value_into_bytes, parameter_annotations_into_bytes,
        parse_annotations, parse_element_value, parse_parameter_annotations,
    },
    code::Code,
    reader_utils::{BytecodeReader, read_byte_chunk},
    write_length,
};
use crate::{
    jvm::{
        Annotation, ConstantValue,
        annotation::ElementValue,
        class::{ConstantPool, InnerClassInfo, NestedClassAccessFlags},
        code::MethodBody,
        references::ClassRef,
    },
    macros::see_jvm_spec,
};

/// Represent an attribute of a class file, method, field, or code.
#[doc = see_jvm_spec!(4, 7)]
#[derive(Debug)]
pub(super) struct AttributeInfo {
    name_idx: u16,
    info: Vec<u8>,
}

impl FromReader for AttributeInfo {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let name_idx = reader.decode_value()?;
        let attribute_length: u32 = reader.decode_value()?;
        let attribute_length = usize::try_from(attribute_length)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let info = read_byte_chunk(reader, attribute_length)?;
        Ok(Self { name_idx, info })
    }
}

impl ToWriter for AttributeInfo {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError> {
        writer.write_all(&self.name_idx.to_be_bytes())?;
        write_length::<u32>(writer, self.info.len())?;
        writer.write_all(&self.info)?;
        Ok(())
    }
}

impl ToWriter for Vec<AttributeInfo> {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError> {
        write_length::<u16>(writer, self.len())?;
        for attr in self {
            attr.to_writer(writer)?;
        }
        Ok(())
    }
}

/// The attributes understood by the reader and the writer.
/// Other attributes, e.g., `LineNumberTable` or `StackMapTable`, are dropped when a class is
/// read.
#[derive(Debug)]
pub(super) enum Attribute {
    ConstantValue(ConstantValue),
    Code(MethodBody),
    Exceptions(Vec<ClassRef>),
    SourceFile(String),
    InnerClasses(Vec<InnerClassInfo>),
    Signature(String),
    RuntimeVisibleAnnotations(Vec<Annotation>),
    RuntimeInvisibleAnnotations(Vec<Annotation>),
    RuntimeVisibleParameterAnnotations(Vec<Vec<Annotation>>),
    RuntimeInvisibleParameterAnnotations(Vec<Vec<Annotation>>),
    AnnotationDefault(ElementValue),
    Unrecognized(String),
}

impl Attribute {
    pub(super) const fn name(&self) -> &'static str {
        match self {
            Self::ConstantValue(_) => "ConstantValue",
            Self::Code(_) => "Code",
            Self::Exceptions(_) => "Exceptions",
            Self::SourceFile(_) => "SourceFile",
            Self::InnerClasses(_) => "InnerClasses",
            Self::Signature(_) => "Signature",
            Self::RuntimeVisibleAnnotations(_) => "RuntimeVisibleAnnotations",
            Self::RuntimeInvisibleAnnotations(_) => "RuntimeInvisibleAnnotations",
            Self::RuntimeVisibleParameterAnnotations(_) => "RuntimeVisibleParameterAnnotations",
            Self::RuntimeInvisibleParameterAnnotations(_) => {
                "RuntimeInvisibleParameterAnnotations"
            }
            Self::AnnotationDefault(_) => "AnnotationDefault",
            Self::Unrecognized(_) => "<unrecognized>",
        }
    }
}

fn ensure_consumed(reader: &[u8], name: &str) -> Result<(), ParseError> {
    if reader.is_empty() {
        Ok(())
    } else {
        Err(ParseError::malform(format!(
            "The {name} attribute has {} trailing bytes",
            reader.len()
        )))
    }
}

impl ClassElement for Attribute {
    type Raw = AttributeInfo;

    fn from_raw(raw: Self::Raw, ctx: &ParsingContext) -> Result<Self, ParseError> {
        let AttributeInfo { name_idx, info } = raw;
        let cp = &ctx.constant_pool;
        let name = cp.get_str(name_idx)?;
        let reader = &mut info.as_slice();
        let attribute = match name {
            "ConstantValue" => Self::ConstantValue(cp.get_constant_value(reader.decode_value()?)?),
            "Code" => {
                let code = Code::from_reader(reader)?;
                Self::Code(MethodBody::from_raw(code, ctx)?)
            }
            "Exceptions" => {
                let count: u16 = reader.decode_value()?;
                let exceptions = (0..count)
                    .map(|_| cp.get_class_ref(reader.decode_value()?))
                    .collect::<Result<_, _>>()?;
                Self::Exceptions(exceptions)
            }
            "SourceFile" => Self::SourceFile(cp.get_str(reader.decode_value()?)?.to_owned()),
            "InnerClasses" => {
                let count: u16 = reader.decode_value()?;
                let classes = (0..count)
                    .map(|_| parse_inner_class(reader, cp))
                    .collect::<Result<_, _>>()?;
                Self::InnerClasses(classes)
            }
            "Signature" => Self::Signature(cp.get_str(reader.decode_value()?)?.to_owned()),
            "RuntimeVisibleAnnotations" => {
                Self::RuntimeVisibleAnnotations(parse_annotations(reader, ctx)?)
            }
            "RuntimeInvisibleAnnotations" => {
                Self::RuntimeInvisibleAnnotations(parse_annotations(reader, ctx)?)
            }
            "RuntimeVisibleParameterAnnotations" => {
                Self::RuntimeVisibleParameterAnnotations(parse_parameter_annotations(reader, ctx)?)
            }
            "RuntimeInvisibleParameterAnnotations" => Self::RuntimeInvisibleParameterAnnotations(
                parse_parameter_annotations(reader, ctx)?,
            ),
            "AnnotationDefault" => Self::AnnotationDefault(parse_element_value(reader, ctx)?),
            unrecognized => return Ok(Self::Unrecognized(unrecognized.to_owned())),
        };
        ensure_consumed(*reader, name)?;
        Ok(attribute)
    }

    fn into_raw(self, cp: &mut ConstantPool) -> Result<Self::Raw, GenerationError> {
        let name_idx = cp.put_string(self.name())?;
        let info = match self {
            Self::ConstantValue(value) => cp.put_constant_value(value)?.to_be_bytes().to_vec(),
            Self::Code(body) => {
                let mut bytes = Vec::new();
                body.into_raw(cp)?.to_writer(&mut bytes)?;
                bytes
            }
            Self::Exceptions(exceptions) => {
                let mut bytes = Vec::new();
                write_length::<u16>(&mut bytes, exceptions.len())?;
                for exception in exceptions {
                    bytes.extend(cp.put_class_ref(exception)?.to_be_bytes());
                }
                bytes
            }
            Self::SourceFile(it) | Self::Signature(it) => cp.put_string(it)?.to_be_bytes().to_vec(),
            Self::InnerClasses(classes) => {
                let mut bytes = Vec::new();
                write_length::<u16>(&mut bytes, classes.len())?;
                for class in classes {
                    bytes.extend(inner_class_into_bytes(class, cp)?);
                }
                bytes
            }
            Self::RuntimeVisibleAnnotations(it) | Self::RuntimeInvisibleAnnotations(it) => {
                annotations_into_bytes(it, cp)?
            }
            Self::RuntimeVisibleParameterAnnotations(it)
            | Self::RuntimeInvisibleParameterAnnotations(it) => {
                parameter_annotations_into_bytes(it, cp)?
            }
            Self::AnnotationDefault(value) => element_value_into_bytes(value, cp)?,
            Self::Unrecognized(name) => {
                return Err(GenerationError::other(format!(
                    "Attribute {name} cannot be written"
                )));
            }
        };
        Ok(AttributeInfo { name_idx, info })
    }
}

fn parse_inner_class(reader: &mut &[u8], cp: &ConstantPool) -> Result<InnerClassInfo, ParseError> {
    let info_index: u16 = reader.decode_value()?;
    let outer_class_info_index: u16 = reader.decode_value()?;
    let inner_name_index: u16 = reader.decode_value()?;
    let access_flags: u16 = reader.decode_value()?;
    let outer_class = match outer_class_info_index {
        0 => None,
        idx => Some(cp.get_class_ref(idx)?),
    };
    let inner_name = match inner_name_index {
        0 => None,
        idx => Some(cp.get_str(idx)?.to_owned()),
    };
    Ok(InnerClassInfo {
        inner_class: cp.get_class_ref(info_index)?,
        outer_class,
        inner_name,
        access_flags: NestedClassAccessFlags::from_bits_truncate(access_flags),
    })
}

fn inner_class_into_bytes(
    class: InnerClassInfo,
    cp: &mut ConstantPool,
) -> Result<Vec<u8>, GenerationError> {
    let info_index = cp.put_class_ref(class.inner_class)?;
    let outer_class_info_index = class
        .outer_class
        .map(|it| cp.put_class_ref(it))
        .transpose()?
        .unwrap_or(0);
    let inner_name_index = class
        .inner_name
        .map(|it| cp.put_string(it))
        .transpose()?
        .unwrap_or(0);
    Ok([
        info_index,
        outer_class_info_index,
        inner_name_index,
        class.access_flags.bits(),
    ]
    .into_iter()
    .flat_map(u16::to_be_bytes)
    .collect_vec())
}

/// Converts the attributes of an element into their raw form, skipping the empty ones.
pub(super) fn attributes_into_raw<I>(
    attributes: I,
    cp: &mut ConstantPool,
) -> Result<Vec<AttributeInfo>, GenerationError>
where
    I: IntoIterator<Item = Option<Attribute>>,
{
    attributes
        .into_iter()
        .flatten()
        .map(|it| it.into_raw(cp))
        .try_collect()
}

/// Wraps `items` into an attribute unless there are none.
pub(super) fn non_empty<T>(items: Vec<T>, wrap: fn(Vec<T>) -> Attribute) -> Option<Attribute> {
    (!items.is_empty()).then(|| wrap(items))
}
