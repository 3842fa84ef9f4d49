use std::io::{self, Read, Write};

use super::{
    ClassElement, FromReader, GenerationError, ParseError, ParsingContext, ToWriter,
    attribute::{Attribute, AttributeInfo, attributes_into_raw, non_empty},
    reader_utils::BytecodeReader,
};
use crate::{
    jvm::{Field, Method, class::ConstantPool, field, method, references::ClassRef},
    macros::see_jvm_spec,
    types::{Descriptor, field_type::FieldType, method_descriptor::MethodDescriptor},
};

/// The raw representation of a `field_info` or a `method_info` structure, which share the same
/// layout.
#[doc = see_jvm_spec!(4, 5)]
#[doc = see_jvm_spec!(4, 6)]
#[derive(Debug)]
pub(super) struct MemberInfo {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    attributes: Vec<AttributeInfo>,
}

impl FromReader for MemberInfo {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let access_flags = reader.decode_value()?;
        let name_index = reader.decode_value()?;
        let descriptor_index = reader.decode_value()?;
        let attributes_count: u16 = reader.decode_value()?;
        let attributes = (0..attributes_count)
            .map(|_| AttributeInfo::from_reader(reader))
            .collect::<io::Result<_>>()?;
        Ok(Self {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }
}

impl ToWriter for MemberInfo {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError> {
        writer.write_all(&self.access_flags.to_be_bytes())?;
        writer.write_all(&self.name_index.to_be_bytes())?;
        writer.write_all(&self.descriptor_index.to_be_bytes())?;
        self.attributes.to_writer(writer)?;
        Ok(())
    }
}

fn parse_attributes(
    attributes: Vec<AttributeInfo>,
    ctx: &ParsingContext,
) -> Result<Vec<Attribute>, ParseError> {
    attributes
        .into_iter()
        .map(|it| Attribute::from_raw(it, ctx))
        .collect()
}

fn duplicated(kind: &str, attribute: &Attribute) -> ParseError {
    ParseError::malform(format!("Duplicated {} attribute in {kind}", attribute.name()))
}

impl ClassElement for Field {
    type Raw = MemberInfo;

    fn from_raw(raw: Self::Raw, ctx: &ParsingContext) -> Result<Self, ParseError> {
        let MemberInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        } = raw;
        let cp = &ctx.constant_pool;
        let name = cp.get_str(name_index)?.to_owned();
        let field_type = cp
            .get_str(descriptor_index)?
            .parse::<FieldType>()
            .map_err(|err| ParseError::descriptor(format_args!("field {name}, {err}")))?;
        let mut field = Field {
            access_flags: field::AccessFlags::from_bits_truncate(access_flags),
            name,
            owner: ClassRef::new(ctx.current_class_binary_name.as_str()),
            field_type,
            constant_value: None,
            signature: None,
            runtime_visible_annotations: Vec::new(),
            runtime_invisible_annotations: Vec::new(),
        };
        for attribute in parse_attributes(attributes, ctx)? {
            match attribute {
                Attribute::ConstantValue(it) if field.constant_value.is_none() => {
                    field.constant_value = Some(it);
                }
                Attribute::Signature(it) if field.signature.is_none() => {
                    field.signature = Some(it);
                }
                Attribute::RuntimeVisibleAnnotations(it) => {
                    field.runtime_visible_annotations.extend(it);
                }
                Attribute::RuntimeInvisibleAnnotations(it) => {
                    field.runtime_invisible_annotations.extend(it);
                }
                Attribute::Unrecognized(_) => {}
                unexpected @ (Attribute::ConstantValue(_) | Attribute::Signature(_)) => {
                    return Err(duplicated("field_info", &unexpected));
                }
                unexpected => {
                    return Err(ParseError::malform(format!(
                        "Unexpected {} attribute in field_info",
                        unexpected.name()
                    )));
                }
            }
        }
        Ok(field)
    }

    fn into_raw(self, cp: &mut ConstantPool) -> Result<Self::Raw, GenerationError> {
        let name_index = cp.put_string(self.name)?;
        let descriptor_index = cp.put_string(self.field_type.descriptor())?;
        let attributes = attributes_into_raw(
            [
                self.constant_value.map(Attribute::ConstantValue),
                self.signature.map(Attribute::Signature),
                non_empty(
                    self.runtime_visible_annotations,
                    Attribute::RuntimeVisibleAnnotations,
                ),
                non_empty(
                    self.runtime_invisible_annotations,
                    Attribute::RuntimeInvisibleAnnotations,
                ),
            ],
            cp,
        )?;
        Ok(MemberInfo {
            access_flags: self.access_flags.bits(),
            name_index,
            descriptor_index,
            attributes,
        })
    }
}

impl ClassElement for Method {
    type Raw = MemberInfo;

    fn from_raw(raw: Self::Raw, ctx: &ParsingContext) -> Result<Self, ParseError> {
        let MemberInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        } = raw;
        let cp = &ctx.constant_pool;
        let name = cp.get_str(name_index)?.to_owned();
        let descriptor = cp
            .get_str(descriptor_index)?
            .parse::<MethodDescriptor>()
            .map_err(|err| ParseError::descriptor(format_args!("method {name}, {err}")))?;
        let mut method = Method {
            access_flags: method::AccessFlags::from_bits_truncate(access_flags),
            name,
            descriptor,
            owner: ClassRef::new(ctx.current_class_binary_name.as_str()),
            body: None,
            exceptions: Vec::new(),
            signature: None,
            runtime_visible_annotations: Vec::new(),
            runtime_invisible_annotations: Vec::new(),
            runtime_visible_parameter_annotations: Vec::new(),
            runtime_invisible_parameter_annotations: Vec::new(),
            annotation_default: None,
        };
        for attribute in parse_attributes(attributes, ctx)? {
            match attribute {
                Attribute::Code(it) if method.body.is_none() => method.body = Some(it),
                Attribute::Exceptions(it) => method.exceptions.extend(it),
                Attribute::Signature(it) if method.signature.is_none() => {
                    method.signature = Some(it);
                }
                Attribute::AnnotationDefault(it) if method.annotation_default.is_none() => {
                    method.annotation_default = Some(it);
                }
                Attribute::RuntimeVisibleAnnotations(it) => {
                    method.runtime_visible_annotations.extend(it);
                }
                Attribute::RuntimeInvisibleAnnotations(it) => {
                    method.runtime_invisible_annotations.extend(it);
                }
                Attribute::RuntimeVisibleParameterAnnotations(it) => {
                    method.runtime_visible_parameter_annotations = it;
                }
                Attribute::RuntimeInvisibleParameterAnnotations(it) => {
                    method.runtime_invisible_parameter_annotations = it;
                }
                Attribute::Unrecognized(_) => {}
                unexpected @ (Attribute::Code(_)
                | Attribute::Signature(_)
                | Attribute::AnnotationDefault(_)) => {
                    return Err(duplicated("method_info", &unexpected));
                }
                unexpected => {
                    return Err(ParseError::malform(format!(
                        "Unexpected {} attribute in method_info",
                        unexpected.name()
                    )));
                }
            }
        }
        let has_body = !method
            .access_flags
            .intersects(method::AccessFlags::ABSTRACT | method::AccessFlags::NATIVE);
        if has_body != method.body.is_some() {
            return Err(ParseError::malform(format!(
                "The method {} must have a Code attribute if and only if it is neither abstract nor native",
                method.name
            )));
        }
        Ok(method)
    }

    fn into_raw(self, cp: &mut ConstantPool) -> Result<Self::Raw, GenerationError> {
        let name_index = cp.put_string(self.name)?;
        let descriptor_index = cp.put_string(self.descriptor.descriptor())?;
        let attributes = attributes_into_raw(
            [
                self.body.map(Attribute::Code),
                non_empty(self.exceptions, Attribute::Exceptions),
                self.signature.map(Attribute::Signature),
                self.annotation_default.map(Attribute::AnnotationDefault),
                non_empty(
                    self.runtime_visible_annotations,
                    Attribute::RuntimeVisibleAnnotations,
                ),
                non_empty(
                    self.runtime_invisible_annotations,
                    Attribute::RuntimeInvisibleAnnotations,
                ),
                non_empty(
                    self.runtime_visible_parameter_annotations,
                    Attribute::RuntimeVisibleParameterAnnotations,
                ),
                non_empty(
                    self.runtime_invisible_parameter_annotations,
                    Attribute::RuntimeInvisibleParameterAnnotations,
                ),
            ],
            cp,
        )?;
        Ok(MemberInfo {
            access_flags: self.access_flags.bits(),
            name_index,
            descriptor_index,
            attributes,
        })
    }
}
