use std::io::{self, Read, Write};

use super::{
    GenerationError, ParseError, ToWriter,
    reader_utils::{BytecodeReader, read_byte_chunk},
    write_length,
};
use crate::{
    jvm::{
        ConstantValue, JavaString, MethodHandle,
        class::{
            ConstantPool,
            constant_pool::{Entry, Overflow, Slot},
        },
        references::{ClassRef, FieldRef, MethodRef},
    },
    types::Descriptor,
};

impl Entry {
    pub(crate) fn parse<R>(reader: &mut R) -> io::Result<Self>
    where
        R: Read + ?Sized,
    {
        let tag: u8 = reader.decode_value()?;
        let entry = match tag {
            1 => {
                let length: u16 = reader.decode_value()?;
                let bytes = read_byte_chunk(reader, usize::from(length))?;
                let value = match cesu8::from_java_cesu8(&bytes) {
                    Ok(it) => JavaString::Utf8(it.into_owned()),
                    Err(_) => JavaString::InvalidUtf8(bytes),
                };
                Self::Utf8(value)
            }
            3 => Self::Integer(reader.decode_value()?),
            4 => Self::Float(reader.decode_value()?),
            5 => Self::Long(reader.decode_value()?),
            6 => Self::Double(reader.decode_value()?),
            7 => Self::Class {
                name_index: reader.decode_value()?,
            },
            8 => Self::String {
                string_index: reader.decode_value()?,
            },
            9 => Self::FieldRef {
                class_index: reader.decode_value()?,
                name_and_type_index: reader.decode_value()?,
            },
            10 => Self::MethodRef {
                class_index: reader.decode_value()?,
                name_and_type_index: reader.decode_value()?,
            },
            11 => Self::InterfaceMethodRef {
                class_index: reader.decode_value()?,
                name_and_type_index: reader.decode_value()?,
            },
            12 => Self::NameAndType {
                name_index: reader.decode_value()?,
                descriptor_index: reader.decode_value()?,
            },
            15 => Self::MethodHandle {
                reference_kind: reader.decode_value()?,
                reference_index: reader.decode_value()?,
            },
            16 => Self::MethodType {
                descriptor_index: reader.decode_value()?,
            },
            17 => Self::Dynamic {
                bootstrap_method_attr_index: reader.decode_value()?,
                name_and_type_index: reader.decode_value()?,
            },
            18 => Self::InvokeDynamic {
                bootstrap_method_attr_index: reader.decode_value()?,
                name_and_type_index: reader.decode_value()?,
            },
            unexpected => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Unexpected constant pool tag {unexpected}"),
                ));
            }
        };
        Ok(entry)
    }
}

impl ToWriter for Entry {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError> {
        writer.write_all(&[self.tag()])?;
        match self {
            Self::Utf8(JavaString::Utf8(value)) => {
                let bytes = cesu8::to_java_cesu8(value);
                write_length::<u16>(writer, bytes.len())?;
                writer.write_all(&bytes)?;
            }
            Self::Utf8(JavaString::InvalidUtf8(bytes)) => {
                write_length::<u16>(writer, bytes.len())?;
                writer.write_all(bytes)?;
            }
            Self::Integer(it) => writer.write_all(&it.to_be_bytes())?,
            Self::Float(it) => writer.write_all(&it.to_be_bytes())?,
            Self::Long(it) => writer.write_all(&it.to_be_bytes())?,
            Self::Double(it) => writer.write_all(&it.to_be_bytes())?,
            Self::Class { name_index: index }
            | Self::String {
                string_index: index,
            }
            | Self::MethodType {
                descriptor_index: index,
            } => writer.write_all(&index.to_be_bytes())?,
            Self::FieldRef {
                class_index: first,
                name_and_type_index: second,
            }
            | Self::MethodRef {
                class_index: first,
                name_and_type_index: second,
            }
            | Self::InterfaceMethodRef {
                class_index: first,
                name_and_type_index: second,
            }
            | Self::NameAndType {
                name_index: first,
                descriptor_index: second,
            }
            | Self::Dynamic {
                bootstrap_method_attr_index: first,
                name_and_type_index: second,
            }
            | Self::InvokeDynamic {
                bootstrap_method_attr_index: first,
                name_and_type_index: second,
            } => {
                writer.write_all(&first.to_be_bytes())?;
                writer.write_all(&second.to_be_bytes())?;
            }
            Self::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                writer.write_all(&[*reference_kind])?;
                writer.write_all(&reference_index.to_be_bytes())?;
            }
        }
        Ok(())
    }
}

impl ToWriter for ConstantPool {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError> {
        writer.write_all(&self.count().to_be_bytes())?;
        for slot in &self.inner {
            if let Slot::Entry(entry) = slot {
                entry.to_writer(writer)?;
            }
        }
        Ok(())
    }
}

fn mismatch(index: u16, expected: &str, found: &Entry) -> ParseError {
    ParseError::malform(format!(
        "Expected {expected} at constant pool index {index}, found {}",
        found.constant_kind()
    ))
}

impl ConstantPool {
    fn get_entry_internal(&self, index: u16) -> Result<&Entry, ParseError> {
        self.get_entry(index)
            .ok_or_else(|| ParseError::malform(format!("Bad constant pool index {index}")))
    }

    pub(crate) fn get_java_string(&self, index: u16) -> Result<&JavaString, ParseError> {
        match self.get_entry_internal(index)? {
            Entry::Utf8(it) => Ok(it),
            unexpected => Err(mismatch(index, "CONSTANT_Utf8", unexpected)),
        }
    }

    pub(crate) fn get_str(&self, index: u16) -> Result<&str, ParseError> {
        match self.get_java_string(index)? {
            JavaString::Utf8(it) => Ok(it),
            JavaString::InvalidUtf8(_) => Err(ParseError::malform(format!(
                "Broken UTF-8 at constant pool index {index}"
            ))),
        }
    }

    pub(crate) fn get_class_ref(&self, index: u16) -> Result<ClassRef, ParseError> {
        match self.get_entry_internal(index)? {
            &Entry::Class { name_index } => Ok(ClassRef::new(self.get_str(name_index)?)),
            unexpected => Err(mismatch(index, "CONSTANT_Class", unexpected)),
        }
    }

    pub(crate) fn get_name_and_type(&self, index: u16) -> Result<(&str, &str), ParseError> {
        match self.get_entry_internal(index)? {
            &Entry::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.get_str(name_index)?, self.get_str(descriptor_index)?)),
            unexpected => Err(mismatch(index, "CONSTANT_NameAndType", unexpected)),
        }
    }

    pub(crate) fn get_field_ref(&self, index: u16) -> Result<FieldRef, ParseError> {
        match self.get_entry_internal(index)? {
            &Entry::FieldRef {
                class_index,
                name_and_type_index,
            } => {
                let owner = self.get_class_ref(class_index)?;
                let (name, descriptor) = self.get_name_and_type(name_and_type_index)?;
                let field_type = descriptor.parse().map_err(ParseError::descriptor)?;
                Ok(FieldRef {
                    owner,
                    name: name.to_owned(),
                    field_type,
                })
            }
            unexpected => Err(mismatch(index, "CONSTANT_Fieldref", unexpected)),
        }
    }

    pub(crate) fn get_method_ref(&self, index: u16) -> Result<MethodRef, ParseError> {
        let entry = self.get_entry_internal(index)?;
        let (class_index, name_and_type_index, is_interface) = match entry {
            &Entry::MethodRef {
                class_index,
                name_and_type_index,
            } => (class_index, name_and_type_index, false),
            &Entry::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => (class_index, name_and_type_index, true),
            unexpected => {
                return Err(mismatch(
                    index,
                    "CONSTANT_Methodref | CONSTANT_InterfaceMethodref",
                    unexpected,
                ));
            }
        };
        let owner = self.get_class_ref(class_index)?;
        let (name, descriptor) = self.get_name_and_type(name_and_type_index)?;
        let descriptor = descriptor.parse().map_err(ParseError::descriptor)?;
        Ok(MethodRef {
            owner,
            name: name.to_owned(),
            descriptor,
            is_interface,
        })
    }

    pub(crate) fn get_method_handle(&self, index: u16) -> Result<MethodHandle, ParseError> {
        let &Entry::MethodHandle {
            reference_kind,
            reference_index,
        } = self.get_entry_internal(index)?
        else {
            return Err(mismatch(
                index,
                "CONSTANT_MethodHandle",
                self.get_entry_internal(index)?,
            ));
        };
        let (class_index, name_and_type_index, is_interface) =
            match self.get_entry_internal(reference_index)? {
                &Entry::FieldRef {
                    class_index,
                    name_and_type_index,
                }
                | &Entry::MethodRef {
                    class_index,
                    name_and_type_index,
                } if (1..=9).contains(&reference_kind) => {
                    (class_index, name_and_type_index, false)
                }
                &Entry::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } if (5..=9).contains(&reference_kind) => {
                    (class_index, name_and_type_index, true)
                }
                unexpected => {
                    return Err(mismatch(
                        reference_index,
                        "the target of a method handle",
                        unexpected,
                    ));
                }
            };
        let owner = self.get_class_ref(class_index)?;
        let (name, descriptor) = self.get_name_and_type(name_and_type_index)?;
        Ok(MethodHandle {
            kind: reference_kind,
            owner,
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            is_interface,
        })
    }

    pub(crate) fn get_constant_value(&self, index: u16) -> Result<ConstantValue, ParseError> {
        let value = match self.get_entry_internal(index)? {
            &Entry::Integer(it) => ConstantValue::Integer(it),
            &Entry::Long(it) => ConstantValue::Long(it),
            &Entry::Float(it) => ConstantValue::Float(it),
            &Entry::Double(it) => ConstantValue::Double(it),
            &Entry::String { string_index } => {
                ConstantValue::String(self.get_java_string(string_index)?.clone())
            }
            Entry::Class { .. } => ConstantValue::Class(self.get_class_ref(index)?),
            &Entry::MethodType { descriptor_index } => ConstantValue::MethodType(
                self.get_str(descriptor_index)?
                    .parse()
                    .map_err(ParseError::malform)?,
            ),
            Entry::MethodHandle { .. } => ConstantValue::Handle(self.get_method_handle(index)?),
            &Entry::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                let (name, descriptor) = self.get_name_and_type(name_and_type_index)?;
                ConstantValue::Dynamic {
                    bootstrap_method_attr_index,
                    name: name.to_owned(),
                    descriptor: descriptor.to_owned(),
                }
            }
            unexpected => return Err(mismatch(index, "a loadable constant", unexpected)),
        };
        Ok(value)
    }

    pub(crate) fn put_java_string(&mut self, value: JavaString) -> Result<u16, Overflow> {
        self.put_entry_dedup(Entry::Utf8(value))
    }

    pub(crate) fn put_string<S: Into<String>>(&mut self, value: S) -> Result<u16, Overflow> {
        self.put_java_string(JavaString::Utf8(value.into()))
    }

    pub(crate) fn put_class_ref(&mut self, class_ref: ClassRef) -> Result<u16, Overflow> {
        let name_index = self.put_string(class_ref.binary_name)?;
        self.put_entry_dedup(Entry::Class { name_index })
    }

    pub(crate) fn put_name_and_type(
        &mut self,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Result<u16, Overflow> {
        let name_index = self.put_string(name)?;
        let descriptor_index = self.put_string(descriptor)?;
        self.put_entry_dedup(Entry::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    pub(crate) fn put_field_ref(&mut self, field_ref: FieldRef) -> Result<u16, Overflow> {
        let class_index = self.put_class_ref(field_ref.owner)?;
        let name_and_type_index =
            self.put_name_and_type(field_ref.name, field_ref.field_type.descriptor())?;
        self.put_entry_dedup(Entry::FieldRef {
            class_index,
            name_and_type_index,
        })
    }

    pub(crate) fn put_method_ref(&mut self, method_ref: MethodRef) -> Result<u16, Overflow> {
        let class_index = self.put_class_ref(method_ref.owner)?;
        let name_and_type_index =
            self.put_name_and_type(method_ref.name, method_ref.descriptor.descriptor())?;
        let entry = if method_ref.is_interface {
            Entry::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            }
        } else {
            Entry::MethodRef {
                class_index,
                name_and_type_index,
            }
        };
        self.put_entry_dedup(entry)
    }

    pub(crate) fn put_method_handle(&mut self, handle: MethodHandle) -> Result<u16, Overflow> {
        let class_index = self.put_class_ref(handle.owner)?;
        let name_and_type_index = self.put_name_and_type(handle.name, handle.descriptor)?;
        let reference = match handle.kind {
            1..=4 => Entry::FieldRef {
                class_index,
                name_and_type_index,
            },
            _ if handle.is_interface => Entry::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            },
            _ => Entry::MethodRef {
                class_index,
                name_and_type_index,
            },
        };
        let reference_index = self.put_entry_dedup(reference)?;
        self.put_entry_dedup(Entry::MethodHandle {
            reference_kind: handle.kind,
            reference_index,
        })
    }

    /// Puts a loadable constant and returns the index of its entry.
    pub(crate) fn put_constant_value(&mut self, value: ConstantValue) -> Result<u16, GenerationError> {
        let entry = match value {
            ConstantValue::Null => {
                return Err(GenerationError::other(
                    "null cannot be stored in the constant pool",
                ));
            }
            ConstantValue::Integer(it) => Entry::Integer(it),
            ConstantValue::Float(it) => Entry::Float(it),
            ConstantValue::Long(it) => Entry::Long(it),
            ConstantValue::Double(it) => Entry::Double(it),
            ConstantValue::String(it) => Entry::String {
                string_index: self.put_java_string(it)?,
            },
            ConstantValue::Class(it) => return Ok(self.put_class_ref(it)?),
            ConstantValue::Handle(it) => return Ok(self.put_method_handle(it)?),
            ConstantValue::MethodType(it) => Entry::MethodType {
                descriptor_index: self.put_string(it.descriptor())?,
            },
            ConstantValue::Dynamic {
                bootstrap_method_attr_index,
                name,
                descriptor,
            } => Entry::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index: self.put_name_and_type(name, descriptor)?,
            },
        };
        Ok(self.put_entry_dedup(entry)?)
    }
}
