use std::io::{self, Read, Write};

use itertools::Itertools;

use super::{
    ClassElement, FromReader, GenerationError, ParseError, ParsingContext, ToWriter,
    attribute::{Attribute, AttributeInfo, attributes_into_raw, non_empty},
    member_info::MemberInfo,
    reader_utils::BytecodeReader,
    write_length,
};
use crate::{
    jvm::{
        Class, Field, Method,
        class::{self, ConstantPool, Version},
        references::ClassRef,
    },
    macros::see_jvm_spec,
};

/// The raw representation of a class file.
#[doc = see_jvm_spec!(4, 1)]
#[derive(Debug)]
pub(super) struct ClassFile {
    minor_version: u16,
    major_version: u16,
    constant_pool: ConstantPool,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<MemberInfo>,
    methods: Vec<MemberInfo>,
    attributes: Vec<AttributeInfo>,
}

const JAVA_CLASS_MAGIC: u32 = 0xCAFE_BABE;

const JAVA_LANG_OBJECT: &str = "java/lang/Object";

impl Class {
    /// Parses a class file from the given reader.
    /// # Errors
    /// See [`ParseError`] for more information.
    pub fn from_reader<R>(reader: &mut R) -> Result<Class, ParseError>
    where
        R: Read + ?Sized,
    {
        let class_file = ClassFile::from_reader(reader)?;
        Class::from_raw(class_file)
    }

    /// Writes the class file to the given writer.
    /// # Errors
    /// See [`GenerationError`] for more information.
    #[instability::unstable(feature = "bytecode-generation")]
    pub fn to_writer<W>(self, writer: &mut W) -> Result<(), GenerationError>
    where
        W: Write + ?Sized,
    {
        let class_file = self.into_raw()?;
        class_file.to_writer(writer)
    }

    /// Serializes the class into the bytes of a class file.
    /// # Errors
    /// See [`GenerationError`] for more information.
    #[instability::unstable(feature = "bytecode-generation")]
    pub fn to_bytes(self) -> Result<Vec<u8>, GenerationError> {
        let mut bytes = Vec::new();
        self.into_raw()?.to_writer(&mut bytes)?;
        Ok(bytes)
    }
}

impl FromReader for ClassFile {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let magic: u32 = reader.decode_value()?;
        if magic != JAVA_CLASS_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "This is not a Java class file",
            ));
        }
        let minor_version = reader.decode_value()?;
        let major_version = reader.decode_value()?;
        let constant_pool_count = reader.decode_value()?;
        let constant_pool = ConstantPool::from_reader(reader, constant_pool_count)?;
        let access_flags = reader.decode_value()?;
        let this_class = reader.decode_value()?;
        let super_class = reader.decode_value()?;
        let interfaces_count: u16 = reader.decode_value()?;
        let interfaces = (0..interfaces_count)
            .map(|_| reader.decode_value())
            .collect::<io::Result<_>>()?;
        let fields_count: u16 = reader.decode_value()?;
        let fields = (0..fields_count)
            .map(|_| MemberInfo::from_reader(reader))
            .collect::<io::Result<_>>()?;
        let methods_count: u16 = reader.decode_value()?;
        let methods = (0..methods_count)
            .map(|_| MemberInfo::from_reader(reader))
            .collect::<io::Result<_>>()?;
        let attributes_count: u16 = reader.decode_value()?;
        let attributes = (0..attributes_count)
            .map(|_| AttributeInfo::from_reader(reader))
            .collect::<io::Result<_>>()?;
        Ok(Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }
}

impl ToWriter for ClassFile {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError> {
        writer.write_all(&JAVA_CLASS_MAGIC.to_be_bytes())?;
        writer.write_all(&self.minor_version.to_be_bytes())?;
        writer.write_all(&self.major_version.to_be_bytes())?;
        self.constant_pool.to_writer(writer)?;
        writer.write_all(&self.access_flags.to_be_bytes())?;
        writer.write_all(&self.this_class.to_be_bytes())?;
        writer.write_all(&self.super_class.to_be_bytes())?;
        write_length::<u16>(writer, self.interfaces.len())?;
        for interface_idx in &self.interfaces {
            writer.write_all(&interface_idx.to_be_bytes())?;
        }
        write_length::<u16>(writer, self.fields.len())?;
        for field in &self.fields {
            field.to_writer(writer)?;
        }
        write_length::<u16>(writer, self.methods.len())?;
        for method in &self.methods {
            method.to_writer(writer)?;
        }
        self.attributes.to_writer(writer)?;
        Ok(())
    }
}

impl Class {
    fn from_raw(raw: ClassFile) -> Result<Self, ParseError> {
        let ClassFile {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        } = raw;
        let version = Version::from_versions(major_version, minor_version)?;
        let binary_name = constant_pool.get_class_ref(this_class)?.binary_name;
        let super_class = match super_class {
            0 if binary_name == JAVA_LANG_OBJECT => None,
            0 => {
                return Err(ParseError::malform(format!(
                    "The class {binary_name} has no superclass"
                )));
            }
            idx => Some(constant_pool.get_class_ref(idx)?),
        };
        let interfaces = interfaces
            .into_iter()
            .map(|idx| constant_pool.get_class_ref(idx))
            .collect::<Result<_, _>>()?;
        let ctx = ParsingContext {
            constant_pool,
            class_version: version,
            current_class_binary_name: binary_name,
        };
        let fields = fields
            .into_iter()
            .map(|it| Field::from_raw(it, &ctx))
            .collect::<Result<_, _>>()?;
        let methods = methods
            .into_iter()
            .map(|it| Method::from_raw(it, &ctx))
            .collect::<Result<_, _>>()?;

        let mut class = Class {
            version,
            access_flags: class::AccessFlags::from_bits_truncate(access_flags),
            binary_name: String::new(),
            super_class,
            interfaces,
            fields,
            methods,
            source_file: None,
            inner_classes: Vec::new(),
            signature: None,
            runtime_visible_annotations: Vec::new(),
            runtime_invisible_annotations: Vec::new(),
        };
        for attribute in attributes {
            match Attribute::from_raw(attribute, &ctx)? {
                Attribute::SourceFile(it) if class.source_file.is_none() => {
                    class.source_file = Some(it);
                }
                Attribute::Signature(it) if class.signature.is_none() => {
                    class.signature = Some(it);
                }
                Attribute::InnerClasses(it) => class.inner_classes.extend(it),
                Attribute::RuntimeVisibleAnnotations(it) => {
                    class.runtime_visible_annotations.extend(it);
                }
                Attribute::RuntimeInvisibleAnnotations(it) => {
                    class.runtime_invisible_annotations.extend(it);
                }
                Attribute::Unrecognized(_) => {}
                unexpected => {
                    return Err(ParseError::malform(format!(
                        "Unexpected or duplicated {} attribute in ClassFile",
                        unexpected.name()
                    )));
                }
            }
        }
        class.binary_name = ctx.current_class_binary_name;
        Ok(class)
    }

    fn into_raw(self) -> Result<ClassFile, GenerationError> {
        let mut cp = ConstantPool::new();
        let this_class = cp.put_class_ref(ClassRef::new(self.binary_name))?;
        let super_class = self
            .super_class
            .map(|it| cp.put_class_ref(it))
            .transpose()?
            .unwrap_or(0);
        let interfaces = self
            .interfaces
            .into_iter()
            .map(|it| cp.put_class_ref(it))
            .try_collect()?;
        let fields = self
            .fields
            .into_iter()
            .map(|it| it.into_raw(&mut cp))
            .try_collect()?;
        let methods = self
            .methods
            .into_iter()
            .map(|it| it.into_raw(&mut cp))
            .try_collect()?;
        let attributes = attributes_into_raw(
            [
                self.source_file.map(Attribute::SourceFile),
                self.signature.map(Attribute::Signature),
                non_empty(self.inner_classes, Attribute::InnerClasses),
                non_empty(
                    self.runtime_visible_annotations,
                    Attribute::RuntimeVisibleAnnotations,
                ),
                non_empty(
                    self.runtime_invisible_annotations,
                    Attribute::RuntimeInvisibleAnnotations,
                ),
            ],
            &mut cp,
        )?;
        Ok(ClassFile {
            minor_version: self.version.minor(),
            major_version: self.version.major(),
            constant_pool: cp,
            access_flags: self.access_flags.bits(),
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }
}
