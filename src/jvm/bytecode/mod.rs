//! Reading and writing of the JVM class file format.
mod annotation;
mod attribute;
mod class_file;
mod code;
pub(crate) mod constant_pool;
mod errors;
mod member_info;
mod reader_utils;

use std::{
    io::{self, Read, Write},
    num::TryFromIntError,
};

pub use errors::{GenerationError, ParseError};
use num_traits::ToBytes;

use crate::jvm::class::{ConstantPool, Version};

/// Context used to parse a class file.
#[derive(Debug, Clone)]
pub(crate) struct ParsingContext {
    /// The constant pool of the class file.
    pub constant_pool: ConstantPool,
    /// The version of the class file being parsed.
    pub class_version: Version,
    /// The binary name of the class being parsed.
    pub current_class_binary_name: String,
}

trait FromReader {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self>
    where
        Self: Sized;
}

/// Writes a raw class file structure.
trait ToWriter {
    fn to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GenerationError>;
}

/// Converts between a class file element and its raw, constant pool indexed form.
trait ClassElement: Sized {
    type Raw;

    fn from_raw(raw: Self::Raw, ctx: &ParsingContext) -> Result<Self, ParseError>;

    fn into_raw(self, cp: &mut ConstantPool) -> Result<Self::Raw, GenerationError>;
}

fn write_length<Len>(writer: &mut (impl Write + ?Sized), length: usize) -> Result<(), GenerationError>
where
    usize: TryInto<Len, Error = TryFromIntError>,
    Len: ToBytes,
    <Len as ToBytes>::Bytes: IntoIterator<Item = u8>,
{
    let length = length.try_into()?;
    writer.write_all(length.to_be_bytes().as_ref())?;
    Ok(())
}
