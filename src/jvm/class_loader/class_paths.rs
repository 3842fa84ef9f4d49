//! Implementations of [`ClassPath`].

use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::PathBuf,
};

#[cfg(feature = "jar")]
use zip::{ZipArchive, result::ZipError};

use super::{ClassPath, Error};
use crate::jvm::Class;

/// A class path that searches for classes in a directory.
#[derive(Debug)]
pub struct DirectoryClassPath {
    directory: PathBuf,
}

impl ClassPath for DirectoryClassPath {
    fn find_class(&self, binary_name: &str) -> Result<Class, Error> {
        let class_file_path = self.directory.join(format!("{binary_name}.class"));
        if class_file_path.is_file() {
            let class_file = File::open(class_file_path)?;
            let mut buf_read = BufReader::new(class_file);
            let class = Class::from_reader(&mut buf_read)?;
            Ok(class)
        } else {
            Err(Error::NotFound(binary_name.to_owned()))
        }
    }
}

impl DirectoryClassPath {
    /// Create a new directory class path.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

/// A class path that searches for classes in a JAR file.
#[derive(Debug)]
#[cfg(feature = "jar")]
pub struct JarClassPath {
    jar_file: PathBuf,
}

#[cfg(feature = "jar")]
impl JarClassPath {
    /// Create a new JAR class path.
    pub fn new(jar_file: impl Into<PathBuf>) -> Self {
        Self {
            jar_file: jar_file.into(),
        }
    }
}

#[cfg(feature = "jar")]
impl ClassPath for JarClassPath {
    fn find_class(&self, binary_name: &str) -> Result<Class, Error> {
        let jar_file = File::open(&self.jar_file)?;
        let jar_reader = BufReader::new(jar_file);
        let mut jar_archive = ZipArchive::new(jar_reader).map_err(|e| match e {
            ZipError::Io(io_err) => Error::IO(io_err),
            e => Error::Other(Box::new(e)),
        })?;
        let mut class_file = jar_archive
            .by_name(&format!("{binary_name}.class"))
            .map_err(|e| match e {
                ZipError::FileNotFound => Error::NotFound(binary_name.to_owned()),
                ZipError::Io(io_err) => Error::IO(io_err),
                e => Error::Other(Box::new(e)),
            })?;
        Class::from_reader(&mut class_file).map_err(Into::into)
    }
}

/// A class path backed by class file bytes held in memory, keyed by binary name.
/// Useful for classes produced at runtime, e.g., by another proxy.
#[derive(Debug, Default, Clone)]
pub struct MemoryClassPath {
    classes: HashMap<String, Vec<u8>>,
}

impl MemoryClassPath {
    /// Creates an empty class path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the bytes of a class file. Replaces the bytes previously stored under the same name.
    pub fn insert(&mut self, binary_name: impl Into<String>, bytes: Vec<u8>) {
        self.classes.insert(binary_name.into(), bytes);
    }

    /// Returns `true` if the class path has a class with the given name.
    #[must_use]
    pub fn contains(&self, binary_name: &str) -> bool {
        self.classes.contains_key(binary_name)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<u8>)> for MemoryClassPath {
    fn from_iter<T: IntoIterator<Item = (S, Vec<u8>)>>(iter: T) -> Self {
        Self {
            classes: iter
                .into_iter()
                .map(|(name, bytes)| (name.into(), bytes))
                .collect(),
        }
    }
}

impl ClassPath for MemoryClassPath {
    fn find_class(&self, binary_name: &str) -> Result<Class, Error> {
        let bytes = self
            .classes
            .get(binary_name)
            .ok_or_else(|| Error::NotFound(binary_name.to_owned()))?;
        Class::from_reader(&mut bytes.as_slice()).map_err(Into::into)
    }
}
