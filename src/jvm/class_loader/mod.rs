//! Discovering and loading classes.

use std::{
    collections::HashMap,
    ops::Deref,
    sync::{Arc, RwLock},
};

use super::{Class, bytecode::ParseError};

pub mod class_paths;

/// An error that can occur while loading a class.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The class could not be found.
    #[error("Class not found: {0}")]
    NotFound(String),
    /// Error occurred while parsing the class bytes.
    #[error("Error parsing class bytes: {0}")]
    Malformed(#[from] ParseError),
    /// Error occurred while reading the class bytes or locating the class file.
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    /// Other error occurred.
    #[error("Cause: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A class path that can be searched for classes.
pub trait ClassPath {
    /// Find a class by its binary name.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the class path does not contain the class, see [`Error`] for
    /// the others.
    fn find_class(&self, binary_name: &str) -> Result<Class, Error>;
}

impl<T> ClassPath for T
where
    T: Deref,
    <T as Deref>::Target: ClassPath,
{
    fn find_class(&self, binary_name: &str) -> Result<Class, Error> {
        self.deref().find_class(binary_name)
    }
}

/// A class loader that can load classes from a list of class paths.
#[derive(Debug)]
pub struct ClassLoader<P> {
    class_path: Vec<P>,
}

impl<P: ClassPath> ClassLoader<P> {
    /// Loads a class from the first class path containing it.
    ///
    /// # Errors
    /// See [`Error`].
    pub fn load_class(&self, binary_name: impl AsRef<str>) -> Result<Class, Error> {
        for class_path in &self.class_path {
            match class_path.find_class(binary_name.as_ref()) {
                Ok(class) => return Ok(class),
                Err(Error::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Err(Error::NotFound(binary_name.as_ref().to_owned()))
    }
}

impl<P> ClassLoader<P> {
    /// Create a new class loader with the given class paths.
    #[must_use]
    pub fn new(class_path: impl Into<Vec<P>>) -> Self {
        let class_path = class_path.into();
        Self { class_path }
    }

    /// Convert this class loader into a [`CachingClassLoader`].
    #[must_use]
    pub fn into_cached(self) -> CachingClassLoader<P> {
        CachingClassLoader {
            class_loader: self,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

/// A class loader that caches loaded classes.
/// Entries are never evicted, so a class is parsed at most once per loader unless two threads
/// race on the first load.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct CachingClassLoader<P> {
    class_loader: ClassLoader<P>,
    cache: RwLock<HashMap<String, Arc<Class>>>,
}

impl<P: ClassPath> CachingClassLoader<P> {
    /// Loads a class from the class loader's cache, or loads it from the class loader if it is
    /// not.
    ///
    /// # Errors
    /// See [`Error`].
    pub fn load_class(&self, binary_name: impl AsRef<str>) -> Result<Arc<Class>, Error> {
        let key = binary_name.as_ref();
        // Entries are immutable once inserted, so a poisoned lock still guards a valid map.
        let cached = self
            .cache
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned();
        if let Some(class) = cached {
            return Ok(class);
        }
        let class = Arc::new(self.class_loader.load_class(key)?);
        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let class = cache.entry(key.to_owned()).or_insert(class);
        Ok(Arc::clone(class))
    }

    /// Returns `true` if the class has been loaded through this loader.
    #[must_use]
    pub fn is_cached(&self, binary_name: &str) -> bool {
        self.cache
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(binary_name)
    }
}

#[cfg(test)]
mod tests {
    use super::{class_paths::MemoryClassPath, *};
    use crate::tests::empty_class_bytes;

    #[test]
    fn first_class_path_wins() {
        let mut first = MemoryClassPath::new();
        first.insert("org/pkg/A", empty_class_bytes("org/pkg/A", "java/lang/Object"));
        let mut second = MemoryClassPath::new();
        second.insert("org/pkg/A", empty_class_bytes("org/pkg/A", "org/pkg/Base"));
        second.insert("org/pkg/B", empty_class_bytes("org/pkg/B", "java/lang/Object"));
        let loader = ClassLoader::new(vec![first, second]);

        let a = loader.load_class("org/pkg/A").unwrap();
        assert_eq!(a.super_class.unwrap().binary_name, "java/lang/Object");
        assert!(loader.load_class("org/pkg/B").is_ok());
        assert!(matches!(
            loader.load_class("org/pkg/C"),
            Err(Error::NotFound(name)) if name == "org/pkg/C"
        ));
    }

    #[test]
    fn malformed_class_is_reported() {
        let mut class_path = MemoryClassPath::new();
        class_path.insert("org/pkg/Broken", vec![0xCA, 0xFE]);
        let loader = ClassLoader::new(vec![class_path]);
        assert!(matches!(
            loader.load_class("org/pkg/Broken"),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn caching_returns_the_same_instance() {
        let mut class_path = MemoryClassPath::new();
        class_path.insert("org/pkg/A", empty_class_bytes("org/pkg/A", "java/lang/Object"));
        let loader = ClassLoader::new(vec![class_path]).into_cached();
        assert!(!loader.is_cached("org/pkg/A"));
        let first = loader.load_class("org/pkg/A").unwrap();
        let second = loader.load_class("org/pkg/A").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(loader.is_cached("org/pkg/A"));
    }
}
