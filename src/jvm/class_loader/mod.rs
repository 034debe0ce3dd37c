//! Discovering and loading classes.

use std::{
    collections::HashMap,
    ops::Deref,
    path::PathBuf,
    sync::RwLock,
};

use super::references::ClassRef;

pub mod class_paths;

/// An error that can occur while loading a class.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The class could not be found.
    #[error("Class not found")]
    NotFound,
    /// Error occurred while reading the class bytes or locating the class file.
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    /// Other error occurred.
    #[error("Cause: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Where a class was found.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ClassSource {
    /// A `.class` file on the file system.
    File(PathBuf),
    /// An entry in a JAR archive.
    Jar {
        /// The path to the archive.
        archive: PathBuf,
        /// The name of the entry in the archive.
        entry: String,
    },
    /// A class registered in memory.
    Memory,
}

/// The metadata of a class found on a [`ClassPath`].
/// Finding a class does not parse or initialize it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ClassInfo {
    /// The class.
    pub class_ref: ClassRef,
    /// Where the class was found.
    pub source: ClassSource,
}

/// A class path that can be searched for classes.
pub trait ClassPath {
    /// Find a class by its binary name.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if the class is not on this class path.
    /// - Other variants if the class path itself cannot be read.
    fn find_class(&self, binary_name: &str) -> Result<ClassInfo, Error>;
}

impl<T> ClassPath for T
where
    T: Deref,
    <T as Deref>::Target: ClassPath,
{
    fn find_class(&self, binary_name: &str) -> Result<ClassInfo, Error> {
        self.deref().find_class(binary_name)
    }
}

/// A class loader that can load classes from a list of class paths.
#[derive(Debug)]
pub struct ClassLoader<P> {
    class_path: Vec<P>,
}

impl<P: ClassPath> ClassLoader<P> {
    /// Searches the class paths in order for the given class.
    ///
    /// # Errors
    /// See [`Error`].
    pub fn load_class(&self, binary_name: impl AsRef<str>) -> Result<ClassInfo, Error> {
        for class_path in &self.class_path {
            match class_path.find_class(binary_name.as_ref()) {
                Ok(class) => return Ok(class),
                Err(Error::NotFound) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::NotFound)
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

/// A class loader that caches found classes.
/// Misses are not cached since the class may appear on the class path later.
#[derive(Debug)]
pub struct CachingClassLoader<P> {
    class_loader: ClassLoader<P>,
    cache: RwLock<HashMap<String, ClassInfo>>,
}

impl<P: ClassPath> CachingClassLoader<P> {
    /// Loads a class from the cache, or from the underlying class loader if it is not cached.
    ///
    /// # Errors
    /// See [`Error`].
    pub fn load_class(&self, binary_name: impl AsRef<str>) -> Result<ClassInfo, Error> {
        let key = binary_name.as_ref();
        {
            let cache = self
                .cache
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(class) = cache.get(key) {
                return Ok(class.clone());
            }
        }
        tracing::debug!(binary_name = key, "class cache miss");
        let class = self.class_loader.load_class(key)?;
        // A panic while holding the lock cannot leave the map half-updated.
        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(cache.entry(key.to_owned()).or_insert(class).clone())
    }
}

impl<P> ClassPath for CachingClassLoader<P>
where
    P: ClassPath,
{
    fn find_class(&self, binary_name: &str) -> Result<ClassInfo, Error> {
        self.load_class(binary_name)
    }
}

impl<P> ClassPath for ClassLoader<P>
where
    P: ClassPath,
{
    fn find_class(&self, binary_name: &str) -> Result<ClassInfo, Error> {
        self.load_class(binary_name)
    }
}
