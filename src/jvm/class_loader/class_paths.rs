//! Implementations of [`ClassPath`].

use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
};

#[cfg(feature = "jar")]
use std::{fs::File, io::BufReader};

#[cfg(feature = "jar")]
use zip::{ZipArchive, result::ZipError};

use super::{ClassInfo, ClassPath, ClassSource, Error};
use crate::jvm::references::ClassRef;

const CLASS_FILE_EXTENSION: &str = "class";

/// A class path that searches for classes in a directory.
///
/// Only names that are valid binary names are looked up, so a lookup never leaves the directory.
#[derive(Debug)]
pub struct DirectoryClassPath {
    directory: PathBuf,
}

impl ClassPath for DirectoryClassPath {
    fn find_class(&self, binary_name: &str) -> Result<ClassInfo, Error> {
        if !is_relative_class_path(binary_name) {
            return Err(Error::NotFound);
        }
        let class_file_path = self
            .directory
            .join(binary_name)
            .with_extension(CLASS_FILE_EXTENSION);
        match std::fs::metadata(&class_file_path) {
            Ok(meta) if meta.is_file() => Ok(ClassInfo {
                class_ref: ClassRef::new(binary_name),
                source: ClassSource::File(class_file_path),
            }),
            Ok(_) => Err(Error::NotFound),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound),
            Err(e) => Err(Error::IO(e)),
        }
    }
}

fn is_relative_class_path(binary_name: &str) -> bool {
    ClassRef::is_valid_binary_name(binary_name)
        && Path::new(binary_name)
            .components()
            .all(|it| matches!(it, Component::Normal(_)))
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

    fn open(&self) -> Result<ZipArchive<BufReader<File>>, Error> {
        let jar_file = File::open(&self.jar_file)?;
        ZipArchive::new(BufReader::new(jar_file)).map_err(zip_error)
    }
}

#[cfg(feature = "jar")]
fn zip_error(e: ZipError) -> Error {
    match e {
        ZipError::FileNotFound => Error::NotFound,
        ZipError::Io(io_err) => Error::IO(io_err),
        e => Error::Other(Box::new(e)),
    }
}

#[cfg(feature = "jar")]
impl ClassPath for JarClassPath {
    fn find_class(&self, binary_name: &str) -> Result<ClassInfo, Error> {
        let mut jar_archive = self.open()?;
        let entry = format!("{binary_name}.{CLASS_FILE_EXTENSION}");
        jar_archive.by_name(&entry).map_err(zip_error)?;
        Ok(ClassInfo {
            class_ref: ClassRef::new(binary_name),
            source: ClassSource::Jar {
                archive: self.jar_file.clone(),
                entry,
            },
        })
    }
}

/// A class path backed by a set of class names held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryClassPath {
    classes: HashSet<String>,
}

impl MemoryClassPath {
    /// Creates a class path containing the given classes.
    pub fn new<I, S>(binary_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: binary_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds a class to the class path.
    pub fn insert(&mut self, binary_name: impl Into<String>) {
        self.classes.insert(binary_name.into());
    }
}

impl ClassPath for MemoryClassPath {
    fn find_class(&self, binary_name: &str) -> Result<ClassInfo, Error> {
        if self.classes.contains(binary_name) {
            Ok(ClassInfo {
                class_ref: ClassRef::new(binary_name),
                source: ClassSource::Memory,
            })
        } else {
            Err(Error::NotFound)
        }
    }
}
