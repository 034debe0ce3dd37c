//! Resolving class names to types on behalf of an accessing class.

use std::collections::HashMap;

use super::{
    ci_type::{LoaderId, TypeId},
    session::CompilationSession,
};
use crate::{
    jvm::{
        class_loader::{self, ClassPath},
        references::ClassRef,
    },
    types::field_type::PrimitiveType,
};

/// The outcome of resolving a class name.
#[derive(Debug, PartialEq, Eq, Clone)]
#[must_use]
pub enum Resolution {
    /// The name resolved to a loaded type.
    Loaded(TypeId),
    /// The class is not loaded from the point of view of the accessing class.
    Unloaded(ClassRef),
}

/// An error that prevents a resolver from answering at all.
/// A class that cannot be found is not an error; see [`Resolution::Unloaded`].
#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
    /// A class path could not be searched.
    #[error("Failed to look up {class} through {loader}: {source}")]
    ClassPath {
        /// The class being looked up.
        class: ClassRef,
        /// The loader whose class path failed.
        loader: LoaderId,
        /// The underlying error.
        #[source]
        source: class_loader::Error,
    },
    /// The accessing class was defined by a loader the resolver does not know.
    #[error("Unknown class loader {0}")]
    UnknownLoader(LoaderId),
}

/// A table of class references already resolved for an accessing class, such as the resolved
/// class entries of its constant pool.
pub trait LookupHandle {
    /// Returns the type previously resolved for `binary_name`, if any.
    fn lookup(&self, binary_name: &str) -> Option<TypeId>;
}

/// No resolved references.
impl LookupHandle for () {
    fn lookup(&self, _binary_name: &str) -> Option<TypeId> {
        None
    }
}

/// Class references resolved so far, keyed by binary name.
#[derive(Debug, Default, Clone)]
pub struct ResolvedReferences {
    entries: HashMap<String, TypeId>,
}

impl ResolvedReferences {
    /// Records that `binary_name` resolved to `ty`.
    pub fn insert(&mut self, binary_name: impl Into<String>, ty: TypeId) {
        self.entries.insert(binary_name.into(), ty);
    }
}

impl LookupHandle for ResolvedReferences {
    fn lookup(&self, binary_name: &str) -> Option<TypeId> {
        self.entries.get(binary_name).copied()
    }
}

/// Maps class names to types from the point of view of an accessing class.
pub trait ClassResolver {
    /// Resolves `binary_name` (a class name or an array descriptor) as seen by `accessing`.
    ///
    /// # Errors
    /// Only if the resolution infrastructure itself fails. Classes that cannot be found resolve
    /// to [`Resolution::Unloaded`].
    ///
    /// # Panics
    /// Implementations may panic if `binary_name` is not a name scanned from a
    /// [`DescriptorSymbol`](crate::types::symbol::DescriptorSymbol).
    fn resolve<L>(
        &self,
        session: &mut CompilationSession,
        accessing: TypeId,
        lookup: &L,
        binary_name: &str,
    ) -> Result<Resolution, ResolutionError>
    where
        L: LookupHandle + ?Sized;
}

impl<T> ClassResolver for &T
where
    T: ClassResolver + ?Sized,
{
    fn resolve<L>(
        &self,
        session: &mut CompilationSession,
        accessing: TypeId,
        lookup: &L,
        binary_name: &str,
    ) -> Result<Resolution, ResolutionError>
    where
        L: LookupHandle + ?Sized,
    {
        (**self).resolve(session, accessing, lookup, binary_name)
    }
}

#[derive(Debug)]
struct LoaderEntry<P> {
    class_path: P,
    parent: Option<LoaderId>,
}

/// Resolves classes through a hierarchy of class loaders.
///
/// Each loader searches its parent first, so a class found by a shared ancestor resolves to the
/// same [`TypeId`] for every accessing class below that ancestor.
#[derive(Debug)]
pub struct LoaderResolver<P> {
    loaders: Vec<LoaderEntry<P>>,
}

impl<P> LoaderResolver<P> {
    /// Creates a resolver whose bootstrap loader searches `bootstrap_class_path`.
    pub fn new(bootstrap_class_path: P) -> Self {
        Self {
            loaders: vec![LoaderEntry {
                class_path: bootstrap_class_path,
                parent: None,
            }],
        }
    }

    /// Registers a loader delegating to `parent`.
    ///
    /// # Panics
    /// Panics if `parent` is not registered.
    pub fn add_loader(&mut self, class_path: P, parent: LoaderId) -> LoaderId {
        assert!(
            (parent.0 as usize) < self.loaders.len(),
            "Parent loader {parent} is not registered"
        );
        let id = LoaderId(
            u32::try_from(self.loaders.len()).unwrap_or_else(|_| panic!("Too many loaders")),
        );
        self.loaders.push(LoaderEntry {
            class_path,
            parent: Some(parent),
        });
        id
    }

    fn entry(&self, loader: LoaderId) -> Result<&LoaderEntry<P>, ResolutionError> {
        self.loaders
            .get(loader.0 as usize)
            .ok_or(ResolutionError::UnknownLoader(loader))
    }

    /// The loader followed by its ancestors, nearest first.
    fn delegation_chain(&self, loader: LoaderId) -> Result<Vec<LoaderId>, ResolutionError> {
        let mut chain = vec![loader];
        let mut current = self.entry(loader)?;
        while let Some(parent) = current.parent {
            chain.push(parent);
            current = self.entry(parent)?;
        }
        Ok(chain)
    }
}

impl<P: ClassPath> LoaderResolver<P> {
    /// Loads a class through `initiating`, parent first.
    /// Returns `None` if no loader in the chain can find it.
    fn load(
        &self,
        session: &mut CompilationSession,
        initiating: LoaderId,
        binary_name: &str,
    ) -> Result<Option<TypeId>, ResolutionError> {
        for loader in self.delegation_chain(initiating)?.into_iter().rev() {
            match self.entry(loader)?.class_path.find_class(binary_name) {
                Ok(class) => {
                    tracing::trace!(%loader, binary_name, "class found");
                    return Ok(Some(session.instance(class.class_ref, loader)));
                }
                Err(class_loader::Error::NotFound) => continue,
                Err(source) => {
                    return Err(ResolutionError::ClassPath {
                        class: ClassRef::new(binary_name),
                        loader,
                        source,
                    });
                }
            }
        }
        Ok(None)
    }
}

impl<P: ClassPath> ClassResolver for LoaderResolver<P> {
    fn resolve<L>(
        &self,
        session: &mut CompilationSession,
        accessing: TypeId,
        lookup: &L,
        binary_name: &str,
    ) -> Result<Resolution, ResolutionError>
    where
        L: LookupHandle + ?Sized,
    {
        if let Some(resolved) = lookup.lookup(binary_name) {
            return Ok(Resolution::Loaded(resolved));
        }
        let Some(initiating) = session.defining_loader(accessing) else {
            panic!("Accessing type {accessing} is not a loaded class");
        };
        let dimensions = binary_name.bytes().take_while(|b| *b == b'[').count();
        let element_name = &binary_name[dimensions..];
        let element = if dimensions == 0 {
            self.load(session, initiating, element_name)?
        } else {
            let mut chars = element_name.chars();
            match (chars.next(), chars.as_str().strip_suffix(';')) {
                (Some('L'), Some(class_name)) => self.load(session, initiating, class_name)?,
                (Some(tag), None) if chars.as_str().is_empty() => PrimitiveType::try_from(tag)
                    .ok()
                    .map(|p| session.primitive(p)),
                _ => panic!("Malformed array class name: {binary_name}"),
            }
        };
        Ok(match element {
            Some(element) => Resolution::Loaded(session.array_of(element, dimensions)),
            None => Resolution::Unloaded(ClassRef::new(binary_name)),
        })
    }
}
