//! Forward-only cursors over the elements of a signature.
//!
//! Both streams visit the parameters in order and then the return type, each exactly once.
//! A stream cannot be rewound; create a new one to traverse again.

use super::{
    ci_type::{LoaderId, TypeId},
    resolver::{ClassResolver, LookupHandle, Resolution, ResolutionError},
    session::CompilationSession,
    signature::Signature,
};
use crate::types::symbol::{DescriptorScanner, DescriptorSymbol, ScannedElement, Token};

/// An element yielded by a [`SignatureStream`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct StreamElement {
    /// The resolved type of the element.
    pub ty: TypeId,
    /// Whether the element is the return type.
    pub at_return: bool,
}

/// A cursor over the resolved elements of a [`Signature`].
#[derive(Debug)]
pub struct SignatureStream<'a> {
    signature: &'a Signature,
    position: usize,
}

impl<'a> SignatureStream<'a> {
    pub(super) fn new(signature: &'a Signature) -> Self {
        Self {
            signature,
            position: 0,
        }
    }

    /// Checks if every element has been visited.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.position > self.signature.parameter_count()
    }

    /// Checks if the cursor is on the return type.
    #[must_use]
    pub fn at_return_type(&self) -> bool {
        self.position == self.signature.parameter_count()
    }

    /// The type of the current element.
    ///
    /// # Panics
    /// Panics if the stream is done.
    #[must_use]
    pub fn current_type(&self) -> TypeId {
        assert!(!self.is_done(), "Signature stream is exhausted");
        if self.at_return_type() {
            self.signature.return_type()
        } else {
            self.signature.parameter_type_at(self.position)
        }
    }

    /// Moves to the next element.
    ///
    /// # Panics
    /// Panics if the stream is done.
    pub fn advance(&mut self) {
        assert!(!self.is_done(), "Signature stream is exhausted");
        self.position += 1;
    }
}

impl Iterator for SignatureStream<'_> {
    type Item = StreamElement;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_done() {
            return None;
        }
        let element = StreamElement {
            ty: self.current_type(),
            at_return: self.at_return_type(),
        };
        self.advance();
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.signature.parameter_count() + 1).saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SignatureStream<'_> {}

/// A cursor over a raw descriptor that resolves each element when it is first asked for.
///
/// Elements that are skipped with [`advance`](Self::advance) are never resolved.
#[derive(Debug)]
pub struct DescriptorStream<'s, R, L: ?Sized> {
    session: &'s mut CompilationSession,
    resolver: &'s R,
    lookup: &'s L,
    accessing: TypeId,
    accessing_loader: LoaderId,
    symbol: &'s DescriptorSymbol,
    scanner: DescriptorScanner<'s>,
    current: Option<ScannedElement<'s>>,
    resolved: Option<TypeId>,
}

impl<'s, R, L> DescriptorStream<'s, R, L>
where
    R: ClassResolver,
    L: LookupHandle + ?Sized,
{
    /// Creates a stream over `symbol` resolving references on behalf of `accessing`.
    ///
    /// # Panics
    /// Panics if `accessing` is not a loaded class or array type in `session`.
    pub fn new(
        session: &'s mut CompilationSession,
        resolver: &'s R,
        accessing: TypeId,
        lookup: &'s L,
        symbol: &'s DescriptorSymbol,
    ) -> Self {
        let Some(accessing_loader) = session.defining_loader(accessing) else {
            panic!("Accessing type {accessing} is not a loaded class");
        };
        let mut scanner = symbol.scan();
        let current = scanner.next();
        Self {
            session,
            resolver,
            lookup,
            accessing,
            accessing_loader,
            symbol,
            scanner,
            current,
            resolved: None,
        }
    }

    /// The descriptor being streamed.
    #[must_use]
    pub fn symbol(&self) -> &'s DescriptorSymbol {
        self.symbol
    }

    /// The session the stream resolves into.
    #[must_use]
    pub fn session(&self) -> &CompilationSession {
        self.session
    }

    /// Checks if every element has been visited.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.current.is_none()
    }

    /// Checks if the cursor is on the return type.
    #[must_use]
    pub fn at_return_type(&self) -> bool {
        self.current.is_some_and(|it| it.at_return)
    }

    /// Resolves the current element.
    /// Primitives never reach the resolver, and unresolvable classes become placeholders.
    ///
    /// # Errors
    /// Propagates failures of the resolver.
    ///
    /// # Panics
    /// Panics if the stream is done.
    pub fn current_type(&mut self) -> Result<TypeId, ResolutionError> {
        if let Some(resolved) = self.resolved {
            return Ok(resolved);
        }
        let Some(element) = self.current else {
            panic!("Descriptor stream is exhausted");
        };
        let ty = match element.token {
            Token::Primitive(p) => self.session.primitive(p),
            Token::Void => self.session.void(),
            Token::Reference(name) => {
                match self
                    .resolver
                    .resolve(self.session, self.accessing, self.lookup, name)?
                {
                    Resolution::Loaded(ty) => ty,
                    Resolution::Unloaded(class) => {
                        tracing::trace!(%class, loader = %self.accessing_loader, "unloaded");
                        self.session.unloaded(class, self.accessing_loader)
                    }
                }
            }
        };
        self.resolved = Some(ty);
        Ok(ty)
    }

    /// Moves to the next element.
    ///
    /// # Panics
    /// Panics if the stream is done.
    pub fn advance(&mut self) {
        assert!(!self.is_done(), "Descriptor stream is exhausted");
        self.current = self.scanner.next();
        self.resolved = None;
    }
}
