//! Resolved method signatures.

use std::{
    fmt::Display,
    hash::{Hash, Hasher},
};

use super::{
    ci_type::TypeId,
    resolver::{ClassResolver, LookupHandle, ResolutionError},
    session::CompilationSession,
    stream::{DescriptorStream, SignatureStream},
};
use crate::types::symbol::DescriptorSymbol;

/// The signature of a method with every element resolved against an accessing class.
///
/// A [`Signature`] is immutable once built. Two signatures are equal if their descriptors are
/// equal and their elements resolved to the same types, regardless of the accessing class.
#[derive(Debug, Clone)]
pub struct Signature {
    symbol: DescriptorSymbol,
    accessing: TypeId,
    parameter_types: Box<[TypeId]>,
    return_type: TypeId,
    argument_slots: u32,
}

#[derive(Debug)]
struct SignatureBuilder {
    parameter_types: Vec<TypeId>,
    return_type: Option<TypeId>,
    argument_slots: u32,
}

impl SignatureBuilder {
    fn new() -> Self {
        Self {
            parameter_types: Vec::with_capacity(8),
            return_type: None,
            argument_slots: 0,
        }
    }

    fn push_parameter(&mut self, ty: TypeId, size: u32) {
        self.parameter_types.push(ty);
        self.argument_slots += size;
    }

    fn set_return_type(&mut self, ty: TypeId) {
        let previous = self.return_type.replace(ty);
        debug_assert!(previous.is_none(), "A descriptor has exactly one return type");
    }

    fn freeze(self, symbol: DescriptorSymbol, accessing: TypeId) -> Signature {
        let Some(return_type) = self.return_type else {
            panic!("Descriptor {symbol} has no return type");
        };
        Signature {
            symbol,
            accessing,
            parameter_types: self.parameter_types.into_boxed_slice(),
            return_type,
            argument_slots: self.argument_slots,
        }
    }
}

impl Signature {
    /// Resolves every element of `symbol` as seen by `accessing`.
    ///
    /// Primitive elements map to the session's primitive singletons. Reference elements go
    /// through `resolver`; those it cannot find become unloaded placeholders.
    ///
    /// # Errors
    /// Propagates the first failure of `resolver`. No signature is built in that case.
    ///
    /// # Panics
    /// Panics if `accessing` is not a loaded class or array type in `session`.
    #[tracing::instrument(level = "debug", skip_all, fields(descriptor = %symbol, %accessing))]
    pub fn new<R, L>(
        session: &mut CompilationSession,
        resolver: &R,
        accessing: TypeId,
        lookup: &L,
        symbol: DescriptorSymbol,
    ) -> Result<Self, ResolutionError>
    where
        R: ClassResolver,
        L: LookupHandle + ?Sized,
    {
        let mut builder = SignatureBuilder::new();
        let mut stream = DescriptorStream::new(session, resolver, accessing, lookup, &symbol);
        while !stream.is_done() {
            let ty = stream.current_type()?;
            if stream.at_return_type() {
                builder.set_return_type(ty);
            } else {
                let size = stream.session().get(ty).size();
                builder.push_parameter(ty, size);
            }
            stream.advance();
        }
        Ok(builder.freeze(symbol, accessing))
    }

    /// The descriptor the signature was built from.
    #[must_use]
    pub fn symbol(&self) -> &DescriptorSymbol {
        &self.symbol
    }

    /// The class on whose behalf the elements were resolved.
    #[must_use]
    pub fn accessing(&self) -> TypeId {
        self.accessing
    }

    /// The parameter types in declaration order.
    #[must_use]
    pub fn parameter_types(&self) -> &[TypeId] {
        &self.parameter_types
    }

    /// The number of parameters.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.parameter_types.len()
    }

    /// The type of the parameter at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn parameter_type_at(&self, index: usize) -> TypeId {
        self.parameter_types[index]
    }

    /// The return type.
    #[must_use]
    pub fn return_type(&self) -> TypeId {
        self.return_type
    }

    /// The number of argument slots taken by the parameters: two for `long` and `double`, one
    /// for everything else.
    #[must_use]
    pub fn argument_slots(&self) -> u32 {
        self.argument_slots
    }

    /// A cursor over the parameters and then the return type.
    #[must_use]
    pub fn stream(&self) -> SignatureStream<'_> {
        SignatureStream::new(self)
    }

    /// Checks if any parameter or the return type is not loaded.
    #[must_use]
    pub fn has_unloaded_types(&self, session: &CompilationSession) -> bool {
        let mut stream = self.stream();
        while !stream.is_done() {
            if !session.get(stream.current_type()).is_loaded() {
                return true;
            }
            stream.advance();
        }
        false
    }

    /// Checks if `other` denotes the same signature, resolving its elements only until the first
    /// difference. Descriptors with different text are rejected without resolving anything.
    ///
    /// # Errors
    /// Propagates failures of the resolver behind `other`.
    pub fn matches_stream<R, L>(
        &self,
        mut other: DescriptorStream<'_, R, L>,
    ) -> Result<bool, ResolutionError>
    where
        R: ClassResolver,
        L: LookupHandle + ?Sized,
    {
        if self.symbol != *other.symbol() {
            return Ok(false);
        }
        let mut own = self.stream();
        while !other.is_done() {
            if own.is_done()
                || own.at_return_type() != other.at_return_type()
                || own.current_type() != other.current_type()?
            {
                return Ok(false);
            }
            own.advance();
            other.advance();
        }
        Ok(own.is_done())
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self.parameter_types.len() == other.parameter_types.len()
            && self
                .parameter_types
                .iter()
                .zip(other.parameter_types.iter())
                .all(|(a, b)| a == b)
            && self.return_type == other.return_type
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
        self.parameter_types.hash(state);
        self.return_type.hash(state);
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.symbol.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ci::{CiType, LoaderId, LoaderResolver, Resolution},
        jvm::{class_loader::class_paths::MemoryClassPath, references::ClassRef},
        types::field_type::PrimitiveType,
    };

    fn setup() -> (CompilationSession, LoaderResolver<MemoryClassPath>, TypeId) {
        let mut session = CompilationSession::new();
        let resolver = LoaderResolver::new(MemoryClassPath::new([
            "java/lang/Object",
            "java/lang/String",
        ]));
        let object = session.instance(ClassRef::new("java/lang/Object"), LoaderId::BOOTSTRAP);
        (session, resolver, object)
    }

    fn build(
        session: &mut CompilationSession,
        resolver: &LoaderResolver<MemoryClassPath>,
        accessing: TypeId,
        descriptor: &str,
    ) -> Signature {
        let symbol = session.symbol(descriptor).unwrap();
        Signature::new(session, resolver, accessing, &(), symbol).unwrap()
    }

    #[test]
    fn int_long_unloaded_to_boolean() {
        let (mut session, resolver, object) = setup();
        let sig = build(&mut session, &resolver, object, "(IJLcom/example/Unloaded;)Z");
        assert_eq!(sig.parameter_count(), 3);
        assert_eq!(sig.argument_slots(), 4);
        assert_eq!(sig.return_type(), session.primitive(PrimitiveType::Boolean));
        assert_eq!(sig.parameter_type_at(0), session.primitive(PrimitiveType::Int));
        assert_eq!(sig.parameter_type_at(1), session.primitive(PrimitiveType::Long));
        assert!(matches!(
            session.get(sig.parameter_type_at(2)),
            CiType::Unloaded { class, .. } if class.binary_name == "com/example/Unloaded"
        ));
        assert!(sig.has_unloaded_types(&session));
    }

    #[test]
    fn no_params_void() {
        let (mut session, resolver, object) = setup();
        let sig = build(&mut session, &resolver, object, "()V");
        assert_eq!(sig.parameter_count(), 0);
        assert_eq!(sig.argument_slots(), 0);
        assert_eq!(sig.return_type(), session.void());
        assert!(!sig.has_unloaded_types(&session));
    }

    #[test]
    fn unloaded_return_type() {
        let (mut session, resolver, object) = setup();
        let sig = build(&mut session, &resolver, object, "(Ljava/lang/String;)Lx/Y;");
        assert!(sig.has_unloaded_types(&session));
        assert_eq!(sig.argument_slots(), 1);
    }

    #[test]
    fn return_type_does_not_count_towards_slots() {
        let (mut session, resolver, object) = setup();
        let sig = build(&mut session, &resolver, object, "(D)J");
        assert_eq!(sig.argument_slots(), 2);
    }

    #[test]
    #[should_panic]
    fn parameter_out_of_range() {
        let (mut session, resolver, object) = setup();
        let sig = build(&mut session, &resolver, object, "(I)V");
        let _ = sig.parameter_type_at(1);
    }

    #[test]
    fn stream_visits_every_element_once() {
        let (mut session, resolver, object) = setup();
        let sig = build(&mut session, &resolver, object, "(I[Ljava/lang/String;)D");
        let elements: Vec<_> = sig.stream().collect();
        assert_eq!(elements.len(), 3);
        assert_eq!(sig.stream().len(), 3);
        assert_eq!(
            elements.iter().map(|it| it.at_return).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert_eq!(elements[2].ty, sig.return_type());
    }

    #[test]
    fn equal_across_contexts() {
        let (mut session, mut resolver, object) = setup();
        let app = resolver.add_loader(MemoryClassPath::new(["app/Main"]), LoaderId::BOOTSTRAP);
        let main = session.instance(ClassRef::new("app/Main"), app);
        let a = build(&mut session, &resolver, object, "(Ljava/lang/String;J)V");
        let b = build(&mut session, &resolver, main, "(Ljava/lang/String;J)V");
        assert_ne!(a.accessing(), b.accessing());
        assert_eq!(a, b);
        assert_eq!(b, a);
    }

    #[test]
    fn different_descriptors_differ() {
        let (mut session, resolver, object) = setup();
        let a = build(&mut session, &resolver, object, "(I)V");
        let b = build(&mut session, &resolver, object, "(II)V");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[derive(Debug)]
    struct FailingResolver;

    impl ClassResolver for FailingResolver {
        fn resolve<L>(
            &self,
            _session: &mut CompilationSession,
            _accessing: TypeId,
            _lookup: &L,
            _binary_name: &str,
        ) -> Result<Resolution, ResolutionError>
        where
            L: LookupHandle + ?Sized,
        {
            Err(ResolutionError::UnknownLoader(LoaderId(7)))
        }
    }

    #[test]
    fn resolver_failure_propagates() {
        let (mut session, _, object) = setup();
        let symbol = session.symbol("(ILjava/lang/String;)V").unwrap();
        let result = Signature::new(&mut session, &FailingResolver, object, &(), symbol);
        assert!(matches!(result, Err(ResolutionError::UnknownLoader(LoaderId(7)))));
    }

    #[test]
    fn primitives_never_reach_the_resolver() {
        let (mut session, _, object) = setup();
        let symbol = session.symbol("(IJDFZBSC)V").unwrap();
        let sig = Signature::new(&mut session, &FailingResolver, object, &(), symbol).unwrap();
        assert_eq!(sig.argument_slots(), 10);
    }
}
