//! Interned method descriptor symbols and the scanner walking their elements.

use std::{
    borrow::Borrow,
    fmt::Display,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    str::FromStr,
    sync::Arc,
};

use itertools::Itertools;

use super::field_type::PrimitiveType;
use crate::{jvm::references::ClassRef, macros::see_jvm_spec};

/// The maximum number of dimensions of an array type.
#[doc = see_jvm_spec!(4, 3, 2)]
pub const MAX_ARRAY_DIMENSIONS: usize = u8::MAX as usize;

/// An error indicating that a descriptor is not well-formed.
#[derive(Debug, PartialEq, Eq, Clone, Copy, thiserror::Error)]
#[error("Invalid descriptor")]
pub struct InvalidDescriptor;

/// The textual descriptor of a method, e.g., `(Ljava/lang/String;I)V`.
///
/// A [`DescriptorSymbol`] can only be created from a well-formed descriptor, so scanning it
/// never fails. Clones share the same storage, and comparing two clones of the same symbol does
/// not look at the text.
#[doc = see_jvm_spec!(4, 3, 3)]
#[derive(Debug, Clone, Eq)]
pub struct DescriptorSymbol(Arc<str>);

impl DescriptorSymbol {
    /// Returns the descriptor text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks if both symbols share the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Creates a scanner over the elements of the descriptor.
    #[must_use]
    pub fn scan(&self) -> DescriptorScanner<'_> {
        DescriptorScanner::new(self)
    }
}

impl FromStr for DescriptorSymbol {
    type Err = InvalidDescriptor;

    /// Parses a method descriptor.
    ///
    /// Every class name must be a valid binary name, i.e., non-empty `/`-separated identifiers
    /// without `.`, `;`, or `[`.
    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let mut scanner = DescriptorScanner::over(descriptor)?;
        while scanner.try_next()?.is_some() {}
        Ok(Self(Arc::from(descriptor)))
    }
}

impl PartialEq for DescriptorSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Hash for DescriptorSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Borrow<str> for DescriptorSymbol {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl Display for DescriptorSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The raw content of a descriptor element.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token<'a> {
    /// A primitive type tag.
    Primitive(PrimitiveType),
    /// The `void` return type.
    Void,
    /// A reference type. For class types this is the binary name (`java/lang/String`); for
    /// array types it is the array descriptor (`[I`, `[Ljava/lang/String;`).
    Reference(&'a str),
}

/// An element of a method descriptor produced by [`DescriptorScanner`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ScannedElement<'a> {
    /// The raw content of the element.
    pub token: Token<'a>,
    /// Whether the element is the return type.
    pub at_return: bool,
}

impl ScannedElement<'_> {
    /// Checks if the element denotes a reference type.
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self.token, Token::Reference(_))
    }
}

/// Iterates over the elements of a [`DescriptorSymbol`], parameters first, then the return type.
#[derive(Debug, Clone)]
pub struct DescriptorScanner<'a> {
    remaining: &'a str,
    at_return: bool,
    done: bool,
}

impl<'a> DescriptorScanner<'a> {
    /// Creates a scanner over `symbol`.
    #[must_use]
    pub fn new(symbol: &'a DescriptorSymbol) -> Self {
        Self::over(symbol.as_str()).unwrap_or_else(|_| malformed(symbol.as_str()))
    }

    fn over(descriptor: &'a str) -> Result<Self, InvalidDescriptor> {
        let remaining = descriptor.strip_prefix('(').ok_or(InvalidDescriptor)?;
        Ok(Self {
            remaining,
            at_return: false,
            done: false,
        })
    }

    /// Scans the next element, checking that it is well-formed and that nothing follows the
    /// return type.
    fn try_next(&mut self) -> Result<Option<ScannedElement<'a>>, InvalidDescriptor> {
        if self.done {
            return Ok(None);
        }
        if !self.at_return {
            if let Some(rest) = self.remaining.strip_prefix(')') {
                self.remaining = rest;
                self.at_return = true;
            }
        }
        let (token, rest) = split_element(self.remaining)?;
        if (token == Token::Void && !self.at_return) || (self.at_return && !rest.is_empty()) {
            return Err(InvalidDescriptor);
        }
        self.remaining = rest;
        self.done = self.at_return;
        Ok(Some(ScannedElement {
            token,
            at_return: self.at_return,
        }))
    }
}

/// Splits the element at the start of `text` from the rest of the text.
fn split_element(text: &str) -> Result<(Token<'_>, &str), InvalidDescriptor> {
    let mut chars = text.chars();
    let dimensions = chars.take_while_ref(|it| *it == '[').count();
    if dimensions > MAX_ARRAY_DIMENSIONS {
        return Err(InvalidDescriptor);
    }
    let element = match chars.next() {
        Some('L') => {
            let (binary_name, rest) = chars.as_str().split_once(';').ok_or(InvalidDescriptor)?;
            if !ClassRef::is_valid_binary_name(binary_name) {
                return Err(InvalidDescriptor);
            }
            chars = rest.chars();
            Token::Reference(binary_name)
        }
        Some('V') if dimensions == 0 => Token::Void,
        Some(c) => Token::Primitive(PrimitiveType::try_from(c)?),
        None => return Err(InvalidDescriptor),
    };
    let rest = chars.as_str();
    if dimensions == 0 {
        Ok((element, rest))
    } else {
        Ok((Token::Reference(&text[..text.len() - rest.len()]), rest))
    }
}

impl<'a> Iterator for DescriptorScanner<'a> {
    type Item = ScannedElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().unwrap_or_else(|_| malformed(self.remaining))
    }
}

impl FusedIterator for DescriptorScanner<'_> {}

#[cold]
fn malformed(text: &str) -> ! {
    panic!("Malformed descriptor element in validated symbol: {text:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{arb_field_descriptor, arb_return_descriptor};
    use proptest::prelude::*;

    fn symbol(text: &str) -> DescriptorSymbol {
        text.parse().expect("The descriptor is invalid")
    }

    #[test]
    fn scan_mixed() {
        let sym = symbol("(IJ[Ljava/lang/String;Ljava/util/List;[[D)Z");
        let elements: Vec<_> = sym.scan().collect();
        assert_eq!(
            elements.iter().map(|it| it.token).collect_vec(),
            vec![
                Token::Primitive(PrimitiveType::Int),
                Token::Primitive(PrimitiveType::Long),
                Token::Reference("[Ljava/lang/String;"),
                Token::Reference("java/util/List"),
                Token::Reference("[[D"),
                Token::Primitive(PrimitiveType::Boolean),
            ]
        );
        assert_eq!(
            elements.iter().map(|it| it.at_return).collect_vec(),
            vec![false, false, false, false, false, true]
        );
    }

    #[test]
    fn scan_void_no_params() {
        let sym = symbol("()V");
        let mut scanner = sym.scan();
        assert_eq!(
            scanner.next(),
            Some(ScannedElement {
                token: Token::Void,
                at_return: true
            })
        );
        assert_eq!(scanner.next(), None);
        assert_eq!(scanner.next(), None);
    }

    #[test]
    fn reference_return() {
        let sym = symbol("()Ljava/lang/Object;");
        let last = sym.scan().last().expect("There must be a return element");
        assert!(last.is_reference());
        assert_eq!(last.token, Token::Reference("java/lang/Object"));
    }

    #[test]
    fn unusual_but_valid_class_names() {
        let sym = symbol("(L$Proxy12;Lcom/acme/Outer$Inner;[Lα/β;)V");
        assert_eq!(
            sym.scan().map(|it| it.token).collect_vec(),
            vec![
                Token::Reference("$Proxy12"),
                Token::Reference("com/acme/Outer$Inner"),
                Token::Reference("[Lα/β;"),
                Token::Void,
            ]
        );
    }

    #[test]
    fn invalid_symbol() {
        assert!(DescriptorSymbol::from_str("(I").is_err());
        assert!(DescriptorSymbol::from_str("Ljava/lang/Object;").is_err());
    }

    #[test]
    fn empty() {
        assert_eq!(DescriptorSymbol::from_str(""), Err(InvalidDescriptor));
        assert_eq!(DescriptorSymbol::from_str("()"), Err(InvalidDescriptor));
    }

    #[test]
    fn missing_parenthesis() {
        assert!(DescriptorSymbol::from_str("I)V").is_err());
        assert!(DescriptorSymbol::from_str("(IV").is_err());
        assert!(DescriptorSymbol::from_str("((I)V").is_err());
    }

    #[test]
    fn too_many_return_type() {
        assert!(DescriptorSymbol::from_str("(I)VV").is_err());
        assert!(DescriptorSymbol::from_str("()IJ").is_err());
        assert!(DescriptorSymbol::from_str("()Ljava/lang/String;I").is_err());
    }

    #[test]
    fn void_parameter() {
        assert!(DescriptorSymbol::from_str("(V)V").is_err());
        assert!(DescriptorSymbol::from_str("([V)V").is_err());
        assert!(DescriptorSymbol::from_str("()[V").is_err());
    }

    #[test]
    fn invalid_primitive() {
        assert!(DescriptorSymbol::from_str("(X)V").is_err());
        assert!(DescriptorSymbol::from_str("([)V").is_err());
    }

    #[test]
    fn missing_semicolon() {
        assert!(DescriptorSymbol::from_str("(Ljava/lang/String)V").is_err());
        assert!(DescriptorSymbol::from_str("()Ljava/lang/String").is_err());
    }

    #[test]
    fn malformed_class_names() {
        for descriptor in [
            "(L[I;)V",
            "(L[;)V",
            "(L[Lfoo;)V",
            "(L[X;)V",
            "(L;)V",
            "(La.b;)V",
            "(L/x;)V",
            "(Lx/;)V",
            "(Lx//y;)V",
            "(L../x;)V",
            "(L./x;)V",
            "([L;)V",
            "([La.b;)V",
            "()L[I;",
        ] {
            assert_eq!(
                DescriptorSymbol::from_str(descriptor),
                Err(InvalidDescriptor),
                "{descriptor} should be rejected"
            );
        }
    }

    #[test]
    fn array_dimension_limit() {
        let max = format!("({}I)V", "[".repeat(MAX_ARRAY_DIMENSIONS));
        let sym = symbol(&max);
        assert_eq!(sym.scan().count(), 2);
        let too_deep = format!("({}I)V", "[".repeat(MAX_ARRAY_DIMENSIONS + 1));
        assert!(DescriptorSymbol::from_str(&too_deep).is_err());
    }

    #[test]
    fn symbol_equality() {
        let a = symbol("(I)V");
        let b = symbol("(I)V");
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert!(a.ptr_eq(&a.clone()));
        assert_ne!(a, symbol("(J)V"));
    }

    proptest! {
        #[test]
        fn element_count_matches_descriptor(
            params in prop::collection::vec(arb_field_descriptor(), 0..10),
            ret in arb_return_descriptor(),
        ) {
            let text = format!("({}){ret}", params.concat());
            let sym = symbol(&text);
            let elements: Vec<_> = sym.scan().collect();
            prop_assert_eq!(elements.len(), params.len() + 1);
            prop_assert_eq!(elements.iter().filter(|it| it.at_return).count(), 1);
            prop_assert!(elements.last().is_some_and(|it| it.at_return));
        }

        #[test]
        fn accepted_text_always_scans(text in r"[()\[LZIJDV;/a.$]{0,16}") {
            if let Ok(sym) = DescriptorSymbol::from_str(&text) {
                let elements: Vec<_> = sym.scan().collect();
                prop_assert!(elements.last().is_some_and(|it| it.at_return));
                for element in elements {
                    if let Token::Reference(name) = element.token {
                        prop_assert!(!name.is_empty());
                        prop_assert!(!name.contains('.'));
                    }
                }
            }
        }
    }
}
