//! Defines the host-side [`Term`] type and its handle-owning variants.
//!
//! Scalars (`Int`, `Float`, `Str`) are plain host values.  Atoms,
//! compounds, lists and variables own a [`Reference`] to an engine-side
//! slot holding their native value, so they stay addressable across
//! resumes.  Every operation that needs the engine takes the [`Bridge`]
//! explicitly, the way arena-backed terms take their arena.

use crate::{Bridge, BridgeError, Engine, Reference};
use core::fmt;
use smartstring::alias::String;
use std::cmp::Ordering;

/// A term exchanged with the engine.
///
/// Cloning a handle-owning term shares its [`Reference`]; the native
/// reference is released after the last clone is dropped.
#[derive(Clone)]
pub enum Term {
    Int(i64),
    Float(f64),
    Str(String),
    Atom(Atom),
    Compound(Compound),
    List(List),
    Var(Var),
}

/// An interned symbolic name.
#[derive(Clone, Debug)]
pub struct Atom {
    pub(crate) name: String,
    pub(crate) reference: Reference,
}

/// A functor applied to one or more arguments.
#[derive(Clone, Debug)]
pub struct Compound {
    pub(crate) functor: String,
    pub(crate) arity: usize,
    pub(crate) reference: Reference,
}

/// A (possibly improper) list.  The empty list is a `List` holding nil.
#[derive(Clone, Debug)]
pub struct List {
    pub(crate) reference: Reference,
}

/// A logical variable.
#[derive(Clone, Debug)]
pub struct Var {
    pub(crate) reference: Reference,
}

/// Conversion of host values into native words.
///
/// Integers, floats and text become the matching native leaf; sequences
/// become lists; terms contribute the word their reference holds.
pub trait IntoTerm {
    fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError>;
}

macro_rules! impl_intoterm_for_integers {
    ($($t:ty),* $(,)?) => {$(
        impl IntoTerm for $t {
            #[inline]
            fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
                Ok(bridge.engine_mut()?.long(self as i64))
            }
        }
    )*};
}
impl_intoterm_for_integers!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_intoterm_for_floats {
    ($($t:ty),* $(,)?) => {$(
        impl IntoTerm for $t {
            #[inline]
            fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
                Ok(bridge.engine_mut()?.double(self as f64))
            }
        }
    )*};
}
impl_intoterm_for_floats!(f32, f64);

impl<'a> IntoTerm for &'a str {
    #[inline]
    fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
        Ok(bridge.engine_mut()?.string(self))
    }
}

impl IntoTerm for String {
    #[inline]
    fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
        self.as_str().into_word(bridge)
    }
}

impl IntoTerm for std::string::String {
    #[inline]
    fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
        self.as_str().into_word(bridge)
    }
}

impl<T: IntoTerm> IntoTerm for Vec<T> {
    #[inline]
    fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
        list_word(bridge, self, None)
    }
}

impl<T: IntoTerm, const N: usize> IntoTerm for [T; N] {
    #[inline]
    fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
        list_word(bridge, self, None)
    }
}

impl<'a, T: IntoTerm + Clone> IntoTerm for &'a [T] {
    #[inline]
    fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
        list_word(bridge, self.iter().cloned(), None)
    }
}

impl<'a> IntoTerm for &'a Term {
    fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
        match self {
            Term::Int(i) => (*i).into_word(bridge),
            Term::Float(r) => (*r).into_word(bridge),
            Term::Str(s) => s.as_str().into_word(bridge),
            Term::Atom(a) => a.into_word(bridge),
            Term::Compound(c) => c.into_word(bridge),
            Term::List(l) => l.into_word(bridge),
            Term::Var(v) => v.into_word(bridge),
        }
    }
}

impl IntoTerm for Term {
    #[inline]
    fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
        (&self).into_word(bridge)
    }
}

macro_rules! impl_intoterm_for_handles {
    ($($t:ty),* $(,)?) => {$(
        impl<'a> IntoTerm for &'a $t {
            #[inline]
            fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
                bridge.ref_word(&self.reference)
            }
        }

        impl IntoTerm for $t {
            #[inline]
            fn into_word<E: Engine>(self, bridge: &mut Bridge<E>) -> Result<E::Word, BridgeError> {
                bridge.ref_word(&self.reference)
            }
        }
    )*};
}
impl_intoterm_for_handles!(Atom, Compound, List, Var);

/// Builds a list word by consing `items` right-to-left onto `tail`
/// (nil when `None`).
pub(crate) fn list_word<E: Engine>(
    bridge: &mut Bridge<E>,
    items: impl IntoIterator<Item = impl IntoTerm>,
    tail: Option<E::Word>,
) -> Result<E::Word, BridgeError> {
    let words = items
        .into_iter()
        .map(|t| t.into_word(bridge))
        .collect::<Result<Vec<_>, _>>()?;
    bridge.cons_words(&words, tail)
}

impl Atom {
    /// Interns `name` and returns the atom.
    pub fn new<E: Engine>(bridge: &mut Bridge<E>, name: impl AsRef<str>) -> Result<Self, BridgeError> {
        let name = name.as_ref();
        let engine = bridge.engine_mut()?;
        let did = engine.did(name, 0);
        let word = engine.atom(did);
        Ok(Self {
            name: name.into(),
            reference: bridge.register(word)?,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn reference(&self) -> &Reference {
        &self.reference
    }
}

impl Compound {
    /// Constructs `functor(args...)`.  At least one argument is required.
    ///
    /// Sequence arguments become lists, scalars become native leaves.  Use
    /// the [`compound!`](crate::compound) macro for arguments of mixed types.
    pub fn new<E: Engine>(
        bridge: &mut Bridge<E>,
        functor: impl AsRef<str>,
        args: impl IntoIterator<Item = impl IntoTerm>,
    ) -> Result<Self, BridgeError> {
        let words = args
            .into_iter()
            .map(|t| t.into_word(bridge))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_words(bridge, functor, &words)
    }

    /// Constructs a compound term from native argument words.
    pub fn from_words<E: Engine>(
        bridge: &mut Bridge<E>,
        functor: impl AsRef<str>,
        args: &[E::Word],
    ) -> Result<Self, BridgeError> {
        let functor = functor.as_ref();
        if args.is_empty() {
            return Err(BridgeError::InvalidArity {
                functor: functor.into(),
            });
        }
        let engine = bridge.engine_mut()?;
        let did = engine.did(functor, args.len());
        let word = engine.term_array(did, args);
        Ok(Self {
            functor: functor.into(),
            arity: args.len(),
            reference: bridge.register(word)?,
        })
    }

    #[inline]
    pub fn functor(&self) -> &str {
        &self.functor
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }

    #[inline]
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    /// Returns the argument at `index` (0-based).  A negative index counts
    /// from the end.  Any index with `|index| >= arity` is out of range.
    pub fn arg<E: Engine>(&self, index: isize, bridge: &mut Bridge<E>) -> Result<Term, BridgeError> {
        if index.unsigned_abs() >= self.arity {
            return Err(BridgeError::IndexOutOfRange { index });
        }
        let index = if index < 0 {
            self.arity as isize + index
        } else {
            index
        };
        let word = self.arg_word(index as usize + 1, bridge)?;
        bridge.decode(word)
    }

    /// Iterates over the arguments in order.
    pub fn args<'a, E: Engine>(
        &self,
        bridge: &'a mut Bridge<E>,
    ) -> Result<ArgIter<'a, E>, BridgeError> {
        let word = bridge.ref_word(&self.reference)?;
        Ok(ArgIter {
            bridge,
            word,
            functor: self.functor.clone(),
            arity: self.arity,
            position: 1,
        })
    }

    fn arg_word<E: Engine>(&self, position: usize, bridge: &Bridge<E>) -> Result<E::Word, BridgeError> {
        let word = bridge.ref_word(&self.reference)?;
        bridge
            .engine()?
            .get_arg(position, word)
            .ok_or_else(|| BridgeError::RangeError {
                functor: self.functor.clone(),
                arity: self.arity,
                position,
            })
    }
}

/// Iterator over the arguments of a [`Compound`].
pub struct ArgIter<'a, E: Engine> {
    bridge: &'a mut Bridge<E>,
    word: E::Word,
    functor: String,
    arity: usize,
    position: usize,
}

impl<E: Engine> Iterator for ArgIter<'_, E> {
    type Item = Result<Term, BridgeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position > self.arity {
            return None;
        }
        let position = self.position;
        self.position += 1;
        match self.bridge.engine.get_arg(position, self.word) {
            Some(arg) => Some(self.bridge.decode(arg)),
            None => {
                // Stop after reporting the mismatch.
                self.position = self.arity + 1;
                Some(Err(BridgeError::RangeError {
                    functor: self.functor.clone(),
                    arity: self.arity,
                    position,
                }))
            }
        }
    }
}

impl List {
    /// Constructs a proper list of `items`.
    pub fn new<E: Engine>(
        bridge: &mut Bridge<E>,
        items: impl IntoIterator<Item = impl IntoTerm>,
    ) -> Result<Self, BridgeError> {
        let word = list_word(bridge, items, None)?;
        Ok(Self {
            reference: bridge.register(word)?,
        })
    }

    /// Constructs an improper list `[items... | tail]`.
    pub fn with_tail<E: Engine>(
        bridge: &mut Bridge<E>,
        items: impl IntoIterator<Item = impl IntoTerm>,
        tail: impl IntoTerm,
    ) -> Result<Self, BridgeError> {
        let tail = tail.into_word(bridge)?;
        let word = list_word(bridge, items, Some(tail))?;
        Ok(Self {
            reference: bridge.register(word)?,
        })
    }

    /// Constructs the empty list.
    pub fn nil<E: Engine>(bridge: &mut Bridge<E>) -> Result<Self, BridgeError> {
        let word = bridge.engine_mut()?.nil();
        Ok(Self {
            reference: bridge.register(word)?,
        })
    }

    #[inline]
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    /// Returns the number of elements before the tail.
    pub fn len<E: Engine>(&self, bridge: &Bridge<E>) -> Result<usize, BridgeError> {
        let engine = bridge.engine()?;
        let mut cursor = bridge.ref_word(&self.reference)?;
        let mut n = 0;
        while let Some((_, tail)) = engine.get_list(cursor) {
            n += 1;
            cursor = tail;
        }
        Ok(n)
    }

    pub fn is_empty<E: Engine>(&self, bridge: &Bridge<E>) -> Result<bool, BridgeError> {
        let word = bridge.ref_word(&self.reference)?;
        Ok(bridge.engine()?.get_list(word).is_none())
    }

    /// Returns the element at `index`.
    ///
    /// A non-negative index walks `index + 1` head/tail splits.  A negative
    /// index `-k` streams the whole list through a ring buffer of `k`
    /// slots and returns the slot the stream stopped at, i.e. the `k`-th
    /// element from the end.  Lists shorter than `k` are out of range.
    pub fn get<E: Engine>(&self, index: isize, bridge: &mut Bridge<E>) -> Result<Term, BridgeError> {
        let word = self.word_at(index, bridge)?;
        bridge.decode(word)
    }

    fn word_at<E: Engine>(&self, index: isize, bridge: &Bridge<E>) -> Result<E::Word, BridgeError> {
        let engine = bridge.engine()?;
        let mut cursor = bridge.ref_word(&self.reference)?;
        if index >= 0 {
            for _ in 0..index {
                match engine.get_list(cursor) {
                    Some((_, tail)) => cursor = tail,
                    None => return Err(BridgeError::IndexOutOfRange { index }),
                }
            }
            return match engine.get_list(cursor) {
                Some((head, _)) => Ok(head),
                None => Err(BridgeError::IndexOutOfRange { index }),
            };
        }

        let k = index.unsigned_abs();
        let mut ring: Vec<E::Word> = Vec::with_capacity(k.min(1024));
        let mut count = 0usize;
        while let Some((head, tail)) = engine.get_list(cursor) {
            if ring.len() < k {
                ring.push(head);
            } else {
                ring[count % k] = head;
            }
            count += 1;
            cursor = tail;
        }
        if count < k {
            return Err(BridgeError::IndexOutOfRange { index });
        }
        Ok(ring[count % k])
    }

    /// Iterates over the elements.
    pub fn iter<'a, E: Engine>(
        &self,
        bridge: &'a mut Bridge<E>,
    ) -> Result<ListIter<'a, E>, BridgeError> {
        let cursor = bridge.ref_word(&self.reference)?;
        Ok(ListIter { bridge, cursor })
    }

    /// Iterates over `(head, tail)` pairs; the last tail is nil for a
    /// proper list.
    pub fn pairs<'a, E: Engine>(
        &self,
        bridge: &'a mut Bridge<E>,
    ) -> Result<ListPairs<'a, E>, BridgeError> {
        let cursor = bridge.ref_word(&self.reference)?;
        Ok(ListPairs { bridge, cursor })
    }

    /// Collects the elements.
    pub fn to_vec<E: Engine>(&self, bridge: &mut Bridge<E>) -> Result<Vec<Term>, BridgeError> {
        self.iter(bridge)?.collect()
    }
}

/// Iterator over the elements of a [`List`].
pub struct ListIter<'a, E: Engine> {
    bridge: &'a mut Bridge<E>,
    cursor: E::Word,
}

impl<E: Engine> Iterator for ListIter<'_, E> {
    type Item = Result<Term, BridgeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (head, tail) = self.bridge.engine.get_list(self.cursor)?;
        self.cursor = tail;
        Some(self.bridge.decode(head))
    }
}

/// Iterator over the `(head, tail)` pairs of a [`List`].
pub struct ListPairs<'a, E: Engine> {
    bridge: &'a mut Bridge<E>,
    cursor: E::Word,
}

impl<E: Engine> Iterator for ListPairs<'_, E> {
    type Item = Result<(Term, Term), BridgeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (head, tail) = self.bridge.engine.get_list(self.cursor)?;
        self.cursor = tail;
        let pair = self
            .bridge
            .decode(head)
            .and_then(|h| self.bridge.decode(tail).map(|t| (h, t)));
        Some(pair)
    }
}

impl Var {
    /// Creates a fresh unbound variable.
    pub fn new<E: Engine>(bridge: &mut Bridge<E>) -> Result<Self, BridgeError> {
        Ok(Self {
            reference: bridge.register_newvar()?,
        })
    }

    #[inline]
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    /// Returns what the variable currently resolves to, or `None` when it
    /// is unbound.
    pub fn value<E: Engine>(&self, bridge: &mut Bridge<E>) -> Result<Option<Term>, BridgeError> {
        let word = bridge.ref_word(&self.reference)?;
        if bridge.engine()?.is_var(word) {
            return Ok(None);
        }
        bridge.decode(word).map(Some)
    }

    pub fn is_bound<E: Engine>(&self, bridge: &Bridge<E>) -> Result<bool, BridgeError> {
        let word = bridge.ref_word(&self.reference)?;
        Ok(!bridge.engine()?.is_var(word))
    }
}

impl Term {
    /// Returns the reference of a handle-owning term.
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            Term::Int(_) | Term::Float(_) | Term::Str(_) => None,
            Term::Atom(a) => Some(&a.reference),
            Term::Compound(c) => Some(&c.reference),
            Term::List(l) => Some(&l.reference),
            Term::Var(v) => Some(&v.reference),
        }
    }

    /// Returns a string describing the kind of this term.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Term::Int(_) => "int",
            Term::Float(_) => "float",
            Term::Str(_) => "str",
            Term::Atom(_) => "atom",
            Term::Compound(_) => "compound",
            Term::List(_) => "list",
            Term::Var(_) => "var",
        }
    }

    /// Returns the arity of the term; only compounds have a non-zero arity.
    #[inline]
    pub fn arity(&self) -> usize {
        match self {
            Term::Compound(c) => c.arity,
            _ => 0,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Term::Float(r) => Some(*r),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Term::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Term::Atom(a) => Some(a),
            _ => None,
        }
    }

    #[inline]
    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Term::Compound(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&List> {
        match self {
            Term::List(l) => Some(l),
            _ => None,
        }
    }

    #[inline]
    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Term::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Compares two terms in the engine's standard order.
    pub fn compare<E: Engine>(&self, other: &Term, bridge: &mut Bridge<E>) -> Result<Ordering, BridgeError> {
        let a = IntoTerm::into_word(self, bridge)?;
        let b = IntoTerm::into_word(other, bridge)?;
        Ok(bridge.engine()?.compare(a, b))
    }

    /// Structural equality; a term never equals no value.
    pub fn equals<E: Engine>(&self, other: Option<&Term>, bridge: &mut Bridge<E>) -> Result<bool, BridgeError> {
        match other {
            None => Ok(false),
            Some(other) => Ok(self.compare(other, bridge)?.is_eq()),
        }
    }

    /// Structural inequality; a term always differs from no value.
    pub fn not_equals<E: Engine>(&self, other: Option<&Term>, bridge: &mut Bridge<E>) -> Result<bool, BridgeError> {
        Ok(!self.equals(other, bridge)?)
    }

    pub fn less_than<E: Engine>(&self, other: Option<&Term>, bridge: &mut Bridge<E>) -> Result<bool, BridgeError> {
        Ok(self.ordered(other, bridge)?.is_lt())
    }

    pub fn less_equal<E: Engine>(&self, other: Option<&Term>, bridge: &mut Bridge<E>) -> Result<bool, BridgeError> {
        Ok(self.ordered(other, bridge)?.is_le())
    }

    pub fn greater_than<E: Engine>(&self, other: Option<&Term>, bridge: &mut Bridge<E>) -> Result<bool, BridgeError> {
        Ok(self.ordered(other, bridge)?.is_gt())
    }

    pub fn greater_equal<E: Engine>(&self, other: Option<&Term>, bridge: &mut Bridge<E>) -> Result<bool, BridgeError> {
        Ok(self.ordered(other, bridge)?.is_ge())
    }

    fn ordered<E: Engine>(&self, other: Option<&Term>, bridge: &mut Bridge<E>) -> Result<Ordering, BridgeError> {
        let other = other.ok_or(BridgeError::IncomparableType)?;
        self.compare(other, bridge)
    }
}

impl From<Atom> for Term {
    fn from(v: Atom) -> Self {
        Term::Atom(v)
    }
}

impl From<Compound> for Term {
    fn from(v: Compound) -> Self {
        Term::Compound(v)
    }
}

impl From<List> for Term {
    fn from(v: List) -> Self {
        Term::List(v)
    }
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Term::Var(v)
    }
}

/// Implements the standard [`Debug`] formatter for [`Term`].
///
/// Scalars print their value; handle-owning terms print their kind and
/// slot.  Use [`Term::display`] to render the engine-side value.
impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Term::Float(r) => f.debug_tuple("Float").field(r).finish(),
            Term::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Term::Atom(a) => f
                .debug_struct("Atom")
                .field("name", &a.name)
                .field("ref", &a.reference.id())
                .finish(),
            Term::Compound(c) => f
                .debug_struct("Compound")
                .field("functor", &c.functor)
                .field("arity", &c.arity)
                .field("ref", &c.reference.id())
                .finish(),
            Term::List(l) => f.debug_struct("List").field("ref", &l.reference.id()).finish(),
            Term::Var(v) => f.debug_struct("Var").field("ref", &v.reference.id()).finish(),
        }
    }
}

/// Builds a [`Compound`] from arguments of mixed types.
///
/// ```
/// # use clp_bridge::{Bridge, LoopbackEngine, compound};
/// let mut bridge = Bridge::new(LoopbackEngine::new());
/// assert!(!bridge.init());
/// let t = compound!("point"; 1, 2.5, "label", vec![1, 2] => &mut bridge).unwrap();
/// assert_eq!(t.arity(), 4);
/// ```
#[macro_export]
macro_rules! compound {
    ($functor:expr; $($arg:expr),+ $(,)? => $bridge:expr) => {{
        let __bridge = $bridge;
        let __args = (|| -> Result<Vec<_>, $crate::BridgeError> {
            Ok(vec![$($crate::IntoTerm::into_word($arg, &mut *__bridge)?),+])
        })();
        __args.and_then(|__args| $crate::Compound::from_words(&mut *__bridge, $functor, &__args))
    }};
}

/// Builds a [`List`] from elements of mixed types, optionally with a tail.
///
/// ```
/// # use clp_bridge::{Bridge, LoopbackEngine, list};
/// let mut bridge = Bridge::new(LoopbackEngine::new());
/// assert!(!bridge.init());
/// let l = list![1, "two", 3.0 => &mut bridge].unwrap();
/// assert_eq!(l.len(&bridge).unwrap(), 3);
/// ```
#[macro_export]
macro_rules! list {
    // with tail
    ($($arg:expr),* $(,)?; $tail:expr => $bridge:expr) => {{
        let __bridge = $bridge;
        let __word = (|| -> Result<_, $crate::BridgeError> {
            let __words = vec![$($crate::IntoTerm::into_word($arg, &mut *__bridge)?),*];
            let __tail = $crate::IntoTerm::into_word($tail, &mut *__bridge)?;
            __bridge.cons_words(&__words, Some(__tail))
        })();
        __word.and_then(|__word| __bridge.list_from_word(__word))
    }};
    // without tail
    ($($arg:expr),* $(,)? => $bridge:expr) => {{
        let __bridge = $bridge;
        let __word = (|| -> Result<_, $crate::BridgeError> {
            let __words = vec![$($crate::IntoTerm::into_word($arg, &mut *__bridge)?),*];
            __bridge.cons_words(&__words, None)
        })();
        __word.and_then(|__word| __bridge.list_from_word(__word))
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoopbackEngine;
    use proptest::prelude::*;

    fn bridge() -> Bridge<LoopbackEngine> {
        let mut bridge = Bridge::new(LoopbackEngine::new());
        assert!(!bridge.init());
        bridge
    }

    #[test]
    fn compound_without_args_is_invalid() {
        let mut b = bridge();
        let err = Compound::new(&mut b, "foo", Vec::<i64>::new()).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArity { .. }));
        let err = Compound::from_words(&mut b, "bar", &[]).unwrap_err();
        assert_eq!(
            err,
            BridgeError::InvalidArity {
                functor: "bar".into()
            }
        );
    }

    #[test]
    fn compound_construction() {
        let mut b = bridge();
        let c = Compound::new(&mut b, "point", [1, 2, 3]).unwrap();
        assert_eq!(c.functor(), "point");
        assert_eq!(c.arity(), 3);
        assert_eq!(c.arg(0, &mut b).unwrap().as_int(), Some(1));
        assert_eq!(c.arg(2, &mut b).unwrap().as_int(), Some(3));
        assert_eq!(c.arg(-1, &mut b).unwrap().as_int(), Some(3));
        assert_eq!(c.arg(-2, &mut b).unwrap().as_int(), Some(2));
        assert!(matches!(
            c.arg(3, &mut b),
            Err(BridgeError::IndexOutOfRange { index: 3 })
        ));
        // |index| >= arity is out of range on the negative side too
        assert!(matches!(
            c.arg(-3, &mut b),
            Err(BridgeError::IndexOutOfRange { index: -3 })
        ));
        let args: Vec<i64> = c
            .args(&mut b)
            .unwrap()
            .map(|t| t.unwrap().as_int().unwrap())
            .collect();
        assert_eq!(args, vec![1, 2, 3]);
    }

    #[test]
    fn sequence_arguments_become_lists() {
        let mut b = bridge();
        let c = compound!("f"; vec![1, 2], "x", 2.5 => &mut b).unwrap();
        let first = c.arg(0, &mut b).unwrap();
        let list = first.as_list().expect("list argument");
        assert_eq!(list.len(&b).unwrap(), 2);
        assert_eq!(c.arg(1, &mut b).unwrap().as_str(), Some("x"));
        assert_eq!(c.arg(2, &mut b).unwrap().as_float(), Some(2.5));
    }

    #[test]
    fn list_indexing() {
        let mut b = bridge();
        let l = List::new(&mut b, [1, 2, 3]).unwrap();
        assert_eq!(l.len(&b).unwrap(), 3);
        assert_eq!(l.get(0, &mut b).unwrap().as_int(), Some(1));
        assert_eq!(l.get(2, &mut b).unwrap().as_int(), Some(3));
        assert_eq!(l.get(-1, &mut b).unwrap().as_int(), Some(3));
        assert_eq!(l.get(-3, &mut b).unwrap().as_int(), Some(1));
        assert!(matches!(
            l.get(3, &mut b),
            Err(BridgeError::IndexOutOfRange { index: 3 })
        ));
        assert!(matches!(
            l.get(-4, &mut b),
            Err(BridgeError::IndexOutOfRange { index: -4 })
        ));
    }

    #[test]
    fn negative_index_matches_forward_index() {
        let mut b = bridge();
        let items: Vec<i64> = (10..27).collect();
        let n = items.len() as isize;
        let l = List::new(&mut b, items.clone()).unwrap();
        for k in 1..=n {
            let back = l.get(-k, &mut b).unwrap().as_int().unwrap();
            let fwd = l.get(n - k, &mut b).unwrap().as_int().unwrap();
            assert_eq!(back, fwd, "k = {k}");
            assert_eq!(back, items[(n - k) as usize]);
        }
    }

    #[test]
    fn empty_and_improper_lists() {
        let mut b = bridge();
        let empty = List::nil(&mut b).unwrap();
        assert!(empty.is_empty(&b).unwrap());
        assert_eq!(empty.len(&b).unwrap(), 0);
        assert!(matches!(
            empty.get(-1, &mut b),
            Err(BridgeError::IndexOutOfRange { .. })
        ));

        let l = List::with_tail(&mut b, [1, 2], "rest").unwrap();
        assert_eq!(l.len(&b).unwrap(), 2);
        let pairs = l.pairs(&mut b).unwrap().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].0.as_int(), Some(2));
        assert_eq!(pairs[1].1.as_str(), Some("rest"));
        assert!(pairs[0].1.as_list().is_some());
    }

    #[test]
    fn iteration() {
        let mut b = bridge();
        let l = list![1, "two", 3.0, vec![4] => &mut b].unwrap();
        let items = l.to_vec(&mut b).unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].as_int(), Some(1));
        assert_eq!(items[1].as_str(), Some("two"));
        assert_eq!(items[2].as_float(), Some(3.0));
        assert_eq!(items[3].kind_name(), "list");
    }

    #[test]
    fn variables() {
        let mut b = bridge();
        let v = Var::new(&mut b).unwrap();
        assert!(v.value(&mut b).unwrap().is_none());
        assert!(!v.is_bound(&b).unwrap());
        let t = Term::from(v.clone());
        assert_eq!(t.kind_name(), "var");
    }

    #[test]
    fn comparison() {
        let mut b = bridge();
        let p1 = Term::from(Compound::new(&mut b, "p", [1, 2]).unwrap());
        let p2 = Term::from(Compound::new(&mut b, "p", [1, 2]).unwrap());
        let p3 = Term::from(Compound::new(&mut b, "p", [1, 3]).unwrap());
        assert_eq!(p1.compare(&p2, &mut b).unwrap(), Ordering::Equal);
        assert!(p1.equals(Some(&p2), &mut b).unwrap());
        assert!(!p1.not_equals(Some(&p2), &mut b).unwrap());

        let ord = p1.compare(&p3, &mut b).unwrap();
        assert_eq!(ord, Ordering::Less);
        assert!(p1.less_than(Some(&p3), &mut b).unwrap());
        assert!(p1.less_equal(Some(&p3), &mut b).unwrap());
        assert!(!p1.greater_than(Some(&p3), &mut b).unwrap());
        assert!(p3.greater_equal(Some(&p1), &mut b).unwrap());
        assert_eq!(p3.compare(&p1, &mut b).unwrap(), Ordering::Greater);
    }

    #[test]
    fn comparison_against_no_value() {
        let mut b = bridge();
        let a = Term::from(Atom::new(&mut b, "a").unwrap());
        assert!(!a.equals(None, &mut b).unwrap());
        assert!(a.not_equals(None, &mut b).unwrap());
        for result in [
            a.less_than(None, &mut b),
            a.less_equal(None, &mut b),
            a.greater_than(None, &mut b),
            a.greater_equal(None, &mut b),
        ] {
            assert_eq!(result, Err(BridgeError::IncomparableType));
        }
    }

    #[test]
    fn scalar_round_trip() {
        let mut b = bridge();
        assert_eq!(b.term(42).unwrap().as_int(), Some(42));
        assert_eq!(b.term(-7i8).unwrap().as_int(), Some(-7));
        assert_eq!(b.term(2.5).unwrap().as_float(), Some(2.5));
        assert_eq!(b.term("hello").unwrap().as_str(), Some("hello"));
        let s = std::string::String::from("owned");
        assert_eq!(b.term(s).unwrap().as_str(), Some("owned"));
    }

    #[test]
    fn long_lists_compare() {
        let mut b = bridge();
        let l1 = Term::from(List::new(&mut b, (0..100_000).collect::<Vec<i64>>()).unwrap());
        let l2 = Term::from(List::new(&mut b, (0..100_000).collect::<Vec<i64>>()).unwrap());
        let l3 = Term::from(List::new(&mut b, (1..100_001).collect::<Vec<i64>>()).unwrap());
        assert_eq!(l1.compare(&l2, &mut b).unwrap(), Ordering::Equal);
        assert!(l1.equals(Some(&l2), &mut b).unwrap());
        assert!(l1.less_than(Some(&l3), &mut b).unwrap());
    }

    #[test]
    fn mixed_kinds_order() {
        let mut b = bridge();
        let v = Term::from(Var::new(&mut b).unwrap());
        let n = Term::Int(1);
        let a = Term::from(Atom::new(&mut b, "a").unwrap());
        let s = Term::Str("s".into());
        let c = Term::from(Compound::new(&mut b, "f", [1]).unwrap());
        let ordered = [v, n, a, s, c];
        for w in ordered.windows(2) {
            assert!(w[0].less_than(Some(&w[1]), &mut b).unwrap());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
        #[test]
        fn prop_list_index_matches_elements(
            items in proptest::collection::vec(-1000i64..1000, 0..12),
            k in 1usize..14,
        ) {
            let mut b = bridge();
            let list = List::new(&mut b, items.clone()).unwrap();
            prop_assert_eq!(list.len(&b).unwrap(), items.len());

            let forward = list.get(k as isize - 1, &mut b);
            match items.get(k - 1) {
                Some(n) => prop_assert_eq!(forward.unwrap().as_int(), Some(*n)),
                None => {
                    let out_of_range = matches!(forward, Err(BridgeError::IndexOutOfRange { .. }));
                    prop_assert!(out_of_range);
                }
            }

            let backward = list.get(-(k as isize), &mut b);
            match items.len().checked_sub(k) {
                Some(i) => prop_assert_eq!(backward.unwrap().as_int(), Some(items[i])),
                None => {
                    let out_of_range = matches!(backward, Err(BridgeError::IndexOutOfRange { .. }));
                    prop_assert!(out_of_range);
                }
            }
        }

        #[test]
        fn prop_integer_order(x in any::<i64>(), y in any::<i64>()) {
            let mut b = bridge();
            let ord = Term::Int(x).compare(&Term::Int(y), &mut b).unwrap();
            prop_assert_eq!(ord, x.cmp(&y));
        }
    }
}
