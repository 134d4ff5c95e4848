//! Decoding of native words into host [`Term`]s.
//!
//! [`classify`] inspects a word and reports which native kind it holds;
//! [`Bridge::decode`] turns the classification into a [`Term`], creating a
//! registry reference for every kind that needs one.

use crate::{Atom, Bridge, BridgeError, Compound, Engine, List, Term, Var};
use smartstring::alias::String;

/// The native kind of a word, as seen by the bridge.
///
/// The probes run in a fixed order: list cell, compound, integer, nil,
/// atom, string, float, variable.  The first probe that matches decides the
/// kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Native<D> {
    List,
    Compound(D),
    Int(i64),
    Nil,
    Atom(D),
    Str,
    Float(f64),
    Var,
}

/// Classifies `word`.  A word that matches no probe is a protocol error.
pub fn classify<E: Engine>(engine: &E, word: E::Word) -> Result<Native<E::Did>, BridgeError> {
    if engine.get_list(word).is_some() {
        return Ok(Native::List);
    }
    if let Some(did) = engine.get_functor(word) {
        return Ok(Native::Compound(did));
    }
    if let Some(i) = engine.get_long(word) {
        return Ok(Native::Int(i));
    }
    if engine.is_nil(word) {
        return Ok(Native::Nil);
    }
    if let Some(did) = engine.get_atom(word) {
        return Ok(Native::Atom(did));
    }
    if engine.get_string(word).is_some() {
        return Ok(Native::Str);
    }
    if let Some(r) = engine.get_double(word) {
        return Ok(Native::Float(r));
    }
    if engine.is_var(word) {
        return Ok(Native::Var);
    }
    log::error!("word {word:?} has an unknown native type");
    Err(BridgeError::UnknownTermType)
}

/// Returns the name and arity of a dictionary entry.
pub(crate) fn did_info<E: Engine>(engine: &E, did: E::Did) -> Result<(&str, usize), BridgeError> {
    let lookup_failed = || {
        log::error!("dictionary lookup failed for {did:?}");
        BridgeError::DictionaryLookup(format!("{did:?}").into())
    };
    let name = engine.did_name(did).ok_or_else(lookup_failed)?;
    let arity = engine.did_arity(did).ok_or_else(lookup_failed)?;
    Ok((name, arity))
}

/// Decoded kind with everything read out of the engine, before any
/// reference is registered.
enum Decoded {
    List,
    Compound(String, usize),
    Int(i64),
    Atom(String),
    Str(String),
    Float(f64),
    Var,
}

fn read<E: Engine>(engine: &E, word: E::Word) -> Result<Decoded, BridgeError> {
    Ok(match classify(engine, word)? {
        Native::List | Native::Nil => Decoded::List,
        Native::Compound(did) => {
            let (name, arity) = did_info(engine, did)?;
            Decoded::Compound(name.into(), arity)
        }
        Native::Int(i) => Decoded::Int(i),
        Native::Atom(did) => {
            let (name, _) = did_info(engine, did)?;
            Decoded::Atom(name.into())
        }
        Native::Str => Decoded::Str(
            engine
                .get_string(word)
                .ok_or(BridgeError::UnknownTermType)?
                .into(),
        ),
        Native::Float(r) => Decoded::Float(r),
        Native::Var => Decoded::Var,
    })
}

impl<E: Engine> Bridge<E> {
    /// Converts a native word into a host term.
    ///
    /// Integers, floats and strings are copied out.  Lists (including nil),
    /// compounds, atoms and variables get a fresh reference holding `word`,
    /// so the returned term stays valid across later resumes.
    pub(crate) fn decode(&mut self, word: E::Word) -> Result<Term, BridgeError> {
        let decoded = read(self.engine()?, word)?;
        Ok(match decoded {
            Decoded::Int(i) => Term::Int(i),
            Decoded::Float(r) => Term::Float(r),
            Decoded::Str(s) => Term::Str(s),
            Decoded::List => Term::List(List {
                reference: self.register(word)?,
            }),
            Decoded::Compound(functor, arity) => Term::Compound(Compound {
                functor,
                arity,
                reference: self.register(word)?,
            }),
            Decoded::Atom(name) => Term::Atom(Atom {
                name,
                reference: self.register(word)?,
            }),
            Decoded::Var => Term::Var(Var {
                reference: self.register(word)?,
            }),
        })
    }
}
