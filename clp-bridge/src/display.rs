//! Defines [`TermDisplay`], a formatter for rendering [`Term`] values.
//!
//! Provides a [`fmt::Display`] implementation producing the textual form of
//! terms: atoms by name, compounds as `f(a,b)`, lists as `[a,b]` or
//! `[a,b|T]`, unbound variables as `_`.

use crate::marshal::{Native, classify, did_info};
use crate::{Bridge, Engine, Term};
use std::fmt;

/// A wrapper that ties together a [`Term`] and the [`Bridge`] its
/// references live in.
///
/// It implements [`fmt::Display`], so it can be used with the standard
/// formatting macros.
///
/// ### Example
/// ```rust
/// use clp_bridge::{Bridge, LoopbackEngine, Term, compound};
/// let mut bridge = Bridge::new(LoopbackEngine::new());
/// assert!(!bridge.init());
/// let term = Term::from(compound!("foo"; 1, "hello, world!" => &mut bridge).unwrap());
///
/// assert_eq!(term.display(&bridge).to_string(), "foo(1,\"hello, world!\")");
/// ```
///
/// A term whose reference can no longer be resolved (engine torn down,
/// foreign bridge) fails to format with [`fmt::Error`].
pub struct TermDisplay<'a, E: Engine> {
    term: &'a Term,
    bridge: &'a Bridge<E>,
}

impl Term {
    /// Return a [`TermDisplay`] suitable for formatting with [`fmt::Display`].
    ///
    /// ```ignore
    /// println!("{}", term.display(&bridge));
    /// ```
    #[inline]
    pub fn display<'a, E: Engine>(&'a self, bridge: &'a Bridge<E>) -> TermDisplay<'a, E> {
        TermDisplay { term: self, bridge }
    }
}

fn write_str_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let mut out = String::new();
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    f.write_str(&out)
}

fn write_float(f: &mut fmt::Formatter<'_>, r: f64) -> fmt::Result {
    if r.fract() == 0.0 {
        write!(f, "{:.1}", r)
    } else {
        write!(f, "{}", r)
    }
}

/// Writes a native word.  Text is quoted only when it is an argument of a
/// compound term.
fn write_word<E: Engine>(
    f: &mut fmt::Formatter<'_>,
    engine: &E,
    word: E::Word,
    quote_text: bool,
) -> fmt::Result {
    match classify(engine, word).map_err(|_e| fmt::Error)? {
        Native::Int(i) => write!(f, "{i}"),
        Native::Float(r) => write_float(f, r),
        Native::Str => {
            let s = engine.get_string(word).ok_or(fmt::Error)?;
            if quote_text {
                write_str_quoted(f, s)
            } else {
                f.write_str(s)
            }
        }
        Native::Atom(did) => {
            let (name, _) = did_info(engine, did).map_err(|_e| fmt::Error)?;
            f.write_str(name)
        }
        Native::Var => f.write_str("_"),
        Native::Nil => f.write_str("[]"),
        Native::Compound(did) => {
            let (name, arity) = did_info(engine, did).map_err(|_e| fmt::Error)?;
            write!(f, "{name}(")?;
            for n in 1..=arity {
                if n > 1 {
                    f.write_str(",")?;
                }
                let arg = engine.get_arg(n, word).ok_or(fmt::Error)?;
                write_word(f, engine, arg, true)?;
            }
            f.write_str(")")
        }
        Native::List => {
            f.write_str("[")?;
            let mut cursor = word;
            let mut first = true;
            while let Some((head, tail)) = engine.get_list(cursor) {
                if !first {
                    f.write_str(",")?;
                }
                first = false;
                write_word(f, engine, head, false)?;
                cursor = tail;
            }
            if !engine.is_nil(cursor) {
                f.write_str("|")?;
                write_word(f, engine, cursor, false)?;
            }
            f.write_str("]")
        }
    }
}

/// Renders a native word as text, the way `write/2` prints it.
pub(crate) fn render_word<E: Engine>(engine: &E, word: E::Word) -> Option<String> {
    struct Rendered<'a, E: Engine>(&'a E, E::Word);

    impl<E: Engine> fmt::Display for Rendered<'_, E> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write_word(f, self.0, self.1, false)
        }
    }

    use fmt::Write;
    let mut out = String::new();
    write!(out, "{}", Rendered(engine, word)).ok()?;
    Some(out)
}

/// Implements [`fmt::Display`] for [`TermDisplay`], enabling it to be
/// formatted and printed with standard formatting macros.
impl<'a, E: Engine> fmt::Display for TermDisplay<'a, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.term {
            Term::Int(i) => write!(f, "{i}"),
            Term::Float(r) => write_float(f, *r),
            Term::Str(s) => f.write_str(s),
            Term::Atom(a) => f.write_str(a.name()),
            Term::Compound(_) | Term::List(_) | Term::Var(_) => {
                let reference = self.term.reference().ok_or(fmt::Error)?;
                let engine = self.bridge.engine().map_err(|_e| fmt::Error)?;
                let word = self.bridge.ref_word(reference).map_err(|_e| fmt::Error)?;
                write_word(f, engine, word, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Atom, Bridge, Compound, List, LoopbackEngine, Term, Var, compound, list};

    fn bridge() -> Bridge<LoopbackEngine> {
        let mut bridge = Bridge::new(LoopbackEngine::new());
        assert!(!bridge.init());
        bridge
    }

    #[test]
    fn scalars() {
        let b = bridge();
        assert_eq!(Term::Int(-3).display(&b).to_string(), "-3");
        assert_eq!(Term::Float(2.0).display(&b).to_string(), "2.0");
        assert_eq!(Term::Float(0.25).display(&b).to_string(), "0.25");
        assert_eq!(Term::Str("plain".into()).display(&b).to_string(), "plain");
    }

    #[test]
    fn atoms_and_compounds() {
        let mut b = bridge();
        let a = Term::from(Atom::new(&mut b, "hello").unwrap());
        assert_eq!(a.display(&b).to_string(), "hello");

        let c = Term::from(compound!("foo"; 1, "x", 2.5 => &mut b).unwrap());
        assert_eq!(c.display(&b).to_string(), "foo(1,\"x\",2.5)");

        let inner = Compound::new(&mut b, "g", ["a\"b"]).unwrap();
        let outer = Term::from(Compound::new(&mut b, "f", [inner]).unwrap());
        assert_eq!(outer.display(&b).to_string(), "f(g(\"a\\\"b\"))");
    }

    #[test]
    fn lists() {
        let mut b = bridge();
        let l = Term::from(List::new(&mut b, [1, 2, 3]).unwrap());
        assert_eq!(l.display(&b).to_string(), "[1,2,3]");

        let empty = Term::from(List::nil(&mut b).unwrap());
        assert_eq!(empty.display(&b).to_string(), "[]");

        let improper = Term::from(List::with_tail(&mut b, [1, 2], 3).unwrap());
        assert_eq!(improper.display(&b).to_string(), "[1,2|3]");

        let text = Term::from(list!["a", 1.0 => &mut b].unwrap());
        assert_eq!(text.display(&b).to_string(), "[a,1.0]");
    }

    #[test]
    fn variables() {
        let mut b = bridge();
        let v = Term::from(Var::new(&mut b).unwrap());
        assert_eq!(v.display(&b).to_string(), "_");
        let c = Term::from(compound!("p"; v.clone(), 1 => &mut b).unwrap());
        assert_eq!(c.display(&b).to_string(), "p(_,1)");
    }
}
