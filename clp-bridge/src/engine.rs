//! Defines the [`Engine`] trait, the native boundary of the bridge.
//!
//! Every primitive the bridge needs from an embedded engine is a method of
//! [`Engine`].  The method set follows the classic embedding interface of
//! constraint logic engines: posting goals, resuming with one or two
//! arguments, cutting to a choice point, engine-side references that keep a
//! term alive across resumes, and a family of constructors and
//! deconstructors for native term words.
//!
//! Native words ([`Engine::Word`]) are only valid until the next resume.
//! Anything that must survive a resume lives in a reference
//! ([`Engine::Ref`]), and the bridge owns all references through its
//! [`Registry`](crate::Registry).

use crate::{BridgeError, EngineOption};
use core::fmt;
use std::cmp::Ordering;

/// Native status codes returned by `init`, `cleanup` and the resume calls.
pub mod code {
    /// The goal succeeded (also: a lifecycle call completed).
    pub const SUCCEED: i32 = 0;
    /// The goal failed.
    pub const FAIL: i32 = 1;
    /// The goal raised an uncaught exception.
    pub const THROW: i32 = 2;
    /// The engine yielded a value to the host.
    pub const YIELD: i32 = 4;
    /// The engine is still running (asynchronous mode only).
    pub const RUNNING: i32 = 5;
    /// The engine is waiting for input on a queue stream.
    pub const WAITIO: i32 = 6;
    /// The engine has flushed output to a queue stream.
    pub const FLUSHIO: i32 = 7;
}

/// Value of the [`EngineOption::Io`] option selecting memory queues for the
/// standard streams.
pub const MEMORY_IO: i64 = 1;

/// Numeric identifier of an engine stream.
pub type StreamId = i32;

/// A host function callable from the engine.
///
/// The callback receives the engine and the argument words of the call.
/// `Ok(true)` succeeds, `Ok(false)` fails and `Err` aborts the running goal
/// after the message has been flushed to the error stream.
pub type HostCallback<E> =
    Box<dyn FnMut(&mut E, &[<E as Engine>::Word]) -> Result<bool, std::string::String>>;

/// Primitive operations of an embedded logic engine.
///
/// Methods returning `i32` report native status codes (see [`code`]); the
/// bridge interprets them.  Inspection methods dereference bound variables
/// before looking at a word and return `None` when the word is not of the
/// requested kind.
pub trait Engine: Sized + 'static {
    /// A native term word.
    type Word: Copy + fmt::Debug;
    /// A native reference, keeping one term alive across resumes.
    type Ref: fmt::Debug;
    /// A dictionary entry (functor or atom name plus arity).
    type Did: Copy + fmt::Debug;

    // ---- options and lifecycle ----

    /// Sets an integer option; must precede [`Engine::init`].
    fn set_option_int(&mut self, option: EngineOption, value: i64) -> i32;

    /// Sets a string option; must precede [`Engine::init`].
    fn set_option_str(&mut self, option: EngineOption, value: &str) -> i32;

    /// Initializes the engine.
    fn init(&mut self) -> i32;

    /// Tears the engine down.  All references must be destroyed first.
    fn cleanup(&mut self) -> i32;

    // ---- execution ----

    /// Adds a goal to the current query.
    fn post_goal(&mut self, goal: Self::Word);

    /// Resumes execution; the outcome payload is stored into `to`.
    fn resume1(&mut self, to: &Self::Ref) -> i32;

    /// Resumes execution passing `input` back to the engine; the outcome
    /// payload is stored into `to`.
    fn resume2(&mut self, input: Self::Word, to: &Self::Ref) -> i32;

    /// Discards the choice points created by the last successful resume,
    /// identified by the marker the resume stored into `chp`.
    fn cut_to_chp(&mut self, chp: &Self::Ref);

    // ---- references ----

    /// Creates a reference holding `word`.
    fn ref_create(&mut self, word: Self::Word) -> Self::Ref;

    /// Creates a reference holding a fresh unbound variable.
    fn ref_create_newvar(&mut self) -> Self::Ref;

    /// Releases a reference.
    fn ref_destroy(&mut self, r: Self::Ref);

    /// Returns the word currently held by a reference.
    fn ref_get(&self, r: &Self::Ref) -> Self::Word;

    /// Replaces the word held by a reference.
    fn ref_set(&mut self, r: &Self::Ref, word: Self::Word);

    // ---- dictionary ----

    /// Interns `name/arity` in the engine dictionary.
    fn did(&mut self, name: &str, arity: usize) -> Self::Did;

    /// Returns the name of a dictionary entry.
    fn did_name(&self, did: Self::Did) -> Option<&str>;

    /// Returns the arity of a dictionary entry.
    fn did_arity(&self, did: Self::Did) -> Option<usize>;

    // ---- construction ----

    fn atom(&mut self, did: Self::Did) -> Self::Word;
    fn string(&mut self, s: &str) -> Self::Word;
    fn long(&mut self, i: i64) -> Self::Word;
    fn double(&mut self, f: f64) -> Self::Word;
    fn nil(&mut self) -> Self::Word;
    fn list(&mut self, head: Self::Word, tail: Self::Word) -> Self::Word;
    fn term_array(&mut self, functor: Self::Did, args: &[Self::Word]) -> Self::Word;
    fn newvar(&mut self) -> Self::Word;

    // ---- inspection ----

    fn get_list(&self, word: Self::Word) -> Option<(Self::Word, Self::Word)>;
    fn get_functor(&self, word: Self::Word) -> Option<Self::Did>;
    /// Returns argument `n` (1-based) of a compound term.
    fn get_arg(&self, n: usize, word: Self::Word) -> Option<Self::Word>;
    fn get_long(&self, word: Self::Word) -> Option<i64>;
    fn is_nil(&self, word: Self::Word) -> bool;
    fn get_atom(&self, word: Self::Word) -> Option<Self::Did>;
    fn get_string(&self, word: Self::Word) -> Option<&str>;
    fn get_double(&self, word: Self::Word) -> Option<f64>;
    fn is_var(&self, word: Self::Word) -> bool;

    /// Compares two words in the engine's standard order of terms.
    fn compare(&self, a: Self::Word, b: Self::Word) -> Ordering;

    /// Unifies two words; returns `false` when they do not unify.
    fn unify(&mut self, a: Self::Word, b: Self::Word) -> bool;

    // ---- queue streams ----

    /// Looks up a stream by name.
    fn stream_nr(&self, name: &str) -> Option<StreamId>;

    /// Reads up to `buf.len()` bytes from a queue stream.
    fn queue_read(&mut self, stream: StreamId, buf: &mut [u8]) -> Result<usize, BridgeError>;

    /// Appends bytes to a queue stream.
    fn queue_write(&mut self, stream: StreamId, data: &[u8]) -> Result<usize, BridgeError>;

    /// Number of bytes waiting in a queue stream.
    fn queue_avail(&self, stream: StreamId) -> Result<usize, BridgeError>;

    // ---- host callbacks ----

    /// Makes `callback` callable from the engine under `name`.
    fn register_callback(&mut self, name: &str, callback: HostCallback<Self>);
}
