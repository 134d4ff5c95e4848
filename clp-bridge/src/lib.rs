//! # CLP Bridge
//!
//! Host-side embedding of a constraint logic programming engine.
//!
//! The engine is reached through the [`Engine`] trait, which lists the
//! primitives of a classic embedding interface: options, init / cleanup,
//! posting goals, resuming, cutting, engine-side references, and
//! construction and inspection of native term words.  On top of it a
//! [`Bridge`] provides:
//!
//! - a host [`Term`] model whose atoms, compounds, lists and variables own
//!   engine-side references tracked by a [`Registry`], so they survive
//!   resumes and even engine re-initialization,
//! - marshalling of native words into terms,
//! - the resume protocol ([`Outcome`], [`ResumeState`]) with `cut`,
//!   yields and queue-stream I/O ([`Stream`]).
//!
//! [`LoopbackEngine`] is an in-process engine implementing the trait.
//!
//! ## Example
//! ```rust
//! # use clp_bridge::{Bridge, LoopbackEngine, Outcome, Term, Var, compound};
//! let mut bridge = Bridge::new(LoopbackEngine::new());
//! assert!(!bridge.init()); // `false` means success
//!
//! // X = point(1, 2.5, "label")
//! let x = Var::new(&mut bridge).unwrap();
//! let p = compound!("point"; 1, 2.5, "label" => &mut bridge).unwrap();
//! let goal = compound!("="; x.clone(), p => &mut bridge).unwrap();
//! bridge.post_goal(goal).unwrap();
//!
//! let (outcome, payload) = bridge.resume(None).unwrap();
//! assert_eq!(outcome, Outcome::Succeeded);
//! assert!(payload.is_none());
//!
//! let value = x.value(&mut bridge).unwrap().unwrap();
//! assert_eq!(value.display(&bridge).to_string(), "point(1,2.5,\"label\")");
//! ```
//!
//! ## License
//!
//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0 or
//! (at your option) any later version (LGPL-3.0-or-later).

mod bridge;
mod display;
mod engine;
mod error;
mod loopback;
mod marshal;
mod options;
mod registry;
mod resume;
mod stream;
mod term;

pub use bridge::Bridge;
pub use display::TermDisplay;
pub use engine::{Engine, HostCallback, MEMORY_IO, StreamId, code};
pub(crate) use error::InternalRegistryError;
pub use error::BridgeError;
pub use loopback::{Did, LoopbackEngine, LoopbackRef, Word};
pub use marshal::{Native, classify};
pub use options::{EngineConfig, EngineOption, OptionType, OptionValue};
pub use registry::{RefId, Reference, Registry, RegistryID, RegistryStats};
pub use resume::{Outcome, ResumeMachine, ResumeState};
pub use stream::Stream;
pub use term::{ArgIter, Atom, Compound, IntoTerm, List, ListIter, ListPairs, Term, Var};
