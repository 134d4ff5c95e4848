//! Defines [`Bridge`], the owner of an embedded engine and of every
//! reference the host holds into it.

use crate::engine::MEMORY_IO;
use crate::{
    BridgeError, Engine, EngineConfig, EngineOption, IntoTerm, List, OptionType, OptionValue,
    Outcome, Reference, Registry, RegistryID, RegistryStats, ResumeMachine, ResumeState, Stream,
    StreamId, Term, Var, code,
};

/// Slot count below which registration never triggers a reap.
const MIN_REAP_THRESHOLD: usize = 256;

/// An embedded engine together with the host-side bookkeeping needed to talk
/// to it.
///
/// The bridge owns:
/// - the engine itself,
/// - the [`Registry`] of native references owned by host terms,
/// - the *transfer variable*, the fixed channel through which every resume
///   reports its payload (cut marker, yielded value, stream id),
/// - the [`ResumeMachine`] tracking the outcome of the last resume.
///
/// ### Lifecycle
/// A bridge starts uninitialized.  Options are set with
/// [`Bridge::set_option`] or [`Bridge::configure`], then [`Bridge::init`]
/// starts the engine.  [`Bridge::cleanup`] tears it down again; terms
/// created before survive as registry entries and come back as fresh
/// unbound variables after the next `init`.  Dropping an initialized bridge
/// cleans it up.
///
/// `init` and `cleanup` return `false` on success and `true` on failure.
///
/// ### Resuming
/// Goals are posted with [`Bridge::post_goal`] and run by
/// [`Bridge::resume`].  After a [`Outcome::FlushIO`] or [`Outcome::WaitIO`]
/// the caller drains or fills the stream and resumes again before building
/// new terms or posting goals.
pub struct Bridge<E: Engine> {
    pub(crate) engine: E,
    pub(crate) registry: Registry<E::Ref>,
    transfer: Option<Var>,
    machine: ResumeMachine,
    initialized: bool,
    reap_at: usize,
}

impl<E: Engine> Bridge<E> {
    /// Wraps an uninitialized engine.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            registry: Registry::new(),
            transfer: None,
            machine: ResumeMachine::new(),
            initialized: false,
            reap_at: MIN_REAP_THRESHOLD,
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the engine, provided it is initialized.
    #[inline]
    pub fn engine(&self) -> Result<&E, BridgeError> {
        self.ensure_initialized()?;
        Ok(&self.engine)
    }

    /// Returns the engine mutably, provided it is initialized.
    #[inline]
    pub fn engine_mut(&mut self) -> Result<&mut E, BridgeError> {
        self.ensure_initialized()?;
        Ok(&mut self.engine)
    }

    #[inline]
    fn ensure_initialized(&self) -> Result<(), BridgeError> {
        if self.initialized {
            Ok(())
        } else {
            Err(BridgeError::NotInitialized)
        }
    }

    /// Sets an engine option.  Only the sizing options and the installation
    /// directory are accepted, and only before [`Bridge::init`].
    pub fn set_option(&mut self, id: i32, value: impl Into<OptionValue>) -> Result<(), BridgeError> {
        let option = EngineOption::try_from(id)?;
        let expected = option.settable().ok_or(BridgeError::UnsupportedOption(id))?;
        let value = value.into();
        if value.kind() != expected {
            return Err(BridgeError::InvalidOptionType {
                option: option.name(),
                expected: match expected {
                    OptionType::Int => "integer",
                    OptionType::Str => "string",
                },
            });
        }
        if self.initialized {
            return Err(BridgeError::AlreadyInitialized);
        }
        let code = match &value {
            OptionValue::Int(i) => self.engine.set_option_int(option, *i),
            OptionValue::Str(s) => self.engine.set_option_str(option, s),
        };
        if code != code::SUCCEED {
            return Err(BridgeError::OptionRejected {
                option: option.name(),
                code,
            });
        }
        log::debug!("option {} = {:?}", option.name(), value);
        Ok(())
    }

    /// Applies every option of `config`.
    pub fn configure(&mut self, config: &EngineConfig) -> Result<(), BridgeError> {
        for (option, value) in config.options() {
            self.set_option(option.code(), value)?;
        }
        Ok(())
    }

    /// Initializes the engine.  Returns `false` on success.
    ///
    /// Selects memory queues for the standard streams, starts the engine,
    /// gives every live reference a fresh native handle and allocates the
    /// transfer variable on first use.
    pub fn init(&mut self) -> bool {
        if self.initialized {
            log::warn!("init: engine already initialized");
            return true;
        }
        let code = self.engine.set_option_int(EngineOption::Io, MEMORY_IO);
        if code != code::SUCCEED {
            log::warn!("init: engine refused memory I/O (code {code})");
        }
        let code = self.engine.init();
        if code != code::SUCCEED {
            log::warn!("init: engine initialization failed (code {code})");
            return true;
        }
        self.initialized = true;
        self.reap();
        let engine = &mut self.engine;
        let recreated = self.registry.recreate_all(|| engine.ref_create_newvar());
        if self.transfer.is_none() {
            match Var::new(self) {
                Ok(var) => self.transfer = Some(var),
                Err(e) => {
                    log::error!("init: cannot allocate the transfer variable: {e}");
                    self.cleanup();
                    return true;
                }
            }
        }
        log::debug!(
            "init: registry {:?}, {} references recreated",
            self.registry.id(),
            recreated
        );
        false
    }

    /// Tears the engine down.  Returns `false` on success.
    ///
    /// Every native reference is released first; the slots stay registered
    /// so [`Bridge::init`] can recreate them.
    pub fn cleanup(&mut self) -> bool {
        if !self.initialized {
            log::warn!("cleanup: engine not initialized");
            return true;
        }
        for handle in self.registry.invalidate_all() {
            self.engine.ref_destroy(handle);
        }
        self.machine.reset();
        self.initialized = false;
        let code = self.engine.cleanup();
        if code != code::SUCCEED {
            log::warn!("cleanup: engine teardown failed (code {code})");
        }
        log::debug!("cleanup: registry {:?}", self.registry.id());
        code != code::SUCCEED
    }

    /// Adds `goal` to the current query.  It runs on the next resume.
    pub fn post_goal(&mut self, goal: impl IntoTerm) -> Result<(), BridgeError> {
        self.ensure_initialized()?;
        let word = goal.into_word(self)?;
        self.engine.post_goal(word);
        Ok(())
    }

    /// Runs the engine until it hands control back.
    ///
    /// `input` is passed back to a pending `yield`.  Flush, wait and yield
    /// outcomes carry the value of the transfer variable; success and
    /// failure carry nothing.
    pub fn resume(&mut self, input: Option<&Term>) -> Result<(Outcome, Option<Term>), BridgeError> {
        self.ensure_initialized()?;
        self.reap();
        let input = match input {
            Some(term) => Some(term.into_word(self)?),
            None => None,
        };
        let transfer = self.transfer.clone().ok_or(BridgeError::NotInitialized)?;
        let registry_id = self.registry.id();
        let handle = self
            .registry
            .handle(&transfer.reference)
            .map_err(|e| e.into_bridge_error(registry_id))?;

        self.machine.begin();
        let code = match input {
            Some(word) => self.engine.resume2(word, handle),
            None => self.engine.resume1(handle),
        };
        log::trace!("resume: native code {code}");
        let outcome = self.machine.finish(code)?;
        if !outcome.has_payload() {
            return Ok((outcome, None));
        }
        let word = self.ref_word(&transfer.reference)?;
        let payload = self.decode(word)?;
        Ok((outcome, Some(payload)))
    }

    /// Discards the choice points left by the last resume.  Only legal right
    /// after a resume that succeeded.
    pub fn cut(&mut self) -> Result<(), BridgeError> {
        self.machine.check_cut()?;
        self.ensure_initialized()?;
        let transfer = self.transfer.clone().ok_or(BridgeError::NotInitialized)?;
        let registry_id = self.registry.id();
        let handle = self
            .registry
            .handle(&transfer.reference)
            .map_err(|e| e.into_bridge_error(registry_id))?;
        self.engine.cut_to_chp(handle);
        Ok(())
    }

    /// Outcome of the last completed resume.
    #[inline]
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.machine.last_outcome()
    }

    #[inline]
    pub fn state(&self) -> ResumeState {
        self.machine.state()
    }

    /// The transfer variable, once the engine has been initialized.
    #[inline]
    pub fn transfer(&self) -> Option<&Var> {
        self.transfer.as_ref()
    }

    /// Makes `callback` callable from goals under `name`.
    pub fn register_function<F>(&mut self, name: &str, callback: F)
    where
        F: FnMut(&mut E, &[E::Word]) -> Result<bool, std::string::String> + 'static,
    {
        log::debug!("registering host function {name}");
        self.engine.register_callback(name, Box::new(callback));
    }

    /// Converts a host value into a term.
    pub fn term(&mut self, value: impl IntoTerm) -> Result<Term, BridgeError> {
        let word = value.into_word(self)?;
        self.decode(word)
    }

    /// Opens the named queue stream.
    pub fn stream(&mut self, name: &str) -> Result<Stream<'_, E>, BridgeError> {
        let id = self
            .engine()?
            .stream_nr(name)
            .ok_or_else(|| BridgeError::StreamNotFound(name.into()))?;
        Ok(Stream::new(self, id))
    }

    /// Opens a queue stream by id, e.g. the id carried by a flush or wait
    /// outcome.
    pub fn stream_by_id(&mut self, id: StreamId) -> Result<Stream<'_, E>, BridgeError> {
        self.engine()?.queue_avail(id)?;
        Ok(Stream::new(self, id))
    }

    /// Releases the native references of dropped terms.  Returns how many
    /// were released.
    pub fn collect(&mut self) -> usize {
        self.reap()
    }

    /// Number of registered references whose owner is alive.
    pub fn live_references(&self) -> usize {
        self.registry.stats().live
    }

    pub fn registry_stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    #[inline]
    pub fn registry_id(&self) -> RegistryID {
        self.registry.id()
    }

    fn reap(&mut self) -> usize {
        let released = self.registry.reap();
        let n = released.len();
        for handle in released {
            self.engine.ref_destroy(handle);
        }
        n
    }

    /// Creates a native reference holding `word` and registers it.
    pub(crate) fn register(&mut self, word: E::Word) -> Result<Reference, BridgeError> {
        self.ensure_initialized()?;
        self.reap_if_crowded();
        let handle = self.engine.ref_create(word);
        Ok(self.registry.register(handle))
    }

    /// Creates a native reference holding a fresh variable and registers it.
    pub(crate) fn register_newvar(&mut self) -> Result<Reference, BridgeError> {
        self.ensure_initialized()?;
        self.reap_if_crowded();
        let handle = self.engine.ref_create_newvar();
        Ok(self.registry.register(handle))
    }

    fn reap_if_crowded(&mut self) {
        if self.registry.slots.len() < self.reap_at || !self.registry.free.is_empty() {
            return;
        }
        self.reap();
        self.reap_at = MIN_REAP_THRESHOLD.max(2 * self.registry.stats().live);
    }

    /// Returns the word a reference currently holds.
    pub(crate) fn ref_word(&self, r: &Reference) -> Result<E::Word, BridgeError> {
        self.ensure_initialized()?;
        let handle = self
            .registry
            .handle(r)
            .map_err(|e| e.into_bridge_error(self.registry.id()))?;
        Ok(self.engine.ref_get(handle))
    }

    /// Conses `items` right-to-left onto `tail` (nil when `None`).
    #[doc(hidden)]
    pub fn cons_words(
        &mut self,
        items: &[E::Word],
        tail: Option<E::Word>,
    ) -> Result<E::Word, BridgeError> {
        let engine = self.engine_mut()?;
        let mut acc = match tail {
            Some(tail) => tail,
            None => engine.nil(),
        };
        for &word in items.iter().rev() {
            acc = engine.list(word, acc);
        }
        Ok(acc)
    }

    #[doc(hidden)]
    pub fn list_from_word(&mut self, word: E::Word) -> Result<List, BridgeError> {
        Ok(List {
            reference: self.register(word)?,
        })
    }
}

impl<E: Engine> Drop for Bridge<E> {
    fn drop(&mut self) {
        if self.initialized {
            self.cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Atom, Compound, LoopbackEngine, compound, list};
    use std::fmt::Write as _;
    use std::io::{Read, Write};

    fn bridge() -> Bridge<LoopbackEngine> {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut bridge = Bridge::new(LoopbackEngine::new());
        assert!(!bridge.init());
        bridge
    }

    fn goal(b: &mut Bridge<LoopbackEngine>, name: &str) -> Term {
        Term::from(Atom::new(b, name).unwrap())
    }

    #[test]
    fn lifecycle_polarity() {
        let mut b = Bridge::new(LoopbackEngine::new());
        assert!(!b.is_initialized());
        assert!(b.cleanup());
        assert!(!b.init());
        assert!(b.is_initialized());
        assert!(b.init());
        assert!(b.transfer().is_some());
        assert!(!b.cleanup());
        assert!(b.cleanup());
        assert!(!b.init());
    }

    #[test]
    fn failed_init_leaves_the_bridge_uninitialized() {
        let mut b = Bridge::new(LoopbackEngine::new());
        // an engine that is already running refuses a second init
        assert_eq!(b.engine.init(), code::SUCCEED);
        assert!(b.init());
        assert!(!b.is_initialized());
        assert!(b.transfer().is_none());
        assert!(matches!(Var::new(&mut b), Err(BridgeError::NotInitialized)));

        assert_eq!(b.engine.cleanup(), code::SUCCEED);
        assert!(!b.init());
        assert!(b.is_initialized());
        assert!(b.transfer().is_some());
    }

    #[test]
    fn terms_need_an_initialized_engine() {
        let mut b = Bridge::new(LoopbackEngine::new());
        assert_eq!(Atom::new(&mut b, "a").unwrap_err(), BridgeError::NotInitialized);
        assert_eq!(b.term(1).unwrap_err(), BridgeError::NotInitialized);
        assert_eq!(b.post_goal(1).unwrap_err(), BridgeError::NotInitialized);
        assert_eq!(b.resume(None).unwrap_err(), BridgeError::NotInitialized);
    }

    #[test]
    fn options() {
        let mut b = Bridge::new(LoopbackEngine::new());
        b.set_option(EngineOption::LocalSize.code(), 1 << 20).unwrap();
        b.set_option(EngineOption::EclipseDir.code(), "/opt/eclipse").unwrap();
        assert_eq!(
            b.set_option(99, 1),
            Err(BridgeError::UnsupportedOption(99))
        );
        assert_eq!(
            b.set_option(EngineOption::Io.code(), 1),
            Err(BridgeError::UnsupportedOption(EngineOption::Io.code()))
        );
        assert!(matches!(
            b.set_option(EngineOption::GlobalSize.code(), "big"),
            Err(BridgeError::InvalidOptionType { .. })
        ));
        assert!(matches!(
            b.set_option(EngineOption::EclipseDir.code(), 7),
            Err(BridgeError::InvalidOptionType { .. })
        ));
        assert!(matches!(
            b.set_option(EngineOption::SharedSize.code(), -5),
            Err(BridgeError::OptionRejected { code: 1, .. })
        ));
        assert!(!b.init());
        assert_eq!(
            b.engine().unwrap().option(EngineOption::LocalSize),
            Some(&OptionValue::Int(1 << 20))
        );
        assert_eq!(
            b.engine().unwrap().option(EngineOption::Io),
            Some(&OptionValue::Int(MEMORY_IO))
        );
        assert_eq!(
            b.set_option(EngineOption::LocalSize.code(), 1),
            Err(BridgeError::AlreadyInitialized)
        );
    }

    #[test]
    fn configure_from_config() {
        let mut b = Bridge::new(LoopbackEngine::new());
        let config = EngineConfig {
            global_size: Some(4096),
            ..Default::default()
        };
        b.configure(&config).unwrap();
        assert!(!b.init());
        assert_eq!(
            b.engine().unwrap().option(EngineOption::GlobalSize),
            Some(&OptionValue::Int(4096))
        );
    }

    #[test]
    fn succeed_and_fail() {
        let mut b = bridge();
        let x = Var::new(&mut b).unwrap();
        let foo = compound!("foo"; 1 => &mut b).unwrap();
        let g = compound!("="; x.clone(), foo => &mut b).unwrap();
        b.post_goal(g).unwrap();
        let (outcome, payload) = b.resume(None).unwrap();
        assert_eq!(outcome, Outcome::Succeeded);
        assert!(payload.is_none());
        assert_eq!(b.last_outcome(), Some(Outcome::Succeeded));
        assert_eq!(b.state(), ResumeState::Done(Outcome::Succeeded));
        let value = x.value(&mut b).unwrap().unwrap();
        assert_eq!(value.display(&b).to_string(), "foo(1)");

        let fail = goal(&mut b, "fail");
        b.post_goal(fail).unwrap();
        let (outcome, payload) = b.resume(None).unwrap();
        assert_eq!(outcome, Outcome::Failed);
        assert!(payload.is_none());
        assert!(x.value(&mut b).unwrap().is_none());
    }

    #[test]
    fn cut_requires_success() {
        let mut b = bridge();
        assert_eq!(b.cut(), Err(BridgeError::IllegalCutState(None)));
        let fail = goal(&mut b, "fail");
        b.post_goal(fail).unwrap();
        b.resume(None).unwrap();
        assert_eq!(
            b.cut(),
            Err(BridgeError::IllegalCutState(Some(Outcome::Failed)))
        );
    }

    fn post_choice(b: &mut Bridge<LoopbackEngine>) -> Var {
        let x = Var::new(b).unwrap();
        let one = compound!("="; x.clone(), 1 => &mut *b).unwrap();
        let two = compound!("="; x.clone(), 2 => &mut *b).unwrap();
        let or = Compound::new(b, ";", [one, two]).unwrap();
        b.post_goal(or).unwrap();
        x
    }

    #[test]
    fn backtracking_without_cut() {
        let mut b = bridge();
        let x = post_choice(&mut b);
        assert_eq!(b.resume(None).unwrap().0, Outcome::Succeeded);
        assert_eq!(x.value(&mut b).unwrap().unwrap().as_int(), Some(1));
        let fail = goal(&mut b, "fail");
        b.post_goal(fail.clone()).unwrap();
        assert_eq!(b.resume(None).unwrap().0, Outcome::Succeeded);
        assert_eq!(x.value(&mut b).unwrap().unwrap().as_int(), Some(2));
        b.post_goal(fail).unwrap();
        assert_eq!(b.resume(None).unwrap().0, Outcome::Failed);
    }

    #[test]
    fn cut_prevents_backtracking() {
        let mut b = bridge();
        let x = post_choice(&mut b);
        assert_eq!(b.resume(None).unwrap().0, Outcome::Succeeded);
        b.cut().unwrap();
        assert_eq!(x.value(&mut b).unwrap().unwrap().as_int(), Some(1));
        let fail = goal(&mut b, "fail");
        b.post_goal(fail).unwrap();
        assert_eq!(b.resume(None).unwrap().0, Outcome::Failed);
    }

    #[test]
    fn yield_round_trip() {
        let mut b = bridge();
        let input = Var::new(&mut b).unwrap();
        let g = compound!("yield"; "ping", input.clone() => &mut b).unwrap();
        b.post_goal(g).unwrap();
        let (outcome, payload) = b.resume(None).unwrap();
        assert_eq!(outcome, Outcome::Yielded);
        assert_eq!(payload.unwrap().as_str(), Some("ping"));
        assert!(input.value(&mut b).unwrap().is_none());

        let reply = Term::Int(5);
        let (outcome, payload) = b.resume(Some(&reply)).unwrap();
        assert_eq!(outcome, Outcome::Succeeded);
        assert!(payload.is_none());
        assert_eq!(input.value(&mut b).unwrap().unwrap().as_int(), Some(5));
    }

    #[test]
    fn throw_is_unrecognized() {
        let mut b = bridge();
        let g = compound!("throw"; "ball" => &mut b).unwrap();
        b.post_goal(g).unwrap();
        let err = b.resume(None).unwrap_err();
        assert_eq!(err, BridgeError::UnrecognizedResumeResult(code::THROW));
        assert!(err.is_fatal());
        assert_eq!(b.state(), ResumeState::Idle);
        assert_eq!(b.last_outcome(), None);
    }

    #[test]
    fn flush_and_wait() {
        let mut b = bridge();
        let x = Var::new(&mut b).unwrap();
        let input = Atom::new(&mut b, "input").unwrap();
        let output = Atom::new(&mut b, "output").unwrap();
        let read = compound!("read_string"; input, x.clone() => &mut b).unwrap();
        let write = compound!("writeln"; output.clone(), x.clone() => &mut b).unwrap();
        let flush = compound!("flush"; output => &mut b).unwrap();
        b.post_goal(read).unwrap();
        b.post_goal(write).unwrap();
        b.post_goal(flush).unwrap();

        let (outcome, payload) = b.resume(None).unwrap();
        assert_eq!(outcome, Outcome::WaitIO);
        let id = payload.unwrap().as_int().unwrap() as StreamId;
        assert_eq!(id, LoopbackEngine::INPUT);
        b.stream_by_id(id).unwrap().write_all(b"hi there").unwrap();

        let (outcome, payload) = b.resume(None).unwrap();
        assert_eq!(outcome, Outcome::FlushIO);
        let id = payload.unwrap().as_int().unwrap() as StreamId;
        let mut text = std::string::String::new();
        b.stream_by_id(id).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "hi there\n");

        assert_eq!(b.resume(None).unwrap().0, Outcome::Succeeded);
        assert_eq!(x.value(&mut b).unwrap().unwrap().as_str(), Some("hi there"));
    }

    #[test]
    fn host_functions() {
        let mut b = bridge();
        b.register_function("twice", |e: &mut LoopbackEngine, args| {
            let n = e.get_long(args[0]).ok_or("twice/2: integer expected")?;
            let out = e.long(2 * n);
            Ok(e.unify(args[1], out))
        });
        let x = Var::new(&mut b).unwrap();
        let g = compound!("twice"; 21, x.clone() => &mut b).unwrap();
        b.post_goal(g).unwrap();
        assert_eq!(b.resume(None).unwrap().0, Outcome::Succeeded);
        assert_eq!(x.value(&mut b).unwrap().unwrap().as_int(), Some(42));

        // a callback error is flushed to the error stream, then the query fails
        let g = compound!("twice"; "x", x.clone() => &mut b).unwrap();
        b.post_goal(g).unwrap();
        let (outcome, payload) = b.resume(None).unwrap();
        assert_eq!(outcome, Outcome::FlushIO);
        let id = payload.unwrap().as_int().unwrap() as StreamId;
        assert_eq!(id, LoopbackEngine::ERROR);
        let message = b.stream_by_id(id).unwrap().read_all().unwrap();
        assert_eq!(message, b"twice/2: integer expected\n");
        assert_eq!(b.resume(None).unwrap().0, Outcome::Failed);
    }

    #[test]
    fn callback_through_argument_list() {
        let mut b = bridge();
        b.register_function("echo", |e: &mut LoopbackEngine, args| {
            let [x, y] = args else {
                return Err("echo/2: two arguments expected".into());
            };
            Ok(e.unify(*x, *y))
        });
        let v = Var::new(&mut b).unwrap();
        let echo = Atom::new(&mut b, "echo").unwrap();
        let args = list![1, v.clone() => &mut b].unwrap();
        let g = compound!("call_python_function"; echo, args => &mut b).unwrap();
        b.post_goal(g).unwrap();
        assert_eq!(b.resume(None).unwrap().0, Outcome::Succeeded);
        assert_eq!(v.value(&mut b).unwrap().unwrap().as_int(), Some(1));
    }

    #[test]
    fn unknown_goal_reports_on_error_stream() {
        let mut b = bridge();
        let g = compound!("frobnicate"; 1 => &mut b).unwrap();
        b.post_goal(g).unwrap();
        let (outcome, _) = b.resume(None).unwrap();
        assert_eq!(outcome, Outcome::FlushIO);
        let message = b.stream("error").unwrap().read_all().unwrap();
        assert_eq!(
            std::string::String::from_utf8(message).unwrap(),
            "calling an undefined procedure frobnicate/1\n"
        );
        assert_eq!(b.resume(None).unwrap().0, Outcome::Failed);
    }

    #[test]
    fn dropped_terms_are_reaped() {
        let mut b = bridge();
        let base = b.live_references();
        let keep = Atom::new(&mut b, "keep").unwrap();
        let atoms: Vec<Atom> = (0..10)
            .map(|i| Atom::new(&mut b, format!("a{i}")).unwrap())
            .collect();
        assert_eq!(b.live_references(), base + 11);
        let engine_refs = b.engine().unwrap().ref_count();
        drop(atoms);
        assert_eq!(b.live_references(), base + 1);
        assert_eq!(b.collect(), 10);
        assert_eq!(b.engine().unwrap().ref_count(), engine_refs - 10);
        assert_eq!(b.collect(), 0);
        assert_eq!(keep.name(), "keep");
    }

    #[test]
    fn clones_share_a_reference() {
        let mut b = bridge();
        let a = Atom::new(&mut b, "a").unwrap();
        let a2 = a.clone();
        assert!(a.reference().same_slot(a2.reference()));
        let before = b.live_references();
        drop(a);
        b.collect();
        assert_eq!(b.live_references(), before);
        assert_eq!(Term::from(a2).display(&b).to_string(), "a");
    }

    #[test]
    fn foreign_reference() {
        let mut b1 = bridge();
        let mut b2 = bridge();
        if b1.registry_id() == b2.registry_id() {
            return;
        }
        let a = Term::from(Atom::new(&mut b1, "a").unwrap());
        let err = b2.post_goal(&a).unwrap_err();
        assert_eq!(
            err,
            BridgeError::ForeignReference {
                expected: b2.registry_id(),
                found: b1.registry_id(),
            }
        );
    }

    #[test]
    fn terms_survive_reinitialization() {
        let mut b = bridge();
        let c = Term::from(compound!("foo"; 1, 2 => &mut b).unwrap());
        let v = Var::new(&mut b).unwrap();
        let live = b.live_references();
        assert!(!b.cleanup());
        assert_eq!(b.registry_stats().valid, 0);
        assert_eq!(b.live_references(), live);
        assert_eq!(v.value(&mut b).unwrap_err(), BridgeError::NotInitialized);
        let mut text = std::string::String::new();
        assert!(write!(text, "{}", c.display(&b)).is_err());

        assert!(!b.init());
        assert_eq!(b.registry_stats().valid, live);
        // the old value is gone, the reference holds a fresh variable
        assert_eq!(c.display(&b).to_string(), "_");
        assert!(v.value(&mut b).unwrap().is_none());
    }

    #[test]
    fn resume_leaves_done_through_idle() {
        let mut b = bridge();
        assert_eq!(b.state(), ResumeState::Idle);
        let t = goal(&mut b, "true");
        b.post_goal(t).unwrap();
        b.resume(None).unwrap();
        assert_eq!(b.state(), ResumeState::Done(Outcome::Succeeded));
        assert!(!b.cleanup());
        assert_eq!(b.state(), ResumeState::Idle);
        assert_eq!(b.cut(), Err(BridgeError::IllegalCutState(None)));
    }
}
