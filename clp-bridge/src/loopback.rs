//! Defines [`LoopbackEngine`], a small in-process [`Engine`].
//!
//! The loopback engine keeps its terms on a heap of cells addressed by
//! [`Word`] indices, binds variables through a trail, and runs posted goals
//! depth-first with choice points.  It understands a handful of builtins:
//!
//! | goal                   | effect                                               |
//! |------------------------|------------------------------------------------------|
//! | `true`, `fail`, `false`| succeed / fail                                       |
//! | `(A, B)`, `(A ; B)`    | conjunction / disjunction (leaves a choice point)    |
//! | `X = Y`                | unification                                          |
//! | `throw(Ball)`          | aborts the query with the native throw code          |
//! | `yield(Out, In)`       | hands `Out` to the host, binds `In` on resume        |
//! | `write(S, T)`          | appends the text of `T` to queue stream `S`          |
//! | `writeln(S, T)`        | like `write/2` followed by a newline                 |
//! | `flush(S)`             | hands control back with the stream id of `S`         |
//! | `read_string(S, X)`    | binds `X` to the pending input of `S`, waits if none |
//! | `call_python_function(F, Args)` | calls host callback `F` with the list `Args` |
//!
//! Any other goal whose name matches a registered host callback calls it
//! directly with the goal's arguments.
//! Goals the engine does not know print an error on the `error` stream and
//! abort the query.

use crate::display::render_word;
use crate::{BridgeError, Engine, EngineOption, HostCallback, OptionValue, StreamId, code};
use indexmap::{IndexMap, IndexSet};
use smartstring::alias::String;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// A heap address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Word(u32);

/// A reference slot of the loopback engine.
#[derive(Debug, PartialEq, Eq)]
pub struct LoopbackRef(u32);

/// A dictionary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Did(u32);

#[derive(Debug, Clone)]
enum Cell {
    Var(Option<Word>),
    Int(i64),
    Float(f64),
    Atom(Did),
    Str(String),
    Nil,
    Cons(Word, Word),
    Struct(Did, Vec<Word>),
}

#[derive(Debug)]
struct ChoicePoint {
    trail_mark: usize,
    goals: Vec<Word>,
}

enum Step {
    Next,
    Fail,
    Stop(i32),
}

/// An in-process engine implementing [`Engine`].
///
/// There is no garbage collector: the heap only grows until
/// [`Engine::cleanup`].  The trail keeps every binding of the running query,
/// including bindings of goals that already succeeded, because a later
/// failure undoes the whole query.  It is emptied when the query fails or
/// aborts.
///
/// ```
/// use clp_bridge::{Bridge, Compound, LoopbackEngine, Outcome, Var};
/// let mut bridge = Bridge::new(LoopbackEngine::new());
/// assert!(!bridge.init());
/// let x = Var::new(&mut bridge).unwrap();
/// let goal = Compound::new(&mut bridge, "=", [x.clone().into(), clp_bridge::Term::Int(3)]).unwrap();
/// bridge.post_goal(goal).unwrap();
/// assert_eq!(bridge.resume(None).unwrap().0, Outcome::Succeeded);
/// assert_eq!(x.value(&mut bridge).unwrap().unwrap().as_int(), Some(3));
/// ```
pub struct LoopbackEngine {
    running: bool,
    options: IndexMap<EngineOption, OptionValue>,

    heap: Vec<Cell>,
    trail: Vec<Word>,
    dict: IndexSet<(String, usize)>,

    refs: Vec<Word>,
    free_refs: Vec<u32>,

    /// Goal stack; the next goal is on top.
    goals: Vec<Word>,
    choicepoints: Vec<ChoicePoint>,
    /// Variable of the pending `yield/2`, bound by the next two-argument resume.
    pending_input: Option<Word>,
    /// Set after an error was flushed; the next resume fails the query.
    abort_pending: bool,

    queues: IndexMap<String, VecDeque<u8>>,
    callbacks: IndexMap<String, Option<HostCallback<Self>>>,
}

impl Default for LoopbackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackEngine {
    /// Stream id of the predefined `input` queue.
    pub const INPUT: StreamId = 0;
    /// Stream id of the predefined `output` queue.
    pub const OUTPUT: StreamId = 1;
    /// Stream id of the predefined `error` queue.
    pub const ERROR: StreamId = 2;

    pub fn new() -> Self {
        let mut queues = IndexMap::new();
        for name in ["input", "output", "error"] {
            queues.insert(String::from(name), VecDeque::new());
        }
        Self {
            running: false,
            options: IndexMap::new(),
            heap: Vec::new(),
            trail: Vec::new(),
            dict: IndexSet::new(),
            refs: Vec::new(),
            free_refs: Vec::new(),
            goals: Vec::new(),
            choicepoints: Vec::new(),
            pending_input: None,
            abort_pending: false,
            queues,
            callbacks: IndexMap::new(),
        }
    }

    /// Returns the value an option was set to.
    pub fn option(&self, option: EngineOption) -> Option<&OptionValue> {
        self.options.get(&option)
    }

    /// Opens a named queue stream, or returns the id of an existing one.
    pub fn open_queue(&mut self, name: &str) -> StreamId {
        let (index, _) = self.queues.insert_full(name.into(), VecDeque::new());
        index as StreamId
    }

    /// Number of live reference slots.
    pub fn ref_count(&self) -> usize {
        self.refs.len() - self.free_refs.len()
    }

    /// Number of choice points left by the goals run so far.
    pub fn choicepoint_count(&self) -> usize {
        self.choicepoints.len()
    }

    /// Number of bindings the running query can still undo.
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    fn alloc(&mut self, cell: Cell) -> Word {
        self.heap.push(cell);
        Word((self.heap.len() - 1) as u32)
    }

    #[inline]
    fn cell(&self, w: Word) -> &Cell {
        &self.heap[w.0 as usize]
    }

    fn deref(&self, mut w: Word) -> Word {
        while let Cell::Var(Some(next)) = self.cell(w) {
            w = *next;
        }
        w
    }

    fn bind(&mut self, var: Word, value: Word) {
        self.heap[var.0 as usize] = Cell::Var(Some(value));
        self.trail.push(var);
    }

    fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some(var) = self.trail.pop() {
                self.heap[var.0 as usize] = Cell::Var(None);
            }
        }
    }

    fn unify_words(&mut self, a: Word, b: Word) -> bool {
        let mut pending = vec![(a, b)];
        while let Some((a, b)) = pending.pop() {
            let (a, b) = (self.deref(a), self.deref(b));
            if a == b {
                continue;
            }
            if matches!(self.cell(a), Cell::Var(None)) {
                self.bind(a, b);
                continue;
            }
            if matches!(self.cell(b), Cell::Var(None)) {
                self.bind(b, a);
                continue;
            }
            match (self.cell(a), self.cell(b)) {
                (Cell::Int(x), Cell::Int(y)) if x == y => {}
                (Cell::Float(x), Cell::Float(y)) if x == y => {}
                (Cell::Atom(x), Cell::Atom(y)) if x == y => {}
                (Cell::Str(x), Cell::Str(y)) if x == y => {}
                (Cell::Nil, Cell::Nil) => {}
                (Cell::Cons(h1, t1), Cell::Cons(h2, t2)) => {
                    pending.push((*t1, *t2));
                    pending.push((*h1, *h2));
                }
                (Cell::Struct(f1, args1), Cell::Struct(f2, args2))
                    if f1 == f2 && args1.len() == args2.len() =>
                {
                    pending.extend(args1.iter().copied().zip(args2.iter().copied()).rev());
                }
                _ => return false,
            }
        }
        true
    }

    fn atom_name(&self, w: Word) -> &str {
        match self.cell(w) {
            Cell::Atom(did) => self.dict.get_index(did.0 as usize).map_or("", |(n, _)| n.as_str()),
            _ => "[]",
        }
    }

    /// Functor name of a compound word; list cells are `'.'/2`.
    fn functor_name(&self, w: Word) -> &str {
        match self.cell(w) {
            Cell::Struct(did, _) => self.did_name(*did).unwrap_or(""),
            Cell::Cons(..) => ".",
            _ => "",
        }
    }

    fn kind_order(&self, w: Word) -> u8 {
        match self.cell(w) {
            Cell::Var(_) => 0,
            Cell::Int(_) | Cell::Float(_) => 1,
            Cell::Atom(_) | Cell::Nil => 2,
            Cell::Str(_) => 3,
            Cell::Cons(..) | Cell::Struct(..) => 4,
        }
    }

    fn compare_words(&self, a: Word, b: Word) -> Ordering {
        let mut pending = vec![(a, b)];
        while let Some((a, b)) = pending.pop() {
            let (a, b) = (self.deref(a), self.deref(b));
            let ord = self.kind_order(a).cmp(&self.kind_order(b));
            if ord != Ordering::Equal {
                return ord;
            }
            let ord = match (self.cell(a), self.cell(b)) {
                (Cell::Var(_), Cell::Var(_)) => a.0.cmp(&b.0),
                (Cell::Int(x), Cell::Int(y)) => x.cmp(y),
                (Cell::Float(x), Cell::Float(y)) => x.total_cmp(y),
                // Equal values order the float first.
                (Cell::Int(x), Cell::Float(y)) => (*x as f64).total_cmp(y).then(Ordering::Greater),
                (Cell::Float(x), Cell::Int(y)) => x.total_cmp(&(*y as f64)).then(Ordering::Less),
                (Cell::Str(x), Cell::Str(y)) => x.cmp(y),
                (Cell::Atom(_) | Cell::Nil, _) => self.atom_name(a).cmp(self.atom_name(b)),
                _ => {
                    let args_a = self.compound_args(a);
                    let args_b = self.compound_args(b);
                    let ord = args_a
                        .len()
                        .cmp(&args_b.len())
                        .then_with(|| self.functor_name(a).cmp(self.functor_name(b)));
                    if ord == Ordering::Equal {
                        // Leftmost argument on top; a list tail is compared last.
                        pending.extend(args_a.into_iter().zip(args_b).rev());
                    }
                    ord
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    fn compound_args(&self, w: Word) -> Vec<Word> {
        match self.cell(w) {
            Cell::Cons(h, t) => vec![*h, *t],
            Cell::Struct(_, args) => args.clone(),
            _ => Vec::new(),
        }
    }

    fn set_ref(&mut self, r: &LoopbackRef, word: Word) {
        self.refs[r.0 as usize] = word;
    }

    /// Resolves a stream argument: an atom naming the stream or its id.
    fn stream_arg(&self, w: Word) -> Option<StreamId> {
        let w = self.deref(w);
        match self.cell(w) {
            Cell::Atom(_) => self.stream_nr(self.atom_name(w)),
            Cell::Int(i) => {
                let id = StreamId::try_from(*i).ok()?;
                (id >= 0 && (id as usize) < self.queues.len()).then_some(id)
            }
            _ => None,
        }
    }

    fn queue_mut(&mut self, id: StreamId) -> Result<&mut VecDeque<u8>, BridgeError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.queues.get_index_mut(i))
            .map(|(_, q)| q)
            .ok_or_else(|| BridgeError::Stream(format!("no queue stream {id}").into()))
    }

    /// Drops the current query: goals, choice points and bindings.
    fn reset_query(&mut self) {
        self.goals.clear();
        self.choicepoints.clear();
        self.undo_to(0);
        self.pending_input = None;
    }

    /// Writes `message` to the error stream and aborts the query after the
    /// host has drained it.
    fn abort(&mut self, message: &str, to: &LoopbackRef) -> Step {
        log::debug!("loopback: aborting query: {message}");
        if let Ok(queue) = self.queue_mut(Self::ERROR) {
            queue.extend(message.as_bytes());
            queue.push_back(b'\n');
        }
        let id = self.long(Self::ERROR as i64);
        self.set_ref(to, id);
        self.abort_pending = true;
        Step::Stop(code::FLUSHIO)
    }

    fn backtrack(&mut self) -> bool {
        match self.choicepoints.pop() {
            Some(cp) => {
                self.undo_to(cp.trail_mark);
                self.goals = cp.goals;
                true
            }
            None => {
                self.reset_query();
                false
            }
        }
    }

    fn step(&mut self, goal: Word, to: &LoopbackRef) -> Step {
        let goal = self.deref(goal);
        let parsed: Result<(String, Vec<Word>), &'static str> = match self.cell(goal) {
            Cell::Atom(_) => Ok((self.atom_name(goal).into(), Vec::new())),
            Cell::Struct(did, args) => Ok((self.did_name(*did).unwrap_or("").into(), args.clone())),
            Cell::Var(_) => Err("instantiation fault in call"),
            _ => Err("type error: callable expected"),
        };
        let (name, args) = match parsed {
            Ok(parsed) => parsed,
            Err(message) => return self.abort(message, to),
        };

        match (name.as_str(), args.as_slice()) {
            ("true", []) => Step::Next,
            ("fail" | "false", []) => Step::Fail,
            (",", [a, b]) => {
                self.goals.push(*b);
                self.goals.push(*a);
                Step::Next
            }
            (";", [a, b]) => {
                let mut goals = self.goals.clone();
                goals.push(*b);
                self.choicepoints.push(ChoicePoint {
                    trail_mark: self.trail.len(),
                    goals,
                });
                self.goals.push(*a);
                Step::Next
            }
            ("=", [a, b]) => {
                if self.unify_words(*a, *b) {
                    Step::Next
                } else {
                    Step::Fail
                }
            }
            ("throw", [ball]) => {
                self.set_ref(to, *ball);
                self.reset_query();
                Step::Stop(code::THROW)
            }
            ("yield", [out, input]) => {
                self.set_ref(to, *out);
                self.pending_input = Some(*input);
                Step::Stop(code::YIELD)
            }
            ("write" | "writeln", [s, t]) => {
                let Some(id) = self.stream_arg(*s) else {
                    return self.abort("stream expected in write", to);
                };
                let mut text = render_word(&*self, *t).unwrap_or_default();
                if name == "writeln" {
                    text.push('\n');
                }
                match self.queue_mut(id) {
                    Ok(queue) => {
                        queue.extend(text.as_bytes());
                        Step::Next
                    }
                    Err(e) => self.abort(&e.to_string(), to),
                }
            }
            ("flush", [s]) => {
                let Some(id) = self.stream_arg(*s) else {
                    return self.abort("stream expected in flush", to);
                };
                let id = self.long(id as i64);
                self.set_ref(to, id);
                Step::Stop(code::FLUSHIO)
            }
            ("read_string", [s, x]) => {
                let Some(id) = self.stream_arg(*s) else {
                    return self.abort("stream expected in read_string", to);
                };
                let data: Vec<u8> = match self.queue_mut(id) {
                    Ok(queue) => queue.drain(..).collect(),
                    Err(e) => return self.abort(&e.to_string(), to),
                };
                if data.is_empty() {
                    self.goals.push(goal);
                    let id = self.long(id as i64);
                    self.set_ref(to, id);
                    return Step::Stop(code::WAITIO);
                }
                let text = std::string::String::from_utf8_lossy(&data);
                let text = self.string(&text);
                if self.unify_words(*x, text) {
                    Step::Next
                } else {
                    Step::Fail
                }
            }
            ("call_python_function", [f, list]) => {
                let f = self.deref(*f);
                if !matches!(self.cell(f), Cell::Atom(_)) {
                    return self.abort("type error: callback name expected", to);
                }
                let Some(items) = self.list_items(*list) else {
                    return self.abort("type error: argument list expected", to);
                };
                let callee = self.atom_name(f).to_owned();
                self.call_host(&callee, &items, to)
            }
            _ => self.call_host(&name, &args, to),
        }
    }

    /// Elements of a proper list, `None` for anything else.
    fn list_items(&self, w: Word) -> Option<Vec<Word>> {
        let mut items = Vec::new();
        let mut w = self.deref(w);
        loop {
            match self.cell(w) {
                Cell::Cons(h, t) => {
                    items.push(*h);
                    w = self.deref(*t);
                }
                Cell::Nil => return Some(items),
                _ => return None,
            }
        }
    }

    fn call_host(&mut self, name: &str, args: &[Word], to: &LoopbackRef) -> Step {
        let Some(slot) = self.callbacks.get_mut(name) else {
            return self.abort(
                &format!("calling an undefined procedure {}/{}", name, args.len()),
                to,
            );
        };
        let Some(mut callback) = slot.take() else {
            return self.abort(&format!("host function {name} is already running"), to);
        };
        let result = callback(self, args);
        if let Some(slot) = self.callbacks.get_mut(name) {
            *slot = Some(callback);
        }
        match result {
            Ok(true) => Step::Next,
            Ok(false) => Step::Fail,
            Err(message) => self.abort(&message, to),
        }
    }

    fn run(&mut self, to: &LoopbackRef) -> i32 {
        if self.abort_pending {
            self.abort_pending = false;
            self.reset_query();
            return code::FAIL;
        }
        let mut base = self.choicepoints.len();
        loop {
            let Some(goal) = self.goals.pop() else {
                let marker = self.long(base as i64);
                self.set_ref(to, marker);
                return code::SUCCEED;
            };
            match self.step(goal, to) {
                Step::Next => {}
                Step::Fail => {
                    if !self.backtrack() {
                        return code::FAIL;
                    }
                    base = base.min(self.choicepoints.len());
                }
                Step::Stop(code) => return code,
            }
        }
    }
}

impl Engine for LoopbackEngine {
    type Word = Word;
    type Ref = LoopbackRef;
    type Did = Did;

    fn set_option_int(&mut self, option: EngineOption, value: i64) -> i32 {
        if self.running || value < 0 {
            return code::FAIL;
        }
        self.options.insert(option, OptionValue::Int(value));
        code::SUCCEED
    }

    fn set_option_str(&mut self, option: EngineOption, value: &str) -> i32 {
        if self.running {
            return code::FAIL;
        }
        self.options.insert(option, OptionValue::from(value));
        code::SUCCEED
    }

    fn init(&mut self) -> i32 {
        if self.running {
            return code::FAIL;
        }
        log::debug!("loopback: init with {} options", self.options.len());
        self.running = true;
        code::SUCCEED
    }

    fn cleanup(&mut self) -> i32 {
        if !self.running {
            return code::FAIL;
        }
        self.running = false;
        self.heap.clear();
        self.trail.clear();
        self.refs.clear();
        self.free_refs.clear();
        self.goals.clear();
        self.choicepoints.clear();
        self.pending_input = None;
        self.abort_pending = false;
        for queue in self.queues.values_mut() {
            queue.clear();
        }
        code::SUCCEED
    }

    fn post_goal(&mut self, goal: Word) {
        // Posted goals run after everything already pending.
        self.goals.insert(0, goal);
    }

    fn resume1(&mut self, to: &LoopbackRef) -> i32 {
        self.pending_input = None;
        self.run(to)
    }

    fn resume2(&mut self, input: Word, to: &LoopbackRef) -> i32 {
        if let Some(slot) = self.pending_input.take() {
            if !self.unify_words(slot, input) && !self.backtrack() {
                return code::FAIL;
            }
        }
        self.run(to)
    }

    fn cut_to_chp(&mut self, chp: &LoopbackRef) {
        match self.get_long(self.ref_get(chp)) {
            Some(marker) => self.choicepoints.truncate(marker.max(0) as usize),
            None => log::warn!("loopback: cut without a choice point marker"),
        }
    }

    fn ref_create(&mut self, word: Word) -> LoopbackRef {
        match self.free_refs.pop() {
            Some(index) => {
                self.refs[index as usize] = word;
                LoopbackRef(index)
            }
            None => {
                self.refs.push(word);
                LoopbackRef((self.refs.len() - 1) as u32)
            }
        }
    }

    fn ref_create_newvar(&mut self) -> LoopbackRef {
        let var = self.newvar();
        self.ref_create(var)
    }

    fn ref_destroy(&mut self, r: LoopbackRef) {
        if (r.0 as usize) < self.refs.len() {
            self.free_refs.push(r.0);
        }
    }

    fn ref_get(&self, r: &LoopbackRef) -> Word {
        self.refs[r.0 as usize]
    }

    fn ref_set(&mut self, r: &LoopbackRef, word: Word) {
        self.set_ref(r, word);
    }

    fn did(&mut self, name: &str, arity: usize) -> Did {
        let (index, _) = self.dict.insert_full((name.into(), arity));
        Did(index as u32)
    }

    fn did_name(&self, did: Did) -> Option<&str> {
        self.dict.get_index(did.0 as usize).map(|(n, _)| n.as_str())
    }

    fn did_arity(&self, did: Did) -> Option<usize> {
        self.dict.get_index(did.0 as usize).map(|(_, a)| *a)
    }

    fn atom(&mut self, did: Did) -> Word {
        self.alloc(Cell::Atom(did))
    }

    fn string(&mut self, s: &str) -> Word {
        self.alloc(Cell::Str(s.into()))
    }

    fn long(&mut self, i: i64) -> Word {
        self.alloc(Cell::Int(i))
    }

    fn double(&mut self, f: f64) -> Word {
        self.alloc(Cell::Float(f))
    }

    fn nil(&mut self) -> Word {
        self.alloc(Cell::Nil)
    }

    fn list(&mut self, head: Word, tail: Word) -> Word {
        self.alloc(Cell::Cons(head, tail))
    }

    fn term_array(&mut self, functor: Did, args: &[Word]) -> Word {
        self.alloc(Cell::Struct(functor, args.to_vec()))
    }

    fn newvar(&mut self) -> Word {
        self.alloc(Cell::Var(None))
    }

    fn get_list(&self, word: Word) -> Option<(Word, Word)> {
        match self.cell(self.deref(word)) {
            Cell::Cons(h, t) => Some((*h, *t)),
            _ => None,
        }
    }

    fn get_functor(&self, word: Word) -> Option<Did> {
        match self.cell(self.deref(word)) {
            Cell::Struct(did, _) => Some(*did),
            _ => None,
        }
    }

    fn get_arg(&self, n: usize, word: Word) -> Option<Word> {
        match self.cell(self.deref(word)) {
            Cell::Struct(_, args) if n >= 1 => args.get(n - 1).copied(),
            _ => None,
        }
    }

    fn get_long(&self, word: Word) -> Option<i64> {
        match self.cell(self.deref(word)) {
            Cell::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn is_nil(&self, word: Word) -> bool {
        matches!(self.cell(self.deref(word)), Cell::Nil)
    }

    fn get_atom(&self, word: Word) -> Option<Did> {
        match self.cell(self.deref(word)) {
            Cell::Atom(did) => Some(*did),
            _ => None,
        }
    }

    fn get_string(&self, word: Word) -> Option<&str> {
        match self.cell(self.deref(word)) {
            Cell::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn get_double(&self, word: Word) -> Option<f64> {
        match self.cell(self.deref(word)) {
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn is_var(&self, word: Word) -> bool {
        matches!(self.cell(self.deref(word)), Cell::Var(None))
    }

    fn compare(&self, a: Word, b: Word) -> Ordering {
        self.compare_words(a, b)
    }

    fn unify(&mut self, a: Word, b: Word) -> bool {
        let mark = self.trail.len();
        let ok = self.unify_words(a, b);
        if !ok {
            self.undo_to(mark);
        }
        ok
    }

    fn stream_nr(&self, name: &str) -> Option<StreamId> {
        self.queues.get_index_of(name).map(|i| i as StreamId)
    }

    fn queue_read(&mut self, stream: StreamId, buf: &mut [u8]) -> Result<usize, BridgeError> {
        let queue = self.queue_mut(stream)?;
        let n = buf.len().min(queue.len());
        for (dst, src) in buf.iter_mut().zip(queue.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn queue_write(&mut self, stream: StreamId, data: &[u8]) -> Result<usize, BridgeError> {
        self.queue_mut(stream)?.extend(data);
        Ok(data.len())
    }

    fn queue_avail(&self, stream: StreamId) -> Result<usize, BridgeError> {
        usize::try_from(stream)
            .ok()
            .and_then(|i| self.queues.get_index(i))
            .map(|(_, q)| q.len())
            .ok_or_else(|| BridgeError::Stream(format!("no queue stream {stream}").into()))
    }

    fn register_callback(&mut self, name: &str, callback: HostCallback<Self>) {
        self.callbacks.insert(name.into(), Some(callback));
    }
}
