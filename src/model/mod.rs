//! The C4 model: a declarative graph of states, transitions, calcs, shadows,
//! spans and portals (spec §3/§4.1).
//!
//! `Model<C>` is generic over an opaque per-model-kind context type `C`,
//! mirroring the teacher's own `bio::alignment::pairwise::Scoring<F>`
//! pattern (a struct generic over a scoring closure, see
//! `get_blosum62() -> Scoring<impl Fn(u8, u8) -> i32>` in the original CLI):
//! rather than type-erasing the user-data pointer behind `dyn Any`, each
//! model kind picks a concrete context struct bundling whatever matrices,
//! translation tables and splice predictors it needs (spec §9).

pub mod builders;
pub mod intron;
pub mod phase;

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::region::Region;
use crate::score::Score;

/// Where in a DP region a terminal state may legally occur (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Anywhere,
    Edge,
    Query,
    Target,
    Corner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub u32);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalcId(pub u32);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShadowId(pub u32);

pub const START: StateId = StateId(0);
pub const END: StateId = StateId(1);

#[derive(Debug, Clone)]
pub struct State {
    pub id: StateId,
    pub name: String,
    pub scope: Scope,
}

/// Distinguishes how a transition is rendered and how it is treated by the
/// spliced/phased sub-models (spec §3, "label").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    None,
    Match,
    Gap,
    FiveSs,
    ThreeSs,
    Intron,
    Ner,
    SplitCodon { phase: u8 },
    Frameshift,
}

/// A named score function: an upper bound (for pruning), a closure, and
/// optional per-region init/exit hooks (spec §3, "Calc").
pub struct Calc<C> {
    pub id: CalcId,
    pub name: String,
    pub max_score: Score,
    score_fn: Box<dyn Fn(usize, usize, &C) -> Score + Send + Sync>,
    init_fn: Option<Box<dyn Fn(&Region, &C) + Send + Sync>>,
    exit_fn: Option<Box<dyn Fn(&Region, &C) + Send + Sync>>,
    pub protect_underflow: bool,
}

impl<C> Calc<C> {
    pub fn score(&self, q: usize, t: usize, ctx: &C) -> Score {
        (self.score_fn)(q, t, ctx)
    }
    pub fn init(&self, region: &Region, ctx: &C) {
        if let Some(f) = &self.init_fn {
            f(region, ctx);
        }
    }
    pub fn exit(&self, region: &Region, ctx: &C) {
        if let Some(f) = &self.exit_fn {
            f(region, ctx);
        }
    }
}

pub struct Transition<C> {
    pub id: TransitionId,
    pub name: String,
    pub input: StateId,
    pub output: StateId,
    pub advance_q: u32,
    pub advance_t: u32,
    pub calc: Option<CalcId>,
    pub label: Label,
    _marker: std::marker::PhantomData<C>,
}

impl<C> Transition<C> {
    pub fn is_silent(&self) -> bool {
        self.advance_q == 0 && self.advance_t == 0
    }
}

/// A per-path accumulator: records a coordinate at a source state, consumed
/// by an `end_fn` at a destination transition (spec §3/§4.4). See
/// `SPEC_FULL.md` §4 for the resolved scoring contract: `end_fn`'s return
/// value is *added* to the destination transition's tentative score.
pub struct Shadow<C> {
    pub id: ShadowId,
    pub name: String,
    pub sources: HashSet<StateId>,
    pub dst_transitions: HashSet<TransitionId>,
    start_fn: Box<dyn Fn(usize, usize, &C) -> i32 + Send + Sync>,
    end_fn: Box<dyn Fn(i32, usize, usize, &C) -> Score + Send + Sync>,
}

impl<C> Shadow<C> {
    pub fn start(&self, q: usize, t: usize, ctx: &C) -> i32 {
        (self.start_fn)(q, t, ctx)
    }
    pub fn end(&self, stored: i32, q: usize, t: usize, ctx: &C) -> Score {
        (self.end_fn)(stored, q, t, ctx)
    }
}

/// Bounds how far a self-cycle state may progress on each axis since it was
/// entered, per context (spec §3, "Span"). The bound is a closure rather
/// than fixed constants because some spans depend on per-alignment
/// configuration (e.g. the intron body's length depends on the configured
/// min/max intron length), mirroring how `Calc`/`Shadow` already close over
/// `&C`.
pub struct Span<C> {
    pub state: StateId,
    bounds_fn: Box<dyn Fn(&C) -> (u32, u32, u32, u32) + Send + Sync>,
}

impl<C> Span<C> {
    /// `(min_q, max_q, min_t, max_t)` for this context.
    pub fn bounds(&self, ctx: &C) -> (u32, u32, u32, u32) {
        (self.bounds_fn)(ctx)
    }
}

/// Advertises a `(calc, Δq, Δt)` tuple for heuristic mid-graph entry (spec
/// §3, "Portal"). Not consumed by the Viterbi engine itself; the HSP seeder
/// (spec §4.5) reads these.
#[derive(Clone)]
pub struct Portal {
    pub name: String,
    pub calc: Option<CalcId>,
    pub advance_q: u32,
    pub advance_t: u32,
}

/// A derived model retains a map from derived-transition-id to the original
/// transition it was rewritten from (spec §4.1, "Derived models").
#[derive(Debug, Clone, Default)]
pub struct DerivationMap {
    pub to_original: HashMap<TransitionId, TransitionId>,
}

struct StartEndConfig {
    scope: Scope,
    cell_start_fn: Option<Box<dyn Fn(usize, usize) -> Score + Send + Sync>>,
}

/// The C4 model itself: open (mutable) until [`Model::close`] is called.
pub struct Model<C> {
    name: String,
    closed: bool,
    states: Vec<State>,
    transitions: Vec<Transition<C>>,
    calcs: Vec<Calc<C>>,
    shadows: Vec<Shadow<C>>,
    spans: Vec<Span<C>>,
    portals: Vec<Portal>,
    start_config: StartEndConfig,
    end_config: StartEndConfig,
    extra_init: Option<Box<dyn Fn(&Region, &C) + Send + Sync>>,
    extra_exit: Option<Box<dyn Fn(&Region, &C) + Send + Sync>>,
    // Populated by close(): per-state incoming/outgoing transition ids.
    incoming: Vec<Vec<TransitionId>>,
    outgoing: Vec<Vec<TransitionId>>,
    // Per-state designation of shadows sourced/destined there, and the
    // contiguous shadow-slot numbering ("designation") assigned at close().
    shadow_slot: HashMap<ShadowId, usize>,
}

impl<C> Model<C> {
    pub fn new(name: impl Into<String>) -> Self {
        let mut model = Self {
            name: name.into(),
            closed: false,
            states: Vec::new(),
            transitions: Vec::new(),
            calcs: Vec::new(),
            shadows: Vec::new(),
            spans: Vec::new(),
            portals: Vec::new(),
            start_config: StartEndConfig {
                scope: Scope::Corner,
                cell_start_fn: None,
            },
            end_config: StartEndConfig {
                scope: Scope::Corner,
                cell_start_fn: None,
            },
            extra_init: None,
            extra_exit: None,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            shadow_slot: HashMap::new(),
        };
        model.states.push(State {
            id: START,
            name: "START".to_string(),
            scope: Scope::Corner,
        });
        model.states.push(State {
            id: END,
            name: "END".to_string(),
            scope: Scope::Corner,
        });
        model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn require_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Usage(format!("model '{}' is closed", self.name)))
        } else {
            Ok(())
        }
    }

    pub fn add_state(&mut self, name: impl Into<String>) -> Result<StateId> {
        self.require_open()?;
        let id = StateId(self.states.len() as u32);
        self.states.push(State {
            id,
            name: name.into(),
            scope: Scope::Anywhere,
        });
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_calc(
        &mut self,
        name: impl Into<String>,
        max_score: Score,
        score_fn: impl Fn(usize, usize, &C) -> Score + Send + Sync + 'static,
        init_fn: Option<Box<dyn Fn(&Region, &C) + Send + Sync>>,
        exit_fn: Option<Box<dyn Fn(&Region, &C) + Send + Sync>>,
        protect_underflow: bool,
    ) -> Result<CalcId> {
        self.require_open()?;
        let id = CalcId(self.calcs.len() as u32);
        self.calcs.push(Calc {
            id,
            name: name.into(),
            max_score,
            score_fn: Box::new(score_fn),
            init_fn,
            exit_fn,
            protect_underflow,
        });
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_transition(
        &mut self,
        name: impl Into<String>,
        input: StateId,
        output: StateId,
        advance_q: u32,
        advance_t: u32,
        calc: Option<CalcId>,
        label: Label,
    ) -> Result<TransitionId> {
        self.require_open()?;
        if label == Label::Match && advance_q == 0 && advance_t == 0 {
            return Err(Error::InvalidModel(format!(
                "match transition '{}' must advance on at least one axis",
                name.into()
            )));
        }
        let id = TransitionId(self.transitions.len() as u32);
        self.transitions.push(Transition {
            id,
            name: name.into(),
            input,
            output,
            advance_q,
            advance_t,
            calc,
            label,
            _marker: std::marker::PhantomData,
        });
        Ok(id)
    }

    pub fn add_shadow(
        &mut self,
        name: impl Into<String>,
        sources: impl IntoIterator<Item = StateId>,
        dst_transitions: impl IntoIterator<Item = TransitionId>,
        start_fn: impl Fn(usize, usize, &C) -> i32 + Send + Sync + 'static,
        end_fn: impl Fn(i32, usize, usize, &C) -> Score + Send + Sync + 'static,
    ) -> Result<ShadowId> {
        self.require_open()?;
        let id = ShadowId(self.shadows.len() as u32);
        self.shadows.push(Shadow {
            id,
            name: name.into(),
            sources: sources.into_iter().collect(),
            dst_transitions: dst_transitions.into_iter().collect(),
            start_fn: Box::new(start_fn),
            end_fn: Box::new(end_fn),
        });
        Ok(id)
    }

    pub fn add_span(&mut self, state: StateId, bounds_fn: impl Fn(&C) -> (u32, u32, u32, u32) + Send + Sync + 'static) -> Result<()> {
        self.require_open()?;
        self.spans.push(Span {
            state,
            bounds_fn: Box::new(bounds_fn),
        });
        Ok(())
    }

    pub fn add_portal(&mut self, name: impl Into<String>, calc: Option<CalcId>, advance_q: u32, advance_t: u32) -> Result<()> {
        self.require_open()?;
        self.portals.push(Portal {
            name: name.into(),
            calc,
            advance_q,
            advance_t,
        });
        Ok(())
    }

    pub fn configure_start(&mut self, scope: Scope, cell_start_fn: Option<Box<dyn Fn(usize, usize) -> Score + Send + Sync>>) -> Result<()> {
        self.require_open()?;
        self.start_config = StartEndConfig { scope, cell_start_fn };
        Ok(())
    }

    pub fn configure_end(&mut self, scope: Scope, cell_start_fn: Option<Box<dyn Fn(usize, usize) -> Score + Send + Sync>>) -> Result<()> {
        self.require_open()?;
        self.end_config = StartEndConfig { scope, cell_start_fn };
        Ok(())
    }

    pub fn configure_extra(
        &mut self,
        init_fn: Option<Box<dyn Fn(&Region, &C) + Send + Sync>>,
        exit_fn: Option<Box<dyn Fn(&Region, &C) + Send + Sync>>,
    ) -> Result<()> {
        self.require_open()?;
        self.extra_init = init_fn;
        self.extra_exit = exit_fn;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn start_scope(&self) -> Scope {
        self.start_config.scope
    }
    pub fn end_scope(&self) -> Scope {
        self.end_config.scope
    }
    pub fn is_global(&self) -> bool {
        self.start_config.scope == Scope::Corner && self.end_config.scope == Scope::Corner
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }
    pub fn transitions(&self) -> &[Transition<C>] {
        &self.transitions
    }
    pub fn transition(&self, id: TransitionId) -> &Transition<C> {
        &self.transitions[id.0 as usize]
    }
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0 as usize]
    }
    pub fn calc(&self, id: CalcId) -> &Calc<C> {
        &self.calcs[id.0 as usize]
    }
    pub fn shadows(&self) -> &[Shadow<C>] {
        &self.shadows
    }
    pub fn spans(&self) -> &[Span<C>] {
        &self.spans
    }
    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }
    pub fn incoming(&self, state: StateId) -> &[TransitionId] {
        &self.incoming[state.0 as usize]
    }
    pub fn outgoing(&self, state: StateId) -> &[TransitionId] {
        &self.outgoing[state.0 as usize]
    }
    pub fn cell_start(&self, q: usize, t: usize) -> Score {
        self.start_config.cell_start_fn.as_ref().map_or(0, |f| f(q, t))
    }
    pub fn run_extra_init(&self, region: &Region, ctx: &C) {
        if let Some(f) = &self.extra_init {
            f(region, ctx);
        }
        for calc in &self.calcs {
            calc.init(region, ctx);
        }
    }
    pub fn run_extra_exit(&self, region: &Region, ctx: &C) {
        for calc in &self.calcs {
            calc.exit(region, ctx);
        }
        if let Some(f) = &self.extra_exit {
            f(region, ctx);
        }
    }

    /// Total number of shadow designations, i.e. the number of extra cell
    /// slots beyond the main score (spec §3, "Viterbi cell").
    pub fn total_shadow_designations(&self) -> usize {
        self.shadows.len()
    }

    pub fn shadow_slot(&self, id: ShadowId) -> usize {
        self.shadow_slot[&id]
    }

    pub fn cell_size(&self) -> usize {
        1 + self.total_shadow_designations()
    }

    /// Splice `sub_model` in between `in_state` and `out_state` (`None`
    /// denotes this model's own START/END), returning a map from the
    /// sub-model's state/transition/calc ids to the ids they now have in
    /// `self`. The sub-model's calcs, shadows and spans move into `self`
    /// wholesale (shadow source/destination ids are remapped along with
    /// everything else), so a sub-model built in isolation behaves
    /// identically once spliced into a host graph.
    pub fn insert(&mut self, sub_model: Model<C>, in_state: Option<StateId>, out_state: Option<StateId>) -> Result<InsertedSubModel> {
        self.require_open()?;
        let host_in = in_state.unwrap_or(START);
        let host_out = out_state.unwrap_or(END);
        let mut state_map = HashMap::new();
        state_map.insert(START, host_in);
        state_map.insert(END, host_out);
        for state in &sub_model.states {
            if state.id == START || state.id == END {
                continue;
            }
            let new_id = self.add_state(state.name.clone())?;
            state_map.insert(state.id, new_id);
        }

        let mut calc_map = HashMap::new();
        for mut calc in sub_model.calcs {
            let old_id = calc.id;
            let new_id = CalcId(self.calcs.len() as u32);
            calc.id = new_id;
            self.calcs.push(calc);
            calc_map.insert(old_id, new_id);
        }

        let mut transition_map = HashMap::new();
        for transition in &sub_model.transitions {
            let calc = transition.calc.map(|c| calc_map[&c]);
            let new_id = self.add_transition(
                transition.name.clone(),
                state_map[&transition.input],
                state_map[&transition.output],
                transition.advance_q,
                transition.advance_t,
                calc,
                transition.label,
            )?;
            transition_map.insert(transition.id, new_id);
        }

        for mut shadow in sub_model.shadows {
            let remapped_sources = shadow.sources.iter().map(|s| state_map[s]).collect();
            let remapped_dst = shadow.dst_transitions.iter().map(|t| transition_map[t]).collect();
            shadow.sources = remapped_sources;
            shadow.dst_transitions = remapped_dst;
            shadow.id = ShadowId(self.shadows.len() as u32);
            self.shadows.push(shadow);
        }

        for span in sub_model.spans {
            self.spans.push(Span {
                state: state_map[&span.state],
                bounds_fn: span.bounds_fn,
            });
        }

        Ok(InsertedSubModel {
            state_map,
            transition_map,
            calc_map,
        })
    }

    /// Duplicate the open graph into two disjoint copies sharing only
    /// START/END, used for forward/reverse strand twins (spec §4.1,
    /// "Stereo model").
    pub fn make_stereo(self, suffix_a: &str, suffix_b: &str) -> Result<(Model<C>, StereoMap)>
    where
        C: Clone,
    {
        // Kept generic-friendly: cloning a closure-bearing model is not
        // possible in general, so stereo duplication is implemented by
        // model-kind-specific builders (see `model::intron`) that construct
        // both halves directly from the same parameters instead of cloning
        // an already-built graph. This method documents the contract for
        // callers that *can* rebuild: run the builder twice with distinct
        // name suffixes and merge via `Model::insert`.
        let _ = (suffix_a, suffix_b);
        Err(Error::Usage(
            "generic stereo duplication requires a cloneable context; rebuild both halves via a model-kind builder instead".into(),
        ))
    }

    /// Freeze the graph: number states/transitions contiguously (already
    /// true by construction), verify structural invariants, and pre-compute
    /// per-state transition lists.
    pub fn close(mut self) -> Result<Self> {
        self.require_open()?;

        for t in &self.transitions {
            if t.input.0 as usize >= self.states.len() || t.output.0 as usize >= self.states.len() {
                return Err(Error::InvalidModel(format!("transition '{}' references an unknown state", t.name)));
            }
        }
        for s in &self.spans {
            if s.state.0 as usize >= self.states.len() {
                return Err(Error::InvalidModel("span references an unknown state".into()));
            }
        }
        for sh in &self.shadows {
            for s in &sh.sources {
                if s.0 as usize >= self.states.len() {
                    return Err(Error::InvalidModel(format!("shadow '{}' sources an unknown state", sh.name)));
                }
            }
            for t in &sh.dst_transitions {
                if t.0 as usize >= self.transitions.len() {
                    return Err(Error::InvalidModel(format!("shadow '{}' destines an unknown transition", sh.name)));
                }
            }
        }

        self.incoming = vec![Vec::new(); self.states.len()];
        self.outgoing = vec![Vec::new(); self.states.len()];
        for t in &self.transitions {
            self.outgoing[t.input.0 as usize].push(t.id);
            self.incoming[t.output.0 as usize].push(t.id);
        }

        self.check_reachability()?;
        self.check_silent_acyclic()?;
        self.check_no_ambiguous_parallel_transitions()?;

        for (i, shadow) in self.shadows.iter().enumerate() {
            self.shadow_slot.insert(shadow.id, i);
        }

        self.closed = true;
        Ok(self)
    }

    fn check_reachability(&self) -> Result<()> {
        let n = self.states.len();
        let mut reachable_from_start = vec![false; n];
        let mut stack = vec![START];
        reachable_from_start[START.0 as usize] = true;
        while let Some(s) = stack.pop() {
            for &tid in self.outgoing[s.0 as usize].iter() {
                let out = self.transitions[tid.0 as usize].output;
                if !reachable_from_start[out.0 as usize] {
                    reachable_from_start[out.0 as usize] = true;
                    stack.push(out);
                }
            }
        }
        let mut co_reachable_to_end = vec![false; n];
        let mut stack = vec![END];
        co_reachable_to_end[END.0 as usize] = true;
        while let Some(s) = stack.pop() {
            for &tid in self.incoming[s.0 as usize].iter() {
                let inp = self.transitions[tid.0 as usize].input;
                if !co_reachable_to_end[inp.0 as usize] {
                    co_reachable_to_end[inp.0 as usize] = true;
                    stack.push(inp);
                }
            }
        }
        for state in &self.states {
            if state.id == START || state.id == END {
                continue;
            }
            if !reachable_from_start[state.id.0 as usize] {
                return Err(Error::InvalidModel(format!("state '{}' is unreachable from START", state.name)));
            }
            if !co_reachable_to_end[state.id.0 as usize] {
                return Err(Error::InvalidModel(format!("state '{}' cannot reach END", state.name)));
            }
        }
        Ok(())
    }

    fn check_silent_acyclic(&self) -> Result<()> {
        let n = self.states.len();
        let mut state_index = 0u8;
        let (mut visiting, mut done) = (vec![false; n], vec![false; n]);
        let _ = &mut state_index;
        fn visit<C>(
            model: &Model<C>,
            s: StateId,
            visiting: &mut [bool],
            done: &mut [bool],
        ) -> Result<()> {
            if done[s.0 as usize] {
                return Ok(());
            }
            if visiting[s.0 as usize] {
                return Err(Error::InvalidModel(format!("cyclic silent transitions through state '{}'", model.state(s).name)));
            }
            visiting[s.0 as usize] = true;
            for &tid in model.outgoing(s) {
                let t = model.transition(tid);
                if t.is_silent() {
                    visit(model, t.output, visiting, done)?;
                }
            }
            visiting[s.0 as usize] = false;
            done[s.0 as usize] = true;
            Ok(())
        }
        for state in &self.states {
            visit(self, state.id, &mut visiting, &mut done)?;
        }
        Ok(())
    }

    fn check_no_ambiguous_parallel_transitions(&self) -> Result<()> {
        let mut seen: HashMap<(StateId, Label, u32, u32), usize> = HashMap::new();
        for t in &self.transitions {
            let key = (t.input, t.label, t.advance_q, t.advance_t);
            let count = seen.entry(key).or_insert(0);
            *count += 1;
            // Two transitions sharing label+advances from the same state
            // are fine as long as they carry distinct calcs (spec §3).
            if *count > 1 && t.calc.is_none() {
                return Err(Error::InvalidModel(format!(
                    "state '{}' has ambiguous parallel transitions with label {:?} and no distinguishing calc",
                    self.state(t.input).name,
                    t.label
                )));
            }
        }
        Ok(())
    }
}

pub struct InsertedSubModel {
    pub state_map: HashMap<StateId, StateId>,
    pub transition_map: HashMap<TransitionId, TransitionId>,
    pub calc_map: HashMap<CalcId, CalcId>,
}

/// Placeholder result type for [`Model::make_stereo`]'s documented contract.
pub struct StereoMap {
    pub forward: HashMap<StateId, StateId>,
    pub reverse: HashMap<StateId, StateId>,
}
