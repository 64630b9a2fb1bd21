//! The Viterbi dynamic-programming engine (spec §4.3).
//!
//! Sweeps a [`Region`] of the query/target grid state-by-state, applying
//! each [`Model`] transition's calc and any shadow end-scores that fire on
//! it, keeping the best-scoring predecessor per cell per state. Ties break
//! on the smallest [`TransitionId`] so replay is deterministic (spec §4.3,
//! "tie-breaking").

use std::collections::HashMap;

use crate::model::{Model, Scope, ShadowId, StateId, TransitionId};
use crate::region::Region;
use crate::score::{protected_add, Score, IMPOSSIBLY_LOW};

/// What a DP pass is asked to compute (spec §4.3, "mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    FindScore,
    FindPath,
    FindRegion,
    FindCheckpoints,
}

/// One DP cell: the best score reaching each state at this `(q, t)`, the
/// transition that produced it (for traceback), the live shadow payloads
/// carried along that best path, and how far each state has progressed
/// since it was last (re-)entered (for span enforcement).
#[derive(Clone)]
struct Cell {
    score: Vec<Score>,
    predecessor: Vec<Option<TransitionId>>,
    shadow_values: Vec<HashMap<ShadowId, i32>>,
    span_progress: Vec<(u32, u32)>,
}

impl Cell {
    fn new(num_states: usize) -> Self {
        Self {
            score: vec![IMPOSSIBLY_LOW; num_states],
            predecessor: vec![None; num_states],
            shadow_values: vec![HashMap::new(); num_states],
            span_progress: vec![(0, 0); num_states],
        }
    }
}

/// A full or reduced-space DP grid over a region, addressable by
/// `(q - region.q_start, t - region.t_start)`.
pub struct Grid {
    region: Region,
    cells: Vec<Cell>,
    num_states: usize,
}

impl Grid {
    fn index(&self, q: usize, t: usize) -> usize {
        (q - self.region.q_start) * (self.region.t_length + 1) + (t - self.region.t_start)
    }

    fn cell(&self, q: usize, t: usize) -> &Cell {
        &self.cells[self.index(q, t)]
    }

    fn cell_mut(&mut self, q: usize, t: usize) -> &mut Cell {
        let idx = self.index(q, t);
        &mut self.cells[idx]
    }

    pub fn score(&self, q: usize, t: usize, state: StateId) -> Score {
        self.cell(q, t).score[state.0 as usize]
    }

    /// Snapshot the best path reaching `state` at `(q, t)`, or `None` if
    /// that state is unreachable there. Used to seed a continuation sweep
    /// (e.g. the right half of a checkpoint split) without recomputing
    /// anything the left sweep already found.
    pub fn snapshot(&self, q: usize, t: usize, state: StateId) -> Option<CellSnapshot> {
        let cell = self.cell(q, t);
        let score = cell.score[state.0 as usize];
        if score <= IMPOSSIBLY_LOW {
            return None;
        }
        Some(CellSnapshot {
            state,
            score,
            shadow_values: cell.shadow_values[state.0 as usize].clone(),
            span_progress: cell.span_progress[state.0 as usize],
        })
    }
}

/// A complete snapshot of one state at one cell: enough to resume a sweep
/// from exactly that point (spec §4.3, "continuation mode"). Doubles as the
/// `continuation` parameter's type and as [`ViterbiResult::final_cell`].
#[derive(Clone, Debug)]
pub struct CellSnapshot {
    pub state: StateId,
    pub score: Score,
    pub shadow_values: HashMap<ShadowId, i32>,
    pub span_progress: (u32, u32),
}

/// A candidate row-boundary point collected by `Mode::FindCheckpoints`: the
/// best-scoring way to be in `snapshot.state` at `(q, region.t_end())` for
/// whatever `region` the sweep ran over.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    pub q: usize,
    pub snapshot: CellSnapshot,
}

/// One step of a traceback: the transition taken and how many times it
/// repeats contiguously (self-loops collapse to a run length).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub transition: TransitionId,
    pub repeats: u32,
}

pub struct ViterbiResult {
    pub best_score: Score,
    pub best_state: StateId,
    pub best_q: usize,
    pub best_t: usize,
    pub path: Option<Vec<Step>>,
    /// `Mode::FindRegion`: the sub-region the optimal path actually spanned
    /// (may be smaller than `region` when the model's scope lets the
    /// optimum start/end away from `region`'s corners).
    pub spanned_region: Option<Region>,
    /// `Mode::FindCheckpoints`: one candidate per `(q, state)` reachable at
    /// `region`'s final row.
    pub checkpoints: Option<Vec<Checkpoint>>,
    /// The snapshot at `(best_q, best_t, best_state)`, when reachable.
    pub final_cell: Option<CellSnapshot>,
}

fn start_cells(region: &Region, scope: Scope) -> Vec<(usize, usize)> {
    match scope {
        Scope::Corner => vec![(region.q_start, region.t_start)],
        Scope::Anywhere => {
            let mut cells = Vec::new();
            for q in region.q_start..=region.q_end() {
                for t in region.t_start..=region.t_end() {
                    cells.push((q, t));
                }
            }
            cells
        }
        Scope::Edge => {
            let mut cells: Vec<(usize, usize)> = (region.t_start..=region.t_end()).map(|t| (region.q_start, t)).collect();
            cells.extend((region.q_start..=region.q_end()).map(|q| (q, region.t_start)));
            cells
        }
        Scope::Query => (region.t_start..=region.t_end()).map(|t| (region.q_start, t)).collect(),
        Scope::Target => (region.q_start..=region.q_end()).map(|q| (q, region.t_start)).collect(),
    }
}

fn end_cells(region: &Region, scope: Scope) -> Vec<(usize, usize)> {
    match scope {
        Scope::Corner => vec![(region.q_end(), region.t_end())],
        Scope::Anywhere => {
            let mut cells = Vec::new();
            for q in region.q_start..=region.q_end() {
                for t in region.t_start..=region.t_end() {
                    cells.push((q, t));
                }
            }
            cells
        }
        Scope::Edge => {
            let mut cells: Vec<(usize, usize)> = (region.q_start..=region.q_end()).map(|q| (q, region.t_end())).collect();
            cells.extend((region.t_start..=region.t_end()).map(|t| (region.q_end(), t)));
            cells
        }
        Scope::Query => (region.t_start..=region.t_end()).map(|t| (region.q_end(), t)).collect(),
        Scope::Target => (region.q_start..=region.q_end()).map(|q| (q, region.t_end())).collect(),
    }
}

/// Build the DP grid over `region` without interpreting the result: the
/// shared machinery behind every [`Mode`], and the only piece `optimal.rs`
/// needs when it must land a sub-solve at a specific forced cell/state
/// rather than whatever `run`'s mode-specific scan would report.
///
/// `continuation`, when given, seeds only `continuation.state` at
/// `region`'s top-left corner (used to resume from an exact checkpoint);
/// otherwise every cell the model's start scope designates is seeded at
/// `START` per [`Model::cell_start`].
pub(crate) fn sweep<C>(model: &Model<C>, ctx: &C, region: Region, continuation: Option<&CellSnapshot>) -> Grid {
    assert!(model.is_closed(), "viterbi requires a closed model");
    let num_states = model.states().len();
    let mut grid = Grid {
        cells: vec![Cell::new(num_states); (region.q_length + 1) * (region.t_length + 1)],
        num_states,
        region,
    };

    model.run_extra_init(&region, ctx);

    match continuation {
        Some(snap) => {
            let cell = grid.cell_mut(region.q_start, region.t_start);
            cell.score[snap.state.0 as usize] = snap.score;
            cell.shadow_values[snap.state.0 as usize] = snap.shadow_values.clone();
            cell.span_progress[snap.state.0 as usize] = snap.span_progress;
        }
        None => {
            let start_id = crate::model::START;
            for (q, t) in start_cells(&region, model.start_scope()) {
                let cell = grid.cell_mut(q, t);
                cell.score[start_id.0 as usize] = model.cell_start(q, t);
            }
        }
    }

    for q in region.q_start..=region.q_end() {
        for t in region.t_start..=region.t_end() {
            for state in model.states() {
                let current = grid.cell(q, t).score[state.id.0 as usize];
                if current == IMPOSSIBLY_LOW {
                    continue;
                }
                let outgoing: Vec<TransitionId> = model.outgoing(state.id).to_vec();
                for tid in outgoing {
                    apply_transition(model, ctx, &mut grid, q, t, state.id, tid, current);
                }
            }
        }
    }

    model.run_extra_exit(&grid.region, ctx);
    grid
}

/// Run the DP sweep over `region` and interpret it according to `mode`.
/// `continuation` carries the starting state/score/shadow/span state to
/// resume from at `region`'s top-left corner, used by the reduced-space
/// divide-and-conquer driver in `optimal.rs` to stitch sub-regions together
/// without recomputing the whole grid (spec §4.3, "continuation mode").
pub fn run<C>(model: &Model<C>, ctx: &C, region: Region, mode: Mode, continuation: Option<&CellSnapshot>) -> ViterbiResult {
    let grid = sweep(model, ctx, region, continuation);
    let end_id = crate::model::END;

    let mut best_score = IMPOSSIBLY_LOW;
    let mut best_q = region.q_end();
    let mut best_t = region.t_end();
    for (q, t) in end_cells(&region, model.end_scope()) {
        let score = grid.score(q, t, end_id);
        if score > best_score {
            best_score = score;
            best_q = q;
            best_t = t;
        }
    }
    let final_cell = grid.snapshot(best_q, best_t, end_id);

    let (path, spanned_region) = match mode {
        Mode::FindPath | Mode::FindRegion if best_score > IMPOSSIBLY_LOW => {
            let (steps, _start_state, start_q, start_t) = traceback(model, &grid, best_q, best_t, end_id);
            let spanned = if mode == Mode::FindRegion {
                Some(Region::new(start_q, best_q - start_q, start_t, best_t - start_t))
            } else {
                None
            };
            (Some(steps), spanned)
        }
        _ => (None, None),
    };

    let checkpoints = if mode == Mode::FindCheckpoints {
        let t = region.t_end();
        let mut found = Vec::new();
        for q in region.q_start..=region.q_end() {
            for state in model.states() {
                if let Some(snapshot) = grid.snapshot(q, t, state.id) {
                    found.push(Checkpoint { q, snapshot });
                }
            }
        }
        Some(found)
    } else {
        None
    };

    ViterbiResult {
        best_score,
        best_state: end_id,
        best_q,
        best_t,
        path,
        spanned_region,
        checkpoints,
        final_cell,
    }
}

/// Trace back from a specific forced `(q, t, state)` rather than a
/// mode-scanned best end cell. Used by `optimal.rs` for the left half of a
/// checkpoint split, which must land in the exact checkpoint state the
/// right half continues from, not the model's generic end scope.
pub(crate) fn path_to<C>(model: &Model<C>, grid: &Grid, q: usize, t: usize, state: StateId) -> Option<(Vec<Step>, Score)> {
    let score = grid.score(q, t, state);
    if score <= IMPOSSIBLY_LOW {
        return None;
    }
    let (steps, _start_state, _start_q, _start_t) = traceback(model, grid, q, t, state);
    Some((steps, score))
}

fn apply_transition<C>(model: &Model<C>, ctx: &C, grid: &mut Grid, q: usize, t: usize, from: StateId, tid: TransitionId, from_score: Score) {
    let transition = model.transition(tid);
    let nq = q + transition.advance_q as usize;
    let nt = t + transition.advance_t as usize;
    if nq > grid.region.q_end() || nt > grid.region.t_end() {
        return;
    }

    let from_progress = grid.cell(q, t).span_progress[from.0 as usize];
    if transition.output != from {
        if let Some(span) = model.spans().iter().find(|s| s.state == from) {
            let (min_q, _max_q, min_t, _max_t) = span.bounds(ctx);
            if from_progress.0 < min_q || from_progress.1 < min_t {
                return;
            }
        }
    }

    let calc_score = transition.calc.map_or(0, |c| model.calc(c).score(q, t, ctx));
    let mut total = protected_add(from_score, calc_score);

    let mut new_shadow_values = grid.cell(q, t).shadow_values[from.0 as usize].clone();
    for shadow in model.shadows() {
        if shadow.sources.contains(&from) {
            let stored = shadow.start(q, t, ctx);
            new_shadow_values.insert(shadow.id, stored);
        }
        if shadow.dst_transitions.contains(&tid) {
            if let Some(&stored) = new_shadow_values.get(&shadow.id) {
                let bonus = shadow.end(stored, nq, nt, ctx);
                total = protected_add(total, bonus);
            }
        }
    }

    if total <= IMPOSSIBLY_LOW {
        return;
    }

    let dest = transition.output;
    let dest_progress = if dest == from {
        (from_progress.0 + transition.advance_q, from_progress.1 + transition.advance_t)
    } else {
        (transition.advance_q, transition.advance_t)
    };
    if let Some(span) = model.spans().iter().find(|s| s.state == dest) {
        let (_min_q, max_q, _min_t, max_t) = span.bounds(ctx);
        if dest_progress.0 > max_q || dest_progress.1 > max_t {
            return;
        }
    }

    let improves = {
        let cell = grid.cell(nq, nt);
        let existing = cell.score[dest.0 as usize];
        let ties_to_smaller_id = match cell.predecessor[dest.0 as usize] {
            Some(p) => tid.0 < p.0,
            None => true,
        };
        total > existing || (total == existing && ties_to_smaller_id)
    };
    if improves {
        let cell = grid.cell_mut(nq, nt);
        cell.score[dest.0 as usize] = total;
        cell.predecessor[dest.0 as usize] = Some(tid);
        cell.shadow_values[dest.0 as usize] = new_shadow_values;
        cell.span_progress[dest.0 as usize] = dest_progress;
    }
}

/// Walk predecessor links back from `(q, t, state)` until a cell with no
/// recorded predecessor (the state was seeded there, not reached by a
/// transition). Returns the collapsed step list plus where the chain
/// bottomed out, so `Mode::FindRegion` can report the region the path
/// actually spans.
fn traceback<C>(model: &Model<C>, grid: &Grid, mut q: usize, mut t: usize, mut state: StateId) -> (Vec<Step>, StateId, usize, usize) {
    let mut steps = Vec::new();
    loop {
        let Some(tid) = grid.cell(q, t).predecessor[state.0 as usize] else {
            break;
        };
        let transition = model.transition(tid);
        q -= transition.advance_q as usize;
        t -= transition.advance_t as usize;
        state = transition.input;
        if let Some(last) = steps.last_mut() {
            let last: &mut Step = last;
            if last.transition == tid {
                last.repeats += 1;
                continue;
            }
        }
        steps.push(Step { transition: tid, repeats: 1 });
    }
    steps.reverse();
    (steps, state, q, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::model::builders::{affine_local, ungapped_with_matrix, AffineContext, LinearContext};
    use crate::sequence::Sequence;
    use crate::submat::SubstitutionMatrix;

    fn ctx() -> LinearContext {
        LinearContext {
            query: Sequence::new("q", b"AAAA".to_vec(), Alphabet::Dna),
            target: Sequence::new("t", b"AAAA".to_vec(), Alphabet::Dna),
            matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
        }
    }

    #[test]
    fn ungapped_perfect_match_scores_five_per_base() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let ctx = ctx();
        let region = Region::new(0, 4, 0, 4);
        let result = run(&m, &ctx, region, Mode::FindScore, None);
        assert_eq!(result.best_score, 5);
    }

    #[test]
    fn find_path_reconstructs_the_match_transition() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let ctx = ctx();
        let region = Region::new(0, 1, 0, 1);
        let result = run(&m, &ctx, region, Mode::FindPath, None);
        let path = result.path.unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].repeats, 1);
    }

    #[test]
    fn find_region_reports_where_a_local_match_actually_starts() {
        let m = affine_local().unwrap().close().unwrap();
        let ctx = AffineContext {
            query: Sequence::new("q", b"TTACGTTT".to_vec(), Alphabet::Dna),
            target: Sequence::new("t", b"GGACGTGG".to_vec(), Alphabet::Dna),
            matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
            gap_open: 12,
            gap_extend: 4,
        };
        let region = Region::new(0, 8, 0, 8);
        let result = run(&m, &ctx, region, Mode::FindRegion, None);
        let spanned = result.spanned_region.unwrap();
        assert_eq!((spanned.q_start, spanned.q_end()), (2, 6));
        assert_eq!((spanned.t_start, spanned.t_end()), (2, 6));
    }

    #[test]
    fn find_checkpoints_collects_a_candidate_at_the_reachable_column() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let ctx = ctx();
        let region = Region::new(0, 4, 0, 4);
        let result = run(&m, &ctx, region, Mode::FindCheckpoints, None);
        let checkpoints = result.checkpoints.unwrap();
        assert!(checkpoints.iter().any(|c| c.q == 4));
    }
}
