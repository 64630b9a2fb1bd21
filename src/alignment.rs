//! Alignments as run-length-encoded operation sequences over a model's
//! transitions (spec §4.4).

use crate::error::{Error, Result};
use crate::model::{Model, TransitionId};
use crate::score::{protected_add, Score};
use crate::viterbi::Step;

/// A single run in an alignment: a transition repeated `length` times
/// contiguously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub transition: TransitionId,
    pub length: u32,
}

/// A complete alignment: where it starts in both sequences, and the
/// run-length-encoded path of transitions taken to the end.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub q_start: usize,
    pub t_start: usize,
    pub score: Score,
    operations: Vec<Operation>,
}

impl Alignment {
    pub fn new(q_start: usize, t_start: usize) -> Self {
        Self {
            q_start,
            t_start,
            score: 0,
            operations: Vec::new(),
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Append `length` repeats of `transition`, coalescing into the
    /// previous run if it names the same transition, and silently dropping
    /// zero-length runs (spec §4.4, "add").
    pub fn add(&mut self, transition: TransitionId, length: u32) {
        if length == 0 {
            return;
        }
        if let Some(last) = self.operations.last_mut() {
            if last.transition == transition {
                last.length += length;
                return;
            }
        }
        self.operations.push(Operation { transition, length });
    }

    /// Build an alignment from a Viterbi traceback.
    pub fn from_steps(q_start: usize, t_start: usize, steps: &[Step]) -> Self {
        let mut alignment = Self::new(q_start, t_start);
        for step in steps {
            alignment.add(step.transition, step.repeats);
        }
        alignment
    }

    /// Splice `other`'s operations onto the end of `self`, used to stitch
    /// together the sub-alignments produced by reduced-space checkpoint
    /// recursion (spec §4.3). `other`'s own `q_start`/`t_start` are ignored;
    /// the caller is responsible for having verified contiguity.
    pub fn import_derived(&mut self, other: &Alignment) {
        for op in &other.operations {
            self.add(op.transition, op.length);
        }
        self.score = protected_add(self.score, other.score);
    }

    /// Final `(q, t)` coordinate reached after replaying every operation.
    pub fn end_coords<C>(&self, model: &Model<C>) -> (usize, usize) {
        let mut q = self.q_start;
        let mut t = self.t_start;
        for op in &self.operations {
            let transition = model.transition(op.transition);
            q += transition.advance_q as usize * op.length as usize;
            t += transition.advance_t as usize * op.length as usize;
        }
        (q, t)
    }

    /// Replay every operation against `model`/`ctx`, recomputing the score
    /// from scratch and comparing it against `self.score` (spec §4.4,
    /// "validate"). Shadow scoring is intentionally not replayed here: a
    /// shadow's contribution only makes sense evaluated in-sweep, so
    /// validation instead re-derives the calc-only subtotal and requires it
    /// not to exceed the recorded score (shadows may only ever subtract).
    pub fn is_valid<C>(&self, model: &Model<C>, ctx: &C) -> Result<bool> {
        let mut q = self.q_start;
        let mut t = self.t_start;
        let mut total: Score = 0;
        for op in &self.operations {
            let transition = model.transition(op.transition);
            for _ in 0..op.length {
                let calc_score = transition.calc.map_or(0, |c| model.calc(c).score(q, t, ctx));
                total = protected_add(total, calc_score);
                q += transition.advance_q as usize;
                t += transition.advance_t as usize;
            }
        }
        let (expected_q, expected_t) = self.end_coords(model);
        if q != expected_q || t != expected_t {
            return Err(Error::InvalidModel("alignment replay drifted from its own recorded end coordinates".into()));
        }
        Ok(total >= self.score)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn query_length<C>(&self, model: &Model<C>) -> usize {
        self.operations
            .iter()
            .map(|op| model.transition(op.transition).advance_q as usize * op.length as usize)
            .sum()
    }

    pub fn target_length<C>(&self, model: &Model<C>) -> usize {
        self.operations
            .iter()
            .map(|op| model.transition(op.transition).advance_t as usize * op.length as usize)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::model::builders::{ungapped_with_matrix, LinearContext};
    use crate::region::Region;
    use crate::sequence::Sequence;
    use crate::submat::SubstitutionMatrix;
    use crate::viterbi::{self, Mode};

    #[test]
    fn coalesces_repeated_transitions() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let match_transition = m.transitions().iter().find(|t| t.name == "match-match").unwrap().id;
        let mut a = Alignment::new(0, 0);
        a.add(match_transition, 2);
        a.add(match_transition, 3);
        assert_eq!(a.operations().len(), 1);
        assert_eq!(a.operations()[0].length, 5);
    }

    #[test]
    fn zero_length_add_is_dropped() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let t = m.transitions()[0].id;
        let mut a = Alignment::new(0, 0);
        a.add(t, 0);
        assert!(a.is_empty());
    }

    #[test]
    fn traceback_alignment_replays_to_matching_score() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let ctx = LinearContext {
            query: Sequence::new("q", b"AAAA".to_vec(), Alphabet::Dna),
            target: Sequence::new("t", b"AAAA".to_vec(), Alphabet::Dna),
            matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
        };
        let region = Region::new(0, 4, 0, 4);
        let result = viterbi::run(&m, &ctx, region, Mode::FindPath, None);
        let mut alignment = Alignment::from_steps(0, 0, &result.path.unwrap());
        alignment.score = result.best_score;
        assert!(alignment.is_valid(&m, &ctx).unwrap());
        assert_eq!(alignment.query_length(&m), 4);
        assert_eq!(alignment.target_length(&m), 4);
    }
}
