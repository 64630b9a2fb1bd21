//! High-scoring pair (HSP) seeding (spec §4.5): find short exact or
//! near-exact word matches between query and target, then extend each with
//! a drop-off X-drop algorithm bounded by a per-diagonal horizon and a
//! repeat-seed cap.

use std::collections::HashMap;

use crate::fsm::Automaton;
use crate::region::Region;
use crate::sequence::Sequence;
use crate::submat::SubstitutionMatrix;
use crate::wordhood::expand_neighborhood;

/// A seeded, ungapped high-scoring pair before extension into a full
/// alignment region.
#[derive(Debug, Clone, Copy)]
pub struct Hsp {
    pub q_start: usize,
    pub t_start: usize,
    pub length: usize,
    pub score: i32,
}

impl Hsp {
    pub fn diagonal(&self) -> isize {
        self.t_start as isize - self.q_start as isize
    }

    pub fn to_region(self) -> Region {
        Region::new(self.q_start, self.length, self.t_start, self.length)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SeedParams {
    pub word_length: usize,
    pub word_threshold: i32,
    pub drop_off: i32,
    /// How many times the same diagonal may be re-seeded before later hits
    /// on it are skipped (spec §4.5, "seed_repeat").
    pub seed_repeat: u32,
    /// Caps how far along a diagonal a seed's extension horizon may run
    /// before stopping, independent of score (spec §4.5, "per-diagonal
    /// horizon").
    pub diagonal_horizon: usize,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            word_length: 11,
            word_threshold: 0,
            drop_off: 20,
            seed_repeat: 3,
            diagonal_horizon: usize::MAX,
        }
    }
}

/// Build a word index over `target` and seed every HSP between it and
/// `query`, masking positions for which `is_masked` returns `true` (spec
/// §4.5, "masking predicate").
pub fn seed_all(query: &Sequence, target: &Sequence, alphabet: &[u8], matrix: &SubstitutionMatrix, params: SeedParams, is_masked: impl Fn(usize) -> bool) -> Vec<Hsp> {
    let mut automaton = Automaton::new();
    let mut word = vec![0u8; params.word_length];
    if target.len() >= params.word_length {
        for t_start in 0..=target.len() - params.word_length {
            if (t_start..t_start + params.word_length).any(&is_masked) {
                continue;
            }
            for i in 0..params.word_length {
                word[i] = target.get(t_start + i);
            }
            automaton.add(&word, t_start);
        }
    }
    let compiled = automaton.compile();

    let mut diagonal_counts: HashMap<isize, u32> = HashMap::new();
    let mut hsps = Vec::new();

    if query.len() < params.word_length {
        return hsps;
    }
    for q_start in 0..=query.len() - params.word_length {
        let mut qword = vec![0u8; params.word_length];
        for i in 0..params.word_length {
            qword[i] = query.get(q_start + i);
        }
        expand_neighborhood(&qword, alphabet, matrix, params.word_threshold, |neighbor, _score| {
            compiled.traverse(neighbor, |end_pos, &t_start| {
                if end_pos + 1 != params.word_length {
                    return;
                }
                seed_one(query, target, matrix, &params, q_start, t_start, &mut diagonal_counts, &mut hsps);
            });
        });
    }
    hsps
}

#[allow(clippy::too_many_arguments)]
fn seed_one(query: &Sequence, target: &Sequence, matrix: &SubstitutionMatrix, params: &SeedParams, q_start: usize, t_start: usize, diagonal_counts: &mut HashMap<isize, u32>, out: &mut Vec<Hsp>) {
    let diagonal = t_start as isize - q_start as isize;
    let count = diagonal_counts.entry(diagonal).or_insert(0);
    if *count >= params.seed_repeat {
        return;
    }
    *count += 1;

    let extended = extend(query, target, matrix, params, q_start, t_start);
    out.push(extended);
}

/// Drop-off (X-drop) extension in both directions from a seed word, per
/// spec §4.5: extend while the running score stays within `drop_off` of the
/// best score seen so far, and never past `diagonal_horizon` residues from
/// the seed.
fn extend(query: &Sequence, target: &Sequence, matrix: &SubstitutionMatrix, params: &SeedParams, q_start: usize, t_start: usize) -> Hsp {
    let word_len = params.word_length;
    let base_score: i32 = (0..word_len).map(|i| matrix.score(query.get(q_start + i), target.get(t_start + i))).sum();

    let (left_ext, left_score) = extend_direction(query, target, matrix, params, q_start, t_start, -1);
    let (right_ext, right_score) = extend_direction(
        query,
        target,
        matrix,
        params,
        q_start + word_len - 1,
        t_start + word_len - 1,
        1,
    );

    Hsp {
        q_start: q_start - left_ext,
        t_start: t_start - left_ext,
        length: left_ext + word_len + right_ext,
        score: base_score + left_score + right_score,
    }
}

fn extend_direction(query: &Sequence, target: &Sequence, matrix: &SubstitutionMatrix, params: &SeedParams, from_q: usize, from_t: usize, dir: isize) -> (usize, i32) {
    let mut best_score = 0i32;
    let mut running = 0i32;
    let mut best_extent = 0usize;
    let mut extent = 0usize;
    loop {
        if extent >= params.diagonal_horizon {
            break;
        }
        let (q, t) = if dir < 0 {
            let step = extent + 1;
            if step > from_q || step > from_t {
                break;
            }
            (from_q - step, from_t - step)
        } else {
            (from_q + extent + 1, from_t + extent + 1)
        };
        if q >= query.len() || t >= target.len() {
            break;
        }
        running += matrix.score(query.get(q), target.get(t));
        extent += 1;
        if running > best_score {
            best_score = running;
            best_extent = extent;
        } else if best_score - running > params.drop_off {
            break;
        }
    }
    (best_extent, best_score)
}
