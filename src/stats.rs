//! Small rendering helpers shared by [`crate::render`]: per-operation
//! identity/similarity/gap tallies and the digit width of a line-number
//! column.

use crate::alignment::Alignment;
use crate::model::{Label, Model};
use crate::submat::SubstitutionMatrix;

/// Walk `alignment`'s operations against `model`, scoring each 1-for-1
/// match/mismatch step through `matrix`. Returns `(identical, similar,
/// gaps, length)` where `similar` includes `identical` and `length` is the
/// number of scored columns (gap and NER runs count toward it once per
/// advance, matching the teacher's own `score_stats`).
pub fn score_stats<C>(alignment: &Alignment, model: &Model<C>, matrix: &SubstitutionMatrix, query: &[u8], target: &[u8]) -> (usize, usize, usize, usize) {
    let mut q = alignment.q_start;
    let mut t = alignment.t_start;
    let mut identical = 0;
    let mut similar = 0;
    let mut gaps = 0;
    let mut length = 0;

    for op in alignment.operations() {
        let transition = model.transition(op.transition);
        for _ in 0..op.length {
            match (transition.advance_q, transition.advance_t) {
                (0, _) | (_, 0) if transition.advance_q != transition.advance_t => {
                    gaps += 1;
                    length += 1;
                }
                (aq, at) if aq == at && aq > 0 && transition.label == Label::Match => {
                    let a = query.get(q).copied().unwrap_or(b'N');
                    let b = target.get(t).copied().unwrap_or(b'N');
                    if a.to_ascii_uppercase() == b.to_ascii_uppercase() {
                        identical += 1;
                        similar += 1;
                    } else if matrix.score(a, b) > 0 {
                        similar += 1;
                    }
                    length += 1;
                }
                _ => {}
            }
            q += transition.advance_q as usize;
            t += transition.advance_t as usize;
        }
    }
    (identical, similar, gaps, length.max(1))
}

/// Number of decimal digits in `i`, used to right-trim the ruler line so a
/// multi-digit position marker doesn't shift later columns.
pub fn number_length(i: usize) -> usize {
    if i == 0 {
        1
    } else {
        i.ilog10() as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_length_matches_digit_count() {
        assert_eq!(number_length(0), 1);
        assert_eq!(number_length(9), 1);
        assert_eq!(number_length(10), 2);
        assert_eq!(number_length(999), 3);
        assert_eq!(number_length(1000), 4);
    }
}
