//! Word-neighborhood expansion: given a word and a substitution matrix,
//! enumerate every word within a score threshold of it (spec §4.5,
//! "wordhood"), used to seed HSPs from an index of target words.

use crate::submat::SubstitutionMatrix;

/// Depth-first expansion of `word`'s neighborhood under `matrix`, calling
/// `visit` once per neighbor (including `word` itself) whose total
/// substitution score against `word` is `>= min_score`.
pub fn expand_neighborhood(word: &[u8], alphabet: &[u8], matrix: &SubstitutionMatrix, min_score: i32, mut visit: impl FnMut(&[u8], i32)) {
    let mut buffer = word.to_vec();
    let own_scores: Vec<i32> = word.iter().map(|&s| matrix.score(s, s)).collect();
    let max_suffix_score = suffix_max_scores(&own_scores);
    recurse(word, alphabet, matrix, min_score, 0, 0, &max_suffix_score, &mut buffer, &mut visit);
}

/// `max_suffix[i]` is the best possible score obtainable from position `i`
/// onward, used to prune branches that cannot reach `min_score` even in the
/// best case (spec §4.5: "prune once the remaining positions cannot make up
/// the shortfall").
fn suffix_max_scores(own_scores: &[i32]) -> Vec<i32> {
    let mut out = vec![0i32; own_scores.len() + 1];
    for i in (0..own_scores.len()).rev() {
        out[i] = out[i + 1] + own_scores[i];
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    word: &[u8],
    alphabet: &[u8],
    matrix: &SubstitutionMatrix,
    min_score: i32,
    pos: usize,
    score_so_far: i32,
    max_suffix_score: &[i32],
    buffer: &mut Vec<u8>,
    visit: &mut impl FnMut(&[u8], i32),
) {
    if pos == word.len() {
        if score_so_far >= min_score {
            visit(buffer, score_so_far);
        }
        return;
    }
    if score_so_far + max_suffix_score[pos] < min_score {
        return; // even matching every remaining position perfectly can't recover
    }
    for &symbol in alphabet {
        let pair_score = matrix.score(word[pos], symbol);
        buffer[pos] = symbol;
        recurse(
            word,
            alphabet,
            matrix,
            min_score,
            pos + 1,
            score_so_far + pair_score,
            max_suffix_score,
            buffer,
            visit,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_word_is_always_in_its_own_neighborhood() {
        let matrix = SubstitutionMatrix::dna_match_mismatch(5, -4);
        let mut seen = Vec::new();
        expand_neighborhood(b"ACGT", b"ACGT", &matrix, 20, |w, s| seen.push((w.to_vec(), s)));
        assert!(seen.iter().any(|(w, s)| w == b"ACGT" && *s == 20));
    }

    #[test]
    fn threshold_excludes_distant_neighbors() {
        let matrix = SubstitutionMatrix::dna_match_mismatch(5, -4);
        let mut seen = Vec::new();
        expand_neighborhood(b"AAAA", b"ACGT", &matrix, 20, |w, s| seen.push((w.to_vec(), s)));
        // Only the perfect match scores 20 with a uniform mismatch penalty
        // this harsh relative to the match reward.
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn lower_threshold_admits_single_substitutions() {
        let matrix = SubstitutionMatrix::dna_match_mismatch(5, -4);
        let mut seen = Vec::new();
        expand_neighborhood(b"AAAA", b"ACGT", &matrix, 11, |w, s| seen.push((w.to_vec(), s)));
        // 3 matches (+15) + 1 mismatch (-4) = 11, admitting every single
        // substitution of one base out of four.
        assert_eq!(seen.len(), 1 + 4 * 3);
    }
}
