//! CIGAR: a SUGAR line followed by `OP LEN` runs (spec §6).

use super::{runs, sugar, AlignmentSummary};
use crate::alignment::Alignment;
use crate::model::Model;

pub fn format<C>(summary: &AlignmentSummary, alignment: &Alignment, model: &Model<C>) -> String {
    let mut out = sugar::format(summary);
    for run in runs(alignment, model) {
        let op = if run.advance_q > 0 && run.advance_t > 0 {
            'M'
        } else if run.advance_t == 0 {
            'I'
        } else {
            'D'
        };
        let move_len = run.advance_q.max(run.advance_t) * run.length;
        out.push_str(&format!(" {op} {move_len}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::model::builders::{ungapped_with_matrix, LinearContext};
    use crate::region::Region;
    use crate::sequence::{Sequence, Strand};
    use crate::submat::SubstitutionMatrix;
    use crate::viterbi::{self, Mode};

    #[test]
    fn scenario_a_ungapped_match_is_a_single_m_run() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let ctx = LinearContext {
            query: Sequence::new("q", b"ACGTACGT".to_vec(), Alphabet::Dna),
            target: Sequence::new("t", b"ACGTACGT".to_vec(), Alphabet::Dna),
            matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
        };
        let region = Region::new(0, 8, 0, 8);
        let result = viterbi::run(&m, &ctx, region, Mode::FindPath, None);
        assert_eq!(result.best_score, 40);
        let mut alignment = crate::alignment::Alignment::from_steps(0, 0, &result.path.unwrap());
        alignment.score = result.best_score;

        let summary = AlignmentSummary::from_alignment(&alignment, &m, "q", Strand::Forward, "t", Strand::Forward);
        let cigar = format(&summary, &alignment, &m);
        assert_eq!(cigar, "sugar: q 0 8 + t 0 8 + 40 M 8");
    }
}
