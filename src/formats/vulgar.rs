//! VULGAR: a SUGAR line followed by `OP LEN_Q LEN_T` triples distinguishing
//! match/codon-match/gap/NER/splice/intron/split-codon/frameshift (spec
//! §6).

use super::{runs, sugar, AlignmentSummary, RunLabel};
use crate::alignment::Alignment;
use crate::model::Model;

fn op_char(label: RunLabel) -> char {
    match label {
        RunLabel::Match => 'M',
        RunLabel::CodonMatch => 'C',
        RunLabel::Gap => 'G',
        RunLabel::Ner => 'N',
        RunLabel::FivePrimeSplice => '5',
        RunLabel::ThreePrimeSplice => '3',
        RunLabel::Intron => 'I',
        RunLabel::SplitCodon => 'S',
        RunLabel::Frameshift => 'F',
    }
}

pub fn format<C>(summary: &AlignmentSummary, alignment: &Alignment, model: &Model<C>) -> String {
    let mut out = sugar::format(summary);
    for run in runs(alignment, model) {
        let len_q = run.advance_q * run.length;
        let len_t = run.advance_t * run.length;
        out.push_str(&format!(" {} {len_q} {len_t}", op_char(run.label)));
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
    fn ungapped_match_is_a_single_m_triple() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let ctx = LinearContext {
            query: Sequence::new("q", b"ACGTACGT".to_vec(), Alphabet::Dna),
            target: Sequence::new("t", b"ACGTACGT".to_vec(), Alphabet::Dna),
            matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
        };
        let region = Region::new(0, 8, 0, 8);
        let result = viterbi::run(&m, &ctx, region, Mode::FindPath, None);
        let mut alignment = crate::alignment::Alignment::from_steps(0, 0, &result.path.unwrap());
        alignment.score = result.best_score;
        let summary = AlignmentSummary::from_alignment(&alignment, &m, "q", Strand::Forward, "t", Strand::Forward);
        assert_eq!(format(&summary, &alignment, &m), "sugar: q 0 8 + t 0 8 + 40 M 8 8");
    }
}
