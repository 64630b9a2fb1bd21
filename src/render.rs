//! Terminal pairwise-alignment rendering, adapted from the teacher's
//! three-line (query/markers/target) wrapped display.

use std::fmt::Write as _;

use colored::Colorize;

use crate::alignment::Alignment;
use crate::model::{Label, Model};
use crate::stats::{number_length, score_stats};
use crate::submat::SubstitutionMatrix;

/// Print a full alignment report: identity/similarity/gap summary line
/// followed by a line-wrapped three-row display (query, markers, target).
pub fn show_alignment<C>(alignment: &Alignment, model: &Model<C>, matrix: &SubstitutionMatrix, query: &[u8], target: &[u8], line_width: usize) {
    let (identical, similar, gaps, length) = score_stats(alignment, model, matrix, query, target);

    println!(
        "Identity: {} {}, Similarity: {} {}, Gaps: {} {}, Score: {}\n",
        format!("{:.3}", identical as f64 / length as f64).blue(),
        format!("({identical}/{length})").dimmed(),
        format!("{:.3}", similar as f64 / length as f64).cyan(),
        format!("({similar}/{length})").dimmed(),
        format!("{:.3}", gaps as f64 / length as f64).green(),
        format!("({gaps}/{length})").dimmed(),
        alignment.score.to_string().yellow(),
    );

    let mut lines = (String::new(), String::new(), String::new());
    let mut numbers = String::new();
    let mut q = alignment.q_start;
    let mut t = alignment.t_start;
    let mut column = 0usize;

    macro_rules! line {
        ($top:expr, $bottom:expr, $marker:expr, $colour:ident) => {
            write!(&mut lines.0, "{}", $top.$colour()).unwrap();
            write!(&mut lines.1, "{}", $marker.$colour()).unwrap();
            write!(&mut lines.2, "{}", $bottom.$colour()).unwrap();
        };
    }

    for op in alignment.operations() {
        let transition = model.transition(op.transition);
        for _ in 0..op.length {
            match (transition.advance_q, transition.advance_t) {
                (0, at) if at > 0 => {
                    for _ in 0..at {
                        line!("-", String::from_utf8_lossy(&[target[t]]), "+", yellow);
                        t += 1;
                    }
                }
                (aq, 0) if aq > 0 => {
                    for _ in 0..aq {
                        line!(String::from_utf8_lossy(&[query[q]]), "-", "+", yellow);
                        q += 1;
                    }
                }
                (aq, at) if aq == at && aq > 0 => {
                    for offset in 0..aq as usize {
                        let a = query[q + offset];
                        let b = target[t + offset];
                        if a.to_ascii_uppercase() == b.to_ascii_uppercase() {
                            line!(String::from_utf8_lossy(&[a]), String::from_utf8_lossy(&[b]), " ", normal);
                        } else if transition.label == Label::Match && matrix.score(a, b) > 0 {
                            line!(String::from_utf8_lossy(&[a]), String::from_utf8_lossy(&[b]), "-", green);
                        } else {
                            line!(String::from_utf8_lossy(&[a]), String::from_utf8_lossy(&[b]), "x", red);
                        }
                    }
                    q += aq as usize;
                    t += at as usize;
                }
                _ => continue,
            }
            column += 1;
            write!(&mut numbers, " ").unwrap();
            if column % 10 == 0 {
                numbers.truncate(numbers.len() - number_length(column));
                write!(&mut numbers, "{column}").unwrap();
            }
            if column % line_width == 0 {
                flush(&numbers, &lines);
                lines = (String::new(), String::new(), String::new());
                numbers = String::new();
            }
        }
    }
    flush(&numbers, &lines);
}

fn flush(numbers: &str, lines: &(String, String, String)) {
    println!("{}", numbers.dimmed());
    println!("{}", lines.0);
    println!("{}", lines.1);
    println!("{}", lines.2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::model::builders::{ungapped_with_matrix, LinearContext};
    use crate::region::Region;
    use crate::sequence::Sequence;
    use crate::viterbi::{self, Mode};

    #[test]
    fn renders_a_short_ungapped_alignment_without_panicking() {
        let m = ungapped_with_matrix().unwrap().close().unwrap();
        let matrix = SubstitutionMatrix::dna_match_mismatch(5, -4);
        let ctx = LinearContext {
            query: Sequence::new("q", b"ACGTACGT".to_vec(), Alphabet::Dna),
            target: Sequence::new("t", b"ACGTACGT".to_vec(), Alphabet::Dna),
            matrix: matrix.clone(),
        };
        let region = Region::new(0, 8, 0, 8);
        let result = viterbi::run(&m, &ctx, region, Mode::FindPath, None);
        let mut alignment = Alignment::from_steps(0, 0, &result.path.unwrap());
        alignment.score = result.best_score;
        show_alignment(&alignment, &m, &matrix, b"ACGTACGT", b"ACGTACGT", 80);
    }
}
