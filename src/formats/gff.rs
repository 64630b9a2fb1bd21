//! GFF v2 feature output (spec §6): one `gene` feature spanning the whole
//! alignment plus `exon`/`intron`/`splice5`/`splice3`/`similarity` features
//! derived from its runs. Coordinates are 1-based inclusive; when
//! `forward_strand_coords` is set, reverse-strand coordinates are mirrored
//! back onto the forward strand before being written.

use super::{runs, strand_char, AlignmentSummary, RunLabel};
use crate::alignment::Alignment;
use crate::model::Model;
use crate::sequence::Strand;

pub struct GffOptions {
    pub source: String,
    pub forward_strand_coords: bool,
}

impl Default for GffOptions {
    fn default() -> Self {
        Self {
            source: "c4align".to_string(),
            forward_strand_coords: false,
        }
    }
}

fn mirror(start: usize, end: usize, length: usize, strand: Strand, forward_strand_coords: bool) -> (usize, usize) {
    if forward_strand_coords && strand == Strand::RevComp {
        (length.saturating_sub(end), length.saturating_sub(start))
    } else {
        (start, end)
    }
}

fn line(seqid: &str, source: &str, feature: &str, start: usize, end: usize, score: i32, strand: char, attributes: &str) -> String {
    // GFF is 1-based inclusive; `start`/`end` arrive as 0-based half-open.
    format!("{seqid}\t{source}\t{feature}\t{}\t{end}\t{score}\t{strand}\t.\t{attributes}", start + 1)
}

#[allow(clippy::too_many_arguments)]
pub fn format<C>(summary: &AlignmentSummary, alignment: &Alignment, model: &Model<C>, target_length: usize, options: &GffOptions) -> Vec<String> {
    let strand = strand_char(summary.t_strand);
    let mut out = Vec::new();

    let (gene_start, gene_end) = mirror(summary.t_start, summary.t_end, target_length, summary.t_strand, options.forward_strand_coords);
    out.push(line(
        &summary.t_id,
        &options.source,
        "gene",
        gene_start,
        gene_end,
        summary.score,
        strand,
        &format!("Target {} {} {} ; Score {}", summary.q_id, summary.q_start + 1, summary.q_end, summary.score),
    ));

    let mut t_cursor = summary.t_start;
    for run in runs(alignment, model) {
        let feature = match run.label {
            RunLabel::Intron => Some("intron"),
            RunLabel::FivePrimeSplice => Some("splice5"),
            RunLabel::ThreePrimeSplice => Some("splice3"),
            RunLabel::Match | RunLabel::CodonMatch => Some("exon"),
            RunLabel::SplitCodon => Some("exon"),
            RunLabel::Gap | RunLabel::Ner | RunLabel::Frameshift => None,
        };
        let span = run.advance_t * run.length;
        if let Some(feature) = feature {
            let (start, end) = mirror(t_cursor, t_cursor + span as usize, target_length, summary.t_strand, options.forward_strand_coords);
            out.push(line(&summary.t_id, &options.source, feature, start, end, summary.score, strand, "."));
        }
        t_cursor += span as usize;
    }

    out
}
