//! Alignment output formats (spec §6): SUGAR, CIGAR, VULGAR, GFF v2 and the
//! RYO ("roll your own") template language.

pub mod cigar;
pub mod gff;
pub mod ryo;
pub mod sugar;
pub mod vulgar;

use crate::alignment::Alignment;
use crate::model::{Label, Model};
use crate::sequence::Strand;

/// The coordinate/score summary every text format starts from (spec §6,
/// the SUGAR line).
#[derive(Debug, Clone)]
pub struct AlignmentSummary {
    pub q_id: String,
    pub q_start: usize,
    pub q_end: usize,
    pub q_strand: Strand,
    pub t_id: String,
    pub t_start: usize,
    pub t_end: usize,
    pub t_strand: Strand,
    pub score: i32,
}

pub(crate) fn strand_char(strand: Strand) -> char {
    match strand {
        Strand::Forward => '+',
        Strand::RevComp => '-',
        Strand::Unknown => '.',
    }
}

impl AlignmentSummary {
    pub fn from_alignment<C>(alignment: &Alignment, model: &Model<C>, q_id: impl Into<String>, q_strand: Strand, t_id: impl Into<String>, t_strand: Strand) -> Self {
        let (q_end, t_end) = alignment.end_coords(model);
        Self {
            q_id: q_id.into(),
            q_start: alignment.q_start,
            q_end,
            q_strand,
            t_id: t_id.into(),
            t_start: alignment.t_start,
            t_end,
            t_strand,
            score: alignment.score,
        }
    }
}

/// One coalesced run of identically-typed advances in an alignment,
/// shared by the CIGAR and VULGAR writers (spec §6: "adjacent identical
/// groups coalesce").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub advance_q: u32,
    pub advance_t: u32,
    pub label: RunLabel,
    pub length: u32,
}

/// A label stripped of any payload that shouldn't affect coalescing (e.g.
/// `SplitCodon`'s phase), since the text formats don't distinguish phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLabel {
    Match,
    CodonMatch,
    Gap,
    Ner,
    FivePrimeSplice,
    ThreePrimeSplice,
    Intron,
    SplitCodon,
    Frameshift,
}

fn classify(label: Label, advance_q: u32, advance_t: u32) -> Option<RunLabel> {
    Some(match label {
        Label::None => return None,
        Label::Match if advance_q == 3 && advance_t == 3 => RunLabel::CodonMatch,
        Label::Match => RunLabel::Match,
        Label::Gap => RunLabel::Gap,
        Label::Ner => RunLabel::Ner,
        Label::FiveSs => RunLabel::FivePrimeSplice,
        Label::ThreeSs => RunLabel::ThreePrimeSplice,
        Label::Intron => RunLabel::Intron,
        Label::SplitCodon { .. } => RunLabel::SplitCodon,
        Label::Frameshift => RunLabel::Frameshift,
    })
}

/// Walk `alignment`'s operations against `model`, dropping silent
/// transitions and coalescing adjacent runs that share a label and
/// per-repeat advance.
pub fn runs<C>(alignment: &Alignment, model: &Model<C>) -> Vec<Run> {
    let mut out: Vec<Run> = Vec::new();
    for op in alignment.operations() {
        let transition = model.transition(op.transition);
        let Some(label) = classify(transition.label, transition.advance_q, transition.advance_t) else {
            continue;
        };
        if let Some(last) = out.last_mut() {
            if last.label == label && last.advance_q == transition.advance_q && last.advance_t == transition.advance_t {
                last.length += op.length;
                continue;
            }
        }
        out.push(Run {
            advance_q: transition.advance_q,
            advance_t: transition.advance_t,
            label,
            length: op.length,
        });
    }
    out
}
