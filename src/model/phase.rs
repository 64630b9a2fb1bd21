//! The split-codon phase sub-model: lets an intron fall inside a codon
//! rather than strictly between codons (spec §4.2, "phase model").
//!
//! A codon has three possible split points relative to an intron: phase 0
//! (the intron sits between two codons, no split), phase 1 (one base before
//! the intron, two after) and phase 2 (two bases before, one after). This
//! module builds the two genuinely "split" variants; phase 0 needs no extra
//! machinery beyond the plain intron model (`super::intron`) wired directly
//! between codon boundaries.
//!
//! The pre-intron bases are captured by a shadow's `start_fn` (repurposing
//! its `i32` payload to carry packed bases rather than a bare coordinate,
//! which the shadow contract in `SPEC_FULL.md` §4 allows) and reassembled
//! with the post-intron bases at the shadow's `end_fn`, which also performs
//! the translation and protein-level scoring against the query.

use std::sync::Arc;

use super::intron::IntronContext;
use super::{Label, Model, Scope, END, START};
use crate::error::Result;
use crate::score::IMPOSSIBLY_LOW;
use crate::submat::SubstitutionMatrix;
use crate::translate::TranslationTable;

pub trait PhaseContext: IntronContext {
    fn query(&self) -> &crate::sequence::Sequence;
    fn translation_table(&self) -> &TranslationTable;
    fn protein_matrix(&self) -> &SubstitutionMatrix;
}

fn pack(bases: &[u8]) -> i32 {
    bases.iter().fold(0i32, |acc, &b| (acc << 8) | i32::from(b))
}

fn unpack(value: i32, n: usize) -> Vec<u8> {
    (0..n).rev().map(|i| ((value >> (8 * i)) & 0xff) as u8).collect()
}

/// Build one split-codon phase variant. `pre_bases` is 1 (phase 1) or 2
/// (phase 2); the remainder of the codon (`3 - pre_bases`) is consumed after
/// the intron.
pub fn build<C: PhaseContext + 'static>(pre_bases: usize) -> Result<Model<C>> {
    assert!(pre_bases == 1 || pre_bases == 2, "split-codon phase must be 1 or 2");
    let post_bases = 3 - pre_bases;

    let mut m = Model::new(format!("split-codon-phase-{pre_bases}"));
    m.configure_start(Scope::Anywhere, None)?;
    m.configure_end(Scope::Anywhere, None)?;

    let pre_split = m.add_state("pre-split")?;
    let post_split = m.add_state("post-split")?;

    let pre_transition = m.add_transition(
        "consume-pre-split-bases",
        START,
        pre_split,
        0,
        pre_bases as u32,
        None,
        Label::SplitCodon { phase: pre_bases as u8 },
    )?;

    let intron_sub = super::intron::build::<C>()?;
    let inserted = m.insert(intron_sub, Some(pre_split), Some(post_split))?;
    let _ = inserted;

    // The codon's actual score comes entirely from the reassembly shadow
    // below, which has the pre-split bases; this calc is a zero-scoring
    // placeholder so the final transition has a calc slot to attach to.
    let score_calc = m.add_calc("split-codon-translation", 0, |_q, _t, _ctx: &C| 0, None, None, true)?;

    let final_transition = m.add_transition(
        "consume-post-split-bases",
        post_split,
        END,
        1,
        post_bases as u32,
        Some(score_calc),
        Label::SplitCodon { phase: pre_bases as u8 },
    )?;

    m.add_shadow(
        "split-codon-reassembly",
        [START],
        [final_transition],
        move |_q, t, ctx: &C| pack(&(0..pre_bases).map(|i| ctx.target().get(t + i)).collect::<Vec<_>>()),
        move |stored, q, t, ctx: &C| {
            let pre = unpack(stored, pre_bases);
            let post_start = t - post_bases;
            let post: Vec<u8> = (0..post_bases).map(|i| ctx.target().get(post_start + i)).collect();
            let mut codon = pre;
            codon.extend(post);
            let amino = ctx.translation_table().translate(codon[0], codon[1], codon[2]);
            if q == 0 {
                return IMPOSSIBLY_LOW;
            }
            let query_residue = ctx.query().get(q - 1);
            ctx.protein_matrix().score(query_residue, amino)
        },
    )?;

    let _ = pre_transition;
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::sequence::Sequence;
    use crate::splice::{SiteType, SplicePredictor};

    struct Ctx {
        target: Sequence,
        query: Sequence,
        five: Arc<SplicePredictor>,
        three: Arc<SplicePredictor>,
        table: TranslationTable,
        matrix: SubstitutionMatrix,
    }

    impl IntronContext for Ctx {
        fn target(&self) -> &Sequence {
            &self.target
        }
        fn five_prime(&self) -> &Arc<SplicePredictor> {
            &self.five
        }
        fn three_prime(&self) -> &Arc<SplicePredictor> {
            &self.three
        }
        fn min_intron_length(&self) -> usize {
            4
        }
        fn max_intron_length(&self) -> usize {
            1000
        }
    }

    impl PhaseContext for Ctx {
        fn query(&self) -> &Sequence {
            &self.query
        }
        fn translation_table(&self) -> &TranslationTable {
            &self.table
        }
        fn protein_matrix(&self) -> &SubstitutionMatrix {
            &self.matrix
        }
    }

    #[test]
    fn phase_one_submodel_closes() {
        assert!(build::<Ctx>(1).unwrap().close().is_ok());
    }

    #[test]
    fn phase_two_submodel_closes() {
        assert!(build::<Ctx>(2).unwrap().close().is_ok());
    }

    #[test]
    fn pack_unpack_round_trips() {
        assert_eq!(unpack(pack(&[b'A', b'T']), 2), vec![b'A', b'T']);
        assert_eq!(unpack(pack(&[b'G']), 1), vec![b'G']);
    }

    #[test]
    fn reassembly_shadow_reconstructs_codon_and_scores() {
        let matrix = SubstitutionMatrix::blosum62();
        let c = Ctx {
            target: Sequence::new("t", b"AATG".to_vec(), Alphabet::Dna),
            query: Sequence::new("q", vec![b'M'], Alphabet::Protein),
            five: Arc::new(SplicePredictor::builtin_primate(SiteType::FivePrimeForward)),
            three: Arc::new(SplicePredictor::builtin_primate(SiteType::ThreePrimeForward)),
            table: TranslationTable::standard(),
            matrix,
        };
        let m = build::<Ctx>(1).unwrap().close().unwrap();
        let shadow = &m.shadows()[0];
        // pre_bases=1: "A" captured at t=1, then post_bases=2 "TG" consumed
        // after, codon reassembles to "ATG" = Met, matching query residue M.
        let stored = shadow.start(0, 1, &c);
        let score = shadow.end(stored, 1, 4, &c);
        assert_eq!(score, c.protein_matrix().score(b'M', b'M'));
    }
}
