//! The intron sub-model: a spliceable gap in the target sequence bounded by
//! GT..AG donor/acceptor dinucleotides and a minimum/maximum length (spec
//! §4.2, "intron model").
//!
//! Built as a standalone [`Model`] with its own `START`/`END`, meant to be
//! spliced into a host model at a coding state via [`Model::insert`].

use std::sync::Arc;

use super::{Label, Model, Scope, END, START};
use crate::error::Result;
use crate::score::{protected_add, IMPOSSIBLY_LOW};
use crate::sequence::Sequence;
use crate::splice::SplicePredictor;

/// Whatever a model needs in order to score an intron: the target sequence
/// it is splicing out of, the donor/acceptor predictors, and the length
/// bound taken from configuration (spec §6, `intron_min_length`/
/// `intron_max_length`).
pub trait IntronContext {
    fn target(&self) -> &Sequence;
    fn five_prime(&self) -> &Arc<SplicePredictor>;
    fn three_prime(&self) -> &Arc<SplicePredictor>;
    fn min_intron_length(&self) -> usize;
    fn max_intron_length(&self) -> usize;
    /// Per-base penalty charged while inside the intron body, separate from
    /// the donor/acceptor site scores.
    fn intron_open_penalty(&self) -> i32 {
        0
    }
}

/// Build the intron sub-model for contexts of kind `C`.
pub fn build<C: IntronContext + 'static>() -> Result<Model<C>> {
    let mut m = Model::new("intron");
    m.configure_start(Scope::Anywhere, None)?;
    m.configure_end(Scope::Anywhere, None)?;

    let five_ss = m.add_state("5'SS")?;
    let intron = m.add_state("intron")?;
    let three_ss = m.add_state("3'SS")?;

    let five_calc = m.add_calc(
        "five-prime-splice-site",
        0,
        |_q, t, ctx: &C| ctx.five_prime().score_at(ctx.target(), t),
        None,
        None,
        true,
    )?;
    let intron_calc = m.add_calc(
        "intron-body",
        0,
        |_q, _t, ctx: &C| -ctx.intron_open_penalty(),
        None,
        None,
        true,
    )?;
    let three_calc = m.add_calc(
        "three-prime-splice-site",
        0,
        |_q, t, ctx: &C| ctx.three_prime().score_at(ctx.target(), t),
        None,
        None,
        true,
    )?;

    m.add_transition("enter-intron", START, five_ss, 0, 2, Some(five_calc), Label::FiveSs)?;
    m.add_transition("intron-silent-entry", five_ss, intron, 0, 0, None, Label::None)?;
    m.add_transition("intron-extend", intron, intron, 0, 1, Some(intron_calc), Label::Intron)?;
    m.add_transition("intron-silent-exit", intron, three_ss, 0, 0, None, Label::None)?;
    let exit = m.add_transition("exit-intron", three_ss, END, 0, 2, Some(three_calc), Label::ThreeSs)?;

    // The body self-loop only ever advances `t`; bound it directly so the DP
    // engine can prune/stop extending it without waiting for the shadow at
    // `exit-intron`. The `saturating_sub(4)` accounts for the 2+2 bases the
    // fixed-width `enter-intron`/`exit-intron` transitions already consume
    // outside the self-loop, so this is an exact bound, not a loose one.
    m.add_span(intron, |ctx: &C| {
        let min_t = (ctx.min_intron_length().saturating_sub(4)) as u32;
        let max_t = (ctx.max_intron_length().saturating_sub(4)) as u32;
        (0, 0, min_t, max_t)
    })?;

    // The span above bounds the body in isolation; it cannot see the two SS
    // transitions, so total length is still independently enforced with a
    // shadow: record entry coordinate at START, evaluate total target-advance
    // at the final exit transition.
    m.add_shadow(
        "intron-length-bound",
        [START],
        [exit],
        |_q, t, _ctx: &C| t as i32,
        |stored, _q, t, ctx: &C| {
            let length = t as i32 - stored;
            if length < 0 {
                return IMPOSSIBLY_LOW;
            }
            let length = length as usize;
            if length < ctx.min_intron_length() || length > ctx.max_intron_length() {
                IMPOSSIBLY_LOW
            } else {
                0
            }
        },
    )?;

    Ok(m)
}

/// Combine a transition's own calc score with any shadow end-score that
/// fires on it, per the additive contract documented in `SPEC_FULL.md` §4:
/// shadow end values are summed into the transition's tentative score, with
/// any `IMPOSSIBLY_LOW` term poisoning the whole sum.
pub fn combine_with_shadows(calc_score: i32, shadow_scores: impl IntoIterator<Item = i32>) -> i32 {
    shadow_scores.into_iter().fold(calc_score, protected_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::splice::SiteType;

    struct Ctx {
        target: Sequence,
        five: Arc<SplicePredictor>,
        three: Arc<SplicePredictor>,
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
            20
        }
    }

    fn ctx() -> Ctx {
        Ctx {
            target: Sequence::new("t", b"AAGTAAAAAAGAAAAAAAAAAA".to_vec(), Alphabet::Dna),
            five: Arc::new(SplicePredictor::builtin_primate(SiteType::FivePrimeForward)),
            three: Arc::new(SplicePredictor::builtin_primate(SiteType::ThreePrimeForward)),
        }
    }

    #[test]
    fn intron_submodel_closes() {
        assert!(build::<Ctx>().unwrap().close().is_ok());
    }

    #[test]
    fn length_bound_rejects_too_short() {
        let c = ctx();
        let m = build::<Ctx>().unwrap().close().unwrap();
        let shadow = &m.shadows()[0];
        let stored = shadow.start(0, 2, &c);
        // 2 bases of intron body only: far below min_intron_length (4).
        let score = shadow.end(stored, 0, 4, &c);
        assert_eq!(score, IMPOSSIBLY_LOW);
    }

    #[test]
    fn length_bound_accepts_in_range() {
        let c = ctx();
        let m = build::<Ctx>().unwrap().close().unwrap();
        let shadow = &m.shadows()[0];
        let stored = shadow.start(0, 2, &c);
        let score = shadow.end(stored, 0, 12, &c);
        assert_eq!(score, 0);
    }
}
