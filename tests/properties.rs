//! Property-based and boundary coverage of the invariants named in
//! spec section 8, driven entirely through the public API.

use proptest::prelude::*;

use c4align::alignment::Alignment;
use c4align::alphabet::Alphabet;
use c4align::model::builders::{affine_gapped, ungapped_with_matrix, AffineContext, LinearContext};
use c4align::model::intron::{self, IntronContext};
use c4align::region::Region;
use c4align::score::IMPOSSIBLY_LOW;
use c4align::sequence::Sequence;
use c4align::splice::{SiteType, SplicePredictor};
use c4align::submat::SubstitutionMatrix;
use c4align::viterbi::{self, Mode};
use std::sync::Arc;

fn dna_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(prop::sample::select(vec![b'A', b'C', b'G', b'T']), min..max)
}

proptest! {
    /// Invariant 1: FIND_SCORE agrees with FIND_PATH's best score, and the
    /// resulting alignment replays to at least that score.
    #[test]
    fn find_score_agrees_with_find_path_and_replay(seq in dna_strategy(1, 12)) {
        let model = ungapped_with_matrix().unwrap().close().unwrap();
        let matrix = SubstitutionMatrix::dna_match_mismatch(5, -4);
        let ctx = LinearContext {
            query: Sequence::new("q", seq.clone(), Alphabet::Dna),
            target: Sequence::new("t", seq.clone(), Alphabet::Dna),
            matrix,
        };
        let region = Region::new(0, seq.len(), 0, seq.len());

        let score_only = viterbi::run(&model, &ctx, region, Mode::FindScore, None).best_score;
        let path_result = viterbi::run(&model, &ctx, region, Mode::FindPath, None);
        prop_assert_eq!(score_only, path_result.best_score);

        let mut alignment = Alignment::from_steps(0, 0, &path_result.path.unwrap());
        alignment.score = path_result.best_score;
        prop_assert!(alignment.is_valid(&model, &ctx).unwrap());
    }

    /// Invariant 3: summing `advance * length` over an alignment's operations
    /// reproduces the region's length on each axis, for a gapped model where
    /// the two axes can legitimately disagree.
    #[test]
    fn operation_advances_sum_to_region_length(
        query in dna_strategy(1, 10),
        extra_target_bases in 0usize..4,
    ) {
        let model = affine_gapped().unwrap().close().unwrap();
        let matrix = SubstitutionMatrix::dna_match_mismatch(5, -4);
        let mut target = query.clone();
        target.extend(std::iter::repeat(b'A').take(extra_target_bases));
        let ctx = AffineContext {
            query: Sequence::new("q", query.clone(), Alphabet::Dna),
            target: Sequence::new("t", target.clone(), Alphabet::Dna),
            matrix,
            gap_open: 12,
            gap_extend: 4,
        };
        let region = Region::new(0, query.len(), 0, target.len());
        let result = viterbi::run(&model, &ctx, region, Mode::FindPath, None);
        let Some(path) = result.path else {
            return Ok(());
        };
        let alignment = Alignment::from_steps(0, 0, &path);
        prop_assert_eq!(alignment.query_length(&model), region.q_length);
        prop_assert_eq!(alignment.target_length(&model), region.t_length);
    }
}

/// Invariant 4 (sequence half): `revcomp` is involutive and `filter`
/// composition is consistent, exercised over varied lengths (the module
/// tests in `sequence.rs` cover the fixed cases; this sweeps lengths).
proptest! {
    #[test]
    fn revcomp_is_involutive_for_any_length(seq in dna_strategy(0, 30)) {
        let s = Sequence::new("s", seq.clone(), Alphabet::Dna);
        let rcrc = s.revcomp().revcomp();
        for i in 0..seq.len() {
            prop_assert_eq!(s.get(i), rcrc.get(i));
        }
    }
}

/// Boundary behavior 9: an empty region scores 0 only when START can reach
/// END through a zero-advance silent path; otherwise IMPOSSIBLY_LOW.
#[test]
fn empty_region_scores_zero_when_a_silent_path_exists() {
    let model = ungapped_with_matrix().unwrap().close().unwrap();
    let ctx = LinearContext {
        query: Sequence::new("q", b"".to_vec(), Alphabet::Dna),
        target: Sequence::new("t", b"".to_vec(), Alphabet::Dna),
        matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
    };
    let region = Region::new(0, 0, 0, 0);
    let result = viterbi::run(&model, &ctx, region, Mode::FindScore, None);
    assert_eq!(result.best_score, 0);
}

#[test]
fn empty_region_is_impossibly_low_without_a_silent_path() {
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
    let model = intron::build::<Ctx>().unwrap().close().unwrap();
    let ctx = Ctx {
        target: Sequence::new("t", b"".to_vec(), Alphabet::Dna),
        five: Arc::new(SplicePredictor::builtin_primate(SiteType::FivePrimeForward)),
        three: Arc::new(SplicePredictor::builtin_primate(SiteType::ThreePrimeForward)),
    };
    let region = Region::new(0, 0, 0, 0);
    let result = viterbi::run(&model, &ctx, region, Mode::FindScore, None);
    assert_eq!(result.best_score, IMPOSSIBLY_LOW);
}

/// Boundary behavior 11: an intron of length exactly `min_intron` is
/// accepted; `min_intron - 1` is rejected with IMPOSSIBLY_LOW.
#[test]
fn intron_length_bound_is_exact_at_the_minimum() {
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
            10
        }
        fn max_intron_length(&self) -> usize {
            100
        }
    }
    let model = intron::build::<Ctx>().unwrap().close().unwrap();
    let ctx = Ctx {
        target: Sequence::new("t", b"N".repeat(50), Alphabet::Dna),
        five: Arc::new(SplicePredictor::builtin_primate(SiteType::FivePrimeForward)),
        three: Arc::new(SplicePredictor::builtin_primate(SiteType::ThreePrimeForward)),
    };
    let shadow = &model.shadows()[0];
    let entry_t = 5;
    let stored = shadow.start(0, entry_t, &ctx);

    let exactly_min = shadow.end(stored, 0, entry_t + 10, &ctx);
    assert_eq!(exactly_min, 0);

    let one_short = shadow.end(stored, 0, entry_t + 9, &ctx);
    assert_eq!(one_short, IMPOSSIBLY_LOW);
}
