//! Concrete end-to-end scenarios exercised against the public API.
//!
//! A full-size reduced-space EST-to-genome sweep is out of scope for these
//! scenario tests (too slow to run on every build); see DESIGN.md.

use c4align::alignment::Alignment;
use c4align::alphabet::Alphabet;
use c4align::model::builders::{affine_gapped, affine_local, ungapped_with_matrix, AffineContext, LinearContext};
use c4align::optimal::{find_optimal, MemoryBudget};
use c4align::pcr::{self, Control, Experiment, Primer};
use c4align::region::Region;
use c4align::sequence::Sequence;
use c4align::submat::SubstitutionMatrix;

/// Scenario A (spec-equivalent): ungapped DNA, identical 8-base sequences,
/// match +5 / mismatch -4, global corner scope -> score 40, single 8-long
/// match run.
#[test]
fn scenario_a_ungapped_identical_sequences_score_forty() {
    let model = ungapped_with_matrix().unwrap().close().unwrap();
    let ctx = LinearContext {
        query: Sequence::new("q", b"ACGTACGT".to_vec(), Alphabet::Dna),
        target: Sequence::new("t", b"ACGTACGT".to_vec(), Alphabet::Dna),
        matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
    };
    let region = Region::new(0, 8, 0, 8);
    let result = find_optimal(&model, &ctx, region, 1, MemoryBudget::default()).unwrap().unwrap();
    assert_eq!(result.score, 40);
    assert_eq!(result.alignment.operations().len(), 1);
    assert_eq!(result.alignment.operations()[0].length, 8);
    assert!(result.alignment.is_valid(&model, &ctx).unwrap());
}

/// Scenario B: affine local DNA alignment where the query sits flanked by
/// filler bases on the target; the optimum must exclude the flanks rather
/// than paying gap-open/gap-extend to stretch across them.
#[test]
fn scenario_b_affine_local_excludes_the_flanking_filler() {
    let model = affine_local().unwrap().close().unwrap();
    let ctx = AffineContext {
        query: Sequence::new("q", b"ACGTACGT".to_vec(), Alphabet::Dna),
        target: Sequence::new("t", b"TTACGTACGTTT".to_vec(), Alphabet::Dna),
        matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
        gap_open: 12,
        gap_extend: 4,
    };
    let region = Region::new(0, 8, 0, 12);
    let result = find_optimal(&model, &ctx, region, 1, MemoryBudget::default()).unwrap().unwrap();
    assert_eq!(result.score, 40);
    assert_eq!(result.alignment.q_start, 0);
    assert_eq!(result.alignment.t_start, 2);
    assert_eq!(result.alignment.end_coords(&model), (8, 10));
    assert!(result.alignment.is_valid(&model, &ctx).unwrap());
}

/// Scenario D: a single forward PCR product from a pair of 4-base primers
/// embedded in a longer sequence of filler bases, one mismatch tolerated.
#[test]
fn scenario_d_single_forward_pcr_product_in_window() {
    let mut target_bytes = b"NNNN".to_vec();
    target_bytes.extend(b"ACGT");
    target_bytes.extend(b"NNN");
    // `pcr::prepare` searches each primer in both its literal orientation
    // and its own reverse complement; the reverse primer's own sequence is
    // AACC, so what appears here is GGTT (its reverse complement).
    target_bytes.extend(b"GGTT");
    target_bytes.extend(std::iter::repeat(b'N').take(4));
    let target = Sequence::new("t", target_bytes.clone(), Alphabet::Dna);

    let matrix = SubstitutionMatrix::dna_match_mismatch(5, -4);
    let experiment = Experiment {
        name: "T1".into(),
        forward: Primer {
            name: "A".into(),
            sequence: b"ACGT".to_vec(),
            max_mismatches: 1,
        },
        reverse: Primer {
            name: "B".into(),
            sequence: b"AACC".to_vec(), // revcomp is GGTT
            max_mismatches: 1,
        },
        min_product_length: 10,
        max_product_length: 15,
    };
    let sim = pcr::prepare(vec![experiment], b"ACGT", &matrix);

    let mut products = Vec::new();
    pcr::simulate(&sim, &target, |_exp, product| {
        products.push(product);
        Control::Continue
    });

    assert_eq!(products.len(), 1);
    let product = products[0];
    assert!(product.forward.forward_strand);
    assert!(!product.reverse.forward_strand);
    assert!(product.product_length >= 10 && product.product_length <= 15);
}

/// Scenario E: a short primer that is a suffix of another primer (`CG` is a
/// suffix of `CCGG`) — both experiments' hits must survive the shared
/// automaton, since payload propagation along failure links must not
/// overwrite one pattern's matches with another's.
#[test]
fn scenario_e_suffix_primer_does_not_shadow_the_longer_one() {
    let matrix = SubstitutionMatrix::dna_match_mismatch(5, -4);

    let make_experiment = |name: &str, forward_seq: &[u8]| Experiment {
        name: name.into(),
        forward: Primer {
            name: "A".into(),
            sequence: forward_seq.to_vec(),
            max_mismatches: 0,
        },
        reverse: Primer {
            name: "B".into(),
            sequence: b"AAAA".to_vec(), // revcomp is TTTT
            max_mismatches: 0,
        },
        min_product_length: 1,
        max_product_length: 200,
    };

    let experiment1 = make_experiment("experiment1", b"CCGG");
    let experiment2 = make_experiment("experiment2", b"CG");

    let mut target_bytes = b"CCGG".to_vec();
    target_bytes.extend(std::iter::repeat(b'N').take(20));
    target_bytes.extend(b"TTTT");
    let target = Sequence::new("t", target_bytes, Alphabet::Dna);

    let sim = pcr::prepare(vec![experiment1, experiment2], b"ACGTN", &matrix);

    let mut hit_experiments = Vec::new();
    pcr::simulate(&sim, &target, |exp, _product| {
        hit_experiments.push(exp.name.clone());
        Control::Continue
    });

    assert!(hit_experiments.contains(&"experiment1".to_string()));
    assert!(hit_experiments.contains(&"experiment2".to_string()));
}

/// Scenario F (scaled down): under a memory budget small enough to force
/// reduced-space checkpoint recursion, the resulting alignment must still
/// replay to a score at least as good as the recorded one and must agree
/// with a direct full-matrix pass over the same region.
#[test]
fn reduced_space_recursion_matches_direct_full_matrix_pass() {
    let model = affine_gapped().unwrap().close().unwrap();
    let query: Vec<u8> = b"ACGTACGTACGTACGTACGTACGTACGTACGT".to_vec();
    let target: Vec<u8> = b"ACGTACGTACGTTACGTACGTACGTACGTACGT".to_vec(); // one extra base inserted
    let ctx = AffineContext {
        query: Sequence::new("q", query.clone(), Alphabet::Dna),
        target: Sequence::new("t", target.clone(), Alphabet::Dna),
        matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
        gap_open: 12,
        gap_extend: 4,
    };
    let region = Region::new(0, query.len(), 0, target.len());

    let direct = find_optimal(&model, &ctx, region, 1, MemoryBudget::default()).unwrap().unwrap();

    let tiny_budget = MemoryBudget { max_cells: 16 };
    let recursed = find_optimal(&model, &ctx, region, 1, tiny_budget).unwrap().unwrap();

    assert_eq!(direct.score, recursed.score);
    assert!(recursed.alignment.is_valid(&model, &ctx).unwrap());
    let (end_q, end_t) = recursed.alignment.end_coords(&model);
    assert_eq!(end_q, query.len());
    assert_eq!(end_t, target.len());
}

/// `Alignment::import_derived` composed with its inverse derivation (simply
/// splitting the operation list back at the same boundary) is the identity
/// on the operation sequence (spec round-trip property 8).
#[test]
fn import_derived_recombines_a_split_alignment_identically() {
    let model = ungapped_with_matrix().unwrap().close().unwrap();
    let ctx = LinearContext {
        query: Sequence::new("q", b"AAAAAAAA".to_vec(), Alphabet::Dna),
        target: Sequence::new("t", b"AAAAAAAA".to_vec(), Alphabet::Dna),
        matrix: SubstitutionMatrix::dna_match_mismatch(5, -4),
    };
    let region = Region::new(0, 8, 0, 8);
    let whole = find_optimal(&model, &ctx, region, 1, MemoryBudget::default()).unwrap().unwrap();

    let match_transition = whole.alignment.operations()[0].transition;
    let mut left = Alignment::new(0, 0);
    left.add(match_transition, 3);
    left.score = 15;
    let mut right = Alignment::new(3, 3);
    right.add(match_transition, 5);
    right.score = 25;

    left.import_derived(&right);
    assert_eq!(left.operations().len(), 1);
    assert_eq!(left.operations()[0].length, 8);
    assert_eq!(left.score, 40);
}
