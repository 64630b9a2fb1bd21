//! Concrete model constructors (spec §4.2): each named alignment mode is a
//! particular wiring of the shared C4 primitives, parameterized by a
//! context struct carrying whatever matrices/tables/predictors that mode
//! needs. This mirrors the teacher's own pattern of building one generic
//! alignment routine and varying only the `Scoring` struct passed into it.

use std::sync::Arc;

use super::intron::IntronContext;
use super::phase::PhaseContext;
use super::{Label, Model, Scope, END, START};
use crate::error::Result;
use crate::sequence::Sequence;
use crate::splice::SplicePredictor;
use crate::submat::SubstitutionMatrix;
use crate::translate::TranslationTable;

/// Shared context for the two ungapped/gapped nucleotide-nucleotide and
/// protein-protein models: a substitution matrix plus gap penalties.
pub struct LinearContext {
    pub query: Sequence,
    pub target: Sequence,
    pub matrix: SubstitutionMatrix,
}

pub struct AffineContext {
    pub query: Sequence,
    pub target: Sequence,
    pub matrix: SubstitutionMatrix,
    pub gap_open: i32,
    pub gap_extend: i32,
}

/// Build the ungapped model (spec §4.2: "ungapped"): a single match state
/// self-looping on both axes together, so the whole aligned region consumes
/// no gaps but may extend over any number of residue pairs.
pub fn ungapped(matrix_score: impl Fn(usize, usize, &LinearContext) -> i32 + Send + Sync + 'static) -> Result<Model<LinearContext>> {
    let mut m = Model::new("ungapped");
    m.configure_start(Scope::Corner, None)?;
    m.configure_end(Scope::Corner, None)?;
    let calc = m.add_calc("match", 0, matrix_score, None, None, true)?;
    let match_state = m.add_state("match")?;
    m.add_transition("start-match", START, match_state, 0, 0, None, Label::None)?;
    m.add_transition("match-match", match_state, match_state, 1, 1, Some(calc), Label::Match)?;
    m.add_transition("match-end", match_state, END, 0, 0, None, Label::None)?;
    Ok(m)
}

pub fn ungapped_with_matrix() -> Result<Model<LinearContext>> {
    ungapped(|q, t, ctx: &LinearContext| ctx.matrix.score(ctx.query.get(q), ctx.target.get(t)))
}

/// Build the affine-gapped model (spec §4.2: "affine"): match, query-gap and
/// target-gap states, each gap state charging an open penalty on entry and
/// an extend penalty on each further residue, mirroring the classic
/// three-state Gotoh layout. Global (`Scope::Corner`) at both ends; see
/// [`affine_local`] for the same graph scoped for local alignment.
pub fn affine_gapped() -> Result<Model<AffineContext>> {
    let mut m = affine_graph("affine-gapped")?;
    m.configure_start(Scope::Corner, None)?;
    m.configure_end(Scope::Corner, None)?;
    Ok(m)
}

/// The same graph as [`affine_gapped`], scoped `Scope::Anywhere` at both
/// ends: every cell is seeded as a possible start and scanned as a possible
/// end, so the optimum may begin and end anywhere in the region rather than
/// only at its corners (Smith-Waterman-style local alignment). No new
/// transitions are needed: the existing silent `start-match`/`match-end`
/// transitions already implement "reset to zero" once every cell seeds
/// `START` at baseline 0.
pub fn affine_local() -> Result<Model<AffineContext>> {
    let mut m = affine_graph("affine-local")?;
    m.configure_start(Scope::Anywhere, None)?;
    m.configure_end(Scope::Anywhere, None)?;
    Ok(m)
}

fn affine_graph(name: &str) -> Result<Model<AffineContext>> {
    let mut m = Model::new(name);

    let match_state = m.add_state("match")?;
    let query_gap = m.add_state("query-gap")?;
    let target_gap = m.add_state("target-gap")?;

    let match_calc = m.add_calc(
        "match",
        0,
        |q, t, ctx: &AffineContext| ctx.matrix.score(ctx.query.get(q), ctx.target.get(t)),
        None,
        None,
        true,
    )?;
    let gap_open_q = m.add_calc("gap-open", 0, |_q, _t, ctx: &AffineContext| -ctx.gap_open, None, None, true)?;
    let gap_extend_q = m.add_calc("gap-extend", 0, |_q, _t, ctx: &AffineContext| -ctx.gap_extend, None, None, true)?;

    m.add_transition("start-match", START, match_state, 0, 0, None, Label::None)?;
    m.add_transition("match-match", match_state, match_state, 1, 1, Some(match_calc), Label::Match)?;
    m.add_transition("match-end", match_state, END, 0, 0, None, Label::None)?;

    m.add_transition("match-open-query-gap", match_state, query_gap, 1, 0, Some(gap_open_q), Label::Gap)?;
    m.add_transition("query-gap-extend", query_gap, query_gap, 1, 0, Some(gap_extend_q), Label::Gap)?;
    m.add_transition("query-gap-close", query_gap, match_state, 0, 0, None, Label::None)?;

    m.add_transition("match-open-target-gap", match_state, target_gap, 0, 1, Some(gap_open_q), Label::Gap)?;
    m.add_transition("target-gap-extend", target_gap, target_gap, 0, 1, Some(gap_extend_q), Label::Gap)?;
    m.add_transition("target-gap-close", target_gap, match_state, 0, 0, None, Label::None)?;

    Ok(m)
}

/// Context for the spliced, coding-query-to-genomic-target models
/// (`coding2genome`, `cdna2genome`, `genome2genome`, `protein2genome`):
/// everything the intron and phase sub-models need, plus the plain affine
/// codon/base match calc for exonic regions.
pub struct SplicedContext {
    pub query: Sequence,
    pub target: Sequence,
    pub matrix: SubstitutionMatrix,
    pub table: TranslationTable,
    pub gap_open: i32,
    pub gap_extend: i32,
    pub five_prime: Arc<SplicePredictor>,
    pub three_prime: Arc<SplicePredictor>,
    pub min_intron_length: usize,
    pub max_intron_length: usize,
    pub intron_open_penalty: i32,
}

impl IntronContext for SplicedContext {
    fn target(&self) -> &Sequence {
        &self.target
    }
    fn five_prime(&self) -> &Arc<SplicePredictor> {
        &self.five_prime
    }
    fn three_prime(&self) -> &Arc<SplicePredictor> {
        &self.three_prime
    }
    fn min_intron_length(&self) -> usize {
        self.min_intron_length
    }
    fn max_intron_length(&self) -> usize {
        self.max_intron_length
    }
    fn intron_open_penalty(&self) -> i32 {
        self.intron_open_penalty
    }
}

impl PhaseContext for SplicedContext {
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

/// Build `coding2genome` (spec §4.2): a protein query aligned against a
/// genomic target, with introns allowed at any of the three phases between
/// or within codons.
pub fn coding2genome() -> Result<Model<SplicedContext>> {
    let mut m = Model::new("coding2genome");
    m.configure_start(Scope::Corner, None)?;
    m.configure_end(Scope::Corner, None)?;

    let codon = m.add_state("codon")?;
    let target_gap = m.add_state("target-gap")?;

    let codon_calc = m.add_calc(
        "codon-match",
        0,
        |q, t, ctx: &SplicedContext| {
            let amino = ctx.table.translate(ctx.target.get(t), ctx.target.get(t + 1), ctx.target.get(t + 2));
            ctx.matrix.score(ctx.query.get(q), amino)
        },
        None,
        None,
        true,
    )?;
    let gap_open = m.add_calc("gap-open", 0, |_q, _t, ctx: &SplicedContext| -ctx.gap_open, None, None, true)?;
    let gap_extend = m.add_calc("gap-extend", 0, |_q, _t, ctx: &SplicedContext| -ctx.gap_extend, None, None, true)?;

    m.add_transition("start-codon", START, codon, 0, 0, None, Label::None)?;
    m.add_transition("codon-match", codon, codon, 1, 3, Some(codon_calc), Label::Match)?;
    m.add_transition("codon-end", codon, END, 0, 0, None, Label::None)?;
    m.add_transition("open-target-gap", codon, target_gap, 0, 1, Some(gap_open), Label::Gap)?;
    m.add_transition("extend-target-gap", target_gap, target_gap, 0, 1, Some(gap_extend), Label::Gap)?;
    m.add_transition("close-target-gap", target_gap, codon, 0, 0, None, Label::None)?;

    // Phase 0: a plain intron sits directly between two codons.
    let phase0 = super::intron::build::<SplicedContext>()?;
    m.insert(phase0, Some(codon), Some(codon))?;

    // Phase 1 and phase 2: the intron splits a codon after its first or
    // second base respectively.
    let phase1 = super::phase::build::<SplicedContext>(1)?;
    m.insert(phase1, Some(codon), Some(codon))?;
    let phase2 = super::phase::build::<SplicedContext>(2)?;
    m.insert(phase2, Some(codon), Some(codon))?;

    Ok(m)
}

/// `genome2genome` is `cdna2genome` under another name: both splice introns
/// into the target side of a plain affine nucleotide alignment. Exonerate
/// historically distinguishes them only by which side is declared to carry
/// annotation (the query is treated as genomic rather than as an mRNA), a
/// distinction this implementation keeps at the configuration layer (spec
/// §6's `model` setting) rather than as a second DP graph; see DESIGN.md.
pub fn genome2genome() -> Result<Model<Cdna2GenomeContext>> {
    cdna2genome()
}

/// `cdna2genome`: like `coding2genome` but the query is itself nucleotide,
/// aligned base-for-base against the target outside of introns (no implicit
/// translation on the query side). Reuses the affine-gapped exonic layout
/// with the intron/phase sub-models spliced into its match state.
pub struct Cdna2GenomeContext {
    pub query: Sequence,
    pub target: Sequence,
    pub matrix: SubstitutionMatrix,
    pub gap_open: i32,
    pub gap_extend: i32,
    pub five_prime: Arc<SplicePredictor>,
    pub three_prime: Arc<SplicePredictor>,
    pub min_intron_length: usize,
    pub max_intron_length: usize,
}

impl IntronContext for Cdna2GenomeContext {
    fn target(&self) -> &Sequence {
        &self.target
    }
    fn five_prime(&self) -> &Arc<SplicePredictor> {
        &self.five_prime
    }
    fn three_prime(&self) -> &Arc<SplicePredictor> {
        &self.three_prime
    }
    fn min_intron_length(&self) -> usize {
        self.min_intron_length
    }
    fn max_intron_length(&self) -> usize {
        self.max_intron_length
    }
}

pub fn cdna2genome() -> Result<Model<Cdna2GenomeContext>> {
    let mut m = Model::new("cdna2genome");
    m.configure_start(Scope::Corner, None)?;
    m.configure_end(Scope::Corner, None)?;

    let match_state = m.add_state("match")?;
    let query_gap = m.add_state("query-gap")?;
    let target_gap = m.add_state("target-gap")?;

    let match_calc = m.add_calc(
        "match",
        0,
        |q, t, ctx: &Cdna2GenomeContext| ctx.matrix.score(ctx.query.get(q), ctx.target.get(t)),
        None,
        None,
        true,
    )?;
    let gap_open = m.add_calc("gap-open", 0, |_q, _t, ctx: &Cdna2GenomeContext| -ctx.gap_open, None, None, true)?;
    let gap_extend = m.add_calc("gap-extend", 0, |_q, _t, ctx: &Cdna2GenomeContext| -ctx.gap_extend, None, None, true)?;

    m.add_transition("start-match", START, match_state, 0, 0, None, Label::None)?;
    m.add_transition("match-match", match_state, match_state, 1, 1, Some(match_calc), Label::Match)?;
    m.add_transition("match-end", match_state, END, 0, 0, None, Label::None)?;
    m.add_transition("open-query-gap", match_state, query_gap, 1, 0, Some(gap_open), Label::Gap)?;
    m.add_transition("extend-query-gap", query_gap, query_gap, 1, 0, Some(gap_extend), Label::Gap)?;
    m.add_transition("close-query-gap", query_gap, match_state, 0, 0, None, Label::None)?;
    m.add_transition("open-target-gap", match_state, target_gap, 0, 1, Some(gap_open), Label::Gap)?;
    m.add_transition("extend-target-gap", target_gap, target_gap, 0, 1, Some(gap_extend), Label::Gap)?;
    m.add_transition("close-target-gap", target_gap, match_state, 0, 0, None, Label::None)?;

    let intron = super::intron::build::<Cdna2GenomeContext>()?;
    m.insert(intron, Some(match_state), Some(match_state))?;

    Ok(m)
}

/// `protein2genome` is `coding2genome` under another name (a protein query
/// against a genomic target); spec §4.2 lists them as distinct named modes
/// only because exonerate historically exposed separate `--model` flags for
/// what is, structurally, the exact same C4 graph.
pub fn protein2genome() -> Result<Model<SplicedContext>> {
    coding2genome()
}

/// `est2genome`: an EST (spliced cDNA) query against a genomic target.
/// Structurally identical to `cdna2genome` minus the distinction between an
/// mRNA's CDS and UTR (the whole query is treated as coding-agnostic
/// nucleotide); reuses the same context and builder.
pub fn est2genome() -> Result<Model<Cdna2GenomeContext>> {
    cdna2genome()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::splice::SiteType;

    #[test]
    fn ungapped_closes() {
        assert!(ungapped_with_matrix().unwrap().close().is_ok());
    }

    #[test]
    fn affine_gapped_closes() {
        assert!(affine_gapped().unwrap().close().is_ok());
    }

    #[test]
    fn affine_local_closes_and_is_not_global() {
        let m = affine_local().unwrap().close().unwrap();
        assert!(!m.is_global());
    }

    #[test]
    fn coding2genome_closes() {
        assert!(coding2genome().unwrap().close().is_ok());
    }

    #[test]
    fn cdna2genome_closes() {
        assert!(cdna2genome().unwrap().close().is_ok());
    }

    fn spliced_context() -> SplicedContext {
        SplicedContext {
            query: Sequence::new("q", b"M".to_vec(), Alphabet::Protein),
            target: Sequence::new("t", b"ATGAAGTAAAAAAAGTAA".to_vec(), Alphabet::Dna),
            matrix: SubstitutionMatrix::blosum62(),
            table: TranslationTable::standard(),
            gap_open: 10,
            gap_extend: 1,
            five_prime: Arc::new(SplicePredictor::builtin_primate(SiteType::FivePrimeForward)),
            three_prime: Arc::new(SplicePredictor::builtin_primate(SiteType::ThreePrimeForward)),
            min_intron_length: 4,
            max_intron_length: 100,
            intron_open_penalty: 5,
        }
    }

    #[test]
    fn coding2genome_exonic_match_scores_like_blosum() {
        let ctx = spliced_context();
        let m = coding2genome().unwrap().close().unwrap();
        let codon_calc = m.calc(crate::model::CalcId(0));
        let score = codon_calc.score(0, 0, &ctx);
        assert_eq!(score, ctx.matrix.score(b'M', b'M'));
    }
}
