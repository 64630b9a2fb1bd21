//! Shared command-line surface for the `exonerate` driver: argument
//! parsing, model selection, and the generic align-and-report pipeline
//! every model kind funnels through.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use crate::alignment::Alignment;
use crate::config::Config;
use crate::formats::{cigar, gff, sugar, vulgar, AlignmentSummary};
use crate::model::Model;
use crate::optimal::{find_optimal, MemoryBudget};
use crate::region::Region;
use crate::sequence::{Sequence, Strand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Align two sequences under a C4 model")]
pub struct Cli {
    /// FASTA file holding the query sequence(s).
    #[arg(long)]
    pub query: PathBuf,

    /// FASTA file holding the target sequence(s).
    #[arg(long)]
    pub target: PathBuf,

    /// Optional side-channel annotation file for the query.
    #[arg(long)]
    pub query_annotation: Option<PathBuf>,

    /// Optional side-channel annotation file for the target.
    #[arg(long)]
    pub target_annotation: Option<PathBuf>,

    /// Which C4 model to align under.
    #[arg(long, value_enum, default_value_t = ModelKind::Affine)]
    pub model: ModelKind,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Vulgar)]
    pub show: OutputFormat,

    /// A RYO template string, required when `--show ryo`.
    #[arg(long)]
    pub ryo: Option<String>,

    /// Minimum score a result must reach to be reported.
    #[arg(long, default_value_t = 1)]
    pub score_threshold: i32,

    /// Also search the target's reverse complement and keep whichever
    /// orientation scores higher.
    #[arg(long)]
    pub both_strands: bool,

    /// Path to a TOML configuration file overriding the built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print a colored pairwise alignment in addition to the chosen format.
    #[arg(long)]
    pub show_alignment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    Ungapped,
    Affine,
    Coding2genome,
    Cdna2genome,
    Genome2genome,
    Protein2genome,
    Est2genome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Sugar,
    Cigar,
    Vulgar,
    Gff,
    Ryo,
}

impl Cli {
    pub fn load_config(&self) -> crate::error::Result<Config> {
        match &self.config {
            Some(path) => Config::load(path),
            None => Config::load_user_or_default(),
        }
    }
}

/// The result of aligning one query/target pair: a summary, the full
/// alignment, and which target strand it was found on.
pub struct Hit {
    pub summary: AlignmentSummary,
    pub alignment: Alignment,
    pub t_strand: Strand,
}

/// Align `query` against `target` (and, if `both_strands`, its reverse
/// complement too) and return the best-scoring hit clearing `threshold`.
pub fn align_best<C>(
    model: &Model<C>,
    make_ctx: impl Fn(&Sequence, &Sequence) -> C,
    query: &Sequence,
    target: &Sequence,
    threshold: i32,
    both_strands: bool,
    budget: MemoryBudget,
) -> crate::error::Result<Option<Hit>> {
    let mut best: Option<Hit> = None;
    let orientations: &[Strand] = if both_strands { &[Strand::Forward, Strand::RevComp] } else { &[Strand::Forward] };

    for &orientation in orientations {
        let oriented_target = if orientation == Strand::RevComp { target.revcomp() } else { target.clone() };
        let region = Region::new(0, query.len(), 0, oriented_target.len());
        let ctx = make_ctx(query, &oriented_target);
        let Some(result) = find_optimal(model, &ctx, region, threshold, budget)? else { continue };
        let better = match &best {
            Some(b) => result.score > b.summary.score,
            None => true,
        };
        if better {
            let summary = AlignmentSummary::from_alignment(&result.alignment, model, query.id.clone(), query.strand, target.id.clone(), orientation);
            best = Some(Hit {
                summary,
                alignment: result.alignment,
                t_strand: orientation,
            });
        }
    }
    Ok(best)
}

/// Render `hit` in the requested `format`, returning the lines to print.
pub fn render_hit<C>(hit: &Hit, model: &Model<C>, format: OutputFormat, ryo_template: Option<&str>, target_length: usize, gff_options: &gff::GffOptions) -> crate::error::Result<Vec<String>> {
    match format {
        OutputFormat::Sugar => Ok(vec![sugar::format(&hit.summary)]),
        OutputFormat::Cigar => Ok(vec![cigar::format(&hit.summary, &hit.alignment, model)]),
        OutputFormat::Vulgar => Ok(vec![vulgar::format(&hit.summary, &hit.alignment, model)]),
        OutputFormat::Gff => Ok(gff::format(&hit.summary, &hit.alignment, model, target_length, gff_options)),
        OutputFormat::Ryo => {
            let template = ryo_template.ok_or_else(|| crate::error::Error::Usage("--show ryo requires --ryo <template>".into()))?;
            let ctx = crate::formats::ryo::RyoContext {
                q_id: hit.summary.q_id.clone(),
                t_id: hit.summary.t_id.clone(),
                align_begin: hit.summary.q_start,
                align_end: hit.summary.q_end,
                score: hit.summary.score,
                sugar: sugar::format(&hit.summary),
                cigar: cigar::format(&hit.summary, &hit.alignment, model),
                vulgar: vulgar::format(&hit.summary, &hit.alignment, model),
                ..Default::default()
            };
            Ok(vec![crate::formats::ryo::render(template, &ctx)?])
        }
    }
}

pub fn splice_predictors(config: &Config) -> (Arc<crate::splice::SplicePredictor>, Arc<crate::splice::SplicePredictor>) {
    use crate::splice::{SiteType, SplicePredictor};
    let mut five = SplicePredictor::builtin_primate(SiteType::FivePrimeForward);
    five.force_gtag = config.splice.force_gtag;
    let mut three = SplicePredictor::builtin_primate(SiteType::ThreePrimeForward);
    three.force_gtag = config.splice.force_gtag;
    (Arc::new(five), Arc::new(three))
}
