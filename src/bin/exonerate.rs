//! `exonerate`: align every query sequence against every target sequence
//! under a chosen C4 model and print the best hit in the requested format.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use c4align::alphabet::Alphabet;
use c4align::cli::{align_best, render_hit, splice_predictors, Cli, ModelKind};
use c4align::config::Config;
use c4align::formats::gff::GffOptions;
use c4align::io::fasta::{apply_annotations, read_annotations, read_fasta};
use c4align::model::builders::{self, AffineContext, Cdna2GenomeContext, LinearContext, SplicedContext};
use c4align::model::Model;
use c4align::optimal::MemoryBudget;
use c4align::render::show_alignment;
use c4align::sequence::Sequence;
use c4align::submat::SubstitutionMatrix;
use c4align::translate::TranslationTable;
use clap::Parser;
use itertools::iproduct;
use rayon::prelude::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    let queries = load_sequences(&cli.query, cli.query_annotation.as_deref())?;
    let targets = load_sequences(&cli.target, cli.target_annotation.as_deref())?;

    // Each query/target pair is an independent DP task (spec §5): run the
    // pool across pairs and let each task print its own result as soon as
    // it's ready, rather than collecting everything before printing.
    iproduct!(&queries, &targets).par_bridge().try_for_each(|(query, target)| report_pair(&cli, &config, query, target))
}

fn load_sequences(path: &std::path::Path, annotation_path: Option<&std::path::Path>) -> anyhow::Result<Vec<Sequence>> {
    let reader = BufReader::new(File::open(path)?);
    let sequences = read_fasta(reader, Alphabet::Unknown)?;
    match annotation_path {
        None => Ok(sequences),
        Some(path) => {
            let annotations = read_annotations(BufReader::new(File::open(path)?))?;
            Ok(apply_annotations(sequences, &annotations))
        }
    }
}

fn report_pair(cli: &Cli, config: &Config, query: &Sequence, target: &Sequence) -> anyhow::Result<()> {
    let budget = MemoryBudget::default();
    let gff_options = GffOptions {
        source: "c4align".to_string(),
        forward_strand_coords: config.alignment.forward_strand_coords,
    };

    match cli.model {
        ModelKind::Ungapped => {
            let matrix = default_matrix(query.alphabet());
            let model = builders::ungapped_with_matrix()?.close()?;
            run_generic(cli, &model, query, target, budget, &gff_options, move |q, t| LinearContext {
                query: q.clone(),
                target: t.clone(),
                matrix: matrix.clone(),
            })
        }
        ModelKind::Affine => {
            let matrix = default_matrix(query.alphabet());
            let model = builders::affine_gapped()?.close()?;
            run_generic(cli, &model, query, target, budget, &gff_options, move |q, t| AffineContext {
                query: q.clone(),
                target: t.clone(),
                matrix: matrix.clone(),
                gap_open: -config.affine.gap_open,
                gap_extend: -config.affine.gap_extend,
            })
        }
        ModelKind::Cdna2genome | ModelKind::Genome2genome | ModelKind::Est2genome => {
            let matrix = SubstitutionMatrix::dna_match_mismatch(5, -4);
            let model = builders::cdna2genome()?.close()?;
            let (five_prime, three_prime) = splice_predictors(config);
            run_generic(cli, &model, query, target, budget, &gff_options, move |q, t| Cdna2GenomeContext {
                query: q.clone(),
                target: t.clone(),
                matrix: matrix.clone(),
                gap_open: -config.affine.gap_open,
                gap_extend: -config.affine.gap_extend,
                five_prime: five_prime.clone(),
                three_prime: three_prime.clone(),
                min_intron_length: config.intron.min_intron,
                max_intron_length: config.intron.max_intron,
            })
        }
        ModelKind::Coding2genome | ModelKind::Protein2genome => {
            let matrix = SubstitutionMatrix::blosum62();
            let model = builders::coding2genome()?.close()?;
            let (five_prime, three_prime) = splice_predictors(config);
            let table = TranslationTable::standard();
            run_generic(cli, &model, query, target, budget, &gff_options, move |q, t| SplicedContext {
                query: q.clone(),
                target: t.clone(),
                matrix: matrix.clone(),
                table: table.clone(),
                gap_open: -config.affine.codon_gap_open,
                gap_extend: -config.affine.codon_gap_extend,
                five_prime: Arc::clone(&five_prime),
                three_prime: Arc::clone(&three_prime),
                min_intron_length: config.intron.min_intron,
                max_intron_length: config.intron.max_intron,
                intron_open_penalty: -config.intron.intron_open_penalty,
            })
        }
    }
}

fn default_matrix(alphabet: Alphabet) -> SubstitutionMatrix {
    match alphabet {
        Alphabet::Protein => SubstitutionMatrix::blosum62(),
        _ => SubstitutionMatrix::dna_match_mismatch(5, -4),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_generic<C>(
    cli: &Cli,
    model: &Model<C>,
    query: &Sequence,
    target: &Sequence,
    budget: MemoryBudget,
    gff_options: &GffOptions,
    make_ctx: impl Fn(&Sequence, &Sequence) -> C,
) -> anyhow::Result<()> {
    let Some(hit) = align_best(model, make_ctx, query, target, cli.score_threshold, cli.both_strands, budget)? else {
        return Ok(());
    };
    for line in render_hit(&hit, model, cli.show, cli.ryo.as_deref(), target.len(), gff_options)? {
        println!("{line}");
    }
    if cli.show_alignment {
        let matrix = default_matrix(query.alphabet());
        let oriented_target = if hit.t_strand == c4align::sequence::Strand::RevComp { target.revcomp() } else { target.clone() };
        show_alignment(&hit.alignment, model, &matrix, &query.to_vec(), &oriented_target.to_vec(), 80);
    }
    Ok(())
}
