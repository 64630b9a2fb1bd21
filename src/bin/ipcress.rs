//! `ipcress`: simulate PCR amplification of a primer-pair panel against one
//! or more target sequences (spec §4.7, §6's "PCR input"/"PCR output"
//! formats).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use c4align::alphabet::Alphabet;
use c4align::io::fasta::read_fasta;
use c4align::pcr::{self, Control, Experiment, Primer};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate in-silico PCR against a target sequence set")]
struct Args {
    /// Whitespace-separated `id primer_A primer_B min_product_len
    /// max_product_len` lines, one per experiment.
    experiments: PathBuf,

    /// FASTA file of target sequences to scan.
    target: PathBuf,

    /// Mismatches tolerated per primer.
    #[arg(long, default_value_t = 0)]
    mismatches: u32,

    /// Stop after the first product per target sequence.
    #[arg(long)]
    first_only: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let experiments = read_experiments(&args.experiments, args.mismatches)?;
    let targets = read_fasta(BufReader::new(File::open(&args.target)?), Alphabet::Dna)?;

    let matrix = c4align::submat::SubstitutionMatrix::dna_match_mismatch(5, -4);
    let simulation = pcr::prepare(experiments, b"ACGT", &matrix);

    for target in &targets {
        pcr::simulate(&simulation, target, |experiment, product| {
            println!(
                "ipcress: {} {} {} {} {} {} {} {} {} {}",
                target.id,
                experiment.name,
                product.product_length,
                experiment.forward.name,
                product.forward.t_start,
                product.forward.mismatches,
                experiment.reverse.name,
                product.reverse.t_start,
                product.reverse.mismatches,
                kind(&product),
            );
            if args.first_only {
                Control::Stop
            } else {
                Control::Continue
            }
        });
    }
    Ok(())
}

fn kind(product: &pcr::Product) -> &'static str {
    if product.forward.primer == product.reverse.primer {
        return match product.forward.primer {
            pcr::PrimerSlot::A => "single_A",
            pcr::PrimerSlot::B => "single_B",
        };
    }
    if product.forward.t_start <= product.reverse.t_start {
        "forward"
    } else {
        "revcomp"
    }
}

fn read_experiments(path: &std::path::Path, mismatches: u32) -> anyhow::Result<Vec<Experiment>> {
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [id, primer_a, primer_b, min_len, max_len] = fields[..] else {
            anyhow::bail!("experiment line '{trimmed}' must have 5 fields: id primer_A primer_B min_product_len max_product_len");
        };
        out.push(Experiment {
            name: id.to_string(),
            forward: Primer {
                name: "A".to_string(),
                sequence: primer_a.as_bytes().to_ascii_uppercase(),
                max_mismatches: mismatches,
            },
            reverse: Primer {
                name: "B".to_string(),
                sequence: primer_b.as_bytes().to_ascii_uppercase(),
                max_mismatches: mismatches,
            },
            min_product_length: min_len.parse()?,
            max_product_length: max_len.parse()?,
        });
    }
    Ok(out)
}
