//! FASTA sequence input and side-channel annotation files (spec §6, §9).
//!
//! Annotations map `id -> (strand, optional CDS start, optional CDS
//! length)`. A line giving only `(id, strand)` leaves the CDS fields
//! *absent*, never implicitly zero (spec §9's note on this historical
//! off-by-default bug).

use std::io::BufRead;

use crate::alphabet::Alphabet;
use crate::error::{Error, Result};
use crate::sequence::{Annotation, Sequence, Strand};

/// Parse FASTA records from `reader`. `alphabet` is applied to every
/// record; pass [`Alphabet::Unknown`] to skip symbol validation and sniff
/// DNA-vs-protein per record via [`guess_alphabet`].
pub fn read_fasta<R: BufRead>(reader: R, alphabet: Alphabet) -> Result<Vec<Sequence>> {
    let mut out = Vec::new();
    let mut current_id: Option<String> = None;
    let mut current_def: Option<String> = None;
    let mut current_seq: Vec<u8> = Vec::new();

    let finish = |id: Option<String>, def: Option<String>, seq: Vec<u8>, out: &mut Vec<Sequence>| -> Result<()> {
        let Some(id) = id else { return Ok(()) };
        if seq.is_empty() {
            return Err(Error::InvalidInput(format!("sequence '{id}' has no symbols")));
        }
        let resolved = if alphabet == Alphabet::Unknown { guess_alphabet(&seq) } else { alphabet };
        for &symbol in &seq {
            if !resolved.is_valid(symbol) {
                return Err(Error::InvalidInput(format!("sequence '{id}' contains symbol '{}' not in its alphabet", symbol as char)));
            }
        }
        let mut record = Sequence::new(id, seq, resolved);
        if let Some(def) = def {
            record = record.with_description(def);
        }
        out.push(record);
        Ok(())
    };

    for line in reader.lines() {
        let line = line.map_err(|e| Error::InvalidInput(format!("reading FASTA: {e}")))?;
        if let Some(rest) = line.strip_prefix('>') {
            finish(current_id.take(), current_def.take(), std::mem::take(&mut current_seq), &mut out)?;
            let mut parts = rest.splitn(2, char::is_whitespace);
            current_id = parts.next().map(str::to_string).filter(|s| !s.is_empty());
            current_def = parts.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
            if current_id.is_none() {
                return Err(Error::InvalidInput("FASTA header has no id".into()));
            }
        } else {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                current_seq.extend(trimmed.bytes());
            }
        }
    }
    finish(current_id, current_def, current_seq, &mut out)?;

    if out.is_empty() {
        return Err(Error::InvalidInput("FASTA input contains no records".into()));
    }
    Ok(out)
}

/// Guess DNA vs. protein from symbol composition: DNA if at least 90% of
/// (non-N) symbols are drawn from `ACGTU`, protein otherwise.
pub fn guess_alphabet(symbols: &[u8]) -> Alphabet {
    let mut dna_like = 0usize;
    let mut counted = 0usize;
    for &symbol in symbols {
        let upper = symbol.to_ascii_uppercase();
        if upper == b'N' || upper == b'-' {
            continue;
        }
        counted += 1;
        if matches!(upper, b'A' | b'C' | b'G' | b'T' | b'U') {
            dna_like += 1;
        }
    }
    if counted == 0 || dna_like as f64 / counted as f64 >= 0.9 {
        Alphabet::Dna
    } else {
        Alphabet::Protein
    }
}

/// Parse an annotation side-channel file: whitespace-separated
/// `id strand [cds_start cds_length]` lines, blank lines and `#` comments
/// ignored.
pub fn read_annotations<R: BufRead>(reader: R) -> Result<Vec<Annotation>> {
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| Error::InvalidInput(format!("reading annotations: {e}")))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 2 && fields.len() != 4 {
            return Err(Error::InvalidInput(format!(
                "annotation line '{trimmed}' must have 2 fields (id strand) or 4 (id strand cds_start cds_length)"
            )));
        }
        let id = fields[0].to_string();
        let strand = match fields[1] {
            "+" => Strand::Forward,
            "-" => Strand::RevComp,
            "." => Strand::Unknown,
            other => return Err(Error::InvalidInput(format!("annotation '{id}' has unrecognized strand '{other}'"))),
        };
        let (cds_start, cds_length) = if fields.len() == 4 {
            let start: usize = fields[2].parse().map_err(|_| Error::InvalidInput(format!("annotation '{id}' has non-numeric cds_start")))?;
            let length: usize = fields[3].parse().map_err(|_| Error::InvalidInput(format!("annotation '{id}' has non-numeric cds_length")))?;
            if start == 0 {
                return Err(Error::InvalidInput(format!("annotation '{id}' has a 0 cds_start; coordinates are 1-based")));
            }
            (Some(start - 1), Some(length))
        } else {
            (None, None)
        };
        out.push(Annotation { id, strand, cds_start, cds_length });
    }
    Ok(out)
}

/// Attach an annotation (by matching `id`) to each sequence, reorienting
/// the sequence's strand to match. Sequences with no matching annotation
/// pass through unchanged.
pub fn apply_annotations(sequences: Vec<Sequence>, annotations: &[Annotation]) -> Vec<Sequence> {
    sequences
        .into_iter()
        .map(|seq| match annotations.iter().find(|a| a.id == seq.id) {
            None => seq,
            Some(annotation) => {
                let reoriented = if annotation.strand == Strand::RevComp && seq.strand != Strand::RevComp {
                    seq.revcomp()
                } else {
                    seq
                };
                reoriented.with_annotation(annotation.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_multiple_records_with_wrapped_lines() {
        let input = b">seq1 first record\nACGT\nACGT\n>seq2\nGGGG\n";
        let records = read_fasta(Cursor::new(&input[..]), Alphabet::Dna).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "seq1");
        assert_eq!(records[0].description.as_deref(), Some("first record"));
        assert_eq!(records[0].to_vec(), b"ACGTACGT");
        assert_eq!(records[1].to_vec(), b"GGGG");
    }

    #[test]
    fn rejects_symbol_outside_alphabet() {
        let input = b">seq1\nACGZT\n";
        assert!(read_fasta(Cursor::new(&input[..]), Alphabet::Dna).is_err());
    }

    #[test]
    fn rejects_empty_sequence() {
        let input = b">seq1\n>seq2\nACGT\n";
        assert!(read_fasta(Cursor::new(&input[..]), Alphabet::Dna).is_err());
    }

    #[test]
    fn guesses_dna_and_protein() {
        assert_eq!(guess_alphabet(b"ACGTACGTNN"), Alphabet::Dna);
        assert_eq!(guess_alphabet(b"MKVLASTQWERTY"), Alphabet::Protein);
    }

    #[test]
    fn annotation_without_cds_leaves_fields_absent() {
        let input = b"seq1 +\nseq2 - 10 30\n";
        let annotations = read_annotations(Cursor::new(&input[..])).unwrap();
        assert_eq!(annotations[0].cds_start, None);
        assert_eq!(annotations[0].cds_length, None);
        assert_eq!(annotations[1].cds_start, Some(9));
        assert_eq!(annotations[1].cds_length, Some(30));
    }

    #[test]
    fn applying_annotation_reorients_strand() {
        let records = vec![Sequence::new("seq1", b"ACGT".to_vec(), Alphabet::Dna)];
        let annotations = vec![Annotation {
            id: "seq1".to_string(),
            strand: Strand::RevComp,
            cds_start: None,
            cds_length: None,
        }];
        let applied = apply_annotations(records, &annotations);
        assert_eq!(applied[0].strand, Strand::RevComp);
        assert_eq!(applied[0].to_vec(), b"ACGT".to_vec().iter().rev().map(|&b| Alphabet::Dna.complement(b)).collect::<Vec<_>>());
    }
}
