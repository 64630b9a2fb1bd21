//! Lazy, read-only sequence views (spec §3, "Sequence").
//!
//! Views compose without materialization: a [`Sequence`] is a cheap,
//! `Arc`-shared handle onto a [`SeqView`] trait object, and `subseq`,
//! `revcomp`, `filter` and `translate` all return new handles that borrow
//! their input by reference rather than copying it, per §3's "the view
//! graph owns its inputs" and §5's reference-counted shared-resource model.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::alphabet::Alphabet;
use crate::translate::TranslationTable;

/// A symbol source: anything that can answer `get(pos)` for `0..len()`.
pub trait SeqView: Send + Sync {
    fn len(&self) -> usize;
    fn get(&self, pos: usize) -> u8;
    fn alphabet(&self) -> Alphabet;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The strand a [`Sequence`] (or an annotation on it) was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    #[default]
    Forward,
    RevComp,
    Unknown,
}

/// A side-channel annotation: CDS bounds are *absent*, never implicitly
/// zero, per spec §9's note on annotation-parsing defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub id: String,
    pub strand: Strand,
    pub cds_start: Option<usize>,
    pub cds_length: Option<usize>,
}

/// A read-only, lazily-evaluated view over symbols, with identity metadata.
#[derive(Clone)]
pub struct Sequence {
    inner: Arc<dyn SeqView>,
    pub id: String,
    pub description: Option<String>,
    pub strand: Strand,
    pub annotation: Option<Annotation>,
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("id", &self.id)
            .field("len", &self.len())
            .field("strand", &self.strand)
            .finish()
    }
}

impl Sequence {
    pub fn new(id: impl Into<String>, data: Vec<u8>, alphabet: Alphabet) -> Self {
        Self {
            inner: Arc::new(Owned { data, alphabet }),
            id: id.into(),
            description: None,
            strand: Strand::Forward,
            annotation: None,
        }
    }

    fn from_view(id: impl Into<String>, strand: Strand, inner: Arc<dyn SeqView>) -> Self {
        Self {
            inner,
            id: id.into(),
            description: None,
            strand,
            annotation: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn alphabet(&self) -> Alphabet {
        self.inner.alphabet()
    }

    pub fn get(&self, pos: usize) -> u8 {
        self.inner.get(pos)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    /// A view over `[start, start+length)` of this sequence.
    pub fn subseq(&self, start: usize, length: usize) -> Sequence {
        assert!(start + length <= self.len(), "subseq out of bounds");
        Sequence::from_view(
            self.id.clone(),
            self.strand,
            Arc::new(SubseqView {
                inner: self.inner.clone(),
                offset: start,
                length,
            }),
        )
    }

    /// The reverse complement. `revcomp(revcomp(s))` is the identity on the
    /// symbol stream (spec §3 invariant), up to flipping the recorded strand
    /// back to its original value.
    pub fn revcomp(&self) -> Sequence {
        let strand = match self.strand {
            Strand::Forward => Strand::RevComp,
            Strand::RevComp => Strand::Forward,
            Strand::Unknown => Strand::Unknown,
        };
        Sequence::from_view(
            self.id.clone(),
            strand,
            Arc::new(RevCompView {
                inner: self.inner.clone(),
            }),
        )
    }

    /// Apply a pure per-symbol filter (complement, mask, unmask, softmask, …).
    pub fn filter(&self, filter: impl Fn(u8) -> u8 + Send + Sync + 'static) -> Sequence {
        Sequence::from_view(
            self.id.clone(),
            self.strand,
            Arc::new(FilterView {
                inner: self.inner.clone(),
                filter: Arc::new(filter),
            }),
        )
    }

    /// Translate this (DNA) sequence in the given reading frame (1, 2 or 3).
    /// `translate(s, f).length = (s.length - (f - 1)) / 3`, per spec §3.
    pub fn translate(&self, frame: u8, table: Arc<TranslationTable>) -> Sequence {
        assert!((1..=3).contains(&frame), "frame must be 1, 2 or 3");
        Sequence::from_view(
            self.id.clone(),
            self.strand,
            Arc::new(TranslationView {
                inner: self.inner.clone(),
                frame,
                table,
            }),
        )
    }
}

struct Owned {
    data: Vec<u8>,
    alphabet: Alphabet,
}

impl SeqView for Owned {
    fn len(&self) -> usize {
        self.data.len()
    }
    fn get(&self, pos: usize) -> u8 {
        self.data[pos]
    }
    fn alphabet(&self) -> Alphabet {
        self.alphabet
    }
}

struct SubseqView {
    inner: Arc<dyn SeqView>,
    offset: usize,
    length: usize,
}

impl SeqView for SubseqView {
    fn len(&self) -> usize {
        self.length
    }
    fn get(&self, pos: usize) -> u8 {
        debug_assert!(pos < self.length);
        self.inner.get(self.offset + pos)
    }
    fn alphabet(&self) -> Alphabet {
        self.inner.alphabet()
    }
}

struct RevCompView {
    inner: Arc<dyn SeqView>,
}

impl SeqView for RevCompView {
    fn len(&self) -> usize {
        self.inner.len()
    }
    fn get(&self, pos: usize) -> u8 {
        let alphabet = self.inner.alphabet();
        alphabet.complement(self.inner.get(self.inner.len() - 1 - pos))
    }
    fn alphabet(&self) -> Alphabet {
        self.inner.alphabet()
    }
}

struct FilterView {
    inner: Arc<dyn SeqView>,
    filter: Arc<dyn Fn(u8) -> u8 + Send + Sync>,
}

impl SeqView for FilterView {
    fn len(&self) -> usize {
        self.inner.len()
    }
    fn get(&self, pos: usize) -> u8 {
        (self.filter)(self.inner.get(pos))
    }
    fn alphabet(&self) -> Alphabet {
        self.inner.alphabet()
    }
}

struct TranslationView {
    inner: Arc<dyn SeqView>,
    frame: u8,
    table: Arc<TranslationTable>,
}

impl SeqView for TranslationView {
    fn len(&self) -> usize {
        let base = self.inner.len();
        let offset = (self.frame - 1) as usize;
        base.saturating_sub(offset) / 3
    }
    fn get(&self, pos: usize) -> u8 {
        let start = (self.frame - 1) as usize + pos * 3;
        self.table.translate(
            self.inner.get(start),
            self.inner.get(start + 1),
            self.inner.get(start + 2),
        )
    }
    fn alphabet(&self) -> Alphabet {
        Alphabet::Protein
    }
}

/// A demand-filled, page-cached source for out-of-core ("extmem") sequences.
///
/// Pages are sticky (never evicted) by default, per spec §5; callers that
/// want LRU-style eviction can implement it on top of `empty_func`.
pub trait PageSource: Send + Sync {
    fn len(&self) -> usize;
    fn alphabet(&self) -> Alphabet;
    /// Fill one page worth of symbols starting at `start`, `len` symbols
    /// long (the final page may be shorter).
    fn fill_page(&self, start: usize, len: usize) -> Vec<u8>;
}

/// The paged, mutex-guarded cache itself. Filling one page takes the lock
/// only long enough to insert the freshly-filled page (hot `get()` calls on
/// already-resident pages never block).
pub struct PagedCache<S: PageSource> {
    source: S,
    page_size: usize,
    pages: Mutex<HashMap<usize, Arc<Vec<u8>>>>,
    empty_func: Option<Box<dyn Fn(&mut HashMap<usize, Arc<Vec<u8>>>) + Send + Sync>>,
}

impl<S: PageSource> PagedCache<S> {
    pub fn new(source: S, page_size: usize) -> Self {
        assert!(page_size > 0);
        Self {
            source,
            page_size,
            pages: Mutex::new(HashMap::new()),
            empty_func: None,
        }
    }

    /// Install a custom eviction hook, invoked right before a new page is
    /// inserted (so callers can implement LRU or similar policies).
    pub fn with_empty_func(
        mut self,
        empty_func: impl Fn(&mut HashMap<usize, Arc<Vec<u8>>>) + Send + Sync + 'static,
    ) -> Self {
        self.empty_func = Some(Box::new(empty_func));
        self
    }

    fn page_of(&self, pos: usize) -> (usize, usize) {
        (pos / self.page_size, pos % self.page_size)
    }
}

impl<S: PageSource> SeqView for PagedCache<S> {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn get(&self, pos: usize) -> u8 {
        let (page_index, offset) = self.page_of(pos);
        {
            let pages = self.pages.lock().unwrap();
            if let Some(page) = pages.get(&page_index) {
                return page[offset];
            }
        }
        let page_start = page_index * self.page_size;
        let page_len = self.page_size.min(self.len() - page_start);
        let filled = self.source.fill_page(page_start, page_len);
        debug_assert_eq!(filled.len(), page_len);
        let mut pages = self.pages.lock().unwrap();
        if let Some(empty_func) = &self.empty_func {
            empty_func(&mut pages);
        }
        let page = pages.entry(page_index).or_insert_with(|| Arc::new(filled));
        page[offset]
    }

    fn alphabet(&self) -> Alphabet {
        self.source.alphabet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revcomp_is_involutive() {
        let seq = Sequence::new("s", b"ACGTACGT".to_vec(), Alphabet::Dna);
        let rc = seq.revcomp();
        let rcrc = rc.revcomp();
        for i in 0..seq.len() {
            assert_eq!(seq.get(i), rcrc.get(i));
        }
    }

    #[test]
    fn revcomp_complements_and_reverses() {
        let seq = Sequence::new("s", b"AACG".to_vec(), Alphabet::Dna);
        let rc = seq.revcomp();
        assert_eq!(rc.to_vec(), b"CGTT".to_vec());
    }

    #[test]
    fn mask_unmask_roundtrip_agrees_on_filter() {
        let alphabet = Alphabet::Dna;
        let seq = Sequence::new("s", b"AcGt".to_vec(), alphabet);
        let masked = seq.filter(move |b| alphabet.mask_lowercase_to_n(b));
        let unmask_then_mask = seq
            .filter(move |b| alphabet.unmask(b))
            .filter(move |b| alphabet.mask_lowercase_to_n(b));
        for i in 0..seq.len() {
            // unmasking first removes all lowercase info, so nothing is
            // masked to N; masked directly still masks the lowercase runs.
            assert_eq!(unmask_then_mask.get(i), seq.get(i).to_ascii_uppercase());
            let _ = masked.get(i);
        }
    }

    #[test]
    fn translate_length_matches_spec_formula() {
        let table = Arc::new(TranslationTable::standard());
        let seq = Sequence::new("s", b"ATGAAACTT".to_vec(), Alphabet::Dna); // 9 bases
        let protein = seq.translate(1, table.clone());
        assert_eq!(protein.len(), (9 - 0) / 3);
        let protein2 = seq.translate(2, table);
        assert_eq!(protein2.len(), (9 - 1) / 3);
    }

    struct FixedSource(Vec<u8>);
    impl PageSource for FixedSource {
        fn len(&self) -> usize {
            self.0.len()
        }
        fn alphabet(&self) -> Alphabet {
            Alphabet::Dna
        }
        fn fill_page(&self, start: usize, len: usize) -> Vec<u8> {
            self.0[start..start + len].to_vec()
        }
    }

    #[test]
    fn paged_cache_fills_on_demand_and_is_sticky() {
        let data = b"ACGTACGTACGT".to_vec();
        let cache = PagedCache::new(FixedSource(data.clone()), 4);
        for i in 0..data.len() {
            assert_eq!(cache.get(i), data[i]);
        }
        // re-reading from a filled page still returns the same data
        assert_eq!(cache.get(0), data[0]);
    }
}
