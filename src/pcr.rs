//! In-silico PCR / hybridization simulation (spec §4.7, the "ipcress"
//! model): given a set of primer pairs and a target sequence, find every
//! pair of close-enough primer matches on opposite strands within a
//! plausible product-length window. Each primer is searched in both its own
//! literal orientation and its own reverse complement, so a primer that
//! anneals at both ends of a product (self-priming) is detected too (spec
//! §6, `single_A`/`single_B`).

use std::sync::Arc;

use crate::alphabet::Alphabet;
use crate::fsm::Automaton;
use crate::sequence::Sequence;
use crate::wordhood::expand_neighborhood;
use crate::submat::SubstitutionMatrix;

#[derive(Debug, Clone)]
pub struct Primer {
    pub name: String,
    pub sequence: Vec<u8>,
    pub max_mismatches: u32,
}

/// Which declared primer of an [`Experiment`] a [`Match`] belongs to,
/// independent of which strand orientation actually matched (a primer can
/// anneal via either its own literal sequence or its own reverse
/// complement — see [`prepare`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimerSlot {
    A,
    B,
}

/// A forward/reverse primer pair defining one amplicon to search for.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub name: String,
    pub forward: Primer,
    pub reverse: Primer,
    pub min_product_length: usize,
    pub max_product_length: usize,
}

/// A single primer's binding site found on the target.
///
/// `forward_strand` is true when this hit is the primer's own literal
/// orientation matching the target's forward strand, false when it is the
/// primer's own reverse complement that matched instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub t_start: usize,
    pub length: usize,
    pub mismatches: u32,
    pub primer: PrimerSlot,
    pub forward_strand: bool,
}

/// A complete amplification product: a forward-strand hit paired with a
/// reverse-strand hit whose product length falls inside the experiment's
/// window. When `forward.primer == reverse.primer`, the same primer
/// annealed at both ends (self-priming) rather than a true A/B pair.
#[derive(Debug, Clone, Copy)]
pub struct Product {
    pub forward: Match,
    pub reverse: Match,
    pub product_length: usize,
}

#[derive(Clone, Copy)]
struct Payload {
    experiment: usize,
    primer: PrimerSlot,
    forward_strand: bool,
    mismatches: u32,
    primer_len: usize,
}

/// Caps how many matches are buffered before the sensor starts evicting the
/// oldest out-of-window entries, bounding memory on very repetitive targets
/// (spec §4.7, "memory-limit batching").
pub struct Sensor {
    window: usize,
    matches: Vec<(usize, Match, usize)>, // (experiment_index, match, insertion_order)
    next_order: usize,
}

impl Sensor {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            matches: Vec::new(),
            next_order: 0,
        }
    }

    fn push(&mut self, experiment: usize, m: Match) {
        self.matches.push((experiment, m, self.next_order));
        self.next_order += 1;
        self.evict_before(m.t_start);
    }

    fn evict_before(&mut self, current_t: usize) {
        let floor = current_t.saturating_sub(self.window);
        self.matches.retain(|(_, m, _)| m.t_start >= floor);
    }
}

/// A prepared simulation: the compiled automaton over every primer (and its
/// reverse complement) across all experiments, ready to [`simulate`] over a
/// target sequence.
pub struct Simulation {
    experiments: Vec<Experiment>,
    automaton: Arc<crate::fsm::CompiledAutomaton<Payload>>,
}

/// Build the automaton for `experiments` against `alphabet`/`matrix` (spec
/// §4.7, "prepare"): each primer contributes every neighbor within its
/// mismatch budget, found via the same wordhood expansion HSP seeding uses.
///
/// A primer can anneal via either strand, so both its own literal sequence
/// and its own reverse complement are registered, tagged with the same
/// [`PrimerSlot`] identity -- this is what lets [`simulate`] detect a primer
/// self-priming against both ends of a product (spec §6, `single_A`/
/// `single_B`).
pub fn prepare(experiments: Vec<Experiment>, alphabet: &[u8], matrix: &SubstitutionMatrix) -> Simulation {
    let mut automaton = Automaton::new();
    for (index, experiment) in experiments.iter().enumerate() {
        add_primer(&mut automaton, alphabet, matrix, &experiment.forward, index, PrimerSlot::A);
        add_primer(&mut automaton, alphabet, matrix, &experiment.reverse, index, PrimerSlot::B);
    }
    Simulation {
        experiments,
        automaton: Arc::new(automaton.compile()),
    }
}

fn add_primer(automaton: &mut Automaton<Payload>, alphabet: &[u8], matrix: &SubstitutionMatrix, primer: &Primer, experiment: usize, slot: PrimerSlot) {
    let revcomp: Vec<u8> = primer.sequence.iter().rev().map(|&b| Alphabet::Dna.complement(b)).collect();
    add_primer_orientation(automaton, alphabet, matrix, &primer.sequence, primer.max_mismatches, experiment, slot, true);
    add_primer_orientation(automaton, alphabet, matrix, &revcomp, primer.max_mismatches, experiment, slot, false);
}

#[allow(clippy::too_many_arguments)]
fn add_primer_orientation(
    automaton: &mut Automaton<Payload>,
    alphabet: &[u8],
    matrix: &SubstitutionMatrix,
    sequence: &[u8],
    max_mismatches: u32,
    experiment: usize,
    primer: PrimerSlot,
    forward_strand: bool,
) {
    let max_score = sequence.iter().map(|&s| matrix.score(s, s)).sum::<i32>();
    let worst_single_position_drop = sequence
        .iter()
        .map(|&s| matrix.score(s, s) - alphabet.iter().map(|&a| matrix.score(s, a)).min().unwrap_or(matrix.score(s, s)))
        .fold(0, i32::max);
    let min_score = max_score - max_mismatches as i32 * worst_single_position_drop;
    let primer_len = sequence.len();
    expand_neighborhood(sequence, alphabet, matrix, min_score, |neighbor, _score| {
        let mismatches = sequence
            .iter()
            .zip(neighbor)
            .filter(|(a, b)| a.to_ascii_uppercase() != b.to_ascii_uppercase())
            .count() as u32;
        if mismatches <= max_mismatches {
            automaton.add(
                neighbor,
                Payload {
                    experiment,
                    primer,
                    forward_strand,
                    mismatches,
                    primer_len,
                },
            );
        }
    });
}

/// Signal a [`report`] callback can send back to stop the scan early
/// (spec §4.7, "report callback with stop signal").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// Run the simulation over `target`, invoking `report` for every product
/// found and stopping early if it returns [`Control::Stop`].
pub fn simulate(sim: &Simulation, target: &Sequence, mut report: impl FnMut(&Experiment, Product) -> Control) {
    let max_window = sim.experiments.iter().map(|e| e.max_product_length).max().unwrap_or(0);
    let mut forward_sensor = Sensor::new(max_window);
    let mut reverse_sensor = Sensor::new(max_window);

    let bytes: Vec<u8> = (0..target.len()).map(|i| target.get(i)).collect();
    let mut stopped = false;

    sim.automaton.traverse(&bytes, |end_pos, payload| {
        if stopped {
            return;
        }
        let experiment = &sim.experiments[payload.experiment];
        if end_pos + 1 < payload.primer_len {
            return;
        }
        let m = Match {
            t_start: end_pos + 1 - payload.primer_len,
            length: payload.primer_len,
            mismatches: payload.mismatches,
            primer: payload.primer,
            forward_strand: payload.forward_strand,
        };

        let (same_sensor, other_sensor) = if payload.forward_strand {
            (&mut forward_sensor, &mut reverse_sensor)
        } else {
            (&mut reverse_sensor, &mut forward_sensor)
        };
        same_sensor.push(payload.experiment, m);

        for &(other_exp, other_match, _) in &other_sensor.matches {
            if other_exp != payload.experiment {
                continue;
            }
            let Some(product) = pair_up(experiment, m, other_match) else { continue };
            if report(experiment, product) == Control::Stop {
                stopped = true;
                return;
            }
        }
    });
}

fn pair_up(experiment: &Experiment, a: Match, b: Match) -> Option<Product> {
    let (forward, reverse) = if a.forward_strand { (a, b) } else { (b, a) };
    if forward.forward_strand == reverse.forward_strand {
        return None; // both hits landed on the same strand; not a valid pair
    }
    if reverse.t_start + reverse.length < forward.t_start {
        return None;
    }
    let product_length = reverse.t_start + reverse.length - forward.t_start;
    if product_length < experiment.min_product_length || product_length > experiment.max_product_length {
        return None;
    }
    Some(Product { forward, reverse, product_length })
}
