//! SUGAR: the one-line coordinate/score summary every other format is
//! prefixed with (spec §6).

use super::{strand_char, AlignmentSummary};
use crate::error::{Error, Result};

pub fn format(summary: &AlignmentSummary) -> String {
    format!(
        "sugar: {} {} {} {} {} {} {} {} {}",
        summary.q_id,
        summary.q_start,
        summary.q_end,
        strand_char(summary.q_strand),
        summary.t_id,
        summary.t_start,
        summary.t_end,
        strand_char(summary.t_strand),
        summary.score
    )
}

/// Parse a line previously produced by [`format`]. Round-trips with it
/// (spec §8, invariant 7) for every field except strand, which is
/// normalized to `Unknown` for any character other than `+`/`-` on parse,
/// matching how it was produced.
pub fn parse(line: &str) -> Result<(String, usize, usize, char, String, usize, usize, char, i32)> {
    let rest = line.strip_prefix("sugar: ").ok_or_else(|| Error::InvalidInput("SUGAR line missing 'sugar: ' prefix".into()))?;
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() != 9 {
        return Err(Error::InvalidInput(format!("SUGAR line has {} fields, expected 9", fields.len())));
    }
    let parse_usize = |s: &str| s.parse::<usize>().map_err(|_| Error::InvalidInput(format!("expected integer, got '{s}'")));
    let parse_char = |s: &str| s.chars().next().ok_or_else(|| Error::InvalidInput("empty strand field".into()));
    let parse_score = |s: &str| s.parse::<i32>().map_err(|_| Error::InvalidInput(format!("expected integer score, got '{s}'")));

    Ok((
        fields[0].to_string(),
        parse_usize(fields[1])?,
        parse_usize(fields[2])?,
        parse_char(fields[3])?,
        fields[4].to_string(),
        parse_usize(fields[5])?,
        parse_usize(fields[6])?,
        parse_char(fields[7])?,
        parse_score(fields[8])?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Strand;

    #[test]
    fn formats_and_parses_round_trip() {
        let summary = AlignmentSummary {
            q_id: "q1".into(),
            q_start: 0,
            q_end: 8,
            q_strand: Strand::Forward,
            t_id: "t1".into(),
            t_start: 2,
            t_end: 10,
            t_strand: Strand::Forward,
            score: 40,
        };
        let line = format(&summary);
        assert_eq!(line, "sugar: q1 0 8 + t1 2 10 + 40");
        let parsed = parse(&line).unwrap();
        assert_eq!(parsed.0, "q1");
        assert_eq!(parsed.8, 40);
    }
}
