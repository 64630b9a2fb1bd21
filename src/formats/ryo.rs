//! RYO ("roll your own") templates (spec §6): a format string with
//! `%`-tokens for per-alignment fields and a `{…}` block, iterated once per
//! transition, with nested `%P`-tokens for per-transition fields.

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub name: String,
    pub label: String,
    pub advance_q: u32,
    pub advance_t: u32,
    pub begin_q: usize,
    pub end_q: usize,
    pub begin_t: usize,
    pub end_t: usize,
    pub score: i32,
}

#[derive(Debug, Clone, Default)]
pub struct RyoContext {
    pub q_id: String,
    pub q_def: String,
    pub q_len: usize,
    pub q_strand: char,
    pub t_id: String,
    pub t_def: String,
    pub t_len: usize,
    pub t_strand: char,
    pub align_begin: usize,
    pub align_end: usize,
    pub score: i32,
    pub model_name: String,
    pub rank: usize,
    pub percent_id: f64,
    pub sugar: String,
    pub cigar: String,
    pub vulgar: String,
    pub transitions: Vec<TransitionRecord>,
}

/// Render `template` against `ctx`. Errors if a `{` block is left
/// unterminated or a `{` is found while already inside a block (spec §7,
/// "usage errors").
pub fn render(template: &str, ctx: &RyoContext) -> Result<String> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '%' => {
                i += 1;
                let Some(&code) = chars.get(i) else {
                    return Err(Error::Usage("RYO template ends with a bare '%'".into()));
                };
                out.push_str(&alignment_token(code, ctx)?);
                i += 1;
            }
            '{' => {
                let (block, next) = read_block(&chars, i)?;
                for transition in &ctx.transitions {
                    out.push_str(&render_transition_block(&block, transition)?);
                }
                i = next;
            }
            '}' => {
                return Err(Error::Usage("RYO template has an unmatched '}'".into()));
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Scan a balanced `{…}` block starting at `start` (which must point at
/// `{`). Returns the block's inner text and the index just past the
/// closing `}`. Errors on a nested `{` or on reaching end-of-input first.
fn read_block(chars: &[char], start: usize) -> Result<(String, usize)> {
    let mut i = start + 1;
    let mut inner = String::new();
    loop {
        match chars.get(i) {
            None => return Err(Error::Usage("RYO template has an unterminated '{' block".into())),
            Some('{') => return Err(Error::Usage("RYO template has a nested '{' block".into())),
            Some('}') => return Ok((inner, i + 1)),
            Some(&c) => {
                inner.push(c);
                i += 1;
            }
        }
    }
}

fn render_transition_block(block: &str, transition: &TransitionRecord) -> Result<String> {
    let chars: Vec<char> = block.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '%' && chars.get(i + 1) == Some(&'P') {
            let Some(&code) = chars.get(i + 2) else {
                return Err(Error::Usage("RYO template has a bare '%P' with no field code".into()));
            };
            out.push_str(&transition_token(code, transition));
            i += 3;
        } else if chars[i] == '%' {
            i += 1;
            let Some(&code) = chars.get(i) else {
                return Err(Error::Usage("RYO template ends with a bare '%'".into()));
            };
            out.push(code);
            i += 1;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    Ok(out)
}

fn alignment_token(code: char, ctx: &RyoContext) -> Result<String> {
    Ok(match code {
        'q' => ctx.q_id.clone(),
        'Q' => ctx.q_def.clone(),
        'l' => ctx.q_len.to_string(),
        'e' => ctx.align_begin.to_string(),
        'E' => ctx.align_end.to_string(),
        't' => ctx.t_id.clone(),
        'T' => ctx.t_def.clone(),
        's' => ctx.score.to_string(),
        'm' => ctx.model_name.clone(),
        'r' => ctx.rank.to_string(),
        'p' => format!("{:.2}", ctx.percent_id),
        'g' => sugar_or_cigar_or_vulgar(ctx, 'g'),
        'c' => sugar_or_cigar_or_vulgar(ctx, 'c'),
        'v' => sugar_or_cigar_or_vulgar(ctx, 'v'),
        '%' => "%".to_string(),
        other => return Err(Error::InvalidConfig(format!("unknown RYO token '%{other}'"))),
    })
}

fn sugar_or_cigar_or_vulgar(ctx: &RyoContext, which: char) -> String {
    match which {
        'g' => ctx.sugar.clone(),
        'c' => ctx.cigar.clone(),
        _ => ctx.vulgar.clone(),
    }
}

fn transition_token(code: char, transition: &TransitionRecord) -> String {
    match code {
        'n' => transition.name.clone(),
        'l' => transition.label.clone(),
        'q' => transition.advance_q.to_string(),
        't' => transition.advance_t.to_string(),
        'b' => transition.begin_q.to_string(),
        'e' => transition.end_q.to_string(),
        's' => transition.score.to_string(),
        other => format!("%P{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RyoContext {
        RyoContext {
            q_id: "q1".into(),
            score: 40,
            transitions: vec![
                TransitionRecord {
                    name: "match-match".into(),
                    label: "Match".into(),
                    advance_q: 1,
                    advance_t: 1,
                    begin_q: 0,
                    end_q: 1,
                    begin_t: 0,
                    end_t: 1,
                    score: 5,
                },
                TransitionRecord {
                    name: "match-match".into(),
                    label: "Match".into(),
                    advance_q: 1,
                    advance_t: 1,
                    begin_q: 1,
                    end_q: 2,
                    begin_t: 1,
                    end_t: 2,
                    score: 5,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn substitutes_simple_tokens() {
        let out = render("query=%q score=%s", &ctx()).unwrap();
        assert_eq!(out, "query=q1 score=40");
    }

    #[test]
    fn iterates_transition_block() {
        let out = render("[{%Pn:%Ps}]", &ctx()).unwrap();
        assert_eq!(out, "[match-match:5match-match:5]");
    }

    #[test]
    fn unterminated_block_errors() {
        assert!(render("{%Pn", &ctx()).is_err());
    }

    #[test]
    fn nested_block_errors() {
        assert!(render("{a{b}c}", &ctx()).is_err());
    }
}
