use crate::entry::FileEntry;
use crate::error::TidyError;
use crate::rules::compile_regex;
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone)]
pub enum TemplatePart {
    Literal(String),
    Token(Token),
}

#[derive(Debug, Clone)]
pub enum Token {
    /// `{F}`
    Stem,
    /// `{D}`
    Timestamp,
    /// `{0}`
    IndexFromZero,
    /// `{1}`
    IndexFromOne,
    /// `{F,old:new,...}`
    Replace(Vec<(String, String)>),
    /// `{F,/pattern/replacement/}`
    RegexReplace { regex: Regex, replacement: String },
}

/// Everything a template needs to know about one file.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub stem: &'a str,
    pub extension: &'a str,
    pub index: usize,
    pub timestamp: &'a str,
}

/// A parsed batch rename template.
#[derive(Debug, Clone)]
pub struct BatchRule {
    source: String,
    parts: Vec<TemplatePart>,
}

impl BatchRule {
    pub fn parse(input: &str) -> Result<Self, TidyError> {
        Ok(Self {
            source: input.to_string(),
            parts: parse_template(input)?,
        })
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    pub fn render(&self, ctx: &RuleContext<'_>) -> String {
        render_template(&self.parts, ctx)
    }

    /// Expands the rule for every file, in order. The position in `files`
    /// is the value of `{0}` / `{1}`.
    pub fn expand<P: AsRef<Path>>(&self, files: &[P]) -> Vec<String> {
        files
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let entry = FileEntry::from_path(path.as_ref());
                let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
                self.render(&RuleContext {
                    stem: &entry.stem,
                    extension: &entry.extension,
                    index,
                    timestamp: &timestamp,
                })
            })
            .collect()
    }
}

impl fmt::Display for BatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

pub fn expand_batch_rule<P: AsRef<Path>>(
    files: &[P],
    template: &str,
) -> Result<Vec<String>, TidyError> {
    Ok(BatchRule::parse(template)?.expand(files))
}

/// Splits a template into literals and tokens. Brace sequences that are not
/// a known placeholder stay in the output verbatim.
pub fn parse_template(input: &str) -> Result<Vec<TemplatePart>, TidyError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let candidate = &rest[open..];
        match parse_block(candidate)? {
            Some((token, consumed)) => {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(TemplatePart::Token(token));
                rest = &candidate[consumed..];
            }
            None => {
                literal.push('{');
                rest = &candidate[1..];
            }
        }
    }
    literal.push_str(rest);

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }

    Ok(parts)
}

pub fn render_template(parts: &[TemplatePart], ctx: &RuleContext<'_>) -> String {
    let mut output = String::new();
    for part in parts {
        match part {
            TemplatePart::Literal(s) => output.push_str(s),
            TemplatePart::Token(token) => match token {
                Token::Stem => output.push_str(ctx.stem),
                Token::Timestamp => output.push_str(ctx.timestamp),
                Token::IndexFromZero => output.push_str(&ctx.index.to_string()),
                Token::IndexFromOne => output.push_str(&(ctx.index + 1).to_string()),
                Token::Replace(pairs) => {
                    let mut value = ctx.stem.to_string();
                    for (from, to) in pairs {
                        if from.is_empty() {
                            continue;
                        }
                        value = value.replace(from.as_str(), to);
                    }
                    output.push_str(&value);
                }
                Token::RegexReplace { regex, replacement } => {
                    output.push_str(&regex.replace_all(ctx.stem, replacement.as_str()));
                }
            },
        }
    }

    output.push_str(ctx.extension);
    output
}

/// `input` starts with `{`. Returns the token and the number of bytes it
/// spans, or `None` when the block is not a placeholder.
fn parse_block(input: &str) -> Result<Option<(Token, usize)>, TidyError> {
    if let Some(body) = input.strip_prefix("{F,/") {
        if let Some((token, consumed)) = parse_regex_block(body)? {
            return Ok(Some((token, "{F,/".len() + consumed)));
        }
    }

    let Some(close) = input.find('}') else {
        return Ok(None);
    };
    let content = &input[1..close];
    if content.contains('{') {
        return Ok(None);
    }

    let token = match content {
        "F" => Token::Stem,
        "D" => Token::Timestamp,
        "0" => Token::IndexFromZero,
        "1" => Token::IndexFromOne,
        other => match other.strip_prefix("F,").and_then(parse_replace_pairs) {
            Some(pairs) => Token::Replace(pairs),
            None => return Ok(None),
        },
    };
    Ok(Some((token, close + 1)))
}

/// `body` follows `{F,/`. The pattern ends at the first unescaped `/`, the
/// replacement at the next `/}`.
fn parse_regex_block(body: &str) -> Result<Option<(Token, usize)>, TidyError> {
    let mut escaped = false;
    let mut pattern_end = None;
    for (pos, ch) in body.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '/' => {
                pattern_end = Some(pos);
                break;
            }
            _ => {}
        }
    }

    let Some(pattern_end) = pattern_end.filter(|&pos| pos > 0) else {
        return Ok(None);
    };
    let after = &body[pattern_end + 1..];
    let Some(replacement_end) = after.find("/}") else {
        return Ok(None);
    };

    let pattern = &body[..pattern_end];
    let token = Token::RegexReplace {
        regex: compile_regex(pattern)?,
        replacement: after[..replacement_end].to_string(),
    };
    Ok(Some((token, pattern_end + 1 + replacement_end + "/}".len())))
}

fn parse_replace_pairs(pairs: &str) -> Option<Vec<(String, String)>> {
    if pairs.is_empty() {
        return None;
    }
    // Text after a second `:` in a pair is ignored.
    pairs
        .split(',')
        .map(|pair| {
            let mut fields = pair.split(':');
            let from = fields.next()?;
            let to = fields.next()?;
            Some((from.to_string(), to.to_string()))
        })
        .collect()
}
