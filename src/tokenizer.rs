//! Tokenizer for the template language using winnow parser combinators.
//!
//! Converts raw template text into a zero-copy token stream. All string data
//! in a [`Token`] borrows from the original input.

use winnow::combinator::{alt, delimited};
use winnow::error::{ContextError, ErrMode};
use winnow::token::{take_till, take_until};
use winnow::Parser;

/// Result type for the individual tag parsers below, matching the
/// `winnow::Parser` convention of a backtrackable error on no match.
type PResult<O> = Result<O, ErrMode<ContextError>>;

fn fail<T>() -> PResult<T> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

/// A token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// A literal run: the longest substring not starting with `{{`.
    Literal(&'a str),

    /// `{{#! arbitrary text }}`, produces no output, never closed.
    Comment(&'a str),

    /// `{{#NAME arg1 arg2 …}}`, an opener for a paired or inline tag.
    Open { name: &'a str, args: Vec<&'a str> },

    /// `{{/NAME}}`, a closer for a paired tag.
    Close { name: &'a str },

    /// `{{PATH[,ALIGN][:FORMAT]}}`, a key placeholder.
    Placeholder {
        path: &'a str,
        alignment: i32,
        format: Option<&'a str>,
    },

    /// Sentinel marking the end of the stream.
    Eof,
}

/// Tokenizes template input into a token stream ending in [`Token::Eof`].
///
/// Malformed tag syntax (bad name, bad path, or no closing `}}`) falls back
/// to treating the opening `{{` as two literal characters and resuming
/// plain-text scanning from there, mirroring how a handwritten scanner
/// recovers from unparseable input rather than failing the whole template.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() {
        match parse_token(&mut remaining) {
            Ok(token) => tokens.push(token),
            Err(_) => {
                // Only `parse_literal` can fail here (every tag parser falls
                // back to it in `alt`), and it only fails when `remaining`
                // starts with `{{` that none of the tag shapes accept.
                // Treat those two bytes as literal text and keep scanning;
                // `merge_adjacent_literals` glues the pieces back together.
                let split = remaining.len().min(2);
                let (lit, rest) = remaining.split_at(split);
                tokens.push(Token::Literal(lit));
                remaining = rest;
            }
        }
    }
    tokens.push(Token::Eof);
    merge_adjacent_literals(tokens, input)
}

/// Dispatches to the tag-shaped parsers first, falling back to a literal run
/// when none of them match `{{` or when the input doesn't start with `{{`
/// at all.
fn parse_token<'a>(input: &mut &'a str) -> PResult<Token<'a>> {
    alt((parse_comment, parse_close, parse_open, parse_placeholder, parse_literal)).parse_next(input)
}

/// Consumes one `{{...}}` tag's raw interior and advances past its closing
/// `}}`, without interpreting what's inside.
fn tag_body<'a>(input: &mut &'a str) -> PResult<&'a str> {
    delimited("{{", take_until(0.., "}}"), "}}").parse_next(input)
}

fn parse_comment<'a>(input: &mut &'a str) -> PResult<Token<'a>> {
    let mut probe = *input;
    let inner = tag_body(&mut probe)?;
    let Some(body) = inner.strip_prefix("#!") else { return fail() };
    *input = probe;
    Ok(Token::Comment(body.trim()))
}

fn parse_close<'a>(input: &mut &'a str) -> PResult<Token<'a>> {
    let mut probe = *input;
    let inner = tag_body(&mut probe)?;
    let Some(body) = inner.strip_prefix('/') else { return fail() };
    let name = body.trim();
    if !is_valid_ident(name) {
        return fail();
    }
    *input = probe;
    Ok(Token::Close { name })
}

fn parse_open<'a>(input: &mut &'a str) -> PResult<Token<'a>> {
    let mut probe = *input;
    let inner = tag_body(&mut probe)?;
    let Some(body) = inner.strip_prefix('#') else { return fail() };
    let mut rest = body.trim_start();
    let Ok(name) = whitespace_delimited_token(&mut rest) else { return fail() };
    if !is_valid_ident(name) {
        return fail();
    }
    let args: Vec<&str> = rest.split_whitespace().collect();
    *input = probe;
    Ok(Token::Open { name, args })
}

/// Takes the first run of non-whitespace characters, matching what
/// `str::split_whitespace().next()` would yield; the caller validates the
/// result with [`is_valid_ident`].
fn whitespace_delimited_token<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_till(1.., char::is_whitespace).parse_next(input)
}

fn parse_placeholder<'a>(input: &mut &'a str) -> PResult<Token<'a>> {
    let mut probe = *input;
    let inner = tag_body(&mut probe)?;
    let Some(token) = build_placeholder(inner) else { return fail() };
    *input = probe;
    Ok(token)
}

/// Consumes the longest run of text that doesn't start with `{{`. Plain
/// `find`/`split_at` rather than a winnow combinator because, unlike the
/// tag parsers above, a literal run that never hits another `{{` has to
/// swallow the rest of the input rather than fail.
fn parse_literal<'a>(input: &mut &'a str) -> PResult<Token<'a>> {
    let end = input.find("{{").unwrap_or(input.len());
    if end == 0 {
        return fail();
    }
    let (text, rest) = input.split_at(end);
    *input = rest;
    Ok(Token::Literal(text))
}

/// Merges adjacent [`Token::Literal`]s that sit next to each other in the
/// original input, so the fallback-on-malformed-tag path in [`tokenize`]
/// never leaves a literal run needlessly split into two tokens.
fn merge_adjacent_literals<'a>(tokens: Vec<Token<'a>>, input: &'a str) -> Vec<Token<'a>> {
    let base = input.as_ptr() as usize;
    let mut out: Vec<Token<'a>> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        if let Token::Literal(new) = tok {
            if let Some(Token::Literal(prev)) = out.last() {
                let prev_start = prev.as_ptr() as usize - base;
                let prev_end = prev_start + prev.len();
                let new_start = new.as_ptr() as usize - base;
                if prev_end == new_start {
                    let merged = &input[prev_start..new_start + new.len()];
                    *out.last_mut().unwrap() = Token::Literal(merged);
                    continue;
                }
            }
            out.push(Token::Literal(new));
        } else {
            out.push(tok);
        }
    }
    out
}

fn build_placeholder(inner: &str) -> Option<Token<'_>> {
    let (head, format) = match inner.find(':') {
        Some(idx) => (&inner[..idx], Some(&inner[idx + 1..])),
        None => (inner, None),
    };

    let (path, alignment) = match head.find(',') {
        Some(idx) => {
            let path = &head[..idx];
            let alignment = parse_alignment(&head[idx + 1..])?;
            (path, alignment)
        }
        None => (head, 0),
    };

    if !is_valid_path(path) {
        return None;
    }

    Some(Token::Placeholder { path, alignment, format })
}

fn parse_alignment(s: &str) -> Option<i32> {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i32>().ok().map(|n| sign * n)
}

fn is_valid_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_valid_path(s: &str) -> bool {
    if s == "this" {
        return true;
    }
    !s.is_empty() && s.split('.').all(is_valid_ident)
}

/// Splits every [`Token::Literal`] at embedded newlines so each literal is
/// either a single complete line (ending in `\n`) or a newline-free
/// fragment. Standalone-line detection (below) depends on literals never
/// straddling a line boundary.
fn split_literals_at_newlines(tokens: Vec<Token<'_>>) -> Vec<Token<'_>> {
    let mut out = Vec::with_capacity(tokens.len());
    for tok in tokens {
        if let Token::Literal(mut rest) = tok {
            while let Some(idx) = rest.find('\n') {
                let (line, remainder) = rest.split_at(idx + 1);
                out.push(Token::Literal(line));
                rest = remainder;
            }
            if !rest.is_empty() {
                out.push(Token::Literal(rest));
            }
        } else {
            out.push(tok);
        }
    }
    out
}

fn is_intraline_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

fn qualifies_for_elision(tok: &Token<'_>) -> bool {
    matches!(tok, Token::Open { .. } | Token::Close { .. } | Token::Comment(_))
}

/// Groups a newline-split token stream into line segments: each segment is
/// the run of tokens up to and including the literal that terminates that
/// line (or, for the final segment, up to end of input).
fn group_into_lines<'a>(tokens: Vec<Token<'a>>) -> Vec<Vec<Token<'a>>> {
    let mut lines = vec![Vec::new()];
    for tok in tokens {
        let ends_line = matches!(&tok, Token::Literal(s) if s.ends_with('\n'));
        lines.last_mut().unwrap().push(tok);
        if ends_line {
            lines.push(Vec::new());
        }
    }
    lines
}

/// A line is standalone iff it contains at least one qualifying tag, no
/// placeholder, and every literal token on it is pure intra-line whitespace
/// (the line's own trailing newline, if present, doesn't count against
/// that check).
fn line_is_standalone(line: &[Token<'_>]) -> bool {
    let mut has_qualifying = false;
    for tok in line {
        match tok {
            Token::Placeholder { .. } => return false,
            Token::Literal(s) => {
                let body = s.strip_suffix('\n').unwrap_or(s);
                if !body.chars().all(is_intraline_whitespace) {
                    return false;
                }
            }
            other if qualifies_for_elision(other) => has_qualifying = true,
            _ => {}
        }
    }
    has_qualifying
}

/// Applies the standalone-line elision rule to a token stream.
///
/// Operates purely on token *kind* and line layout, independent of the
/// tree the parser later builds from these tokens, standalone-ness is a
/// lexical property. A standalone line's own content and terminator is
/// always dropped. Reaching back to also eat the newline that separates it
/// from whatever came before only happens when the standalone line has no
/// terminator of its own, i.e. it's the final line of the template: that's
/// what makes `"{{#if this}}\nContent\n{{/if}}"` render as `"Content"`
/// rather than `"Content\n"`, since the closer's line ends at EOF with no
/// `\n` of its own to drop. An interior standalone line (one that does end
/// in `\n`) only loses that one newline, not the preceding line's too.
pub fn elide_standalone_lines(tokens: Vec<Token<'_>>) -> Vec<Token<'_>> {
    let eof_tail: Vec<Token<'_>> = tokens
        .iter()
        .rev()
        .take_while(|t| matches!(t, Token::Eof))
        .cloned()
        .collect();
    let body_len = tokens.len() - eof_tail.len();
    let body = tokens[..body_len].to_vec();

    let split = split_literals_at_newlines(body);
    let lines = group_into_lines(split);
    let standalone: Vec<bool> = lines.iter().map(|l| line_is_standalone(l)).collect();

    let mut out: Vec<Token<'_>> = Vec::new();
    for (line, is_standalone) in lines.into_iter().zip(standalone) {
        if !is_standalone {
            out.extend(line);
            continue;
        }
        let has_own_terminator = matches!(line.last(), Some(Token::Literal(s)) if s.ends_with('\n'));
        if !has_own_terminator {
            if let Some(Token::Literal(last)) = out.last().cloned() {
                if let Some(stripped) = last.strip_suffix('\n') {
                    out.pop();
                    if !stripped.is_empty() {
                        out.push(Token::Literal(stripped));
                    }
                }
            }
        }
        for tok in line {
            if !matches!(tok, Token::Literal(_)) {
                out.push(tok);
            }
        }
    }
    out.extend(eof_tail.into_iter().rev());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_plain_text() {
        let tokens = tokenize("Hello World");
        assert_eq!(tokens, vec![Token::Literal("Hello World"), Token::Eof]);
    }

    #[test]
    fn tokenize_placeholder() {
        let tokens = tokenize("Hello, {{Name}}!!!");
        assert_eq!(
            tokens,
            vec![
                Token::Literal("Hello, "),
                Token::Placeholder { path: "Name", alignment: 0, format: None },
                Token::Literal("!!!"),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_placeholder_with_alignment() {
        let tokens = tokenize("{{Name,-10}}");
        assert_eq!(
            tokens[0],
            Token::Placeholder { path: "Name", alignment: -10, format: None }
        );
    }

    #[test]
    fn tokenize_placeholder_with_format() {
        let tokens = tokenize("{{When:yyyyMMdd}}");
        assert_eq!(
            tokens[0],
            Token::Placeholder { path: "When", alignment: 0, format: Some("yyyyMMdd") }
        );
    }

    #[test]
    fn tokenize_dotted_path() {
        let tokens = tokenize("{{user.name}}");
        assert_eq!(
            tokens[0],
            Token::Placeholder { path: "user.name", alignment: 0, format: None }
        );
    }

    #[test]
    fn tokenize_if_open_close() {
        let tokens = tokenize("{{#if this}}Content{{/if}}");
        assert_eq!(
            tokens,
            vec![
                Token::Open { name: "if", args: vec!["this"] },
                Token::Literal("Content"),
                Token::Close { name: "if" },
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_elif_else() {
        let tokens = tokenize("{{#if First}}A{{#elif Second}}B{{#else}}C{{/if}}");
        assert_eq!(tokens[0], Token::Open { name: "if", args: vec!["First"] });
        assert_eq!(tokens[2], Token::Open { name: "elif", args: vec!["Second"] });
        assert_eq!(tokens[4], Token::Open { name: "else", args: vec![] });
    }

    #[test]
    fn tokenize_each_with_custom_args() {
        let tokens = tokenize("{{#custom a b c}}x{{/custom}}");
        assert_eq!(tokens[0], Token::Open { name: "custom", args: vec!["a", "b", "c"] });
    }

    #[test]
    fn tokenize_comment() {
        let tokens = tokenize("{{#! a comment }}");
        assert_eq!(tokens, vec![Token::Comment("a comment"), Token::Eof]);
    }

    #[test]
    fn malformed_tag_falls_back_to_literal() {
        let tokens = tokenize("{{ }}rest");
        assert_eq!(tokens, vec![Token::Literal("{{ }}rest"), Token::Eof]);
    }

    #[test]
    fn unterminated_tag_is_literal() {
        let tokens = tokenize("{{incomplete");
        assert_eq!(tokens, vec![Token::Literal("{{incomplete"), Token::Eof]);
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(tokenize(""), vec![Token::Eof]);
    }

    #[test]
    fn tag_free_fidelity_has_single_literal() {
        let tokens = tokenize("no tags here at all");
        assert_eq!(tokens.len(), 2);
    }

    fn elided(input: &str) -> Vec<Token<'_>> {
        elide_standalone_lines(tokenize(input))
    }

    #[test]
    fn standalone_if_block_drops_both_surrounding_lines() {
        let tokens = elided("{{#if this}}\nContent\n{{/if}}");
        assert_eq!(
            tokens,
            vec![
                Token::Open { name: "if", args: vec!["this"] },
                Token::Literal("Content"),
                Token::Close { name: "if" },
                Token::Eof,
            ]
        );
    }

    #[test]
    fn standalone_comment_line_is_fully_elided() {
        let tokens = elided("{{#! c }}\n{{this}}");
        assert_eq!(
            tokens,
            vec![Token::Placeholder { path: "this", alignment: 0, format: None }, Token::Eof]
        );
    }

    #[test]
    fn interior_standalone_line_only_drops_its_own_newline() {
        // The comment line has its own terminator (it isn't the last line),
        // so only that one `\n` is dropped; the line before it is untouched.
        let tokens = elided("Line1\n{{#! note}}\nLine2");
        assert_eq!(
            tokens,
            vec![Token::Literal("Line1\n"), Token::Comment("note"), Token::Literal("Line2"), Token::Eof]
        );
    }

    #[test]
    fn standalone_closer_eats_preceding_newline_even_with_real_content_before_it() {
        // The opener shares its line with " hi" so it does not elide, but the
        // closer is alone on the final (newline-less, EOF) line and still
        // eats the single newline that separated it from that content.
        let tokens = elided("{{#if x}} hi\n{{/if}}");
        assert_eq!(
            tokens,
            vec![
                Token::Open { name: "if", args: vec!["x"] },
                Token::Literal(" hi"),
                Token::Close { name: "if" },
                Token::Eof,
            ]
        );
    }

    #[test]
    fn placeholder_sharing_a_line_with_a_tag_blocks_elision() {
        // Elision leaves content untouched but still splits literals at
        // newlines internally; that split is invisible once re-joined by
        // the renderer.
        let tokens = elided("{{#! c}}{{Name}}\nrest");
        assert_eq!(
            tokens,
            vec![
                Token::Comment("c"),
                Token::Placeholder { path: "Name", alignment: 0, format: None },
                Token::Literal("\n"),
                Token::Literal("rest"),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn multiple_qualifying_tags_share_one_elided_line() {
        let tokens = elided("{{#! a}} {{#! b}}\nrest");
        assert_eq!(
            tokens,
            vec![Token::Comment("a"), Token::Comment("b"), Token::Literal("rest"), Token::Eof]
        );
    }

    #[test]
    fn blank_line_with_no_tag_is_preserved() {
        let tokens = elided("{{#if x}}\n\n{{/if}}");
        assert_eq!(
            tokens,
            vec![
                Token::Open { name: "if", args: vec!["x"] },
                Token::Close { name: "if" },
                Token::Eof,
            ]
        );
    }

    #[test]
    fn no_tags_at_all_reconstructs_to_the_same_text() {
        let rejoined: String = elided("plain\ntext\n")
            .into_iter()
            .map(|t| match t {
                Token::Literal(s) => s,
                Token::Eof => "",
                _ => unreachable!("no tags in this input"),
            })
            .collect();
        assert_eq!(rejoined, "plain\ntext\n");
    }
}
