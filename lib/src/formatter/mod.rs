/*! Canonical formatting of YARA files.

The formatter works on the [`TokenStream`] of a parsed or built file, so
comments are never lost. The layout is rebuilt from scratch with a few
rules:

- Every rule starts on its own line, preceded by a blank line.
- Section keywords (`meta:`, `strings:`, `condition:`) are indented one
  level, and their contents two levels.
- Each meta and each string goes on its own line.
- Line breaks found in conditions are kept, and parentheses whose contents
  start on a new line are laid out as blocks.
- Consecutive blank lines are collapsed into one.
- Comments at the end of consecutive lines are aligned to the same column.

The output is stable: formatting an already formatted file doesn't change
it.
*/

use serde::{Deserialize, Serialize};

use crate::tokens::{Token, TokenKind, TokenStream};

#[cfg(test)]
mod tests;

/// Width of a tab character when aligning comments.
const TAB_WIDTH: usize = 4;

/// Options for the [`Formatter`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FormatConfig {
    /// Text inserted for each level of indentation.
    pub indent: String,
    /// Aligns the comments at the end of consecutive lines.
    pub align_trailing_comments: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { indent: "\t".to_string(), align_trailing_comments: true }
    }
}

/// Produces the canonical text of a token stream.
pub struct Formatter<'a> {
    config: &'a FormatConfig,
    with_includes: bool,
}

impl<'a> Formatter<'a> {
    /// Creates a formatter. With `with_includes` the contents of included
    /// files replace the `include` directives in the output.
    pub fn new(config: &'a FormatConfig, with_includes: bool) -> Self {
        Self { config, with_includes }
    }

    pub fn format(&self, tokens: &TokenStream) -> String {
        let mut layout = Layout::default();
        self.layout(tokens, &mut layout);
        layout.finish();
        self.render(layout.lines, tokens.newline_text())
    }

    fn layout(&self, stream: &TokenStream, layout: &mut Layout) {
        let mut tokens = stream.iter().peekable();
        while let Some((_, token)) = tokens.next() {
            match (token.kind(), token.sub_stream()) {
                (TokenKind::NewLine, _) => layout.newline(),
                (TokenKind::Comment | TokenKind::OneLineComment, _) => {
                    layout.comment(token, stream.literal_text(token))
                }
                (TokenKind::Include, Some(included)) if self.with_includes => {
                    // The path of the directive is dropped with it.
                    if let Some((_, path)) = tokens.peek() {
                        if path.kind() == TokenKind::StringLiteral {
                            tokens.next();
                        }
                    }
                    layout.break_line();
                    self.layout(included, layout);
                    layout.break_line();
                }
                (kind, _) => layout.code(
                    kind,
                    stream.literal_text(token),
                    token.force_newline(),
                ),
            }
        }
    }

    fn render(&self, lines: Vec<Line>, newline: &str) -> String {
        let mut rendered: Vec<String> = lines
            .iter()
            .map(|line| match (line.at_column_zero, line.level) {
                (true, _) => line.code.clone(),
                (false, level) => {
                    format!(
                        "{}{}",
                        self.config.indent.repeat(level.unwrap_or(0)),
                        line.code
                    )
                }
            })
            .collect();

        // Trailing comments are aligned within runs of consecutive lines
        // that have one.
        let mut start = 0;
        while start < lines.len() {
            if lines[start].comment.is_none() {
                start += 1;
                continue;
            }
            let mut end = start;
            while end < lines.len() && lines[end].comment.is_some() {
                end += 1;
            }
            let column = rendered[start..end]
                .iter()
                .map(|code| display_width(code))
                .max()
                .unwrap_or(0)
                + 1;
            for i in start..end {
                if let Some(comment) = &lines[i].comment {
                    let padding = if self.config.align_trailing_comments {
                        column - display_width(&rendered[i])
                    } else {
                        1
                    };
                    rendered[i].push_str(&" ".repeat(padding));
                    rendered[i].push_str(comment);
                }
            }
            start = end;
        }

        let mut output = String::new();
        for line in rendered {
            output.push_str(line.trim_end());
            output.push_str(newline);
        }
        output
    }
}

fn display_width(text: &str) -> usize {
    text.chars().map(|c| if c == '\t' { TAB_WIDTH } else { 1 }).sum()
}

#[derive(Debug, Default)]
struct Line {
    /// Indentation level. Lines holding only a comment get the level of the
    /// code line that follows them.
    level: Option<usize>,
    /// Comments written at the first column stay there.
    at_column_zero: bool,
    code: String,
    comment: Option<String>,
    comment_only: bool,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.code.is_empty() && self.comment.is_none()
    }
}

/// Splits the tokens into lines and decides their indentation.
#[derive(Default)]
struct Layout {
    lines: Vec<Line>,
    current: Line,
    /// Last code token added to the output.
    prev: Option<TokenKind>,
    /// Line breaks found in the source since the last token.
    newlines: usize,
    /// Open brackets, and whether they lay out their contents as a block.
    brackets: Vec<bool>,
    in_rule: bool,
    /// The current line ends after the next token unless that token is a
    /// comment, which then stays at the end of the line.
    pending_break: bool,
}

impl Layout {
    fn break_line(&mut self) {
        self.pending_break = false;
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
    }

    fn blank_line(&mut self) {
        self.break_line();
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(Line { level: Some(0), ..Default::default() });
        }
    }

    /// Keeps a single blank line where the source had one or more.
    fn separate(&mut self) {
        if self.newlines >= 2 {
            self.blank_line();
        }
        self.newlines = 0;
    }

    fn newline(&mut self) {
        self.newlines += 1;
        self.break_line();
    }

    fn comment(&mut self, token: &Token, text: String) {
        self.separate();
        if self.current.is_empty() {
            self.current = Line {
                level: None,
                at_column_zero: token.indentation == Some(0),
                code: text,
                comment: None,
                comment_only: true,
            };
        } else if token.kind() == TokenKind::OneLineComment {
            self.current.comment = Some(text);
        } else {
            self.current.code.push(' ');
            self.current.code.push_str(&text);
        }
        if token.kind() == TokenKind::OneLineComment {
            self.break_line();
        }
    }

    fn code(&mut self, kind: TokenKind, text: String, force_newline: bool) {
        if self.pending_break {
            self.break_line();
        }
        // The opening brace follows the rule header without a blank line.
        if kind == TokenKind::RuleBegin {
            self.newlines = 0;
        }
        self.separate();

        if kind.is_closing_bracket() && self.brackets.pop() == Some(true) {
            self.break_line();
        }
        if self.starts_rule(kind) {
            self.rule_separator();
        }
        if breaks_before(kind) {
            self.break_line();
        }

        if self.current.is_empty() {
            self.current.level = Some(self.level(kind));
        } else {
            if self.current.comment_only {
                self.current.comment_only = false;
                self.current.level = Some(self.level(kind));
            }
            if self.prev.map_or(true, |prev| spaced(prev, kind)) {
                self.current.code.push(' ');
            }
        }
        self.current.code.push_str(&text);

        let section_colon = kind == TokenKind::Colon
            && matches!(
                self.prev,
                Some(
                    TokenKind::Meta | TokenKind::Strings | TokenKind::Condition
                )
            );
        self.prev = Some(kind);

        match kind {
            TokenKind::RuleBegin => self.in_rule = true,
            TokenKind::RuleEnd => self.in_rule = false,
            _ => {}
        }

        if kind.is_opening_bracket() {
            self.brackets.push(force_newline);
        }

        let block_operator = matches!(kind, TokenKind::And | TokenKind::Or)
            && self.brackets.last() == Some(&true);

        if section_colon
            || block_operator
            || (kind.is_opening_bracket() && force_newline)
            || matches!(kind, TokenKind::RuleBegin | TokenKind::RuleEnd)
        {
            self.pending_break = true;
        }
    }

    fn starts_rule(&self, kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Rule | TokenKind::Private | TokenKind::Global
        ) && !matches!(self.prev, Some(TokenKind::Private | TokenKind::Global))
    }

    /// Puts the next rule on a new line, separated by a blank line from
    /// what precedes it. Comments right above the rule stay with it.
    fn rule_separator(&mut self) {
        self.break_line();
        let mut pos = self.lines.len();
        while pos > 0 && self.lines[pos - 1].comment_only {
            pos -= 1;
        }
        if pos > 0 && !self.lines[pos - 1].is_empty() {
            self.lines
                .insert(pos, Line { level: Some(0), ..Default::default() });
        }
    }

    fn level(&self, kind: TokenKind) -> usize {
        if !self.in_rule {
            return 0;
        }
        match kind {
            TokenKind::Meta | TokenKind::Strings | TokenKind::Condition => 1,
            TokenKind::RuleEnd => 0,
            _ => 2 + self.brackets.iter().filter(|forced| **forced).count(),
        }
    }

    /// Completes the last line and resolves the level of comment lines.
    fn finish(&mut self) {
        self.break_line();
        let mut next_level = 0;
        for line in self.lines.iter_mut().rev() {
            match line.level {
                Some(level) if !line.is_empty() => next_level = level,
                Some(_) => {}
                None => line.level = Some(next_level),
            }
        }
    }
}

fn breaks_before(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Import
            | TokenKind::Include
            | TokenKind::Meta
            | TokenKind::Strings
            | TokenKind::Condition
            | TokenKind::MetaKey
            | TokenKind::StringIdDef
            | TokenKind::RuleBegin
            | TokenKind::RuleEnd
    )
}

/// Whether a space goes between two tokens on the same line.
fn spaced(prev: TokenKind, next: TokenKind) -> bool {
    use TokenKind::*;
    if matches!(
        prev,
        LParen | LSqb | HexJumpLeft | Dot | DoubleDot | UnaryMinus | BitwiseNot
            | Dash
    ) {
        return false;
    }
    if matches!(
        next,
        RParen | RSqb | HexJumpRight | Comma | Dot | DoubleDot | Percent | Dash
    ) {
        return false;
    }
    match next {
        Colon => !matches!(prev, Meta | Strings | Condition),
        LParen | LSqb => !matches!(
            prev,
            Id | Ident
                | IntFunction
                | Xor
                | Base64
                | Base64Wide
                | StringOffset
                | StringLength
        ),
        _ => true,
    }
}
