use std::fmt::{Display, Formatter, Write};
use std::iter::Peekable;
use std::str::Chars;

/// A regular expression as written in YARA, like `/ab+c/is`.
///
/// The pattern is parsed into a tree of [`RegexpUnit`]s, and rendering the
/// tree produces exactly the text it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Regexp {
    pub pattern: RegexpUnit,
    pub modifiers: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegexpUnit {
    Char(char),
    /// An escape sequence like `\d`, `\.` or `\/`, the character is the one
    /// after the backslash.
    Escaped(char),
    AnyChar,
    LineStart,
    LineEnd,
    Class(RegexpClass),
    Group(Box<RegexpUnit>),
    Iteration {
        operand: Box<RegexpUnit>,
        repetition: Repetition,
        greedy: bool,
    },
    Concat(Vec<RegexpUnit>),
    Or(Vec<RegexpUnit>),
}

/// A character class like `[a-z]` or `[^\x00-\x1f]`. The body is kept as
/// written, without the brackets and the negation.
#[derive(Debug, Clone, PartialEq)]
pub struct RegexpClass {
    pub negated: bool,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Repetition {
    ZeroOrMore,
    OneOrMore,
    ZeroOrOne,
    /// `{n}`, `{n,}`, `{,m}` or `{n,m}`.
    Range { min: Option<u32>, max: Option<u32>, exact: bool },
}

impl Regexp {
    /// Parses a regular expression including its slashes and modifiers.
    pub fn parse(text: &str) -> Result<Self, String> {
        let body = text.strip_prefix('/').ok_or_else(|| {
            "regular expression must start with '/'".to_string()
        })?;
        let end = body.rfind('/').ok_or_else(|| {
            "regular expression must end with '/'".to_string()
        })?;
        let modifiers = &body[end + 1..];
        if let Some(m) = modifiers.chars().find(|c| !matches!(c, 'i' | 's')) {
            return Err(format!("unknown modifier '{}'", m));
        }
        Ok(Self {
            pattern: parse_pattern(&body[..end])?,
            modifiers: modifiers.to_string(),
        })
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.modifiers.contains('i')
    }

    pub fn is_dot_all(&self) -> bool {
        self.modifiers.contains('s')
    }
}

impl Display for Regexp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.modifiers)
    }
}

impl Display for RegexpUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RegexpUnit::Char(c) => f.write_char(*c),
            RegexpUnit::Escaped(c) => write!(f, "\\{}", c),
            RegexpUnit::AnyChar => f.write_char('.'),
            RegexpUnit::LineStart => f.write_char('^'),
            RegexpUnit::LineEnd => f.write_char('$'),
            RegexpUnit::Class(class) => {
                let negation = if class.negated { "^" } else { "" };
                write!(f, "[{}{}]", negation, class.body)
            }
            RegexpUnit::Group(inner) => write!(f, "({})", inner),
            RegexpUnit::Iteration { operand, repetition, greedy } => {
                write!(f, "{}{}", operand, repetition)?;
                if !greedy {
                    f.write_char('?')?;
                }
                Ok(())
            }
            RegexpUnit::Concat(units) => {
                units.iter().try_for_each(|unit| write!(f, "{}", unit))
            }
            RegexpUnit::Or(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_char('|')?;
                    }
                    write!(f, "{}", alternative)?;
                }
                Ok(())
            }
        }
    }
}

impl Display for Repetition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Repetition::ZeroOrMore => f.write_char('*'),
            Repetition::OneOrMore => f.write_char('+'),
            Repetition::ZeroOrOne => f.write_char('?'),
            Repetition::Range { min, max, exact: true } => {
                write!(f, "{{{}}}", min.or(*max).unwrap_or_default())
            }
            Repetition::Range { min, max, exact: false } => {
                f.write_char('{')?;
                if let Some(min) = min {
                    write!(f, "{}", min)?;
                }
                f.write_char(',')?;
                if let Some(max) = max {
                    write!(f, "{}", max)?;
                }
                f.write_char('}')
            }
        }
    }
}

/// Parses the pattern of a regular expression, the text between slashes.
pub fn parse_pattern(pattern: &str) -> Result<RegexpUnit, String> {
    let mut parser = PatternParser { chars: pattern.chars().peekable() };
    let unit = parser.alternation()?;
    match parser.chars.next() {
        None => Ok(unit),
        Some(')') => Err("unmatched ')'".to_string()),
        Some(c) => Err(format!("unexpected '{}'", c)),
    }
}

struct PatternParser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> PatternParser<'a> {
    fn alternation(&mut self) -> Result<RegexpUnit, String> {
        let mut alternatives = vec![self.concatenation()?];
        while self.chars.next_if_eq(&'|').is_some() {
            alternatives.push(self.concatenation()?);
        }
        Ok(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            RegexpUnit::Or(alternatives)
        })
    }

    fn concatenation(&mut self) -> Result<RegexpUnit, String> {
        let mut units = Vec::new();
        while let Some(&c) = self.chars.peek() {
            if c == '|' || c == ')' {
                break;
            }
            let atom = self.atom()?;
            units.push(self.repetitions(atom)?);
        }
        Ok(if units.len() == 1 {
            units.remove(0)
        } else {
            RegexpUnit::Concat(units)
        })
    }

    fn atom(&mut self) -> Result<RegexpUnit, String> {
        let c = match self.chars.next() {
            Some(c) => c,
            None => return Err("unexpected end of pattern".to_string()),
        };
        Ok(match c {
            '(' => {
                let inner = self.alternation()?;
                if self.chars.next_if_eq(&')').is_none() {
                    return Err("missing ')'".to_string());
                }
                RegexpUnit::Group(Box::new(inner))
            }
            '[' => RegexpUnit::Class(self.class()?),
            '.' => RegexpUnit::AnyChar,
            '^' => RegexpUnit::LineStart,
            '$' => RegexpUnit::LineEnd,
            '\\' => match self.chars.next() {
                Some(escaped) => RegexpUnit::Escaped(escaped),
                None => return Err("trailing backslash".to_string()),
            },
            '*' | '+' | '?' => {
                return Err(format!("nothing to repeat before '{}'", c))
            }
            c => RegexpUnit::Char(c),
        })
    }

    fn class(&mut self) -> Result<RegexpClass, String> {
        let negated = self.chars.next_if_eq(&'^').is_some();
        let mut body = String::new();
        // A closing bracket right at the start is part of the class.
        if let Some(c) = self.chars.next_if_eq(&']') {
            body.push(c);
        }
        loop {
            match self.chars.next() {
                Some(']') => return Ok(RegexpClass { negated, body }),
                Some('\\') => {
                    body.push('\\');
                    match self.chars.next() {
                        Some(c) => body.push(c),
                        None => return Err("trailing backslash".to_string()),
                    }
                }
                Some(c) => body.push(c),
                None => return Err("missing ']'".to_string()),
            }
        }
    }

    fn repetitions(
        &mut self,
        mut unit: RegexpUnit,
    ) -> Result<RegexpUnit, String> {
        loop {
            let repetition = match self.chars.peek() {
                Some('*') => Repetition::ZeroOrMore,
                Some('+') => Repetition::OneOrMore,
                Some('?') => Repetition::ZeroOrOne,
                Some('{') => match self.range()? {
                    Some(range) => range,
                    None => return Ok(unit),
                },
                _ => return Ok(unit),
            };
            if !matches!(repetition, Repetition::Range { .. }) {
                self.chars.next();
            }
            if matches!(unit, RegexpUnit::LineStart | RegexpUnit::LineEnd) {
                return Err(format!(
                    "nothing to repeat before '{}'",
                    repetition
                ));
            }
            let greedy = self.chars.next_if_eq(&'?').is_none();
            unit = RegexpUnit::Iteration {
                operand: Box::new(unit),
                repetition,
                greedy,
            };
        }
    }

    /// Parses a `{n,m}` repetition. If what follows the brace is not a valid
    /// repetition the brace is a literal character, and `None` is returned
    /// without consuming anything.
    fn range(&mut self) -> Result<Option<Repetition>, String> {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        let mut text = String::new();
        loop {
            match lookahead.next() {
                Some('}') => break,
                Some(c) if c.is_ascii_digit() || c == ',' => text.push(c),
                _ => return Ok(None),
            }
        }

        let number = |s: &str| -> Result<Option<u32>, String> {
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<u32>()
                    .map(Some)
                    .map_err(|_| format!("invalid repetition '{{{}}}'", text))
            }
        };

        let repetition = match text.split_once(',') {
            None if !text.is_empty() => Repetition::Range {
                min: number(&text)?,
                max: None,
                exact: true,
            },
            Some((min, max))
                if !max.contains(',') && !(min.is_empty() && max.is_empty()) =>
            {
                let (min, max) = (number(min)?, number(max)?);
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(format!(
                            "invalid repetition '{{{}}}'",
                            text
                        ));
                    }
                }
                Repetition::Range { min, max, exact: false }
            }
            _ => return Ok(None),
        };

        self.chars = lookahead;
        Ok(Some(repetition))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{parse_pattern, Regexp, RegexpUnit, Repetition};

    #[test]
    fn renders_back_to_source() {
        for text in [
            r"/abc/",
            r"/a(b|c)+d?/i",
            r"/[^\]a-z]{2,4}?\./s",
            r"/^foo.*bar$/is",
            r"/a{3}b{,2}c{1,}|d/",
            r"/\/path\/to/",
            r"/x{/",
        ] {
            assert_eq!(Regexp::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn tree_structure() {
        assert_eq!(
            parse_pattern("ab*").unwrap(),
            RegexpUnit::Concat(vec![
                RegexpUnit::Char('a'),
                RegexpUnit::Iteration {
                    operand: Box::new(RegexpUnit::Char('b')),
                    repetition: Repetition::ZeroOrMore,
                    greedy: true,
                },
            ])
        );
        assert_eq!(
            parse_pattern("a|").unwrap(),
            RegexpUnit::Or(vec![
                RegexpUnit::Char('a'),
                RegexpUnit::Concat(vec![])
            ])
        );
    }

    #[test]
    fn errors() {
        assert_eq!(parse_pattern("(ab").unwrap_err(), "missing ')'");
        assert_eq!(parse_pattern("ab)").unwrap_err(), "unmatched ')'");
        assert_eq!(
            parse_pattern("*a").unwrap_err(),
            "nothing to repeat before '*'"
        );
        assert_eq!(parse_pattern("[ab").unwrap_err(), "missing ']'");
        assert_eq!(
            parse_pattern("a{5,2}").unwrap_err(),
            "invalid repetition '{5,2}'"
        );
        assert_eq!(Regexp::parse("/a/x").unwrap_err(), "unknown modifier 'x'");
    }

    #[test]
    fn modifiers() {
        let regexp = Regexp::parse("/a/is").unwrap();
        assert!(regexp.is_case_insensitive());
        assert!(regexp.is_dot_all());
    }
}
