//! Build constraints: `// +build` lines and `//go:build` expressions.
//!
//! A file's constraints are collected from the comments that precede its
//! package clause. Evaluation is a pure function of the parsed constraints
//! and the active [`BuildTags`].
//!
//! `+build` syntax: space-separated alternatives are OR'd, each alternative is
//! a comma-joined list of AND'd terms, and a `!` prefix requires the tag to be
//! absent. `+build linux,amd64 darwin` reads `(linux AND amd64) OR darwin`.
//! Every `+build` line of a file must hold, and so must its `//go:build` line
//! if it has one.

use std::fmt;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use thiserror::Error;

/// The set of tags active for one build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildTags {
    tags: FxHashSet<SmolStr>,
}

impl BuildTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<SmolStr>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, tag: impl Into<SmolStr>) -> Self {
        self.insert(tag);
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(SmolStr::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<T: Into<SmolStr>> FromIterator<T> for BuildTags {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<T: Into<SmolStr>> Extend<T> for BuildTags {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tags.extend(iter.into_iter().map(Into::into));
    }
}

/// One term of a `+build` alternative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagTerm {
    pub tag: SmolStr,
    pub negated: bool,
}

impl TagTerm {
    fn parse(text: &str) -> Self {
        match text.strip_prefix('!') {
            // `!!x` is not a valid term; keeping the full text makes it never match.
            Some(rest) if !rest.starts_with('!') => Self {
                tag: rest.into(),
                negated: true,
            },
            _ => Self {
                tag: text.into(),
                negated: false,
            },
        }
    }

    pub fn matches(&self, tags: &BuildTags) -> bool {
        let present = is_valid_tag(&self.tag) && tags.contains(&self.tag);
        present != self.negated
    }
}

/// A parsed `// +build` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlusBuildLine {
    /// OR'd alternatives of AND'd terms.
    pub alternatives: Vec<Vec<TagTerm>>,
}

impl PlusBuildLine {
    /// Parses the text following `+build`.
    pub fn parse(expr: &str) -> Self {
        let alternatives = expr
            .split_whitespace()
            .map(|alternative| alternative.split(',').map(TagTerm::parse).collect())
            .collect();
        Self { alternatives }
    }

    /// A line without alternatives is never satisfied.
    pub fn is_satisfied(&self, tags: &BuildTags) -> bool {
        self.alternatives
            .iter()
            .any(|terms| terms.iter().all(|term| term.matches(tags)))
    }
}

/// A parsed `//go:build` expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintExpr {
    Tag(SmolStr),
    Not(Box<ConstraintExpr>),
    And(Box<ConstraintExpr>, Box<ConstraintExpr>),
    Or(Box<ConstraintExpr>, Box<ConstraintExpr>),
}

impl ConstraintExpr {
    pub fn parse(text: &str) -> Result<Self, ConstraintError> {
        let tokens = tokenize(text)?;
        let mut parser = ExprParser { tokens: &tokens, pos: 0 };
        let expr = parser.or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(ConstraintError::new(format!("unexpected {token}"))),
        }
    }

    pub fn eval(&self, tags: &BuildTags) -> bool {
        match self {
            Self::Tag(tag) => tags.contains(tag),
            Self::Not(inner) => !inner.eval(tags),
            Self::And(lhs, rhs) => lhs.eval(tags) && rhs.eval(tags),
            Self::Or(lhs, rhs) => lhs.eval(tags) || rhs.eval(tags),
        }
    }
}

impl fmt::Display for ConstraintExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::Not(inner) => write!(f, "!{inner}"),
            Self::And(lhs, rhs) => write!(f, "({lhs} && {rhs})"),
            Self::Or(lhs, rhs) => write!(f, "({lhs} || {rhs})"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid //go:build line: {message}")]
pub struct ConstraintError {
    pub message: String,
}

impl ConstraintError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// All constraints found in one file's leading comments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildConstraints {
    pub go_build: Option<ConstraintExpr>,
    pub plus_build: Vec<PlusBuildLine>,
}

impl BuildConstraints {
    /// Collects constraints from the comment texts (with their `//`) that
    /// precede the package clause.
    pub fn from_comments<'a>(
        comments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConstraintError> {
        let mut constraints = Self::default();
        for text in comments {
            let Some(body) = text.strip_prefix("//") else {
                continue;
            };
            if let Some(expr) = directive_arg(body, "go:build") {
                if constraints.go_build.is_some() {
                    return Err(ConstraintError::new("multiple //go:build lines"));
                }
                constraints.go_build = Some(ConstraintExpr::parse(expr)?);
            } else if let Some(expr) = directive_arg(body.trim_start(), "+build") {
                constraints.plus_build.push(PlusBuildLine::parse(expr));
            }
        }
        Ok(constraints)
    }

    pub fn is_unconditional(&self) -> bool {
        self.go_build.is_none() && self.plus_build.is_empty()
    }

    pub fn passes(&self, tags: &BuildTags) -> bool {
        self.plus_build.iter().all(|line| line.is_satisfied(tags))
            && self.go_build.as_ref().is_none_or(|expr| expr.eval(tags))
    }
}

/// `directive` followed by whitespace or end of line; returns the rest.
fn directive_arg<'a>(body: &'a str, directive: &str) -> Option<&'a str> {
    let rest = body.strip_prefix(directive)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Tag(SmolStr),
    Not,
    And,
    Or,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Tag(tag) => write!(f, "tag '{tag}'"),
            Token::Not => f.write_str("'!'"),
            Token::And => f.write_str("'&&'"),
            Token::Or => f.write_str("'||'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ConstraintError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '!' => tokens.push(Token::Not),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(ConstraintError::new(format!("unexpected '{c}'")));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut end = start + c.len_utf8();
                while let Some((idx, next)) =
                    chars.next_if(|&(_, n)| n.is_alphanumeric() || n == '_' || n == '.')
                {
                    end = idx + next.len_utf8();
                }
                tokens.push(Token::Tag(text[start..end].into()));
            }
            other => return Err(ConstraintError::new(format!("unexpected '{other}'"))),
        }
    }
    Ok(tokens)
}

struct ExprParser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<ConstraintExpr, ConstraintError> {
        let mut expr = self.and()?;
        while self.eat(&Token::Or) {
            expr = ConstraintExpr::Or(Box::new(expr), Box::new(self.and()?));
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<ConstraintExpr, ConstraintError> {
        let mut expr = self.not()?;
        while self.eat(&Token::And) {
            expr = ConstraintExpr::And(Box::new(expr), Box::new(self.not()?));
        }
        Ok(expr)
    }

    fn not(&mut self) -> Result<ConstraintExpr, ConstraintError> {
        if self.eat(&Token::Not) {
            return Ok(ConstraintExpr::Not(Box::new(self.not()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<ConstraintExpr, ConstraintError> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ConstraintError::new("unexpected end of expression"))?;
        self.pos += 1;
        match token {
            Token::Tag(tag) => Ok(ConstraintExpr::Tag(tag)),
            Token::LParen => {
                let expr = self.or()?;
                if !self.eat(&Token::RParen) {
                    return Err(ConstraintError::new("missing ')'"));
                }
                Ok(expr)
            }
            other => Err(ConstraintError::new(format!("unexpected {other}"))),
        }
    }
}
