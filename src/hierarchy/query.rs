//! Path queries over a parsed hierarchy.
//!
//! Supported grammar (the subset element lookups need):
//!
//! ```text
//! path      := ('/' | '//')? step (('/' | '//') step)*
//! step      := '.' | ('*' | name) predicate*
//! predicate := '[' (number | 'last()' | or_expr) ']'
//! or_expr   := and_expr ('or' and_expr)*
//! and_expr  := primary ('and' primary)*
//! primary   := '(' or_expr ')'
//!            | '@' name (('=' | '!=') literal)?
//!            | ('contains' | 'starts-with') '(' '@' name ',' literal ')'
//! ```
//!
//! Queries are evaluated with the context node acting as the document root, so
//! `/x`, `//x` and `x` never escape the subtree they run against.

use super::types::{NodeId, Tree};
use crate::error::{DriverError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    Descendant,
    SelfNode,
}

#[derive(Debug, Clone, PartialEq)]
enum NameTest {
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    Last,
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Has(String),
    Eq(String, String),
    Ne(String, String),
    Contains(String, String),
    StartsWith(String, String),
}

impl Query {
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            source,
        };
        let query = parser.path()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(query)
    }

    /// All nodes matched from `context`, deduplicated, in document order
    pub fn evaluate(&self, tree: &Tree, context: NodeId) -> Vec<NodeId> {
        let mut current = vec![context];

        for step in &self.steps {
            let mut next = Vec::new();
            for &ctx in &current {
                match step.axis {
                    Axis::SelfNode => {
                        if step.matches_name(tree, ctx) {
                            next.extend(step.filter(tree, vec![ctx]));
                        }
                    }
                    Axis::Child => {
                        next.extend(step.filter(tree, step.children_of(tree, ctx)));
                    }
                    Axis::Descendant => {
                        for origin in tree.descendants_or_self(ctx) {
                            next.extend(step.filter(tree, step.children_of(tree, origin)));
                        }
                    }
                }
            }
            next.sort_unstable();
            next.dedup();
            current = next;
        }

        current
    }
}

impl Step {
    fn matches_name(&self, tree: &Tree, id: NodeId) -> bool {
        match &self.test {
            NameTest::Any => true,
            NameTest::Name(name) => tree.get(id).is_some_and(|n| &n.name == name),
        }
    }

    fn children_of(&self, tree: &Tree, id: NodeId) -> Vec<NodeId> {
        tree.children(id)
            .iter()
            .copied()
            .filter(|&child| self.matches_name(tree, child))
            .collect()
    }

    fn filter(&self, tree: &Tree, mut candidates: Vec<NodeId>) -> Vec<NodeId> {
        for predicate in &self.predicates {
            candidates = match predicate {
                Predicate::Position(n) => candidates.get(n.wrapping_sub(1)).copied().into_iter().collect(),
                Predicate::Last => candidates.last().copied().into_iter().collect(),
                Predicate::Expr(expr) => candidates
                    .into_iter()
                    .filter(|&id| expr.eval(tree, id))
                    .collect(),
            };
        }
        candidates
    }
}

impl Expr {
    fn eval(&self, tree: &Tree, id: NodeId) -> bool {
        let attr = |name: &str| tree.get(id).and_then(|n| n.attribute(name));
        match self {
            Expr::Or(a, b) => a.eval(tree, id) || b.eval(tree, id),
            Expr::And(a, b) => a.eval(tree, id) && b.eval(tree, id),
            Expr::Has(name) => attr(name).is_some(),
            Expr::Eq(name, value) => attr(name) == Some(value.as_str()),
            Expr::Ne(name, value) => attr(name).is_some_and(|v| v != value),
            Expr::Contains(name, value) => attr(name).is_some_and(|v| v.contains(value.as_str())),
            Expr::StartsWith(name, value) => {
                attr(name).is_some_and(|v| v.starts_with(value.as_str()))
            }
        }
    }
}

// ============ Lexer ============

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Eq,
    Ne,
    Dot,
    Star,
    Name(String),
    Literal(String),
    Number(usize),
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '@' => {
                tokens.push(Token::At);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| invalid(source, "unterminated string literal"))?;
                tokens.push(Token::Literal(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().collect();
                let n = digits
                    .parse()
                    .map_err(|_| invalid(source, "position out of range"))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || matches!(chars[i], '_' | '-' | ':' | '.'))
                {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            other => return Err(invalid(source, &format!("unexpected character '{}'", other))),
        }
    }

    Ok(tokens)
}

// ============ Parser ============

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            _ => Err(self.error(&format!("expected {:?}", expected))),
        }
    }

    fn error(&self, message: &str) -> DriverError {
        invalid(self.source, message)
    }

    fn path(&mut self) -> Result<Query> {
        let mut steps = Vec::new();

        let mut axis = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                Axis::Child
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                Axis::Descendant
            }
            _ => Axis::Child,
        };

        loop {
            steps.push(self.step(axis)?);
            axis = match self.peek() {
                Some(Token::Slash) => Axis::Child,
                Some(Token::DoubleSlash) => Axis::Descendant,
                _ => break,
            };
            self.pos += 1;
        }

        Ok(Query { steps })
    }

    fn step(&mut self, axis: Axis) -> Result<Step> {
        let (axis, test) = match self.next() {
            Some(Token::Dot) if axis == Axis::Child => (Axis::SelfNode, NameTest::Any),
            Some(Token::Star) => (axis, NameTest::Any),
            Some(Token::Name(name)) => (axis, NameTest::Name(name)),
            _ => return Err(self.error("expected a node name")),
        };

        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            self.pos += 1;
            predicates.push(self.predicate()?);
            self.expect(Token::RBracket)?;
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn predicate(&mut self) -> Result<Predicate> {
        match self.peek() {
            Some(Token::Number(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(Predicate::Position(n))
            }
            Some(Token::Name(name)) if name == "last" => {
                self.pos += 1;
                self.expect(Token::LParen)?;
                self.expect(Token::RParen)?;
                Ok(Predicate::Last)
            }
            _ => Ok(Predicate::Expr(self.or_expr()?)),
        }
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut left = self.and_expr()?;
        while matches!(self.peek(), Some(Token::Name(n)) if n == "or") {
            self.pos += 1;
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut left = self.primary()?;
        while matches!(self.peek(), Some(Token::Name(n)) if n == "and") {
            self.pos += 1;
            let right = self.primary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::LParen) => {
                let expr = self.or_expr()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::At) => {
                let name = self.name()?;
                match self.peek() {
                    Some(Token::Eq) => {
                        self.pos += 1;
                        Ok(Expr::Eq(name, self.literal()?))
                    }
                    Some(Token::Ne) => {
                        self.pos += 1;
                        Ok(Expr::Ne(name, self.literal()?))
                    }
                    _ => Ok(Expr::Has(name)),
                }
            }
            Some(Token::Name(func)) if func == "contains" || func == "starts-with" => {
                self.expect(Token::LParen)?;
                self.expect(Token::At)?;
                let name = self.name()?;
                self.expect(Token::Comma)?;
                let value = self.literal()?;
                self.expect(Token::RParen)?;
                if func == "contains" {
                    Ok(Expr::Contains(name, value))
                } else {
                    Ok(Expr::StartsWith(name, value))
                }
            }
            _ => Err(self.error("expected a predicate expression")),
        }
    }

    fn name(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Name(name)) => Ok(name),
            _ => Err(self.error("expected an attribute name")),
        }
    }

    fn literal(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Literal(value)) => Ok(value),
            _ => Err(self.error("expected a quoted string")),
        }
    }
}

fn invalid(source: &str, message: &str) -> DriverError {
    DriverError::InvalidQuery(format!("{}: {}", source, message))
}
