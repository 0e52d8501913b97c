//! Local query evaluator for the bundled clients.
//!
//! A real content host evaluates its own query language. The in-memory and
//! file clients need *something* to answer `fetch`, so this module covers the
//! filter-and-slice subset that bulk searches produce:
//!
//! ```text
//! *[_type == "post" && (title match "*foo*" || name match "*foo*")][0...100]
//! ```
//!
//! Supported: `*[cond]` with an optional `[a...b]` (exclusive) or `[a..b]`
//! (inclusive) slice. Conditions combine `==`, `!=`, `match`, `defined(path)`,
//! `!`, `&&`, `||` and parentheses over dotted field paths and
//! string/number/bool/null literals. Anything else is a query error.

use crate::error::{BulkError, Result};
use serde_json::Value;

/// Deepest nesting of `!` and parentheses a filter may use.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Star,
    LBracket,
    RBracket,
    LParen,
    RParen,
    And,
    Or,
    Not,
    Eq,
    NotEq,
    Range { inclusive: bool },
    Ident(String),
    Str(String),
    Num(f64),
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Path(Vec<String>),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Eq(Operand, Operand),
    NotEq(Operand, Operand),
    Match(Operand, Operand),
    Defined(Vec<String>),
    Truthy(Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slice {
    start: usize,
    end: usize,
}

/// A parsed `*[filter][slice]` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalQuery {
    filter: Expr,
    slice: Option<Slice>,
}

impl LocalQuery {
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
        .query()
    }

    pub fn matches(&self, doc: &Value) -> bool {
        eval(&self.filter, doc)
    }

    /// Filters then slices, preserving document order.
    pub fn run<'a, I>(&self, documents: I) -> Vec<Value>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let matching = documents.into_iter().filter(|d| self.matches(d));
        match self.slice {
            Some(Slice { start, end }) => matching
                .skip(start)
                .take(end.saturating_sub(start))
                .cloned()
                .collect(),
            None => matching.cloned().collect(),
        }
    }
}

pub fn evaluate(source: &str, documents: &[Value]) -> Result<Vec<Value>> {
    Ok(LocalQuery::parse(source)?.run(documents))
}

fn query_error(msg: impl Into<String>) -> BulkError {
    BulkError::Query(msg.into())
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '*' => {
                tokens.push(Token::Star);
                i += 1;
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
            '&' if chars.get(i + 1) == Some(&'&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if chars.get(i + 1) == Some(&'|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Eq);
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::NotEq);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '.' if chars.get(i + 1) == Some(&'.') => {
                let inclusive = chars.get(i + 2) != Some(&'.');
                tokens.push(Token::Range { inclusive });
                i += if inclusive { 2 } else { 3 };
            }
            '"' | '\'' => {
                let (s, next) = read_string(&chars, i)?;
                tokens.push(Token::Str(s));
                i = next;
            }
            c if c.is_ascii_digit() || (c == '-' && next_is_digit(&chars, i)) => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                // A fraction needs a digit after the dot, otherwise `0...10` would eat a dot.
                if chars.get(i) == Some(&'.') && next_is_digit(&chars, i) {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| query_error(format!("invalid number: {}", text)))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() {
                    let ch = chars[i];
                    if ch.is_alphanumeric() || ch == '_' {
                        i += 1;
                    } else if ch == '.'
                        && chars
                            .get(i + 1)
                            .is_some_and(|n| n.is_alphabetic() || *n == '_')
                    {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(query_error(format!(
                    "unexpected character '{}' at position {}",
                    other, i
                )))
            }
        }
    }

    Ok(tokens)
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

fn read_string(chars: &[char], start: usize) -> Result<(String, usize)> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| query_error("unterminated escape in string"))?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => *other,
                });
                i += 2;
            }
            c if c == quote => return Ok((out, i + 1)),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err(query_error("unterminated string literal"))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(query_error(format!(
                "filter is nested more than {} levels deep",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(query_error(format!("expected {:?}, found {:?}", expected, t))),
            None => Err(query_error(format!(
                "expected {:?}, found end of query",
                expected
            ))),
        }
    }

    fn query(mut self) -> Result<LocalQuery> {
        self.expect(Token::Star)?;
        self.expect(Token::LBracket)?;
        let filter = self.or()?;
        self.expect(Token::RBracket)?;

        let slice = if self.peek() == Some(&Token::LBracket) {
            self.pos += 1;
            Some(self.slice()?)
        } else {
            None
        };

        if let Some(t) = self.peek() {
            return Err(query_error(format!(
                "unsupported query: unexpected {:?} after filter",
                t
            )));
        }

        Ok(LocalQuery { filter, slice })
    }

    fn slice(&mut self) -> Result<Slice> {
        let start = self.index()?;
        let inclusive = match self.next() {
            Some(Token::Range { inclusive }) => inclusive,
            _ => return Err(query_error("expected a range slice like [0...10]")),
        };
        let end = self.index()?;
        self.expect(Token::RBracket)?;
        let end = if inclusive {
            end.checked_add(1)
                .ok_or_else(|| query_error("slice bound too large"))?
        } else {
            end
        };
        Ok(Slice { start, end })
    }

    fn index(&mut self) -> Result<usize> {
        match self.next() {
            Some(Token::Num(n)) if n >= 0.0 && n.fract() == 0.0 => {
                if n >= usize::MAX as f64 {
                    return Err(query_error(format!("slice bound {} is too large", n)));
                }
                Ok(n as usize)
            }
            other => Err(query_error(format!(
                "slice bounds must be non-negative integers, found {:?}",
                other
            ))),
        }
    }

    fn or(&mut self) -> Result<Expr> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            self.enter()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            self.enter()?;
            let inner = self.or()?;
            self.expect(Token::RParen)?;
            self.depth -= 1;
            return Ok(inner);
        }

        if let Some(Token::Ident(name)) = self.peek() {
            if name == "defined" && self.tokens.get(self.pos + 1) == Some(&Token::LParen) {
                self.pos += 2;
                let path = match self.next() {
                    Some(Token::Ident(p)) => split_path(&p),
                    other => {
                        return Err(query_error(format!(
                            "defined() expects a field, found {:?}",
                            other
                        )))
                    }
                };
                self.expect(Token::RParen)?;
                return Ok(Expr::Defined(path));
            }
        }

        let left = self.operand()?;
        match self.peek() {
            Some(Token::Eq) => {
                self.pos += 1;
                Ok(Expr::Eq(left, self.operand()?))
            }
            Some(Token::NotEq) => {
                self.pos += 1;
                Ok(Expr::NotEq(left, self.operand()?))
            }
            Some(Token::Ident(op)) if op == "match" => {
                self.pos += 1;
                Ok(Expr::Match(left, self.operand()?))
            }
            _ => Ok(Expr::Truthy(left)),
        }
    }

    fn operand(&mut self) -> Result<Operand> {
        match self.next() {
            Some(Token::Str(s)) => Ok(Operand::Literal(Value::String(s))),
            Some(Token::Num(n)) => Ok(Operand::Literal(number(n))),
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "true" => Operand::Literal(Value::Bool(true)),
                "false" => Operand::Literal(Value::Bool(false)),
                "null" => Operand::Literal(Value::Null),
                _ => Operand::Path(split_path(&name)),
            }),
            other => Err(query_error(format!(
                "expected a field or literal, found {:?}",
                other
            ))),
        }
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn lookup<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |current, key| current.get(key))
}

fn resolve<'a>(doc: &'a Value, operand: &'a Operand) -> Option<&'a Value> {
    match operand {
        Operand::Path(path) => lookup(doc, path).filter(|v| !v.is_null()),
        Operand::Literal(Value::Null) => None,
        Operand::Literal(v) => Some(v),
    }
}

fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x.as_f64() == y.as_f64(),
        (a, b) => a == b,
    }
}

fn eval(expr: &Expr, doc: &Value) -> bool {
    match expr {
        Expr::And(l, r) => eval(l, doc) && eval(r, doc),
        Expr::Or(l, r) => eval(l, doc) || eval(r, doc),
        Expr::Not(inner) => !eval(inner, doc),
        Expr::Eq(l, r) => values_equal(resolve(doc, l), resolve(doc, r)),
        Expr::NotEq(l, r) => !values_equal(resolve(doc, l), resolve(doc, r)),
        Expr::Defined(path) => lookup(doc, path).is_some_and(|v| !v.is_null()),
        Expr::Truthy(operand) => resolve(doc, operand) == Some(&Value::Bool(true)),
        Expr::Match(l, r) => match (resolve(doc, l), resolve(doc, r)) {
            (Some(text), Some(Value::String(pattern))) => text_matches(text, pattern),
            _ => false,
        },
    }
}

/// Word-based, case-insensitive matching with `*` wildcards.
///
/// Every term of the pattern has to match at least one word of the text.
fn text_matches(text: &Value, pattern: &str) -> bool {
    let haystack = match text {
        Value::String(s) => s.to_lowercase(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
        _ => return false,
    };
    let words: Vec<&str> = haystack
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let pattern = pattern.to_lowercase();
    let terms: Vec<&str> = pattern
        .split(|c: char| !(c.is_alphanumeric() || c == '*'))
        .filter(|t| !t.is_empty())
        .collect();

    if terms.iter().all(|t| t.chars().all(|c| c == '*')) {
        return true;
    }

    terms
        .iter()
        .all(|term| words.iter().any(|word| glob(term, word)))
}

fn glob(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|c| *c == '*')
}
