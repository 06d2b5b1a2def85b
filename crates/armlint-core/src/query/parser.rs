//! Recursive-descent parser for selector expressions.

use super::QueryError;
use serde_json::Value;

/// One navigation step.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Step {
    /// Apply the selector to the children of each current node.
    Child(Selector),
    /// Apply the selector to the children of each current node and of all
    /// its descendants.
    Descendant(Selector),
}

/// What a step selects among the children of a node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Selector {
    /// Every child.
    Wildcard,
    /// Children whose key (or index) is listed.
    Union(Vec<Key>),
    /// Children satisfying a predicate.
    Filter(Expr),
}

/// A union member.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Key {
    Name(String),
    Index(usize),
}

/// Filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Truthy(Operand),
    Compare(Operand, CompareOp, Operand),
}

/// Comparison operator. Loose and strict forms behave identically on JSON
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
}

/// A filter operand.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    /// `@`, `@.a.b`, `@['a'][0]`: the candidate child or a value below it.
    Current(Vec<Key>),
    /// `@property`: the candidate's key, or index inside an array.
    Property,
    /// A literal value.
    Literal(Value),
}

pub(crate) fn parse(expression: &str) -> Result<Vec<Step>, QueryError> {
    let mut parser = Parser::new(expression);
    parser.skip_ws();
    if !parser.eat('$') {
        return Err(parser.error("expression must start with '$'"));
    }
    let mut steps = Vec::new();
    loop {
        parser.skip_ws();
        if parser.at_end() {
            break;
        }
        steps.push(parser.step()?);
    }
    Ok(steps)
}

struct Parser<'s> {
    source: &'s str,
    chars: Vec<char>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> QueryError {
        QueryError {
            expression: self.source.to_string(),
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let n = s.chars().count();
        if self.chars.len() >= self.pos + n
            && self.chars[self.pos..self.pos + n].iter().copied().eq(s.chars())
        {
            self.pos += n;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), QueryError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn step(&mut self) -> Result<Step, QueryError> {
        if self.eat_str("..") {
            let selector = if self.peek() == Some('[') {
                self.bracket()?
            } else {
                self.dotted()?
            };
            return Ok(Step::Descendant(selector));
        }
        if self.eat('.') {
            return Ok(Step::Child(self.dotted()?));
        }
        if self.peek() == Some('[') {
            return Ok(Step::Child(self.bracket()?));
        }
        Err(self.error("expected '.', '..' or '['"))
    }

    fn dotted(&mut self) -> Result<Selector, QueryError> {
        if self.eat('*') {
            return Ok(Selector::Wildcard);
        }
        let name = self.name();
        if name.is_empty() {
            return Err(self.error("expected a property name or '*'"));
        }
        Ok(Selector::Union(vec![Key::Name(name)]))
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !matches!(c, '.' | '[' | ']' | '(' | ')' | ',' | '=' | '!' | '&' | '|') && !c.is_whitespace())
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn bracket(&mut self) -> Result<Selector, QueryError> {
        self.expect('[')?;
        self.skip_ws();

        let selector = if self.eat('*') {
            Selector::Wildcard
        } else if self.eat('?') {
            self.skip_ws();
            self.expect('(')?;
            let expr = self.or_expr()?;
            self.skip_ws();
            self.expect(')')?;
            Selector::Filter(expr)
        } else {
            let mut keys = vec![self.key()?];
            loop {
                self.skip_ws();
                if !self.eat(',') {
                    break;
                }
                self.skip_ws();
                keys.push(self.key()?);
            }
            Selector::Union(keys)
        };

        self.skip_ws();
        self.expect(']')?;
        Ok(selector)
    }

    fn key(&mut self) -> Result<Key, QueryError> {
        match self.peek() {
            Some('\'' | '"') => Ok(Key::Name(self.quoted()?)),
            Some(c) if c.is_ascii_digit() => {
                let digits = self.digits();
                digits
                    .parse()
                    .map(Key::Index)
                    .map_err(|_| self.error("invalid index"))
            }
            _ => {
                let name = self.name();
                if name.is_empty() {
                    Err(self.error("expected a key"))
                } else {
                    Ok(Key::Name(name))
                }
            }
        }
    }

    fn digits(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn quoted(&mut self) -> Result<String, QueryError> {
        let Some(quote) = self.peek() else {
            return Err(self.error("expected a quoted string"));
        };
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c) => out.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                    self.pos += 1;
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn or_expr(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.and_expr()?;
        loop {
            self.skip_ws();
            if !self.eat_str("||") {
                return Ok(left);
            }
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
    }

    fn and_expr(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.unary()?;
        loop {
            self.skip_ws();
            if !self.eat_str("&&") {
                return Ok(left);
            }
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, QueryError> {
        self.skip_ws();
        if self.peek() == Some('!') && self.peek_at(1) != Some('=') {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        if self.eat('(') {
            let inner = self.or_expr()?;
            self.skip_ws();
            self.expect(')')?;
            return Ok(inner);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, QueryError> {
        let left = self.operand()?;
        self.skip_ws();
        let op = if self.eat_str("===") || self.eat_str("==") {
            CompareOp::Eq
        } else if self.eat_str("!==") || self.eat_str("!=") {
            CompareOp::Ne
        } else {
            return Ok(Expr::Truthy(left));
        };
        let right = self.operand()?;
        Ok(Expr::Compare(left, op, right))
    }

    fn operand(&mut self) -> Result<Operand, QueryError> {
        self.skip_ws();
        match self.peek() {
            Some('@') => {
                self.pos += 1;
                if self.eat_str("property") {
                    return Ok(Operand::Property);
                }
                let mut keys = Vec::new();
                loop {
                    if self.peek() == Some('.') {
                        self.pos += 1;
                        let name = self.name();
                        if name.is_empty() {
                            return Err(self.error("expected a property name after '.'"));
                        }
                        keys.push(Key::Name(name));
                    } else if self.peek() == Some('[') {
                        self.pos += 1;
                        self.skip_ws();
                        keys.push(self.key()?);
                        self.skip_ws();
                        self.expect(']')?;
                    } else {
                        break;
                    }
                }
                Ok(Operand::Current(keys))
            }
            Some('\'' | '"') => Ok(Operand::Literal(Value::String(self.quoted()?))),
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let start = self.pos;
                self.pos += 1;
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
                {
                    self.pos += 1;
                }
                let text: String = self.chars[start..self.pos].iter().collect();
                serde_json::from_str::<Value>(&text)
                    .ok()
                    .filter(Value::is_number)
                    .map(Operand::Literal)
                    .ok_or_else(|| self.error(format!("invalid number '{text}'")))
            }
            _ => {
                if self.eat_str("true") {
                    Ok(Operand::Literal(Value::Bool(true)))
                } else if self.eat_str("false") {
                    Ok(Operand::Literal(Value::Bool(false)))
                } else if self.eat_str("null") {
                    Ok(Operand::Literal(Value::Null))
                } else {
                    Err(self.error("expected an operand"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_and_bracketed_steps() {
        let steps = parse("$.paths['/a'].*").unwrap();
        assert_eq!(
            steps,
            vec![
                Step::Child(Selector::Union(vec![Key::Name("paths".into())])),
                Step::Child(Selector::Union(vec![Key::Name("/a".into())])),
                Step::Child(Selector::Wildcard),
            ]
        );
    }

    #[test]
    fn parses_union_with_mixed_keys() {
        let steps = parse("$[get, 'put', 0]").unwrap();
        assert_eq!(
            steps,
            vec![Step::Child(Selector::Union(vec![
                Key::Name("get".into()),
                Key::Name("put".into()),
                Key::Index(0),
            ]))]
        );
    }

    #[test]
    fn parses_filter_precedence() {
        let steps = parse("$[?(@.a == 1 || @.b && !@.c)]").unwrap();
        let Step::Child(Selector::Filter(Expr::Or(_, right))) = &steps[0] else {
            panic!("expected an or-filter, got {steps:?}");
        };
        assert!(matches!(**right, Expr::And(_, _)));
    }

    #[test]
    fn parses_property_comparison() {
        let steps = parse("$..[?(@property !== 'x-ms-paths')]").unwrap();
        assert_eq!(
            steps,
            vec![Step::Descendant(Selector::Filter(Expr::Compare(
                Operand::Property,
                CompareOp::Ne,
                Operand::Literal(Value::String("x-ms-paths".into())),
            )))]
        );
    }

    #[test]
    fn hyphenated_names_are_single_keys() {
        let steps = parse("$.x-ms-paths").unwrap();
        assert_eq!(
            steps,
            vec![Step::Child(Selector::Union(vec![Key::Name("x-ms-paths".into())]))]
        );
    }

    #[test]
    fn reports_offsets() {
        let err = parse("$.a[1").unwrap_err();
        assert_eq!(err.offset, 5);
        assert!(parse("$.").is_err());
        assert!(parse("$[?(@.a == 'x)]").is_err());
    }
}
