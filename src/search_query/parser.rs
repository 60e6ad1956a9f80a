use std::fmt;

use serde::Serialize;

use super::lexer::{Prefix, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Url,
    Tag,
    Category,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Url => "url",
            Field::Tag => "tag",
            Field::Category => "category",
        };
        write!(f, "{name}")
    }
}

/// Parsed search query. Holds no reference to bookmark data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QueryExpression {
    /// Empty query; matches everything.
    All,
    Term(String),
    Phrase(String),
    FieldFilter(Field, String),
    Not(Box<QueryExpression>),
    And(Box<QueryExpression>, Box<QueryExpression>),
    Or(Box<QueryExpression>, Box<QueryExpression>),
}

impl QueryExpression {
    pub fn and(left: QueryExpression, right: QueryExpression) -> Self {
        QueryExpression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: QueryExpression, right: QueryExpression) -> Self {
        QueryExpression::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: QueryExpression) -> Self {
        QueryExpression::Not(Box::new(inner))
    }
}

/// S-expression rendering, used by `search --explain`.
impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryExpression::All => write!(f, "(all)"),
            QueryExpression::Term(t) => write!(f, "(term {t:?})"),
            QueryExpression::Phrase(p) => write!(f, "(phrase {p:?})"),
            QueryExpression::FieldFilter(field, v) => write!(f, "({field} {v:?})"),
            QueryExpression::Not(inner) => write!(f, "(not {inner})"),
            QueryExpression::And(l, r) => write!(f, "(and {l} {r})"),
            QueryExpression::Or(l, r) => write!(f, "(or {l} {r})"),
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// or_expr = and_expr ("or" and_expr)*
    fn parse_or(&mut self) -> QueryExpression {
        let mut left = self.parse_and();
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let right = self.parse_and();
            left = QueryExpression::or(left, right);
        }
        left
    }

    /// and_expr = adjacent ("and" adjacent)*
    fn parse_and(&mut self) -> QueryExpression {
        let mut left = self.parse_adjacent();
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let right = self.parse_adjacent();
            left = QueryExpression::and(left, right);
        }
        left
    }

    /// adjacent = operand operand*
    /// Implicit AND binds tighter than an explicit one.
    fn parse_adjacent(&mut self) -> QueryExpression {
        let mut left = self.parse_operand();
        while self.peek().is_some_and(|t| !t.is_operator()) {
            let right = self.parse_operand();
            left = QueryExpression::and(left, right);
        }
        left
    }

    fn parse_operand(&mut self) -> QueryExpression {
        match self.advance() {
            Some(tok) => token_to_expr(tok),
            None => QueryExpression::All,
        }
    }
}

fn prefix_to_field(p: Prefix) -> Field {
    match p {
        Prefix::Title => Field::Title,
        Prefix::Url => Field::Url,
        Prefix::Tag => Field::Tag,
        Prefix::Category => Field::Category,
    }
}

fn token_to_expr(tok: Token) -> QueryExpression {
    match tok {
        Token::Word(w) => QueryExpression::Term(w),
        Token::Phrase(p) => QueryExpression::Phrase(p),
        Token::Field(p, v) => QueryExpression::FieldFilter(prefix_to_field(p), v),
        Token::Negated(inner) => QueryExpression::not(token_to_expr(*inner)),
        // normalization keeps operators out of operand position
        Token::And => QueryExpression::Term("and".to_string()),
        Token::Or => QueryExpression::Term("or".to_string()),
    }
}

/// Parse normalized tokens into a QueryExpression.
/// An empty token stream is `All`.
pub fn parse(tokens: Vec<Token>) -> QueryExpression {
    if tokens.is_empty() {
        return QueryExpression::All;
    }
    Parser::new(tokens).parse_or()
}
