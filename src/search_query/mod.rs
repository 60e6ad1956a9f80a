//! Search bar query language.
//!
//! ```text
//! rust "machine learning" tag:dev -deprecated title:guide OR category:docs
//! ```
//!
//! - bare words match title, url and summary (substring, case-insensitive)
//! - `"..."` matches the exact phrase
//! - `title:` / `url:` match a substring of that field
//! - `tag:` / `category:` match the whole value
//! - `-x` excludes, `AND` / `OR` combine; adjacency is an implicit AND
//!   binding tighter than `AND`, which binds tighter than `OR`

mod eval;
mod index;
mod lexer;
mod normalize;
mod parser;
mod text;

pub use eval::{evaluate, evaluate_indexed, matches, HighlightField, HighlightSpan, MatchResult};
pub use index::BookmarkIndex;
pub use lexer::QuerySyntaxError;
pub use parser::{Field, QueryExpression};
pub(crate) use text::fold;

/// Parse a search bar query.
///
/// Only an unbalanced quote is an error. Everything else degrades:
/// - Empty/whitespace → `QueryExpression::All`
/// - Unknown field (`foo:bar`) or empty value (`tag:`) → plain term of the token
/// - Leading/trailing/repeated operators → dropped
/// - Only operators (`and`, `OR AND`) → searched as words
pub fn parse(input: &str) -> Result<QueryExpression, QuerySyntaxError> {
    let tokens = lexer::tokenize(input)?;
    let tokens = normalize::normalize(tokens);
    Ok(parser::parse(tokens))
}
