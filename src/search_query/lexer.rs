#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prefix {
    Title,    // title:
    Url,      // url:
    Tag,      // tag:
    Category, // category:
}

impl Prefix {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "title" => Some(Prefix::Title),
            "url" => Some(Prefix::Url),
            "tag" => Some(Prefix::Tag),
            "category" => Some(Prefix::Category),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Word(String),
    Phrase(String),
    Field(Prefix, String),
    Negated(Box<Token>),
    And,
    Or,
}

impl Token {
    pub fn is_operator(&self) -> bool {
        matches!(self, Token::And | Token::Or)
    }
}

/// Raised only when a double quote is never closed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unbalanced quote: quote opened at position {position} is never closed")]
pub struct QuerySyntaxError {
    /// Character offset of the opening quote.
    pub position: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, QuerySyntaxError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        let raw = read_raw(&chars, &mut i)?;
        tokens.push(classify(&raw));
    }

    Ok(tokens)
}

/// Reads one whitespace-delimited chunk. Whitespace inside quotes does not
/// end the chunk; quotes are kept so `classify` can see them.
fn read_raw(chars: &[char], i: &mut usize) -> Result<String, QuerySyntaxError> {
    let mut raw = String::new();
    while *i < chars.len() {
        let ch = chars[*i];
        if ch.is_whitespace() {
            break;
        }
        if ch == '"' {
            let start = *i;
            raw.push(ch);
            *i += 1;
            loop {
                match chars.get(*i) {
                    Some('"') => {
                        raw.push('"');
                        *i += 1;
                        break;
                    }
                    Some(&inner) => {
                        raw.push(inner);
                        *i += 1;
                    }
                    None => return Err(QuerySyntaxError { position: start }),
                }
            }
            continue;
        }
        raw.push(ch);
        *i += 1;
    }
    Ok(raw)
}

fn classify(raw: &str) -> Token {
    if raw.eq_ignore_ascii_case("and") {
        return Token::And;
    }
    if raw.eq_ignore_ascii_case("or") {
        return Token::Or;
    }
    classify_operand(raw)
}

/// Like `classify`, but never yields an operator: `-and` negates the word.
fn classify_operand(raw: &str) -> Token {
    if let Some(rest) = raw.strip_prefix('-') {
        if !rest.is_empty() {
            return Token::Negated(Box::new(classify_operand(rest)));
        }
    }

    if let Some(inner) = whole_quoted(raw) {
        if inner.is_empty() {
            return Token::Word(raw.to_string());
        }
        return Token::Phrase(inner.to_string());
    }

    if let Some((name, value)) = raw.split_once(':') {
        if let Some(prefix) = Prefix::from_name(name) {
            let value = match whole_quoted(value) {
                Some(inner) => inner.to_string(),
                None => strip_quotes(value),
            };
            if value.is_empty() {
                return Token::Word(raw.to_string());
            }
            return Token::Field(prefix, value);
        }
    }

    Token::Word(strip_quotes(raw))
}

/// `"abc"` → `abc`; anything with quotes elsewhere → None.
fn whole_quoted(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('"')?.strip_suffix('"')?;
    if inner.contains('"') {
        None
    } else {
        Some(inner)
    }
}

fn strip_quotes(s: &str) -> String {
    s.chars().filter(|c| *c != '"').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[test]
    fn test_tokenize_words_and_operators() {
        let tokens = tokenize("rust AND go or Zig").unwrap();
        assert_eq!(
            tokens,
            vec![word("rust"), Token::And, word("go"), Token::Or, word("Zig")]
        );
    }

    #[test]
    fn test_tokenize_phrase_keeps_whitespace() {
        let tokens = tokenize("\"machine  learning\" ai").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Phrase("machine  learning".to_string()), word("ai")]
        );
    }

    #[test]
    fn test_tokenize_field_prefix_case_insensitive() {
        let tokens = tokenize("TITLE:rust Tag:dev").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Field(Prefix::Title, "rust".to_string()),
                Token::Field(Prefix::Tag, "dev".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_quoted_field_value() {
        let tokens = tokenize("title:\"rust book\"").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Field(Prefix::Title, "rust book".to_string())]
        );
    }

    #[test]
    fn test_tokenize_unknown_field_is_word() {
        let tokens = tokenize("https://example.com").unwrap();
        assert_eq!(tokens, vec![word("https://example.com")]);
    }

    #[test]
    fn test_tokenize_empty_field_value_is_word() {
        assert_eq!(tokenize("category:").unwrap(), vec![word("category:")]);
        assert_eq!(tokenize("tag:\"\"").unwrap(), vec![word("tag:\"\"")]);
    }

    #[test]
    fn test_tokenize_negation() {
        let tokens = tokenize("-deprecated -\"old stuff\" -url:foo").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Negated(Box::new(word("deprecated"))),
                Token::Negated(Box::new(Token::Phrase("old stuff".to_string()))),
                Token::Negated(Box::new(Token::Field(Prefix::Url, "foo".to_string()))),
            ]
        );
    }

    #[test]
    fn test_tokenize_double_negation_and_lone_dash() {
        let tokens = tokenize("--x -").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Negated(Box::new(Token::Negated(Box::new(word("x"))))),
                word("-"),
            ]
        );
    }

    #[test]
    fn test_tokenize_negated_keyword_is_word() {
        let tokens = tokenize("-and").unwrap();
        assert_eq!(tokens, vec![Token::Negated(Box::new(word("and")))]);
    }

    #[test]
    fn test_tokenize_embedded_quotes_group_whitespace() {
        let tokens = tokenize("ab\"c d\"e").unwrap();
        assert_eq!(tokens, vec![word("abc de")]);
    }

    #[test]
    fn test_unbalanced_quote_reports_position() {
        let err = tokenize("rust \"open").unwrap_err();
        assert_eq!(err.position, 5);
        assert!(err.to_string().contains("position 5"));

        let err = tokenize("\"a\" \"b\" title:\"c").unwrap_err();
        assert_eq!(err.position, 14);
    }

    #[test]
    fn test_unbalanced_quote_position_counts_chars() {
        let err = tokenize("café \"x").unwrap_err();
        assert_eq!(err.position, 5);
    }
}
