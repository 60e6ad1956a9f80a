use super::lexer::Token;

/// Normalize a token stream so the parser never meets a dangling operator.
/// Never fails.
pub fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    let tokens = literalize_operator_only(tokens);
    let tokens = strip_boundary_operators(tokens);
    collapse_adjacent_operators(tokens)
}

/// If nothing but operators was typed (`and`, `OR AND`), the user is
/// searching for those words.
fn literalize_operator_only(tokens: Vec<Token>) -> Vec<Token> {
    if tokens.iter().any(|t| !t.is_operator()) {
        return tokens;
    }
    tokens
        .into_iter()
        .map(|t| match t {
            Token::And => Token::Word("and".to_string()),
            Token::Or => Token::Word("or".to_string()),
            other => other,
        })
        .collect()
}

/// Strip leading/trailing binary operators.
fn strip_boundary_operators(tokens: Vec<Token>) -> Vec<Token> {
    let start = tokens.iter().position(|t| !t.is_operator());
    let end = tokens.iter().rposition(|t| !t.is_operator());
    match (start, end) {
        (Some(s), Some(e)) => tokens[s..=e].to_vec(),
        _ => vec![],
    }
}

/// Collapse adjacent operators, the last one typed wins: `a AND OR b` → `a OR b`.
fn collapse_adjacent_operators(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        if tok.is_operator() && out.last().is_some_and(Token::is_operator) {
            out.pop();
        }
        out.push(tok);
    }
    out
}
