use crate::bookmarks::{BackendCsv, BookmarkCreate, BookmarkManager};
use crate::search_query::QueryExpression;

#[test]
fn test_unbalanced_quote_falls_back_to_phrase() {
    assert_eq!(
        crate::parse_or_phrase("  \"rust book "),
        QueryExpression::Phrase("\"rust book".to_string())
    );
    assert_eq!(
        crate::parse_or_phrase("rust"),
        QueryExpression::Term("rust".to_string())
    );
}

#[test]
fn test_search_and_explain_agree_on_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = BackendCsv::load(dir.path().join("bookmarks.csv").to_str().unwrap()).unwrap();
    mgr.create(BookmarkCreate {
        url: "https://quotes.example".to_string(),
        title: Some("The \"best quotes".to_string()),
        ..Default::default()
    })
    .unwrap();

    let raw = "\"best quotes";
    let hits = crate::search(&mgr, raw, None).unwrap();
    assert_eq!(hits.len(), 1);

    let expr = crate::parse_or_phrase(raw);
    assert_eq!(mgr.search_expr(&expr, None).unwrap().len(), hits.len());
}

#[test]
fn test_count_by_folds_names() {
    let counts = crate::count_by(["ΟΔΟΣ", "οδοσ", "Rust", "rust", "web"].into_iter());
    let counts: Vec<(String, usize)> = counts.into_values().collect();
    assert_eq!(
        counts,
        vec![
            ("Rust".to_string(), 2),
            ("web".to_string(), 1),
            ("ΟΔΟΣ".to_string(), 2),
        ]
    );
}
