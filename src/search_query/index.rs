//! Advisory candidate index for search queries.
//!
//! Maps folded trigrams of title/url/summary, and folded tag and category
//! values, to bookmark IDs. `candidates` only ever answers with a superset
//! of the true matches; the scan evaluator has the final word.

use std::collections::{HashMap, HashSet};

use super::parser::{Field, QueryExpression};
use super::text::{fold, trigrams};
use crate::bookmarks::Bookmark;

type Postings = HashMap<String, HashSet<u64>>;

#[derive(Debug, Clone, Default)]
pub struct BookmarkIndex {
    /// Collection version this index was built from
    version: u64,
    len: usize,
    title: Postings,
    url: Postings,
    summary: Postings,
    tags: Postings,
    categories: Postings,
}

impl BookmarkIndex {
    pub fn build(bookmarks: &[Bookmark], version: u64) -> Self {
        let mut index = Self {
            version,
            len: bookmarks.len(),
            ..Default::default()
        };

        for bm in bookmarks {
            add_trigrams(&mut index.title, &bm.title, bm.id);
            add_trigrams(&mut index.url, &bm.url, bm.id);
            if let Some(summary) = &bm.summary {
                add_trigrams(&mut index.summary, summary, bm.id);
            }
            for tag in &bm.tags {
                index.tags.entry(fold(tag)).or_default().insert(bm.id);
            }
            index
                .categories
                .entry(fold(bm.effective_category()))
                .or_default()
                .insert(bm.id);
        }

        index
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of bookmarks indexed.
    pub fn len(&self) -> usize {
        self.len
    }

    /// IDs that might satisfy `expr`, or None when no pruning is possible.
    pub fn candidates(&self, expr: &QueryExpression) -> Option<HashSet<u64>> {
        match expr {
            QueryExpression::All => None,
            QueryExpression::Term(t) | QueryExpression::Phrase(t) => {
                let needle = fold(t);
                let mut out = HashSet::new();
                for postings in [&self.title, &self.url, &self.summary] {
                    out.extend(lookup_substring(postings, &needle)?);
                }
                Some(out)
            }
            QueryExpression::FieldFilter(Field::Title, v) => {
                lookup_substring(&self.title, &fold(v))
            }
            QueryExpression::FieldFilter(Field::Url, v) => lookup_substring(&self.url, &fold(v)),
            QueryExpression::FieldFilter(Field::Tag, v) => {
                Some(self.tags.get(&fold(v)).cloned().unwrap_or_default())
            }
            QueryExpression::FieldFilter(Field::Category, v) => {
                Some(self.categories.get(&fold(v)).cloned().unwrap_or_default())
            }
            // the complement of a superset is not a superset
            QueryExpression::Not(_) => None,
            QueryExpression::And(l, r) => match (self.candidates(l), self.candidates(r)) {
                (Some(l), Some(r)) => Some(l.intersection(&r).copied().collect()),
                (Some(one), None) | (None, Some(one)) => Some(one),
                (None, None) => None,
            },
            QueryExpression::Or(l, r) => {
                let mut l = self.candidates(l)?;
                l.extend(self.candidates(r)?);
                Some(l)
            }
        }
    }
}

fn add_trigrams(postings: &mut Postings, text: &str, id: u64) {
    for gram in trigrams(&fold(text)) {
        postings.entry(gram).or_default().insert(id);
    }
}

/// Every substring match contains all trigrams of the needle, so the
/// intersection of their postings covers the matches. Needles under three
/// characters have no trigrams and cannot be pruned.
fn lookup_substring(postings: &Postings, needle: &str) -> Option<HashSet<u64>> {
    let grams = trigrams(needle);
    let (first, rest) = grams.split_first()?;

    let mut out = postings.get(first).cloned().unwrap_or_default();
    for gram in rest {
        if out.is_empty() {
            break;
        }
        match postings.get(gram) {
            Some(ids) => out.retain(|id| ids.contains(id)),
            None => out.clear(),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_query::parse;
    use crate::tests::bookmark;

    fn sample() -> Vec<Bookmark> {
        vec![
            bookmark(1, "Python Tutorial", "https://python.org", &[], "Programming"),
            bookmark(2, "React Guide", "https://reactjs.org", &["js"], "Frontend"),
            bookmark(3, "Rust Book", "https://doc.rust-lang.org", &["Rust", "lang"], ""),
        ]
    }

    fn ids(set: Option<HashSet<u64>>) -> Option<Vec<u64>> {
        set.map(|s| {
            let mut v: Vec<u64> = s.into_iter().collect();
            v.sort();
            v
        })
    }

    #[test]
    fn test_build_records_version_and_len() {
        let index = BookmarkIndex::build(&sample(), 7);
        assert_eq!(index.version(), 7);
        assert_eq!(index.len(), 3);
        assert_eq!(BookmarkIndex::build(&[], 0).len(), 0);
    }

    #[test]
    fn test_term_candidates_from_trigrams() {
        let index = BookmarkIndex::build(&sample(), 0);
        let expr = parse("python").unwrap();
        assert_eq!(ids(index.candidates(&expr)), Some(vec![1]));

        let expr = parse("ORG").unwrap();
        assert_eq!(ids(index.candidates(&expr)), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_short_term_is_not_pruned() {
        let index = BookmarkIndex::build(&sample(), 0);
        assert_eq!(index.candidates(&parse("js").unwrap()), None);
    }

    #[test]
    fn test_tag_and_category_candidates() {
        let index = BookmarkIndex::build(&sample(), 0);
        assert_eq!(ids(index.candidates(&parse("tag:rust").unwrap())), Some(vec![3]));
        assert_eq!(
            ids(index.candidates(&parse("category:frontend").unwrap())),
            Some(vec![2])
        );
        assert_eq!(
            ids(index.candidates(&parse("category:uncategorized").unwrap())),
            Some(vec![3])
        );
        assert_eq!(ids(index.candidates(&parse("tag:missing").unwrap())), Some(vec![]));
    }

    #[test]
    fn test_not_and_or_combinations() {
        let index = BookmarkIndex::build(&sample(), 0);
        assert_eq!(index.candidates(&parse("-python").unwrap()), None);
        // AND keeps the side that can prune
        assert_eq!(ids(index.candidates(&parse("-react tag:js").unwrap())), Some(vec![2]));
        // OR needs both sides
        assert_eq!(index.candidates(&parse("python OR js").unwrap()), None);
        assert_eq!(
            ids(index.candidates(&parse("python OR react").unwrap())),
            Some(vec![1, 2])
        );
    }

    #[test]
    fn test_field_filter_uses_its_own_field() {
        let index = BookmarkIndex::build(&sample(), 0);
        assert_eq!(ids(index.candidates(&parse("url:python").unwrap())), Some(vec![1]));
        assert_eq!(ids(index.candidates(&parse("title:reactjs").unwrap())), Some(vec![]));
    }
}
