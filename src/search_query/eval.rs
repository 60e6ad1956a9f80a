use rayon::prelude::*;
use serde::Serialize;

use super::index::BookmarkIndex;
use super::parser::{Field, QueryExpression};
use super::text::{fold, FoldedText};
use crate::bookmarks::Bookmark;

const TITLE_WEIGHT: f64 = 3.0;
const URL_WEIGHT: f64 = 1.5;
const SUMMARY_WEIGHT: f64 = 1.0;
const TAG_WEIGHT: f64 = 2.0;
const CATEGORY_WEIGHT: f64 = 2.0;

/// Added per occurrence of a matched needle, per field.
const OCCURRENCE_BOOST: f64 = 0.1;
const MAX_COUNTED_OCCURRENCES: usize = 10;

/// Phrase field weights are multiplied by this times the phrase's word
/// count, so a phrase outranks the implicit AND of its words.
const PHRASE_WORD_BOOST: f64 = 1.5;

/// Added when both sides of an OR match.
const OR_BOTH_BONUS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightField {
    Title,
    Url,
    Summary,
    Category,
    /// Position in the bookmark's tag list.
    Tag(usize),
}

/// Character range `[start, end)` of a matched substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub field: HighlightField,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub id: u64,
    pub score: f64,
    pub highlights: Vec<HighlightSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TextField {
    Title,
    Url,
    Summary,
}

const FREE_TEXT_FIELDS: [TextField; 3] = [TextField::Title, TextField::Url, TextField::Summary];

impl TextField {
    fn weight(self) -> f64 {
        match self {
            TextField::Title => TITLE_WEIGHT,
            TextField::Url => URL_WEIGHT,
            TextField::Summary => SUMMARY_WEIGHT,
        }
    }

    fn highlight(self) -> HighlightField {
        match self {
            TextField::Title => HighlightField::Title,
            TextField::Url => HighlightField::Url,
            TextField::Summary => HighlightField::Summary,
        }
    }
}

/// Outcome of a node that matched.
struct Hit {
    score: f64,
    highlights: Vec<HighlightSpan>,
}

impl Hit {
    fn filter_only() -> Self {
        Hit {
            score: 0.0,
            highlights: vec![],
        }
    }

    fn combine(mut self, other: Hit, score: f64) -> Self {
        self.highlights.extend(other.highlights);
        self.score = score;
        self
    }
}

/// Folded fields of one bookmark, built once per evaluation.
struct BookmarkView<'a> {
    bookmark: &'a Bookmark,
    title: FoldedText,
    url: FoldedText,
    summary: FoldedText,
    category: String,
    tags: Vec<String>,
}

impl<'a> BookmarkView<'a> {
    fn new(bookmark: &'a Bookmark) -> Self {
        Self {
            bookmark,
            title: FoldedText::new(&bookmark.title),
            url: FoldedText::new(&bookmark.url),
            summary: FoldedText::new(bookmark.summary.as_deref().unwrap_or_default()),
            category: fold(bookmark.effective_category()),
            tags: bookmark.tags.iter().map(|t| fold(t)).collect(),
        }
    }

    fn text(&self, field: TextField) -> &FoldedText {
        match field {
            TextField::Title => &self.title,
            TextField::Url => &self.url,
            TextField::Summary => &self.summary,
        }
    }
}

fn eval_node(expr: &QueryExpression, view: &BookmarkView) -> Option<Hit> {
    match expr {
        QueryExpression::All => Some(Hit::filter_only()),
        QueryExpression::Term(t) => eval_text(&fold(t), view, &FREE_TEXT_FIELDS, 1.0),
        QueryExpression::Phrase(p) => {
            let words = p.split_whitespace().count().max(1) as f64;
            eval_text(&fold(p), view, &FREE_TEXT_FIELDS, PHRASE_WORD_BOOST * words)
        }
        QueryExpression::FieldFilter(Field::Title, v) => {
            eval_text(&fold(v), view, &[TextField::Title], 1.0)
        }
        QueryExpression::FieldFilter(Field::Url, v) => {
            eval_text(&fold(v), view, &[TextField::Url], 1.0)
        }
        QueryExpression::FieldFilter(Field::Tag, v) => {
            let v = fold(v);
            let idx = view.tags.iter().position(|t| *t == v)?;
            Some(Hit {
                score: TAG_WEIGHT,
                highlights: vec![HighlightSpan {
                    field: HighlightField::Tag(idx),
                    start: 0,
                    end: view.bookmark.tags[idx].chars().count(),
                }],
            })
        }
        QueryExpression::FieldFilter(Field::Category, v) => {
            if view.category != fold(v) {
                return None;
            }
            // an empty category matched as "Uncategorized" has nothing to emphasize
            let len = view.bookmark.category.chars().count();
            let highlights = if len > 0 {
                vec![HighlightSpan {
                    field: HighlightField::Category,
                    start: 0,
                    end: len,
                }]
            } else {
                vec![]
            };
            Some(Hit {
                score: CATEGORY_WEIGHT,
                highlights,
            })
        }
        QueryExpression::Not(inner) => match eval_node(inner, view) {
            Some(_) => None,
            None => Some(Hit::filter_only()),
        },
        QueryExpression::And(l, r) => {
            let l = eval_node(l, view)?;
            let r = eval_node(r, view)?;
            let score = l.score + r.score;
            Some(l.combine(r, score))
        }
        QueryExpression::Or(l, r) => match (eval_node(l, view), eval_node(r, view)) {
            (Some(l), Some(r)) => {
                let score = l.score.max(r.score) + OR_BOTH_BONUS;
                Some(l.combine(r, score))
            }
            (Some(hit), None) | (None, Some(hit)) => Some(hit),
            (None, None) => None,
        },
    }
}

/// Substring match of an already folded needle over the given fields.
fn eval_text(
    needle: &str,
    view: &BookmarkView,
    fields: &[TextField],
    multiplier: f64,
) -> Option<Hit> {
    let mut score = 0.0;
    let mut highlights = vec![];

    for &field in fields {
        let text = view.text(field);
        let Some((start, end)) = text.find(needle) else {
            continue;
        };
        let occurrences = text.occurrences(needle).min(MAX_COUNTED_OCCURRENCES);
        score += field.weight() * multiplier + OCCURRENCE_BOOST * occurrences as f64;
        highlights.push(HighlightSpan {
            field: field.highlight(),
            start,
            end,
        });
    }

    if highlights.is_empty() {
        None
    } else {
        Some(Hit { score, highlights })
    }
}

fn score_bookmark(expr: &QueryExpression, bookmark: &Bookmark) -> Option<Hit> {
    eval_node(expr, &BookmarkView::new(bookmark))
}

/// Score desc, then most recently modified, then lowest id.
fn rank(mut hits: Vec<(&Bookmark, Hit)>) -> Vec<MatchResult> {
    hits.sort_by(|(a_bm, a), (b_bm, b)| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b_bm.modified_at.cmp(&a_bm.modified_at))
            .then_with(|| a_bm.id.cmp(&b_bm.id))
    });

    hits.into_iter()
        .map(|(bookmark, hit)| {
            let mut highlights = hit.highlights;
            highlights.sort_by_key(|h| (h.field, h.start, h.end));
            highlights.dedup();
            MatchResult {
                id: bookmark.id,
                score: hit.score,
                highlights,
            }
        })
        .collect()
}

/// True if the bookmark satisfies the expression.
pub fn matches(expr: &QueryExpression, bookmark: &Bookmark) -> bool {
    score_bookmark(expr, bookmark).is_some()
}

/// Scan every bookmark and return the ranked matches.
pub fn evaluate(expr: &QueryExpression, bookmarks: &[Bookmark]) -> Vec<MatchResult> {
    let hits = bookmarks
        .par_iter()
        .filter_map(|bm| score_bookmark(expr, bm).map(|hit| (bm, hit)))
        .collect();
    rank(hits)
}

/// Like `evaluate`, but only scores the index's candidates. The index is
/// advisory: a version mismatch or a query it cannot prune falls back to a
/// full scan, and every candidate is still checked by the scan evaluator.
pub fn evaluate_indexed(
    expr: &QueryExpression,
    bookmarks: &[Bookmark],
    index: &BookmarkIndex,
    version: u64,
) -> Vec<MatchResult> {
    if index.version() != version {
        log::debug!(
            "index built for version {} but collection is at {version}; scanning",
            index.version()
        );
        return evaluate(expr, bookmarks);
    }

    let Some(candidates) = index.candidates(expr) else {
        return evaluate(expr, bookmarks);
    };

    log::debug!(
        "index pruned {} bookmarks to {} candidates",
        bookmarks.len(),
        candidates.len()
    );

    let hits = bookmarks
        .par_iter()
        .filter(|bm| candidates.contains(&bm.id))
        .filter_map(|bm| score_bookmark(expr, bm).map(|hit| (bm, hit)))
        .collect();
    rank(hits)
}
