use crate::{
    errors::AppError,
    search_query::{self, fold, BookmarkIndex, HighlightSpan, QueryExpression},
};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
    io::ErrorKind,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
    time::Instant,
};

/// Category reported for bookmarks whose category is empty.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: u64,

    pub url: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Hash for Bookmark {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialEq for Bookmark {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Bookmark {
    pub fn effective_category(&self) -> &str {
        if self.category.trim().is_empty() {
            UNCATEGORIZED
        } else {
            &self.category
        }
    }
}

/// Split comma/space separated tags from the command line, dropping empties
/// and case-insensitive duplicates. The first spelling wins.
pub fn parse_tags(tags: &str) -> Vec<String> {
    normalize_tags(
        tags.split([',', ' '])
            .map(String::from)
            .collect::<Vec<_>>(),
    )
}

/// Commas always separate tags, so a tag never contains one and the CSV
/// column can be split on commas alone. Duplicates are detected with the
/// same folding `tag:` filters use.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .flat_map(|t| {
            t.split(',')
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(fold(t)))
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookmarkCreate {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookmarkUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl BookmarkUpdate {
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.title.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.append_tags.is_none()
            && self.remove_tags.is_none()
            && self.summary.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchQuery {
    /// Raw search bar text
    pub query: String,

    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub bookmark: Bookmark,
    pub score: f64,
    pub highlights: Vec<HighlightSpan>,
}

pub trait BookmarkManager: Send + Sync {
    fn search_expr(
        &self,
        expr: &QueryExpression,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>, AppError>;
    fn list(&self) -> Result<Vec<Bookmark>, AppError>;
    fn create(&self, bookmark: BookmarkCreate) -> Result<Bookmark, AppError>;
    fn update(&self, id: u64, update: BookmarkUpdate) -> Result<Bookmark, AppError>;
    fn delete(&self, id: u64) -> Result<(), AppError>;

    fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, AppError> {
        let expr = search_query::parse(&query.query)?;
        self.search_expr(&expr, query.limit)
    }
}

/// When to consult the candidate index.
#[derive(Debug, Clone, Copy)]
pub struct IndexPolicy {
    pub enabled: bool,
    /// Smaller collections are scanned directly.
    pub min_bookmarks: usize,
}

impl Default for IndexPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_bookmarks: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackendCsv {
    list: Arc<RwLock<Vec<Bookmark>>>,
    /// Bumped on every mutation, while the list write lock is held.
    version: Arc<AtomicU64>,
    index: Arc<RwLock<Option<Arc<BookmarkIndex>>>>,
    index_policy: IndexPolicy,
    path: String,
}

const CSV_HEADERS: [&str; 8] = [
    "id",
    "url",
    "title",
    "category",
    "tags",
    "summary",
    "created_at",
    "modified_at",
];

fn field<'r>(record: &'r csv::StringRecord, idx: usize) -> Result<&'r str, AppError> {
    record.get(idx).ok_or_else(|| {
        AppError::Malformed(format!(
            "missing column '{}' at line {}",
            CSV_HEADERS[idx],
            record.position().map(|p| p.line()).unwrap_or_default()
        ))
    })
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, AppError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

impl BackendCsv {
    pub fn load(path: &str) -> Result<Self, AppError> {
        if let Err(err) = std::fs::metadata(path) {
            match err.kind() {
                ErrorKind::NotFound => {
                    log::info!("Creating new database at {path}");
                    let mut csv_wrt = csv::Writer::from_path(path)?;
                    csv_wrt.write_record(CSV_HEADERS)?;
                    csv_wrt.flush()?;
                }
                _ => Err(err)?,
            }
        }

        let now = Instant::now();
        let mut csv_reader = csv::Reader::from_path(path)?;

        let mut bmarks = vec![];
        for record in csv_reader.records() {
            let record = record?;
            let id = field(&record, 0)?
                .parse::<u64>()
                .map_err(|err| AppError::Malformed(format!("bad id: {err}")))?;
            let summary = field(&record, 5)?;

            bmarks.push(Bookmark {
                id,
                url: field(&record, 1)?.to_string(),
                title: field(&record, 2)?.to_string(),
                category: field(&record, 3)?.to_string(),
                tags: normalize_tags(vec![field(&record, 4)?.to_string()]),
                summary: if summary.is_empty() {
                    None
                } else {
                    Some(summary.to_string())
                },
                created_at: parse_time(field(&record, 6)?)?,
                modified_at: parse_time(field(&record, 7)?)?,
            });
        }

        log::debug!(
            "took {}ms to read csv",
            now.elapsed().as_micros() as f64 / 1000.0
        );

        Ok(BackendCsv {
            list: Arc::new(RwLock::new(bmarks)),
            path: path.to_string(),
            ..Default::default()
        })
    }

    pub fn with_index_policy(mut self, policy: IndexPolicy) -> Self {
        self.index_policy = policy;
        self
    }

    /// Current collection version.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn read_list(&self) -> Result<RwLockReadGuard<'_, Vec<Bookmark>>, AppError> {
        self.list
            .read()
            .map_err(|_| AppError::Other(anyhow!("bookmark list lock poisoned")))
    }

    fn write_list(&self) -> Result<RwLockWriteGuard<'_, Vec<Bookmark>>, AppError> {
        self.list
            .write()
            .map_err(|_| AppError::Other(anyhow!("bookmark list lock poisoned")))
    }

    /// Persist `next`, then publish it and bump the version. Called with the
    /// list write lock held; on a failed save nothing changes.
    fn commit(&self, bmarks: &mut Vec<Bookmark>, next: Vec<Bookmark>) -> Result<(), AppError> {
        self.save(&next)?;
        *bmarks = next;
        self.version.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn save(&self, bmarks: &[Bookmark]) -> Result<(), AppError> {
        let temp_path = format!("{}-tmp", &self.path);
        let mut csv_wrt = csv::Writer::from_path(&temp_path)?;
        csv_wrt.write_record(CSV_HEADERS)?;
        for bmark in bmarks {
            csv_wrt.write_record([
                bmark.id.to_string().as_str(),
                bmark.url.as_str(),
                bmark.title.as_str(),
                bmark.category.as_str(),
                bmark.tags.join(",").as_str(),
                bmark.summary.as_deref().unwrap_or_default(),
                bmark.created_at.to_rfc3339().as_str(),
                bmark.modified_at.to_rfc3339().as_str(),
            ])?;
        }
        csv_wrt.flush()?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Index for `version`, building and publishing a new one if the cached
    /// index is missing or stale. Called with the list read lock held, so the
    /// version cannot move while building.
    fn current_index(
        &self,
        bmarks: &[Bookmark],
        version: u64,
    ) -> Result<Arc<BookmarkIndex>, AppError> {
        let cached = self
            .index
            .read()
            .map_err(|_| AppError::Other(anyhow!("index lock poisoned")))?
            .clone();
        if let Some(index) = cached {
            if index.version() == version {
                return Ok(index);
            }
        }

        let now = Instant::now();
        let index = Arc::new(BookmarkIndex::build(bmarks, version));
        log::debug!(
            "took {}ms to index {} bookmarks (version {version})",
            now.elapsed().as_micros() as f64 / 1000.0,
            index.len()
        );

        *self
            .index
            .write()
            .map_err(|_| AppError::Other(anyhow!("index lock poisoned")))? = Some(index.clone());
        Ok(index)
    }
}

fn apply_update(bmark: &mut Bookmark, update: BookmarkUpdate) {
    if let Some(url) = update.url {
        bmark.url = url;
    }
    if let Some(title) = update.title {
        bmark.title = title;
    }
    if let Some(category) = update.category {
        bmark.category = category;
    }
    if let Some(tags) = update.tags {
        bmark.tags = normalize_tags(tags);
    }
    if let Some(remove_tags) = update.remove_tags {
        let remove: HashSet<String> = remove_tags.iter().map(|t| fold(t)).collect();
        bmark.tags.retain(|t| !remove.contains(&fold(t)));
    }
    if let Some(append_tags) = update.append_tags {
        let mut tags = std::mem::take(&mut bmark.tags);
        tags.extend(append_tags);
        bmark.tags = normalize_tags(tags);
    }
    if let Some(summary) = update.summary {
        bmark.summary = if summary.is_empty() {
            None
        } else {
            Some(summary)
        };
    }
    bmark.modified_at = Utc::now();
}

impl BookmarkManager for BackendCsv {
    fn search_expr(
        &self,
        expr: &QueryExpression,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>, AppError> {
        let _span = tracing::debug_span!("search", query = %expr).entered();

        let bmarks = self.read_list()?;
        let version = self.version();

        let use_index =
            self.index_policy.enabled && bmarks.len() >= self.index_policy.min_bookmarks;
        let mut results = if use_index {
            let index = self.current_index(&bmarks, version)?;
            search_query::evaluate_indexed(expr, &bmarks, &index, version)
        } else {
            search_query::evaluate(expr, &bmarks)
        };

        if let Some(limit) = limit {
            results.truncate(limit);
        }

        let by_id: HashMap<u64, &Bookmark> = bmarks.iter().map(|b| (b.id, b)).collect();
        results
            .into_iter()
            .map(|m| {
                let bookmark = by_id
                    .get(&m.id)
                    .map(|b| (*b).clone())
                    .ok_or(AppError::NotFound(m.id))?;
                Ok(SearchHit {
                    bookmark,
                    score: m.score,
                    highlights: m.highlights,
                })
            })
            .collect()
    }

    fn list(&self) -> Result<Vec<Bookmark>, AppError> {
        Ok(self.read_list()?.clone())
    }

    fn create(&self, bmark_create: BookmarkCreate) -> Result<Bookmark, AppError> {
        let mut bmarks = self.write_list()?;

        if let Some(existing) = bmarks
            .iter()
            .find(|b| b.url.eq_ignore_ascii_case(&bmark_create.url))
        {
            return Err(AppError::AlreadyExists(existing.id));
        }

        let id = bmarks.iter().map(|b| b.id + 1).max().unwrap_or(0);
        let now = Utc::now();

        let bmark = Bookmark {
            id,
            url: bmark_create.url,
            title: bmark_create.title.unwrap_or_default(),
            category: bmark_create.category.unwrap_or_default(),
            tags: normalize_tags(bmark_create.tags.unwrap_or_default()),
            summary: bmark_create.summary.filter(|s| !s.is_empty()),
            created_at: now,
            modified_at: now,
        };

        let mut next = bmarks.clone();
        next.push(bmark.clone());
        self.commit(&mut bmarks, next)?;

        Ok(bmark)
    }

    fn update(&self, id: u64, bmark_update: BookmarkUpdate) -> Result<Bookmark, AppError> {
        let mut bmarks = self.write_list()?;

        let bmark_idx = bmarks
            .iter()
            .position(|b| b.id == id)
            .ok_or(AppError::NotFound(id))?;

        if let Some(url) = &bmark_update.url {
            if let Some(other) = bmarks
                .iter()
                .find(|b| b.id != id && b.url.eq_ignore_ascii_case(url))
            {
                return Err(AppError::AlreadyExists(other.id));
            }
        }

        let mut next = bmarks.clone();
        apply_update(&mut next[bmark_idx], bmark_update);
        let result = next[bmark_idx].clone();

        self.commit(&mut bmarks, next)?;

        Ok(result)
    }

    fn delete(&self, id: u64) -> Result<(), AppError> {
        let mut bmarks = self.write_list()?;
        let idx = bmarks
            .iter()
            .position(|b| b.id == id)
            .ok_or(AppError::NotFound(id))?;
        let mut next = bmarks.clone();
        next.remove(idx);

        self.commit(&mut bmarks, next)
    }
}
