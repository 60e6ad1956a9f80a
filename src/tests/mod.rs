use chrono::{DateTime, TimeZone, Utc};

use crate::bookmarks::Bookmark;

mod commands;

pub fn fixed_time(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn bookmark(id: u64, title: &str, url: &str, tags: &[&str], category: &str) -> Bookmark {
    Bookmark {
        id,
        url: url.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        summary: None,
        created_at: fixed_time(0),
        modified_at: fixed_time(0),
    }
}

pub fn with_summary(mut bm: Bookmark, summary: &str) -> Bookmark {
    bm.summary = Some(summary.to_string());
    bm
}

pub fn modified(mut bm: Bookmark, secs: i64) -> Bookmark {
    bm.modified_at = fixed_time(secs);
    bm
}
