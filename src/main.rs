use std::collections::BTreeMap;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod bookmarks;
mod cli;
mod config;
mod errors;
mod search_query;
#[cfg(test)]
mod tests;

use app::AppFactory;
use bookmarks::{
    parse_tags, BookmarkCreate, BookmarkManager, BookmarkUpdate, SearchHit, SearchQuery,
};
use cli::{BookmarkArgs, Command};
use errors::AppError;
use search_query::QueryExpression;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse the search bar text; an unbalanced quote falls back to the raw
/// text as one phrase.
fn parse_or_phrase(raw: &str) -> QueryExpression {
    search_query::parse(raw).unwrap_or_else(|err| {
        log::warn!("{err}; searching for the raw text instead");
        QueryExpression::Phrase(raw.trim().to_string())
    })
}

fn search(
    mgr: &dyn BookmarkManager,
    raw: &str,
    limit: Option<usize>,
) -> anyhow::Result<Vec<SearchHit>> {
    let query = SearchQuery {
        query: raw.to_string(),
        limit,
    };
    match mgr.search(&query) {
        Err(AppError::Query(_)) => Ok(mgr.search_expr(&parse_or_phrase(raw), limit)?),
        result => Ok(result?),
    }
}

/// Counts by folded name, reported under the first spelling seen.
fn count_by<'a>(names: impl Iterator<Item = &'a str>) -> BTreeMap<String, (String, usize)> {
    let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
    for name in names {
        counts
            .entry(search_query::fold(name))
            .or_insert_with(|| (name.to_string(), 0))
            .1 += 1;
    }
    counts
}

fn print_counts(counts: BTreeMap<String, (String, usize)>) {
    for (name, count) in counts.into_values() {
        println!("{count:>6}  {name}");
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = cli::Args::parse();

    let paths = AppFactory::get_paths()?;
    let config = AppFactory::create_config(&paths)?;
    let mgr = AppFactory::create_backend(&paths, &config)?;

    match args.command {
        Command::Search {
            query,
            limit,
            count,
            explain,
        } => {
            let raw = query.join(" ");

            if explain {
                println!("{}", parse_or_phrase(&raw));
                return Ok(());
            }

            if count {
                let hits = search(&mgr, &raw, None)?;
                println!("{} bookmarks found", hits.len());
                return Ok(());
            }

            let limit = limit.or(config.search.default_limit);
            let hits = search(&mgr, &raw, limit)?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
            Ok(())
        }

        Command::Add {
            url,
            bookmark_args:
                BookmarkArgs {
                    title,
                    category,
                    tags,
                    summary,
                },
        } => {
            let bmark = mgr.create(BookmarkCreate {
                url,
                title,
                category,
                tags: tags.as_deref().map(parse_tags),
                summary,
            })?;
            println!("{}", serde_json::to_string_pretty(&bmark)?);
            Ok(())
        }

        Command::Update {
            id,
            url,
            bookmark_args:
                BookmarkArgs {
                    title,
                    category,
                    tags,
                    summary,
                },
            append_tags,
            remove_tags,
        } => {
            let update = BookmarkUpdate {
                url,
                title,
                category,
                tags: tags.as_deref().map(parse_tags),
                append_tags: append_tags.as_deref().map(parse_tags),
                remove_tags: remove_tags.as_deref().map(parse_tags),
                summary,
            };

            if update.is_empty() {
                println!("This update request does nothing");
                return Ok(());
            }

            let bmark = mgr.update(id, update)?;
            println!("{}", serde_json::to_string_pretty(&bmark)?);
            Ok(())
        }

        Command::Delete { id } => {
            mgr.delete(id)?;
            println!("bookmark {id} removed");
            Ok(())
        }

        Command::Tags {} => {
            let bmarks = mgr.list()?;
            print_counts(count_by(
                bmarks.iter().flat_map(|b| b.tags.iter().map(String::as_str)),
            ));
            Ok(())
        }

        Command::Categories {} => {
            let bmarks = mgr.list()?;
            print_counts(count_by(bmarks.iter().map(|b| b.effective_category())));
            Ok(())
        }
    }
}
