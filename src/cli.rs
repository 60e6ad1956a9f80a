use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BookmarkArgs {
    /// Bookmark title
    #[clap(short, long)]
    pub title: Option<String>,

    /// Bookmark category
    #[clap(short = 'k', long)]
    pub category: Option<String>,

    /// Bookmark tags, comma separated
    #[clap(short = 'g', long)]
    pub tags: Option<String>,

    /// Bookmark summary
    #[clap(short, long)]
    pub summary: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search bookmarks.
    ///
    /// Words match title, url and summary. "quoted phrases" match exactly.
    /// title:, url:, tag: and category: restrict a term to one field.
    /// -term excludes. AND / OR combine terms; adjacent terms are ANDed.
    Search {
        /// Query, e.g. tag:rust "error handling" -deprecated
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,

        /// Maximum number of results
        #[clap(short, long)]
        limit: Option<usize>,

        /// Print the count
        #[clap(short = 'c', long, default_value = "false")]
        count: bool,

        /// Print the parsed query instead of searching
        #[clap(long, default_value = "false")]
        explain: bool,
    },
    /// Add a bookmark
    Add {
        /// a url
        #[clap(allow_hyphen_values = true)]
        url: String,

        #[clap(flatten)]
        bookmark_args: BookmarkArgs,
    },
    /// Update a bookmark
    Update {
        id: u64,

        /// a url
        #[clap(short, long)]
        url: Option<String>,

        #[clap(flatten)]
        bookmark_args: BookmarkArgs,

        /// Appends tags
        #[clap(short = 'a', long)]
        append_tags: Option<String>,

        /// Delete tags
        #[clap(short = 'r', long)]
        remove_tags: Option<String>,
    },
    /// Delete a bookmark
    Delete { id: u64 },
    /// List tags with bookmark counts
    Tags {},
    /// List categories with bookmark counts
    Categories {},
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_collects_query_words() {
        let args = Args::parse_from(["bmfind", "search", "-l", "5", "tag:rust", "-deprecated"]);
        match args.command {
            Command::Search { query, limit, .. } => {
                assert_eq!(query, vec!["tag:rust", "-deprecated"]);
                assert_eq!(limit, Some(5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_add_args() {
        let args = Args::parse_from([
            "bmfind",
            "add",
            "https://rust-lang.org",
            "-t",
            "Rust",
            "-k",
            "Programming",
            "-g",
            "rust,lang",
        ]);
        match args.command {
            Command::Add { url, bookmark_args } => {
                assert_eq!(url, "https://rust-lang.org");
                assert_eq!(bookmark_args.title.as_deref(), Some("Rust"));
                assert_eq!(bookmark_args.category.as_deref(), Some("Programming"));
                assert_eq!(bookmark_args.tags.as_deref(), Some("rust,lang"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
