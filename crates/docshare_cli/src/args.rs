//! Command-line argument parsing for the docshare operator CLI.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// docshare - operate a document-sharing database from the terminal
#[derive(Parser, Debug)]
#[command(name = "docshare")]
#[command(version)]
#[command(about = "Operate a docshare database and file store", long_about = None)]
pub struct Args {
    /// SQLite database path (overrides DOCSHARE_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// File store root (overrides DOCSHARE_FILES_DIR)
    #[arg(long, global = true)]
    pub files: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off without it
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Identity-provider uid of the calling user
    #[arg(long = "as", value_name = "EXTERNAL_UID", global = true)]
    pub actor: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or migrate the database and file store
    Init,
    /// Account management
    #[command(subcommand)]
    User(UserCommand),
    /// Category catalogue
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Documents
    #[command(subcommand)]
    Doc(DocCommand),
    /// Follow a user or category as the calling user
    #[command(subcommand)]
    Follow(FollowCommand),
    /// Inbox of the calling user
    #[command(subcommand)]
    Notifications(NotificationCommand),
    /// Recommendations for the calling user
    Recommend,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        uid: String,
    },
    Login {
        #[arg(long)]
        email: String,
    },
    /// Grant admin to the first user of a fresh database
    Promote {
        #[arg(long)]
        id: i64,
    },
    /// Adjust a balance (admin)
    Points {
        #[arg(long)]
        id: i64,
        #[arg(long, allow_hyphen_values = true)]
        delta: i64,
    },
    /// Lock or unlock an account (admin)
    Lock {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        unlock: bool,
    },
    Ranking {
        /// points|uploads|comments|downloads
        #[arg(long)]
        metric: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        kind: Option<String>,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum DocCommand {
    Upload(UploadArgs),
    Approve {
        #[arg(long)]
        id: i64,
    },
    Lock {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        unlock: bool,
    },
    Download {
        #[arg(long)]
        id: i64,
        /// Output directory; the file is written as `<title>.<type>`
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    Search(SearchArgs),
    Stats,
    Related {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        count: Option<u32>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct UploadArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub category: i64,
    #[arg(long, default_value_t = 0)]
    pub points: i64,
    #[arg(long)]
    pub file: PathBuf,
    #[arg(long)]
    pub cover: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct SearchArgs {
    #[arg(long)]
    pub keyword: Option<String>,
    #[arg(long)]
    pub category: Option<i64>,
    #[arg(long)]
    pub file_type: Option<String>,
    /// uploadedat_desc|uploadedat_asc|downloadcount_desc|title_asc|title_desc
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 10)]
    pub page_size: u32,
}

#[derive(Subcommand, Debug)]
pub enum FollowCommand {
    User {
        #[arg(long)]
        id: i64,
    },
    Category {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotificationCommand {
    List,
    Read {
        #[arg(long)]
        id: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::{Args, Commands, DocCommand, UserCommand};
    use clap::{CommandFactory, Parser};

    #[test]
    fn definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn negative_point_delta_parses() {
        let args = Args::parse_from([
            "docshare", "--as", "admin-uid", "user", "points", "--id", "3", "--delta", "-20",
        ]);
        assert_eq!(args.actor.as_deref(), Some("admin-uid"));
        match args.command {
            Commands::User(UserCommand::Points { id, delta }) => {
                assert_eq!(id, 3);
                assert_eq!(delta, -20);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn search_defaults_to_first_page() {
        let args = Args::parse_from(["docshare", "doc", "search", "--keyword", "rust"]);
        match args.command {
            Commands::Doc(DocCommand::Search(search)) => {
                assert_eq!(search.page, 1);
                assert_eq!(search.page_size, 10);
                assert_eq!(search.keyword.as_deref(), Some("rust"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
