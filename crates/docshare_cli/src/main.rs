//! Operator CLI over `docshare_core`.
//!
//! # Responsibility
//! - Resolve configuration from environment plus flags.
//! - Map subcommands onto core services and print JSON results.
//!
//! # Invariants
//! - Service failures exit non-zero and print the stable error code.

mod args;

use anyhow::{anyhow, Context, Result};
use args::{
    Args, CategoryCommand, Commands, DocCommand, FollowCommand, NotificationCommand, UserCommand,
};
use clap::Parser;
use docshare_core::db::migrations::latest_version;
use docshare_core::db::open_db;
use docshare_core::model::document::{DocumentSearchQuery, DocumentSort};
use docshare_core::model::follow::FollowTarget;
use docshare_core::model::user::RankingMetric;
use docshare_core::repo::badge_repo::SqliteBadgeRepository;
use docshare_core::repo::category_repo::SqliteCategoryRepository;
use docshare_core::repo::notification_repo::SqliteNotificationRepository;
use docshare_core::repo::recommendation_repo::SqliteRecommendationRepository;
use docshare_core::repo::user_repo::SqliteUserRepository;
use docshare_core::{
    init_logging, Actor, AppConfig, BadgeService, CategoryService, DocumentService, FileStore,
    FollowService, NotificationService, RecommendationService, RegisterRequest, ServiceError,
    UploadDocumentRequest, UploadFile, UserService,
};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<ServiceError>()
                .map_or("internal", ServiceError::code);
            eprintln!("error code={code}: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = resolve_config(&args)?;
    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| anyhow!("log dir must be valid UTF-8"))?;
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path.display()))?;
    let store = FileStore::new(&config.files_dir);
    info!("event=cli_command module=cli status=start");

    match args.command {
        Commands::Init => {
            std::fs::create_dir_all(store.root())
                .with_context(|| format!("creating {}", store.root().display()))?;
            print_json(&json!({
                "db_path": config.db_path,
                "files_dir": config.files_dir,
                "schema_version": latest_version(),
            }))
        }
        Commands::User(command) => run_user(&conn, args.actor.as_deref(), command),
        Commands::Category(command) => run_category(&conn, args.actor.as_deref(), command),
        Commands::Doc(command) => {
            let documents = DocumentService::new(&conn, &store)
                .with_notification_cap(config.max_notifications_per_user);
            run_doc(&conn, &documents, args.actor.as_deref(), command)
        }
        Commands::Follow(command) => {
            let actor = require_actor(&conn, args.actor.as_deref())?;
            let target = match command {
                FollowCommand::User { id } => FollowTarget::User(id),
                FollowCommand::Category { id } => FollowTarget::Category(id),
            };
            print_json(&FollowService::new(&conn).follow(&actor, Some(target))?)
        }
        Commands::Notifications(command) => {
            let actor = require_actor(&conn, args.actor.as_deref())?;
            let service = NotificationService::new(SqliteNotificationRepository::new(&conn));
            match command {
                NotificationCommand::List => print_json(&service.list(&actor)?),
                NotificationCommand::Read { id } => {
                    service.mark_read(&actor, id)?;
                    print_json(&json!({ "read": id }))
                }
            }
        }
        Commands::Recommend => {
            let actor = require_actor(&conn, args.actor.as_deref())?;
            let service = RecommendationService::new(SqliteRecommendationRepository::new(&conn));
            print_json(&service.recommended(&actor)?)
        }
    }
}

fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::from_env()?;
    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    if let Some(files) = &args.files {
        config.files_dir = files.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(log_dir) = &args.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    Ok(config)
}

fn require_actor(conn: &Connection, external_uid: Option<&str>) -> Result<Actor> {
    let external_uid =
        external_uid.ok_or_else(|| anyhow!("this command needs --as <EXTERNAL_UID>"))?;
    Ok(UserService::new(SqliteUserRepository::new(conn)).resolve_actor(external_uid)?)
}

fn run_user(conn: &Connection, actor: Option<&str>, command: UserCommand) -> Result<()> {
    let users = UserService::new(SqliteUserRepository::new(conn));
    match command {
        UserCommand::Register { email, name, uid } => print_json(&users.register(
            &RegisterRequest {
                email,
                full_name: name,
                external_uid: uid,
            },
        )?),
        UserCommand::Login { email } => print_json(&users.login(&email)?),
        UserCommand::Promote { id } => {
            users.bootstrap_admin(id)?;
            print_json(&json!({ "admin": id }))
        }
        UserCommand::Points { id, delta } => {
            let actor = require_actor(conn, actor)?;
            let (points, level) = users.add_points(&actor, id, delta)?;
            print_json(&json!({ "user_id": id, "points": points, "level": level }))
        }
        UserCommand::Lock { id, unlock } => {
            let actor = require_actor(conn, actor)?;
            users.set_locked(&actor, id, !unlock)?;
            print_json(&json!({ "user_id": id, "locked": !unlock }))
        }
        UserCommand::Ranking { metric, limit } => match metric.as_deref() {
            None => print_json(&users.ranking(limit)?),
            Some(text) => {
                let metric = RankingMetric::parse(text)
                    .ok_or_else(|| anyhow!("unknown ranking metric `{text}`"))?;
                print_json(&users.ranking_by(metric, limit)?)
            }
        },
    }
}

fn run_category(conn: &Connection, actor: Option<&str>, command: CategoryCommand) -> Result<()> {
    let categories = CategoryService::new(SqliteCategoryRepository::new(conn));
    match command {
        CategoryCommand::Add { name, kind } => {
            let actor = require_actor(conn, actor)?;
            print_json(&categories.create(&actor, &name, kind.as_deref())?)
        }
        CategoryCommand::List => print_json(&categories.list()?),
    }
}

fn run_doc(
    conn: &Connection,
    documents: &DocumentService<'_>,
    actor: Option<&str>,
    command: DocCommand,
) -> Result<()> {
    match command {
        DocCommand::Upload(upload) => {
            let actor = require_actor(conn, actor)?;
            let request = UploadDocumentRequest {
                title: upload.title,
                description: upload.description,
                category_id: upload.category,
                points_required: upload.points,
                file: read_upload(&upload.file)?,
                cover: upload.cover.as_deref().map(read_upload).transpose()?,
            };
            let outcome = documents.upload(&actor, &request)?;
            let badges = BadgeService::new(SqliteBadgeRepository::new(conn))
                .list_for_user(actor.user_id)?;
            print_json(&json!({ "upload": outcome, "badges": badges }))
        }
        DocCommand::Approve { id } => {
            let actor = require_actor(conn, actor)?;
            documents.approve(&actor, id)?;
            print_json(&json!({ "approved": id }))
        }
        DocCommand::Lock { id, unlock } => {
            let actor = require_actor(conn, actor)?;
            documents.set_lock(&actor, id, !unlock)?;
            print_json(&json!({ "document_id": id, "locked": !unlock }))
        }
        DocCommand::Download { id, out } => {
            let actor = require_actor(conn, actor)?;
            let file = documents.download(&actor, id)?;
            let target = out.join(sanitize_file_name(&file.file_name));
            std::fs::write(&target, &file.bytes)
                .with_context(|| format!("writing {}", target.display()))?;
            print_json(&json!({
                "path": target,
                "content_type": file.content_type,
                "bytes": file.bytes.len(),
            }))
        }
        DocCommand::Search(search) => {
            let query = DocumentSearchQuery {
                keyword: search.keyword,
                category_id: search.category,
                file_type: search.file_type,
                sort: DocumentSort::parse(search.sort.as_deref()),
                page: search.page,
                page_size: search.page_size,
            };
            print_json(&documents.search(&query)?)
        }
        DocCommand::Stats => print_json(&documents.statistics()?),
        DocCommand::Related { id, count } => print_json(&documents.related(id, count)?),
    }
}

fn read_upload(path: &Path) -> Result<UploadFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("upload path has no usable file name: {}", path.display()))?;
    Ok(UploadFile::new(file_name, bytes))
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|ch| if matches!(ch, '/' | '\\' | ':') { '_' } else { ch })
        .collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::sanitize_file_name;

    #[test]
    fn download_names_cannot_escape_output_dir() {
        assert_eq!(sanitize_file_name("../a/b.pdf"), ".._a_b.pdf");
        assert_eq!(sanitize_file_name("Intro to Rust.pdf"), "Intro to Rust.pdf");
    }
}
