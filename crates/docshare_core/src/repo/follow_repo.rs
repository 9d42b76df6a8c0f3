//! Follow edges between users and towards categories.
//!
//! # Invariants
//! - `followers_of_upload` returns each follower once and never the uploader.

use crate::model::category::CategoryId;
use crate::model::follow::{Follow, FollowId};
use crate::model::user::UserId;
use crate::repo::{ensure_changed, RepoResult};
use rusqlite::{params, Connection, Row};

const FOLLOW_SELECT_SQL: &str =
    "SELECT id, user_id, followed_user_id, category_id, followed_at FROM follows";

pub trait FollowRepository {
    fn create(
        &self,
        user_id: UserId,
        followed_user_id: Option<UserId>,
        category_id: Option<CategoryId>,
    ) -> RepoResult<FollowId>;
    fn get(&self, id: FollowId) -> RepoResult<Option<Follow>>;
    /// Finds an edge with exactly these targets (`None` matches `NULL`).
    fn find_exact(
        &self,
        user_id: UserId,
        followed_user_id: Option<UserId>,
        category_id: Option<CategoryId>,
    ) -> RepoResult<Option<Follow>>;
    fn list_by_user(&self, user_id: UserId) -> RepoResult<Vec<Follow>>;
    /// Edges pointing at `user_id`.
    fn list_followers(&self, user_id: UserId) -> RepoResult<Vec<Follow>>;
    /// Distinct users to notify when `uploader` publishes into `category_id`.
    fn followers_of_upload(
        &self,
        uploader: UserId,
        category_id: CategoryId,
    ) -> RepoResult<Vec<UserId>>;
    fn delete(&self, id: FollowId) -> RepoResult<()>;
}

pub struct SqliteFollowRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFollowRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn collect(&self, sql: &str, user_id: UserId) -> RepoResult<Vec<Follow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([user_id])?;
        let mut follows = Vec::new();
        while let Some(row) = rows.next()? {
            follows.push(parse_follow_row(row)?);
        }
        Ok(follows)
    }
}

impl FollowRepository for SqliteFollowRepository<'_> {
    fn create(
        &self,
        user_id: UserId,
        followed_user_id: Option<UserId>,
        category_id: Option<CategoryId>,
    ) -> RepoResult<FollowId> {
        self.conn.execute(
            "INSERT INTO follows (user_id, followed_user_id, category_id) VALUES (?1, ?2, ?3);",
            params![user_id, followed_user_id, category_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: FollowId) -> RepoResult<Option<Follow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FOLLOW_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_follow_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_exact(
        &self,
        user_id: UserId,
        followed_user_id: Option<UserId>,
        category_id: Option<CategoryId>,
    ) -> RepoResult<Option<Follow>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FOLLOW_SELECT_SQL}
             WHERE user_id = ?1
               AND followed_user_id IS ?2
               AND category_id IS ?3
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params![user_id, followed_user_id, category_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_follow_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_by_user(&self, user_id: UserId) -> RepoResult<Vec<Follow>> {
        self.collect(
            &format!("{FOLLOW_SELECT_SQL} WHERE user_id = ?1 ORDER BY followed_at DESC, id DESC;"),
            user_id,
        )
    }

    fn list_followers(&self, user_id: UserId) -> RepoResult<Vec<Follow>> {
        self.collect(
            &format!(
                "{FOLLOW_SELECT_SQL} WHERE followed_user_id = ?1 ORDER BY followed_at DESC, id DESC;"
            ),
            user_id,
        )
    }

    fn followers_of_upload(
        &self,
        uploader: UserId,
        category_id: CategoryId,
    ) -> RepoResult<Vec<UserId>> {
        // An edge matches when either of its targets matches.
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT user_id
             FROM follows
             WHERE user_id <> ?1
               AND (followed_user_id = ?1 OR category_id = ?2)
             ORDER BY user_id ASC;",
        )?;
        let mut rows = stmt.query(params![uploader, category_id])?;
        let mut followers = Vec::new();
        while let Some(row) = rows.next()? {
            followers.push(row.get(0)?);
        }
        Ok(followers)
    }

    fn delete(&self, id: FollowId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM follows WHERE id = ?1;", [id])?;
        ensure_changed(changed, "follow", id)
    }
}

fn parse_follow_row(row: &Row<'_>) -> RepoResult<Follow> {
    Ok(Follow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        followed_user_id: row.get(2)?,
        category_id: row.get(3)?,
        followed_at: row.get(4)?,
    })
}
