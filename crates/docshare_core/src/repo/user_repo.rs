//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist accounts, point balances, and moderation flags.
//! - Serve leaderboard queries over users and their uploads/comments.
//!
//! # Invariants
//! - `update_points` clamps the balance to `0..=i64::MAX` and writes `points`
//!   and `level` in one statement.
//! - Email lookups are case-insensitive (column collation).

use crate::model::user::{
    Level, NewUser, RankedUser, RankingItem, RankingMetric, User, UserId, UserProfilePatch,
};
use crate::repo::{bool_to_int, ensure_changed, int_to_bool, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const POINTS_UPDATE_ATTEMPTS: usize = 3;

const USER_SELECT_SQL: &str = "SELECT
    id,
    external_uid,
    email,
    full_name,
    avatar_url,
    school,
    points,
    level,
    is_admin,
    is_locked,
    comment_count,
    created_at
FROM users";

pub trait UserRepository {
    fn create(&self, user: &NewUser) -> RepoResult<UserId>;
    fn get(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_by_external_uid(&self, external_uid: &str) -> RepoResult<Option<User>>;
    fn get_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn list(&self) -> RepoResult<Vec<User>>;
    fn update_profile(&self, id: UserId, patch: &UserProfilePatch) -> RepoResult<()>;
    fn delete(&self, id: UserId) -> RepoResult<()>;
    /// Adds `delta` (possibly negative) and returns the new `(points, level)`.
    fn update_points(&self, id: UserId, delta: i64) -> RepoResult<(i64, Level)>;
    fn set_locked(&self, id: UserId, locked: bool) -> RepoResult<()>;
    fn set_admin(&self, id: UserId, is_admin: bool) -> RepoResult<()>;
    fn count_admins(&self) -> RepoResult<i64>;
    /// Returns the incremented counter.
    fn increment_comment_count(&self, id: UserId) -> RepoResult<i64>;
    fn top_by_points(&self, limit: u32) -> RepoResult<Vec<RankedUser>>;
    fn ranking(&self, metric: RankingMetric, limit: u32) -> RepoResult<Vec<RankingItem>>;
    fn count(&self) -> RepoResult<i64>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn get_where(&self, clause: &str, value: &dyn rusqlite::ToSql) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE {clause};"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create(&self, user: &NewUser) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (external_uid, email, full_name, level)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.external_uid.as_str(),
                user.email.as_str(),
                user.full_name.as_str(),
                Level::Newbie.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: UserId) -> RepoResult<Option<User>> {
        self.get_where("id = ?1", &id)
    }

    fn get_by_external_uid(&self, external_uid: &str) -> RepoResult<Option<User>> {
        self.get_where("external_uid = ?1", &external_uid)
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.get_where("email = ?1", &email.trim())
    }

    fn list(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn update_profile(&self, id: UserId, patch: &UserProfilePatch) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                full_name = COALESCE(?2, full_name),
                school = COALESCE(?3, school),
                avatar_url = COALESCE(?4, avatar_url)
             WHERE id = ?1;",
            params![
                id,
                patch.full_name.as_deref(),
                patch.school.as_deref(),
                patch.avatar_url.as_deref(),
            ],
        )?;
        ensure_changed(changed, "user", id)
    }

    fn delete(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id])?;
        ensure_changed(changed, "user", id)
    }

    fn update_points(&self, id: UserId, delta: i64) -> RepoResult<(i64, Level)> {
        for _ in 0..POINTS_UPDATE_ATTEMPTS {
            let current: Option<i64> = self
                .conn
                .query_row("SELECT points FROM users WHERE id = ?1;", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            let current = current.ok_or(RepoError::NotFound { entity: "user", id })?;

            let points = current.saturating_add(delta).max(0);
            let level = Level::for_points(points);
            // Guarded on the balance read above; a concurrent writer forces a re-read.
            let changed = self.conn.execute(
                "UPDATE users SET points = ?2, level = ?3 WHERE id = ?1 AND points = ?4;",
                params![id, points, level.as_str(), current],
            )?;
            if changed == 1 {
                return Ok((points, level));
            }
        }
        Err(RepoError::Constraint(format!(
            "points of user {id} changed concurrently"
        )))
    }

    fn set_locked(&self, id: UserId, locked: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET is_locked = ?2 WHERE id = ?1;",
            params![id, bool_to_int(locked)],
        )?;
        ensure_changed(changed, "user", id)
    }

    fn set_admin(&self, id: UserId, is_admin: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET is_admin = ?2 WHERE id = ?1;",
            params![id, bool_to_int(is_admin)],
        )?;
        ensure_changed(changed, "user", id)
    }

    fn count_admins(&self) -> RepoResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM users WHERE is_admin = 1;", [], |row| {
                row.get(0)
            })?)
    }

    fn increment_comment_count(&self, id: UserId) -> RepoResult<i64> {
        let count: Option<i64> = self
            .conn
            .query_row(
                "UPDATE users SET comment_count = comment_count + 1
                 WHERE id = ?1
                 RETURNING comment_count;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        count.ok_or(RepoError::NotFound { entity: "user", id })
    }

    fn top_by_points(&self, limit: u32) -> RepoResult<Vec<RankedUser>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                u.id,
                u.full_name,
                u.avatar_url,
                u.points,
                u.level,
                (SELECT COUNT(*) FROM documents d WHERE d.uploaded_by = u.id) AS uploads
             FROM users u
             ORDER BY u.points DESC, uploads DESC, u.id ASC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut ranked = Vec::new();
        while let Some(row) = rows.next()? {
            let level_text: String = row.get(4)?;
            ranked.push(RankedUser {
                user_id: row.get(0)?,
                full_name: row.get(1)?,
                avatar_url: row.get(2)?,
                points: row.get(3)?,
                level: parse_level(&level_text)?,
                documents_uploaded: row.get(5)?,
            });
        }
        Ok(ranked)
    }

    fn ranking(&self, metric: RankingMetric, limit: u32) -> RepoResult<Vec<RankingItem>> {
        let value_sql = match metric {
            RankingMetric::Points => "u.points",
            RankingMetric::Uploads => {
                "(SELECT COUNT(*) FROM documents d WHERE d.uploaded_by = u.id)"
            }
            RankingMetric::Comments => "(SELECT COUNT(*) FROM comments c WHERE c.user_id = u.id)",
            RankingMetric::Downloads => {
                "(SELECT COALESCE(SUM(d.download_count), 0)
                  FROM documents d WHERE d.uploaded_by = u.id)"
            }
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT u.id, u.full_name, u.email, u.avatar_url, {value_sql} AS value
             FROM users u
             ORDER BY value DESC, u.id ASC
             LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(RankingItem {
                user_id: row.get(0)?,
                full_name: row.get(1)?,
                email: row.get(2)?,
                avatar_url: row.get(3)?,
                value: row.get(4)?,
                value_description: metric.value_description(),
            });
        }
        Ok(items)
    }

    fn count(&self) -> RepoResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let level_text: String = row.get(7)?;
    Ok(User {
        id: row.get(0)?,
        external_uid: row.get(1)?,
        email: row.get(2)?,
        full_name: row.get(3)?,
        avatar_url: row.get(4)?,
        school: row.get(5)?,
        points: row.get(6)?,
        level: parse_level(&level_text)?,
        is_admin: int_to_bool(row.get(8)?, "users.is_admin")?,
        is_locked: int_to_bool(row.get(9)?, "users.is_locked")?,
        comment_count: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn parse_level(value: &str) -> RepoResult<Level> {
    Level::parse(value).ok_or_else(|| RepoError::InvalidData(format!("unknown level `{value}`")))
}
