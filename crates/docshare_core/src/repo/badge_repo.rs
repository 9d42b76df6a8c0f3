use crate::model::badge::{Badge, BadgeId, EarnedBadge};
use crate::model::user::UserId;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, Row};

pub trait BadgeRepository {
    fn create(&self, name: &str, description: &str) -> RepoResult<BadgeId>;
    fn get_by_name(&self, name: &str) -> RepoResult<Option<Badge>>;
    fn list(&self) -> RepoResult<Vec<Badge>>;
    /// Returns `true` when the badge was newly awarded.
    fn award(&self, user_id: UserId, badge_id: BadgeId) -> RepoResult<bool>;
    fn has_badge(&self, user_id: UserId, badge_id: BadgeId) -> RepoResult<bool>;
    fn list_by_user(&self, user_id: UserId) -> RepoResult<Vec<EarnedBadge>>;
}

pub struct SqliteBadgeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBadgeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BadgeRepository for SqliteBadgeRepository<'_> {
    fn create(&self, name: &str, description: &str) -> RepoResult<BadgeId> {
        self.conn.execute(
            "INSERT INTO badges (name, description) VALUES (?1, ?2);",
            params![name, description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_by_name(&self, name: &str) -> RepoResult<Option<Badge>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM badges WHERE name = ?1;")?;
        let mut rows = stmt.query([name])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_badge_row(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> RepoResult<Vec<Badge>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM badges ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut badges = Vec::new();
        while let Some(row) = rows.next()? {
            badges.push(parse_badge_row(row)?);
        }
        Ok(badges)
    }

    fn award(&self, user_id: UserId, badge_id: BadgeId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO user_badges (user_id, badge_id) VALUES (?1, ?2);",
            params![user_id, badge_id],
        )?;
        Ok(changed > 0)
    }

    fn has_badge(&self, user_id: UserId, badge_id: BadgeId) -> RepoResult<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM user_badges WHERE user_id = ?1 AND badge_id = ?2);",
            params![user_id, badge_id],
            |row| row.get(0),
        )?)
    }

    fn list_by_user(&self, user_id: UserId) -> RepoResult<Vec<EarnedBadge>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.id, b.name, b.description, ub.earned_at
             FROM user_badges ub
             JOIN badges b ON b.id = ub.badge_id
             WHERE ub.user_id = ?1
             ORDER BY ub.earned_at ASC, b.id ASC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut badges = Vec::new();
        while let Some(row) = rows.next()? {
            badges.push(EarnedBadge {
                badge: parse_badge_row(row)?,
                earned_at: row.get(3)?,
            });
        }
        Ok(badges)
    }
}

fn parse_badge_row(row: &Row<'_>) -> RepoResult<Badge> {
    Ok(Badge {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}
