//! User database operations
//!
//! Handles all database interactions for user records. Uniqueness of names
//! and emails is enforced by the table's constraints: writes are attempted
//! directly and a violation comes back as [`StoreError::Conflict`].

use crate::users::error::StoreError;
use crate::users::models::{User, UserChanges, UserId};
use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

/// Database connection pool for user operations
#[derive(Debug, Clone)]
pub struct UserDb {
    pool: SqlitePool,
}

impl UserDb {
    /// Initialize database connection pool
    ///
    /// # Arguments
    /// * `database_url` - SQLite file path or `sqlite:` URL
    /// * `max_connections` - Upper bound on pooled connections
    ///
    /// # Returns
    /// * `Ok(UserDb)` once connected and the users table exists
    /// * `Err` if the directory, connection or bootstrap script failed
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let file_path = database_file_path(database_url);

        if file_path != ":memory:" {
            if let Some(parent) = Path::new(file_path).parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create db directory {}", parent.display())
                })?;
            }
        }

        let connection_string = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite:{}", database_url)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        info!("Connected to SQLite database at: {}", database_url);

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Create the users table if it does not exist yet
    async fn run_migrations(&self) -> anyhow::Result<()> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_users.sql");

        for statement in split_statements(migration_sql) {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .with_context(|| {
                    format!(
                        "Migration failed - Statement: {}",
                        statement.chars().take(100).collect::<String>()
                    )
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get all users, in insertion order
    pub async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: UserId) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    /// Insert a new user and return it with its assigned ID
    pub async fn create(&self, name: &str, email: &str) -> Result<User, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, created_at, updated_at) VALUES (?, ?, ?, ?) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(name)
        .bind(email)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        debug!("Created user: {}", user.id);
        Ok(user)
    }

    /// Apply the supplied fields to an existing user
    ///
    /// Runs as one statement, so a constraint violation on either field
    /// leaves the row unchanged.
    pub async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, StoreError> {
        if changes.is_empty() {
            return self.get_by_id(id).await;
        }

        let updated_at = chrono::Utc::now().timestamp();
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = COALESCE(?, name), email = COALESCE(?, email), updated_at = ? \
             WHERE id = ? RETURNING {}",
            USER_COLUMNS
        ))
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        debug!("Updated user: {}", id);
        Ok(user)
    }

    /// Delete a user
    pub async fn delete(&self, id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        debug!("Deleted user: {}", id);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Strip the `sqlite:` scheme and any query string, leaving the file path
fn database_file_path(database_url: &str) -> &str {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    path.split('?').next().unwrap_or(path)
}

/// Split a SQL script into statements, dropping `--` comments
fn split_statements(sql: &str) -> Vec<String> {
    let mut cleaned_sql = String::new();
    for line in sql.lines() {
        let without_comments = match line.find("--") {
            Some(comment_pos) => &line[..comment_pos],
            None => line,
        };
        let trimmed = without_comments.trim();
        if trimmed.is_empty() {
            continue;
        }
        cleaned_sql.push_str(trimmed);
        cleaned_sql.push(' ');
    }

    cleaned_sql
        .split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_db() -> (UserDb, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("users.db");
        let db = UserDb::new(db_path.to_str().unwrap(), 2)
            .await
            .expect("Failed to create test database");
        (db, temp_dir)
    }

    #[test]
    fn test_database_file_path() {
        assert_eq!(database_file_path("sqlite:database.db"), "database.db");
        assert_eq!(database_file_path("sqlite://data/users.db"), "data/users.db");
        assert_eq!(database_file_path("sqlite:users.db?mode=rwc"), "users.db");
        assert_eq!(database_file_path("/tmp/users.db"), "/tmp/users.db");
    }

    #[test]
    fn test_split_statements_drops_comments() {
        let statements = split_statements(
            "-- header\nCREATE TABLE a (x INTEGER); -- trailing\n\nCREATE TABLE b (y TEXT);\n",
        );
        assert_eq!(
            statements,
            vec!["CREATE TABLE a (x INTEGER)", "CREATE TABLE b (y TEXT)"]
        );
    }

    #[tokio::test]
    async fn test_creates_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("dir").join("users.db");
        let url = format!("sqlite:{}", db_path.display());
        let db = UserDb::new(&url, 1).await.unwrap();
        assert!(db_path.exists());
        assert!(db.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_keeps_records() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("users.db");
        let path = db_path.to_str().unwrap();

        let db = UserDb::new(path, 1).await.unwrap();
        db.create("alice", "a@x.com").await.unwrap();
        db.pool().close().await;

        let reopened = UserDb::new(path, 1).await.unwrap();
        let users = reopened.list_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "alice");
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (db, _temp_dir) = create_test_db().await;
        let user = db.create("alice", "a@x.com").await.unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "alice");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.created_at, user.updated_at);

        let fetched = db.get_by_id(user.id).await.unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn test_list_all_in_insertion_order() {
        let (db, _temp_dir) = create_test_db().await;
        db.create("bob", "b@x.com").await.unwrap();
        db.create("alice", "a@x.com").await.unwrap();

        let names: Vec<String> = db
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["bob", "alice"]);
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let (db, _temp_dir) = create_test_db().await;
        match db.get_by_id(42).await {
            Err(StoreError::NotFound(42)) => {}
            other => panic!("Expected NotFound, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_duplicate_name_conflicts() {
        let (db, _temp_dir) = create_test_db().await;
        db.create("alice", "a@x.com").await.unwrap();

        let result = db.create("alice", "other@x.com").await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(db.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_email_conflicts() {
        let (db, _temp_dir) = create_test_db().await;
        db.create("alice", "a@x.com").await.unwrap();

        let result = db.create("bob", "a@x.com").await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(db.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let (db, _temp_dir) = create_test_db().await;
        db.create("alice", "a@x.com").await.unwrap();
        let bob = db.create("bob", "b@x.com").await.unwrap();
        db.delete(bob.id).await.unwrap();

        let carol = db.create("carol", "c@x.com").await.unwrap();
        assert!(carol.id > bob.id);
    }

    #[tokio::test]
    async fn test_update_partial() {
        let (db, _temp_dir) = create_test_db().await;
        let user = db.create("alice", "a@x.com").await.unwrap();

        let changes = UserChanges {
            email: Some("alice@new.com".to_string()),
            ..Default::default()
        };
        let updated = db.update(user.id, &changes).await.unwrap();
        assert_eq!(updated.id, user.id);
        assert_eq!(updated.name, "alice");
        assert_eq!(updated.email, "alice@new.com");
        assert_eq!(updated.created_at, user.created_at);
    }

    #[tokio::test]
    async fn test_update_without_changes_returns_record() {
        let (db, _temp_dir) = create_test_db().await;
        let user = db.create("alice", "a@x.com").await.unwrap();
        let same = db.update(user.id, &UserChanges::default()).await.unwrap();
        assert_eq!(same, user);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let (db, _temp_dir) = create_test_db().await;
        let changes = UserChanges {
            name: Some("ghost".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            db.update(9, &changes).await,
            Err(StoreError::NotFound(9))
        ));
    }

    #[tokio::test]
    async fn test_update_conflict_leaves_row_unchanged() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = db.create("alice", "a@x.com").await.unwrap();
        db.create("bob", "b@x.com").await.unwrap();

        // the name is free but the email is taken, so nothing may change
        let changes = UserChanges {
            name: Some("alicia".to_string()),
            email: Some("b@x.com".to_string()),
        };
        let result = db.update(alice.id, &changes).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let unchanged = db.get_by_id(alice.id).await.unwrap();
        assert_eq!(unchanged, alice);
    }

    #[tokio::test]
    async fn test_update_to_own_values_is_not_a_conflict() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = db.create("alice", "a@x.com").await.unwrap();
        let changes = UserChanges {
            name: Some("alice".to_string()),
            email: Some("a@x.com".to_string()),
        };
        let updated = db.update(alice.id, &changes).await.unwrap();
        assert_eq!(updated.name, "alice");
    }

    #[tokio::test]
    async fn test_delete() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = db.create("alice", "a@x.com").await.unwrap();
        let bob = db.create("bob", "b@x.com").await.unwrap();

        db.delete(alice.id).await.unwrap();

        assert!(matches!(
            db.get_by_id(alice.id).await,
            Err(StoreError::NotFound(_))
        ));
        let remaining = db.list_all().await.unwrap();
        assert_eq!(remaining, vec![bob]);
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let (db, _temp_dir) = create_test_db().await;
        assert!(matches!(db.delete(3).await, Err(StoreError::NotFound(3))));
    }
}
