use crate::auth::repo_types::{NewUser, User};
use sqlx::SqlitePool;
use tracing::debug;

impl User {
    /// Insert a new user row. There is no duplicate-username check.
    pub async fn create(db: &SqlitePool, new: &NewUser) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, firstName, lastName, email, contactNumber, address, profilePicture)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, username, password, firstName, lastName, email, contactNumber, address, profilePicture
            "#,
        )
        .bind(&new.username)
        .bind(&new.password)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.contact_number)
        .bind(&new.address)
        .bind(&new.profile_picture)
        .fetch_one(db)
        .await?;
        debug!(user_id = user.id, "user row inserted");
        Ok(user)
    }

    /// True when at least one row matches both username and password exactly.
    pub async fn authenticate(
        db: &SqlitePool,
        username: &str,
        password: &str,
    ) -> Result<bool, sqlx::Error> {
        let (matches,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE username = ? AND password = ?
            "#,
        )
        .bind(username)
        .bind(password)
        .fetch_one(db)
        .await?;
        Ok(matches > 0)
    }

    /// All rows stored under a username, oldest first.
    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> Result<Vec<User>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, firstName, lastName, email, contactNumber, address, profilePicture
            FROM users
            WHERE username = ?
            ORDER BY id
            "#,
        )
        .bind(username)
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}
