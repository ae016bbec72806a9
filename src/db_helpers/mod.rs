use sqlx::SqlitePool;

use crate::{errors::RequestError, models::User};

mod article_helpers;
mod event_helpers;
mod interaction_helpers;
mod user_helpers;

pub use article_helpers::*;
pub use event_helpers::*;
pub use interaction_helpers::*;
pub use user_helpers::*;

/// Builds `SET a = ?, b = ?` fragments out of the fields a caller supplied.
struct QueryBuilder {
    query: String,
    params: Vec<String>,
    seperator: &'static str,
}

impl QueryBuilder {
    fn new(initial: &str, seperator: &'static str) -> Self {
        Self {
            query: initial.to_owned(),
            params: vec![],
            seperator,
        }
    }

    fn add_param(mut self, column: &str, param: Option<String>) -> Self {
        if let Some(value) = param {
            if !self.params.is_empty() {
                self.query.push_str(self.seperator);
            }
            self.query.push_str(column);
            self.query.push_str(" = ?");
            self.params.push(value);
        }
        self
    }

    /// `None` when no field was supplied.
    fn build(self) -> Option<(String, Vec<String>)> {
        if self.params.is_empty() {
            None
        } else {
            Some((self.query, self.params))
        }
    }
}

// ----------------- Helper Functions -----------------

const USER_COLUMNS: &str =
    "id, username, email, password, user_type, is_active, image, bio, created_at";

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let result = sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let result = sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}
