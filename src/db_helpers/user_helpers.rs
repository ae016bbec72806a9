use sqlx::SqlitePool;
use tracing::info;

use crate::{
    authentication::hash_password_argon2,
    config::AdminSeed,
    data_formats::{RegisterRequest, UpdateUserRequest},
    errors::RequestError,
    models::User,
    roles::Role,
};

use super::{get_user_by_email, get_user_by_id, QueryBuilder, USER_COLUMNS};

/// `user.password` must already be hashed.
pub async fn insert_user(
    pool: &SqlitePool,
    user: &RegisterRequest,
    role: Role,
) -> Result<User, RequestError> {
    let query = format!(
        "INSERT INTO users (email, username, password, user_type)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}"
    );
    let mut tx = pool.begin().await?;
    let user = sqlx::query_as::<_, User>(&query)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password)
        .bind(role.code())
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(user)
}

pub async fn update_user_in_db(
    pool: &SqlitePool,
    id: i64,
    UpdateUserRequest {
        email,
        bio,
        image,
        username,
        password,
    }: UpdateUserRequest,
) -> Result<User, RequestError> {
    let password = match password {
        Some(password) => Some(
            hash_password_argon2(password)
                .await
                .map_err(|_| RequestError::ServerError)?,
        ),
        None => None,
    };

    let built = QueryBuilder::new("UPDATE users SET ", ", ")
        .add_param("email", email)
        .add_param("bio", bio)
        .add_param("image", image)
        .add_param("username", username)
        .add_param("password", password)
        .build();

    if let Some((query, params)) = built {
        let query = format!("{query} WHERE id = ?");
        let mut tx = pool.begin().await?;
        let mut update = sqlx::query(&query);
        for param in params {
            update = update.bind(param);
        }
        update.bind(id).execute(&mut tx).await?;
        tx.commit().await?;
    }

    get_user_by_id(pool, id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))
}

pub async fn set_user_role_in_db(
    pool: &SqlitePool,
    id: i64,
    role: Role,
) -> Result<User, RequestError> {
    let result = sqlx::query("UPDATE users SET user_type = $1 WHERE id = $2")
        .bind(role.code())
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }
    get_user_by_id(pool, id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))
}

pub async fn set_user_active_in_db(
    pool: &SqlitePool,
    id: i64,
    active: bool,
) -> Result<User, RequestError> {
    let result = sqlx::query("UPDATE users SET is_active = $1 WHERE id = $2")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }
    get_user_by_id(pool, id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))
}

/// Creates the configured admin unless an account with that email exists.
pub async fn seed_admin(pool: &SqlitePool, seed: &AdminSeed) -> anyhow::Result<()> {
    if get_user_by_email(pool, &seed.email)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to look up admin: {:?}", e))?
        .is_some()
    {
        return Ok(());
    }
    let password = hash_password_argon2(seed.password.clone()).await?;
    let request = RegisterRequest {
        email: seed.email.clone(),
        username: seed.username.clone(),
        password,
    };
    let admin = insert_user(pool, &request, Role::Admin)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed admin: {:?}", e))?;
    info!(user_id = admin.id, "Seeded admin account {}", admin.email);
    Ok(())
}
