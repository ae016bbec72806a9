use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};

use crate::errors::RequestError;
use crate::interaction::{
    membership_changes, signal_matches_set, ArticleId, Direction, InteractionKind,
    MembershipSet,
};

pub async fn get_membership_in_db(
    pool: &SqlitePool,
    user_id: i64,
    kind: InteractionKind,
) -> Result<Vec<ArticleId>, RequestError> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        r#"
        SELECT article_id FROM interactions
        WHERE user_id = $1 AND kind = $2
        ORDER BY article_id
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

async fn read_counter(
    tx: &mut Transaction<'_, Sqlite>,
    article_id: ArticleId,
    kind: InteractionKind,
) -> Result<i64, RequestError> {
    let query = format!(
        "SELECT {} FROM articles WHERE id = $1",
        kind.counter_column()
    );
    let row: Option<(i64,)> = sqlx::query_as(&query)
        .bind(article_id)
        .fetch_optional(&mut *tx)
        .await?;
    row.map(|(count,)| count)
        .ok_or(RequestError::NotFound("Article not found"))
}

async fn read_membership(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: i64,
    kind: InteractionKind,
) -> Result<MembershipSet, RequestError> {
    let rows: Vec<(i64,)> =
        sqlx::query_as("SELECT article_id FROM interactions WHERE user_id = $1 AND kind = $2")
            .bind(user_id)
            .bind(kind.as_str())
            .fetch_all(&mut *tx)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Replaces the user's membership set for `kind` and moves the counter of
/// every article that entered or left the set, all in one transaction.
/// Returns the new counter value of `article_id`.
pub async fn toggle_interaction_in_db(
    pool: &SqlitePool,
    user_id: i64,
    article_id: ArticleId,
    kind: InteractionKind,
    direction: Direction,
    membership: &MembershipSet,
) -> Result<i64, RequestError> {
    if !signal_matches_set(membership, article_id, direction) {
        warn!(
            user_id,
            article_id,
            kind = kind.as_str(),
            "Directional signal disagrees with submitted set"
        );
        return Err(RequestError::RunTimeError(
            "Directional signal does not match the submitted set",
        ));
    }

    let mut tx = pool.begin().await?;

    read_counter(&mut tx, article_id, kind).await?;
    let previous = read_membership(&mut tx, user_id, kind).await?;

    sqlx::query("DELETE FROM interactions WHERE user_id = $1 AND kind = $2")
        .bind(user_id)
        .bind(kind.as_str())
        .execute(&mut tx)
        .await?;

    // Ids of articles that no longer exist are dropped here.
    for member in membership {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO interactions (user_id, article_id, kind)
            SELECT $1, id, $2 FROM articles WHERE id = $3
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(*member)
        .execute(&mut tx)
        .await?;
    }

    let current = read_membership(&mut tx, user_id, kind).await?;
    let changes = membership_changes(&previous, &current);
    let update = format!(
        "UPDATE articles SET {column} = MAX(0, {column} + $1) WHERE id = $2",
        column = kind.counter_column()
    );
    for (changed, delta) in &changes {
        sqlx::query(&update)
            .bind(*delta)
            .bind(*changed)
            .execute(&mut tx)
            .await?;
    }

    let count = read_counter(&mut tx, article_id, kind).await?;
    tx.commit().await?;
    info!(
        user_id,
        article_id,
        kind = kind.as_str(),
        changed = changes.len(),
        count,
        "Reconciled interaction"
    );
    Ok(count)
}

/// Resets both counters of an article to the size of its membership sets.
pub async fn recount_article_in_db(
    pool: &SqlitePool,
    article_id: ArticleId,
) -> Result<(i64, i64), RequestError> {
    let row: Option<(i64, i64)> = sqlx::query_as(
        r#"
        UPDATE articles
        SET like_count = (SELECT COUNT(*) FROM interactions
                          WHERE article_id = articles.id AND kind = 'like'),
            save_count = (SELECT COUNT(*) FROM interactions
                          WHERE article_id = articles.id AND kind = 'save')
        WHERE id = $1
        RETURNING like_count, save_count
        "#,
    )
    .bind(article_id)
    .fetch_optional(pool)
    .await?;
    row.ok_or(RequestError::NotFound("Article not found"))
}
