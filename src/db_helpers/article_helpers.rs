use sqlx::SqlitePool;

use crate::data_formats::{ArticleQueryParams, CreateArticleRequest};
use crate::errors::RequestError;
use crate::models::Article;

const ARTICLE_SELECT: &str = r#"
            SELECT articles.id                                    AS "id",
                   articles.title                                 AS "title",
                   articles.link                                  AS "link",
                   articles.preview_image                         AS "preview_image",
                   articles.author_id                             AS "author_id",
                   users.username                                 AS "author_username",
                   articles.tags                                  AS "tags",
                   articles.like_count                            AS "like_count",
                   articles.save_count                            AS "save_count",
                   articles.created_at                            AS "created_at",
                   EXISTS (SELECT 1
                           FROM   interactions
                           WHERE  interactions.article_id = articles.id
                              AND interactions.kind = 'like'
                              AND interactions.user_id = $1)      AS "liked",
                   EXISTS (SELECT 1
                           FROM   interactions
                           WHERE  interactions.article_id = articles.id
                              AND interactions.kind = 'save'
                              AND interactions.user_id = $1)      AS "saved"
            FROM   articles
                JOIN users
                    ON articles.author_id = users.id
"#;

pub async fn list_all_articles(
    pool: &SqlitePool,
    user_id: Option<i64>,
    ArticleQueryParams { tag, limit, offset }: ArticleQueryParams,
) -> Result<Vec<Article>, RequestError> {
    let query = format!(
        r#"{ARTICLE_SELECT}
            WHERE  ( ',' || articles.tags || ',' LIKE '%,' || $2 || ',%'
                    OR $2 IS NULL )
            ORDER  BY articles.created_at DESC, articles.id DESC
            LIMIT  $3 OFFSET $4
        "#
    );
    let articles = sqlx::query_as::<_, Article>(&query)
        .bind(user_id)
        .bind(tag)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(articles)
}

pub async fn get_article_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
    user_id: Option<i64>,
) -> Result<Option<Article>, RequestError> {
    let query = format!("{ARTICLE_SELECT} WHERE articles.id = $2");
    let article = sqlx::query_as::<_, Article>(&query)
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(article)
}

pub async fn create_article_in_db(
    pool: &SqlitePool,
    author_id: i64,
    CreateArticleRequest {
        title,
        link,
        preview_image,
        tags,
    }: CreateArticleRequest,
) -> Result<Article, RequestError> {
    let tags = join_tags(&tags);
    let mut tx = pool.begin().await?;
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO articles (title, link, preview_image, author_id, tags)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(link)
    .bind(preview_image)
    .bind(author_id)
    .bind(tags)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;

    get_article_by_id_in_db(pool, id, Some(author_id))
        .await?
        .ok_or(RequestError::ServerError)
}

/// Deletes the article and drops it from every user's membership sets.
pub async fn delete_article_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;

    let pruned = sqlx::query("DELETE FROM interactions WHERE article_id = $1")
        .bind(id)
        .execute(&mut tx)
        .await?;

    let result = sqlx::query("DELETE FROM articles WHERE id = $1")
        .bind(id)
        .execute(&mut tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Article not found"));
    }

    tx.commit().await?;
    tracing::info!(
        article_id = id,
        memberships = pruned.rows_affected(),
        "Deleted article"
    );
    Ok(())
}

fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty() && !tag.contains(','))
        .collect::<Vec<_>>()
        .join(",")
}
