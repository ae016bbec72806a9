use sqlx::SqlitePool;

use crate::data_formats::CreateEventRequest;
use crate::errors::RequestError;
use crate::models::Event;

pub async fn list_events_in_db(pool: &SqlitePool) -> Result<Vec<Event>, RequestError> {
    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, title, description, location, starts_at, created_by, created_at
        FROM events
        ORDER BY starts_at ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(events)
}

pub async fn create_event_in_db(
    pool: &SqlitePool,
    created_by: i64,
    CreateEventRequest {
        title,
        description,
        location,
        starts_at,
    }: CreateEventRequest,
) -> Result<Event, RequestError> {
    let mut tx = pool.begin().await?;
    let event = sqlx::query_as::<_, Event>(
        r#"
        INSERT INTO events (title, description, location, starts_at, created_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, description, location, starts_at, created_by, created_at
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(location)
    .bind(starts_at)
    .bind(created_by)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(event)
}

pub async fn delete_event_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Event not found"));
    }
    Ok(())
}
