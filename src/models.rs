use chrono::NaiveDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub user_type: i64,
    pub is_active: bool,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub preview_image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub tags: String,
    pub like_count: i64,
    pub save_count: i64,
    pub created_at: NaiveDateTime,
    pub liked: bool,
    pub saved: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: NaiveDateTime,
    pub created_by: i64,
    pub created_at: NaiveDateTime,
}
