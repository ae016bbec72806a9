use serde::{Deserialize, Serialize};

use crate::interaction::ArticleId;
use crate::models::{Article, Event, User};
use crate::roles::{Profile, Role};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub token: String,
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
    pub role: Role,
    pub liked_articles: Vec<ArticleId>,
    pub saved_articles: Vec<ArticleId>,
    pub profile: Profile,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ArticleResponse {
    pub id: ArticleId,
    pub title: String,
    pub link: String,
    pub preview_image: Option<String>,
    pub author: String,
    pub tags: Vec<String>,
    pub like_count: i64,
    pub save_count: i64,
    pub liked: bool,
    pub saved: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Reply to a like/save toggle.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ToggleResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EventResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(rename = "startsAt")]
    pub starts_at: String,
    pub created_by: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecountResponse {
    pub like_count: i64,
    pub save_count: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessResponse {
    pub success: bool,
}

impl UserResponse {
    pub fn new(
        User {
            id,
            username,
            email,
            bio,
            image,
            ..
        }: User,
        role: Role,
        token: String,
        liked_articles: Vec<ArticleId>,
        saved_articles: Vec<ArticleId>,
    ) -> Self {
        let profile = Profile::new(role, username.clone(), bio.clone(), image.clone());
        UserResponse {
            id,
            username,
            email,
            bio: bio.unwrap_or_default(),
            image,
            token,
            role,
            liked_articles,
            saved_articles,
            profile,
        }
    }
}

impl ArticleResponse {
    pub fn new(
        Article {
            id,
            title,
            link,
            preview_image,
            author_username,
            tags,
            like_count,
            save_count,
            created_at,
            liked,
            saved,
            ..
        }: Article,
    ) -> Self {
        ArticleResponse {
            id,
            title,
            link,
            preview_image,
            author: author_username,
            tags: split_tags(&tags),
            like_count,
            save_count,
            liked,
            saved,
            created_at: created_at.to_string(),
        }
    }
}

impl EventResponse {
    pub fn new(
        Event {
            id,
            title,
            description,
            location,
            starts_at,
            created_by,
            ..
        }: Event,
    ) -> Self {
        EventResponse {
            id,
            title,
            description,
            location,
            starts_at: starts_at.to_string(),
            created_by,
        }
    }
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}
