use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::interaction::ArticleId;
use crate::roles::Role;

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct StatusRequest {
    pub active: bool,
}

// ----------------- Article Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct CreateArticleRequest {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub preview_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of the toggle route: the caller's whole new membership set.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MembershipRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked_articles: Option<Vec<ArticleId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_articles: Option<Vec<ArticleId>>,
}

// ----------------- Event Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub starts_at: NaiveDateTime,
}
