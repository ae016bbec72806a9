use serde::{Deserialize, Serialize};

use super::response::{ArticleResponse, EventResponse};

#[derive(Debug, Deserialize, Serialize)]
pub struct UserWrapper<T> {
    pub user: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ArticleWrapper<T> {
    pub article: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MultipleArticlesWrapper {
    pub articles: Vec<ArticleResponse>,
    #[serde(rename = "articlesCount")]
    pub article_count: usize,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EventWrapper<T> {
    pub event: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MultipleEventsWrapper {
    pub events: Vec<EventResponse>,
}

impl<T> UserWrapper<T> {
    pub fn wrap_with_user_data(request: T) -> UserWrapper<T> {
        UserWrapper { user: request }
    }
}
