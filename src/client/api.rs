use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::{ClientError, FeedCache, InteractionApi, SessionGuard};
use crate::data_formats::*;
use crate::errors::RequestErrorJsonWrapper;
use crate::interaction::{ArticleId, Direction, InteractionKind, MembershipSet};

/// HTTP client for the REST API. Every failed response passes through the
/// [`SessionGuard`] before it reaches the caller.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionGuard>,
    feed: FeedCache<Vec<ArticleResponse>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionGuard>) -> Self {
        Self::with_feed_cache(base_url, session, FeedCache::from_env())
    }

    pub fn with_feed_cache(
        base_url: impl Into<String>,
        session: Arc<SessionGuard>,
        feed: FeedCache<Vec<ArticleResponse>>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            session,
            feed,
        }
    }

    pub fn session(&self) -> &Arc<SessionGuard> {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.session.token().ok_or(ClientError::NotLoggedIn)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.json::<RequestErrorJsonWrapper>().await.ok();
        let code = body.as_ref().map(|body| body.code.clone());
        if let Some(event) = self.session.inspect(status.as_u16(), code.as_deref()) {
            debug!(?event, "Session ended by response {}", status);
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message: body
                .map(|body| body.message())
                .unwrap_or_else(|| status.to_string()),
        })
    }

    async fn send_user<B: Serialize>(
        &self,
        path: &str,
        user: B,
    ) -> Result<UserResponse, ClientError> {
        let request = self
            .request(Method::POST, path)
            .json(&UserWrapper::wrap_with_user_data(user));
        let UserWrapper { user } = self.send::<UserWrapper<UserResponse>>(request).await?;
        self.session.on_login(user.token.clone());
        self.feed.invalidate().await;
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserResponse, ClientError> {
        self.send_user(
            "/users/login",
            LoginRequest {
                email: email.to_owned(),
                password: password.to_owned(),
            },
        )
        .await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserResponse, ClientError> {
        self.send_user(
            "/users",
            RegisterRequest {
                username: username.to_owned(),
                email: email.to_owned(),
                password: password.to_owned(),
            },
        )
        .await
    }

    pub async fn logout(&self) {
        self.session.logout();
        self.feed.invalidate().await;
    }

    pub async fn current_user(&self) -> Result<UserResponse, ClientError> {
        let request = self.authed(Method::GET, "/user")?;
        let UserWrapper { user } = self.send::<UserWrapper<UserResponse>>(request).await?;
        Ok(user)
    }

    /// Newest articles, served from the feed cache while it is fresh.
    pub async fn feed(&self) -> Result<Vec<ArticleResponse>, ClientError> {
        self.feed.get_or_fetch(|| self.fetch_articles()).await
    }

    async fn fetch_articles(&self) -> Result<Vec<ArticleResponse>, ClientError> {
        let request = match self.session.token() {
            Some(token) => self.request(Method::GET, "/posts").bearer_auth(token),
            None => self.request(Method::GET, "/posts"),
        };
        let MultipleArticlesWrapper { articles, .. } = self.send(request).await?;
        Ok(articles)
    }

    pub async fn article(&self, id: ArticleId) -> Result<ArticleResponse, ClientError> {
        let path = format!("/posts/{id}");
        let request = match self.session.token() {
            Some(token) => self.request(Method::GET, &path).bearer_auth(token),
            None => self.request(Method::GET, &path),
        };
        let ArticleWrapper { article } = self.send(request).await?;
        Ok(article)
    }

    pub async fn create_article(
        &self,
        article: CreateArticleRequest,
    ) -> Result<ArticleResponse, ClientError> {
        let request = self
            .authed(Method::POST, "/posts")?
            .json(&ArticleWrapper { article });
        let ArticleWrapper { article } = self.send(request).await?;
        self.feed.invalidate().await;
        Ok(article)
    }

    pub async fn delete_article(&self, id: ArticleId) -> Result<(), ClientError> {
        let request = self.authed(Method::DELETE, &format!("/posts/{id}"))?;
        let SuccessResponse { success } = self.send(request).await?;
        self.feed.invalidate().await;
        if !success {
            return Err(ClientError::Rejected("Article was not deleted".to_owned()));
        }
        Ok(())
    }

    pub async fn events(&self) -> Result<Vec<EventResponse>, ClientError> {
        let MultipleEventsWrapper { events } =
            self.send(self.request(Method::GET, "/events")).await?;
        Ok(events)
    }
}

#[async_trait]
impl InteractionApi for ApiClient {
    async fn send_membership(
        &self,
        article_id: ArticleId,
        kind: InteractionKind,
        direction: Direction,
        membership: &MembershipSet,
    ) -> Result<ToggleResponse, ClientError> {
        let members = Some(membership.iter().copied().collect::<Vec<_>>());
        let body = match kind {
            InteractionKind::Like => MembershipRequest {
                liked_articles: members,
                saved_articles: None,
            },
            InteractionKind::Save => MembershipRequest {
                liked_articles: None,
                saved_articles: members,
            },
        };
        let request = self
            .authed(Method::POST, &format!("/posts/{article_id}"))?
            .query(&[(kind.as_str(), direction.signal())])
            .json(&body);
        let response: ToggleResponse = self.send(request).await?;
        if response.success {
            self.feed.invalidate().await;
        }
        Ok(response)
    }
}
