mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug)]
pub struct ArticleQueryParams {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "get_default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

/// `?like=1|-1` or `?save=1|-1` on the toggle route.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ToggleQuery {
    #[serde(default)]
    pub like: Option<i64>,
    #[serde(default)]
    pub save: Option<i64>,
}

fn get_default_limit() -> u32 {
    20
}
