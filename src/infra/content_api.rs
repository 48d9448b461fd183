//! reqwest-backed client for the Mukoko News content API.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use tracing::debug;

use crate::{
    application::content::{ArticleQuery, ContentApi, ContentError},
    config::ContentApiSettings,
    domain::article::{Article, ArticlesResponse},
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct HttpContentApi {
    client: Client,
    endpoint: Url,
}

impl HttpContentApi {
    pub fn new(settings: &ContentApiSettings) -> Result<Self, InfraError> {
        let endpoint = settings
            .base_url
            .join(&settings.articles_path)
            .map_err(|err| InfraError::configuration(format!("content api endpoint: {err}")))?;

        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn user_agent() -> &'static str {
        concat!("mukoko-embed/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, query: &ArticleQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("countries", &query.countries.join(","));
            pairs.append_pair("limit", &query.limit.to_string());
            pairs.append_pair("sort", query.sort.as_str());
            if let Some(category) = query.category.as_deref() {
                pairs.append_pair("category", category);
            }
        }
        url
    }

    async fn handle(resp: Response) -> Result<Vec<Article>, ContentError> {
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(ContentError::transport)?;
        if !status.is_success() {
            return Err(ContentError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        let payload: ArticlesResponse =
            serde_json::from_slice(&bytes).map_err(ContentError::decode)?;
        Ok(payload.articles)
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn get_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, ContentError> {
        let url = self.url(query);
        debug!(target = "mukoko_embed::content_api", url = %url, "fetching articles");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ContentError::transport)?;
        Self::handle(resp).await
    }
}
