use super::{
    CollectionQuery, ImageryService, QueryRequest, QueryResponse, ServiceError, ServiceResult,
};
use crate::raster::RasterImage;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, IntoUrl, Url};
use tracing::*;

/// Imagery service reached over HTTP: `POST {endpoint}/query` with a JSON
/// `QueryRequest`, answered by a JSON `QueryResponse`
#[derive(Clone, Debug)]
pub struct HttpImageryService {
    client: Client,
    query_url: Url,
}

impl HttpImageryService {
    pub fn new<U: IntoUrl>(endpoint: U) -> ServiceResult<Self> {
        let endpoint = endpoint
            .into_url()
            .map_err(|e| ServiceError::Rejected((0, format!("bad endpoint: {e}"))))?;
        let query_url = Url::parse(&format!("{}/query", endpoint.as_str().trim_end_matches('/')))
            .map_err(|e| ServiceError::Rejected((0, format!("bad endpoint: {e}"))))?;
        Ok(Self {
            client: Client::new(),
            query_url,
        })
    }

    pub fn query_url(&self) -> &Url {
        &self.query_url
    }

    async fn post(&self, query: &CollectionQuery) -> ServiceResult<Vec<RasterImage>> {
        let body = QueryRequest::from(query);
        debug!("POST {} {:?}", self.query_url, body);
        let response = self
            .client
            .post(self.query_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        if let Some(error) = status_error(status, &bytes) {
            return Err(error);
        }

        let response: QueryResponse = serde_json::from_slice(&bytes)?;
        info!("{} returned {} images", self.query_url, response.images.len());
        response
            .images
            .into_iter()
            .map(|record| record.into_image())
            .collect()
    }
}

/// 4xx is the caller's fault and final, 5xx may pass
fn status_error(status: u16, body: &[u8]) -> Option<ServiceError> {
    let text = || String::from_utf8_lossy(body).into_owned();
    match status {
        200..=299 => None,
        400..=499 => Some(ServiceError::Rejected((status, text()))),
        _ => Some(ServiceError::Unavailable(format!("HTTP {status}: {}", text()))),
    }
}

impl ImageryService for HttpImageryService {
    fn query<'a>(
        &'a self,
        query: &'a CollectionQuery,
    ) -> BoxFuture<'a, ServiceResult<Vec<RasterImage>>> {
        self.post(query).boxed()
    }
}
