//! HTTP client for the batch, item and mortality endpoints

use futures_util::future::try_join_all;
use log::{debug, info};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::models::{de, Batch, InventoryItem, MortalityReceipt, MortalityRequest};
use crate::{BatchError, Result, CLIENT_INFO};

/// Identifier list endpoints answer with a bare JSON array (or `null`)
struct IdList(Vec<String>);

impl<'de> Deserialize<'de> for IdList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        de::id_list(deserializer).map(IdList)
    }
}

#[derive(Debug, Clone)]
pub struct BatchClient {
    base_url: String,
    http_client: Client,
}

impl BatchClient {
    pub fn new(base_url: impl Into<String>, http_client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| BatchError::UrlError(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .header("X-Client-Info", CLIENT_INFO)
            .send()
            .await?;
        let response = check_status(response, segments).await?;
        Ok(response.json::<T>().await?)
    }

    /// `GET /batches`
    pub async fn list_batch_ids(&self) -> Result<Vec<String>> {
        Ok(self.get_json::<IdList>(&["batches"]).await?.0)
    }

    /// `GET /batch/{id}`
    pub async fn get_batch(&self, id: &str) -> Result<Batch> {
        self.get_json(&["batch", id]).await
    }

    /// Batch ids followed by the details of each, fetched concurrently
    pub async fn list_batches(&self) -> Result<Vec<Batch>> {
        let ids = self.list_batch_ids().await?;
        let batches = try_join_all(ids.iter().map(|id| self.get_batch(id))).await?;
        info!("Loaded {} batches", batches.len());
        Ok(batches)
    }

    /// `GET /uniqueBatchIDs`
    pub async fn unique_batch_ids(&self) -> Result<Vec<String>> {
        Ok(self.get_json::<IdList>(&["uniqueBatchIDs"]).await?.0)
    }

    /// `GET /uniqueBatchesFromCmBatches`
    pub async fn unique_batches_from_cm_batches(&self) -> Result<Vec<String>> {
        Ok(self
            .get_json::<IdList>(&["uniqueBatchesFromCmBatches"])
            .await?
            .0)
    }

    /// `GET /mortalityIDs/{batchId}`
    pub async fn mortality_ids(&self, batch_id: &str) -> Result<Vec<String>> {
        Ok(self
            .get_json::<IdList>(&["mortalityIDs", batch_id])
            .await?
            .0)
    }

    /// `GET /feedmedicineitems`
    pub async fn feed_medicine_items(&self) -> Result<Vec<InventoryItem>> {
        Ok(self
            .get_json::<Option<Vec<InventoryItem>>>(&["feedmedicineitems"])
            .await?
            .unwrap_or_default())
    }

    /// `POST /mortality`; returns the server echo with its assigned id
    pub async fn submit_mortality(&self, request: &MortalityRequest) -> Result<MortalityReceipt> {
        let url = self.endpoint(&["mortality"])?;
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(url)
            .header("X-Client-Info", CLIENT_INFO)
            .json(request)
            .send()
            .await?;
        let response = check_status(response, &["mortality"]).await?;
        let receipt = response.json::<MortalityReceipt>().await?;

        info!(
            "Mortality of {} recorded for batch {} as {}",
            request.count, request.batch_id, receipt.mortality_id
        );
        Ok(receipt)
    }
}

async fn check_status(response: Response, segments: &[&str]) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = text.trim().to_string();
    if status == StatusCode::NOT_FOUND {
        let what = if message.is_empty() {
            format!("/{}", segments.join("/"))
        } else {
            message
        };
        return Err(BatchError::NotFound(what));
    }

    Err(BatchError::ApiError {
        status: status.as_u16(),
        message,
    })
}
