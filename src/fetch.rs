// src/fetch.rs

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::error::LoadError;

/// GET the CSV export body. Single attempt, no timeout.
pub async fn fetch_csv(client: &Client, url: &Url) -> Result<Vec<u8>, LoadError> {
    debug!("Fetching CSV from {}", url);
    let resp = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| fetch_error(url, e))?;

    let status = resp.status();
    if !status.is_success() {
        warn!(%url, status = status.as_u16(), "Non-success status");
        return Err(LoadError::Fetch {
            status: Some(status.as_u16()),
            reason: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        });
    }

    let body = resp.bytes().await.map_err(|e| fetch_error(url, e))?.to_vec();
    debug!(bytes = body.len(), "CSV body received");
    Ok(body)
}

fn fetch_error(url: &Url, err: reqwest::Error) -> LoadError {
    warn!(%url, error = %err, "GET failed");
    LoadError::Fetch {
        status: err.status().map(|s| s.as_u16()),
        reason: err.to_string(),
    }
}
