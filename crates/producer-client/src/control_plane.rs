use producer_core::constants::SECURITY_KEY_HEADER;
use producer_core::{Intelligence, ProducerError, RemoteProducerConfig};
use reqwest::Client;

/// Thin wrapper over the control-plane HTTP API (spec.md §4.A).
///
/// Holds its own `reqwest::Client` so connection pooling is shared across
/// calls, the same way the teacher threads one `Client` through
/// `fetch_work`/`submit_job` rather than building one per request.
#[derive(Debug, Clone, Default)]
pub struct ControlPlaneClient {
    http: Client,
}

impl ControlPlaneClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// `GET /apis/producers/{global_id}?type={type}` — fetch the remote
    /// producer config the Config Watcher diffs against its last-seen value.
    pub async fn get_producer_config(
        &self,
        base_url: &str,
        global_id: &str,
        producer_type: &str,
        security_key: Option<&str>,
    ) -> Result<RemoteProducerConfig, ProducerError> {
        let url = format!("{base_url}/apis/producers/{global_id}");
        let mut req = self.http.get(&url).query(&[("type", producer_type)]);
        if let Some(key) = security_key {
            req = req.header(SECURITY_KEY_HEADER, key);
        }

        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProducerError::classify(status, &body, producer_type, global_id));
        }
        Ok(res.json().await?)
    }

    /// `GET /apis/producers/{global_id}/intelligences` — fetch the next batch
    /// of work items (spec.md §4.E).
    pub async fn get_intelligences(
        &self,
        base_url: &str,
        global_id: &str,
        security_key: Option<&str>,
    ) -> Result<Vec<Intelligence>, ProducerError> {
        let url = format!("{base_url}/apis/producers/{global_id}/intelligences");
        let mut req = self.http.get(&url);
        if let Some(key) = security_key {
            req = req.header(SECURITY_KEY_HEADER, key);
        }

        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProducerError::classify(status, &body, "", global_id));
        }
        Ok(res.json().await?)
    }

    /// `PUT /apis/producers/{global_id}/intelligences` — report reconciled
    /// outcomes back to the control plane (spec.md §4.F/§4.G).
    pub async fn update_intelligences(
        &self,
        base_url: &str,
        global_id: &str,
        security_key: Option<&str>,
        items: &[Intelligence],
    ) -> Result<(), ProducerError> {
        let url = format!("{base_url}/apis/producers/{global_id}/intelligences");
        let mut req = self.http.put(&url).json(items);
        if let Some(key) = security_key {
            req = req.header(SECURITY_KEY_HEADER, key);
        }

        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProducerError::classify(status, &body, "", global_id));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "control_plane_tests.rs"]
mod tests;
