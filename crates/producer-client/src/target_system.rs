use producer_core::constants::SECURITY_KEY_HEADER;
use producer_core::{Intelligence, ProducerError};
use reqwest::{Client, Method};

/// Dispatches a bucket of intelligences to the SOI ("target system") that
/// owns them, generalized from `backend.rs::submit_job` to an arbitrary
/// method/path rather than a fixed `POST /submit` (spec.md §4.B/§4.G).
#[derive(Debug, Clone, Default)]
pub struct TargetSystemClient {
    http: Client,
}

impl TargetSystemClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    pub async fn dispatch(
        &self,
        base_url: &str,
        method: &str,
        path: &str,
        api_key: Option<&str>,
        items: &[Intelligence],
    ) -> Result<(), ProducerError> {
        let method: Method = method
            .parse()
            .unwrap_or(Method::POST);
        let url = format!("{base_url}{path}");
        let mut req = self.http.request(method, &url).json(items);
        if let Some(key) = api_key {
            req = req.header(SECURITY_KEY_HEADER, key);
        }

        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProducerError::classify(status, &body, "", ""));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "target_system_tests.rs"]
mod tests;
