use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// HTTP collaborator: GET a URL and report the final status code.
#[async_trait]
pub trait LivenessCheck: Send + Sync {
    async fn get_status(&self, url: &str) -> anyhow::Result<u16>;
}

pub struct ReqwestLiveness {
    client: Client,
}

impl ReqwestLiveness {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LivenessCheck for ReqwestLiveness {
    async fn get_status(&self, url: &str) -> anyhow::Result<u16> {
        let resp = self.client.get(url).send().await?;
        Ok(resp.status().as_u16())
    }
}

/// A candidate is live only when `http://candidate` answers 200.
/// Connection errors, timeouts and other statuses all mean not live.
pub async fn probe_subdomain_liveness(http: &dyn LivenessCheck, candidate: &str) -> bool {
    let url = format!("http://{}", candidate);
    match http.get_status(&url).await {
        Ok(200) => true,
        Ok(status) => {
            debug!(candidate, status, "Subdomain answered without 200");
            false
        }
        Err(_) => false,
    }
}
