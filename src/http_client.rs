use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::config::ProbeSettings;

/// Client for subdomain liveness probes: plain HTTP, short timeouts, invalid certs accepted
/// so redirects to self-signed HTTPS still resolve to a status.
pub fn create_probe_client(settings: &ProbeSettings, max_idle_per_host: usize) -> anyhow::Result<Client> {
    let client = ClientBuilder::new()
        .pool_max_idle_per_host(max_idle_per_host)
        .pool_idle_timeout(Some(Duration::from_secs(30)))
        .tcp_nodelay(true)
        .timeout(settings.http_timeout())
        .connect_timeout(Duration::from_secs(5))
        .use_rustls_tls()
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(settings.user_agent.as_str())
        .danger_accept_invalid_certs(true)
        .build()?;
    Ok(client)
}
