use std::sync::Arc;
use tracing::{debug, info};

use crate::concurrent::ConcurrentProbe;
use crate::probe::http_probe::{probe_subdomain_liveness, LivenessCheck};

/// Finds live subdomains of one domain by probing `http://<word>.<domain>` for every wordlist entry.
pub struct SubdomainEnumerator {
    http: Arc<dyn LivenessCheck>,
    words: Arc<Vec<String>>,
}

impl SubdomainEnumerator {
    pub fn new(http: Arc<dyn LivenessCheck>, words: Vec<String>) -> Self {
        Self {
            http,
            words: Arc::new(words),
        }
    }

    pub fn candidates(&self, domain: &str) -> Vec<String> {
        self.words
            .iter()
            .map(|word| word.trim().trim_end_matches('.'))
            .filter(|word| !word.is_empty())
            .map(|word| format!("{}.{}", word, domain))
            .collect()
    }

    /// Probes every candidate and returns the live ones, sorted.
    /// Returns only once every probe has finished.
    pub async fn enumerate(&self, probe: &ConcurrentProbe, domain: &str) -> Vec<String> {
        let candidates = self.candidates(domain);
        debug!(domain, candidates = candidates.len(), "Probing subdomain candidates");

        let http = self.http.clone();
        let results = probe
            .execute(candidates, move |candidate| {
                let http = http.clone();
                async move {
                    if probe_subdomain_liveness(http.as_ref(), &candidate).await {
                        Some(candidate)
                    } else {
                        None
                    }
                }
            })
            .await;

        let mut live: Vec<String> = results.into_iter().flatten().flatten().collect();
        live.sort();
        live.dedup();
        for subdomain in &live {
            info!(subdomain = %subdomain, "Found subdomain");
        }
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct LiveSet(Vec<&'static str>);

    #[async_trait]
    impl LivenessCheck for LiveSet {
        async fn get_status(&self, url: &str) -> anyhow::Result<u16> {
            let host = url.trim_start_matches("http://");
            if self.0.iter().any(|h| *h == host) {
                Ok(200)
            } else if host.starts_with("mail.") {
                Ok(403)
            } else {
                anyhow::bail!("connection refused")
            }
        }
    }

    #[tokio::test]
    async fn keeps_only_200_candidates() {
        let words = vec!["www".to_string(), "mail".to_string(), "ftp".to_string(), "api".to_string()];
        let enumerator = SubdomainEnumerator::new(Arc::new(LiveSet(vec!["www.acme.com", "api.acme.com"])), words);
        let live = enumerator.enumerate(&ConcurrentProbe::new(2), "acme.com").await;
        assert_eq!(live, vec!["api.acme.com", "www.acme.com"]);
    }

    #[test]
    fn candidates_skip_blank_words() {
        let enumerator = SubdomainEnumerator::new(Arc::new(LiveSet(vec![])), vec!["www".into(), " ".into(), "dev.".into()]);
        assert_eq!(enumerator.candidates("acme.fr"), vec!["www.acme.fr", "dev.acme.fr"]);
    }
}
