//! External resources fetched into the prompt.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

const FETCH_TIMEOUT_SECS: u64 = 30;

fn body_pattern() -> &'static Regex {
    static BODY: OnceLock<Regex> = OnceLock::new();
    BODY.get_or_init(|| {
        Regex::new(r"(?is)<body\b[^>]*>.*?</body\s*>").expect("body pattern is valid")
    })
}

/// The `<body>` element of an HTML document, or the whole document.
pub fn extract_body(document: &str) -> &str {
    body_pattern()
        .find(document)
        .map(|m| m.as_str())
        .unwrap_or(document)
}

/// A fetched resource, or the error that prevented it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub url: String,
    pub body: Result<String, String>,
}

/// GET each URL in order. Failures are recorded, never returned.
pub async fn fetch_all(urls: &[String]) -> Vec<Resource> {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent(concat!("arcode/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            return urls
                .iter()
                .map(|url| Resource {
                    url: url.clone(),
                    body: Err(e.to_string()),
                })
                .collect()
        }
    };

    let mut resources = Vec::with_capacity(urls.len());
    for url in urls {
        debug!("Fetching resource {}", url);
        let body = fetch_one(&client, url).await;
        if let Err(e) = &body {
            warn!("Failed to fetch {}: {}", url, e);
        }
        resources.push(Resource {
            url: url.clone(),
            body,
        });
    }
    resources
}

async fn fetch_one(client: &reqwest::Client, url: &str) -> Result<String, String> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.to_string())?;
    let text = response.text().await.map_err(|e| e.to_string())?;
    Ok(extract_body(&text).to_string())
}

/// The "Resources:" prompt section, or `None` when no URLs were given.
pub fn render_section(resources: &[Resource]) -> Option<String> {
    if resources.is_empty() {
        return None;
    }
    let mut out = String::from("\nResources:\n");
    for resource in resources {
        match &resource.body {
            Ok(body) => out.push_str(&format!("\nURL: {}\n{}\n", resource.url, body)),
            Err(e) => out.push_str(&format!("Failed to fetch {}: {}\n", resource.url, e)),
        }
    }
    Some(out)
}
