pub mod text;

use std::{sync::OnceLock, time::Duration};

use log::warn;
use reqwest::{
    ClientBuilder, StatusCode,
    header::{self, HeaderMap},
};
use url::Url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

pub fn get_user_agent<'a>() -> &'a str {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
}

pub fn create_client() -> &'static reqwest::Client {
    static LAZZY_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    LAZZY_CLIENT.get_or_init(|| {
        create_client_builder()
            .default_headers(get_default_headers())
            .build()
            .unwrap()
    })
}

pub fn create_client_builder() -> ClientBuilder {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .read_timeout(Duration::from_secs(30))
        .user_agent(get_user_agent())
        .danger_accept_invalid_certs(true)
        .cookie_store(true)
}

pub fn get_default_headers() -> HeaderMap {
    let mut headers = HeaderMap::default();

    headers.insert(
        header::ACCEPT,
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8"
            .parse()
            .unwrap(),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        "en-US,en;q=0.9,ar;q=0.8".parse().unwrap(),
    );
    headers.insert(header::CACHE_CONTROL, "no-cache".parse().unwrap());
    headers.insert(header::PRAGMA, "no-cache".parse().unwrap());
    headers.insert("X-Requested-With", "XMLHttpRequest".parse().unwrap());
    headers.insert(
        "Sec-Ch-Ua",
        r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#
            .parse()
            .unwrap(),
    );
    headers.insert("Sec-Ch-Ua-Mobile", "?0".parse().unwrap());
    headers.insert("Sec-Ch-Ua-Platform", "\"Windows\"".parse().unwrap());
    headers.insert("Sec-Fetch-Dest", "document".parse().unwrap());
    headers.insert("Sec-Fetch-Mode", "navigate".parse().unwrap());
    headers.insert("Sec-Fetch-Site", "same-origin".parse().unwrap());
    headers.insert("Sec-Fetch-User", "?1".parse().unwrap());
    headers.insert("Upgrade-Insecure-Requests", "1".parse().unwrap());

    headers
}

/// Origin of `url` with a trailing slash, used as the Referer so requests
/// look like in-site navigation. Falls back to the url itself when it does
/// not parse.
pub fn origin_referer(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| format!("{}/", u.origin().ascii_serialization()))
        .unwrap_or_else(|| url.to_owned())
}

/// Fetch a page as text. Non-2xx responses are not an error here: the body
/// is still returned and inspected upstream. A transport failure triggers a
/// single blind retry without the per-request timeout.
pub async fn fetch_page(url: &str, referer: &str) -> anyhow::Result<(StatusCode, String)> {
    let client = create_client();

    let first_try = client
        .get(url)
        .header(header::REFERER, referer)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await;

    let res = match first_try {
        Ok(res) => res,
        Err(err) => {
            warn!("[fetch] {url} failed ({err}), retrying without timeout");
            client
                .get(url)
                .header(header::REFERER, referer)
                .send()
                .await?
        }
    };

    let status = res.status();
    let body = res.text().await?;
    Ok((status, body))
}

/// Run `attempt` until it succeeds, allowing `max_extra_attempts` full
/// restarts after the first failure. Returns `None` on exhaustion; failures
/// are logged, never propagated.
pub async fn with_retries<T, F, Fut>(max_extra_attempts: usize, mut attempt: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<T>>,
{
    for attempt_no in 0..=max_extra_attempts {
        match attempt().await {
            Ok(value) => return Some(value),
            Err(err) => warn!(
                "attempt {}/{} failed: {err}",
                attempt_no + 1,
                max_extra_attempts + 1
            ),
        }
    }
    None
}
