//! Boundary consumed by the HTTP surface: one call, one extraction, one
//! outcome. All recoverable conditions are absorbed here or below; only
//! genuinely unexpected failures escape as errors.

use std::time::Instant;

use log::{info, warn};

use crate::{
    extractors::{fragment, player_page, quality_buttons},
    models::ExtractOutcome,
    utils,
};

/// Fetch `url` once, pick the strategy matching the page shape and run it.
///
/// A transport failure is logged and reported as the empty outcome, per the
/// error taxonomy: the caller can only distinguish "no links" from "internal
/// failure", the why stays in the logs.
pub async fn extract(url: &str) -> anyhow::Result<ExtractOutcome> {
    let started = Instant::now();

    let (status, html) = match utils::fetch_page(url, &utils::origin_referer(url)).await {
        Ok(res) => res,
        Err(err) => {
            warn!("[extract] fetching {url} failed: {err}");
            return Ok(ExtractOutcome::Links(vec![]));
        }
    };
    info!("[extract] {url} responded {status}");

    let outcome = if html.contains(fragment::FRAGMENT_MARKER) {
        // the sandbox is !Send, keep the whole decode on a blocking thread
        let source = url.to_owned();
        let links =
            tokio::task::spawn_blocking(move || quality_buttons::decode_page(&html, &source))
                .await??;
        ExtractOutcome::Links(links)
    } else if player_page::find_player_link(&html).is_some() {
        ExtractOutcome::Player(player_page::extract(url).await)
    } else {
        warn!(
            "[extract] no known page shape at {url}: {:?}",
            fragment::classify_miss(&html)
        );
        ExtractOutcome::Links(vec![])
    };

    info!(
        "[extract] {url} finished in {:.3}s",
        started.elapsed().as_secs_f64()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test(tokio::test)]
    #[ignore = "hits the live site"]
    async fn should_extract() {
        let outcome = extract("https://www.faselhds.biz/video/99").await.unwrap();
        println!("{outcome:#?}");
    }
}
