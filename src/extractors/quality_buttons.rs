//! Primary strategy: run the obfuscated decryptor found in the
//! `quality_change` region and read the decrypted buttons back out of the
//! mutated sandbox DOM.

use std::{sync::OnceLock, time::Duration};

use log::{info, warn};
use scraper::{Html, Selector};

use crate::{
    extractors::fragment,
    models::ExtractedLink,
    sandbox::Sandbox,
    utils::{self, text::scan_manifest_urls},
};

/// How long the decryptor's own timers are allowed to run before the DOM is
/// inspected.
pub const SETTLE_BUDGET: Duration = Duration::from_millis(1000);

/// Decode an already fetched page. Missing fragment is the defined "found
/// nothing" outcome, not an error; the reason only goes to the logs.
pub fn decode_page(html: &str, source_url: &str) -> anyhow::Result<Vec<ExtractedLink>> {
    let Some(fragment_html) = fragment::locate(html) else {
        warn!(
            "[quality_change] no fragment in {source_url}: {:?}",
            fragment::classify_miss(html)
        );
        return Ok(vec![]);
    };

    decode_fragment(fragment_html, source_url)
}

/// Execute the fragment's inline scripts in a disposable sandbox and collect
/// the decrypted links. The sandbox is dropped on every exit path.
pub fn decode_fragment(fragment_html: &str, source_url: &str) -> anyhow::Result<Vec<ExtractedLink>> {
    let sandbox = Sandbox::new(&utils::origin_referer(source_url))?;
    sandbox.seed_fragment(fragment_html)?;

    let scripts = inline_scripts(fragment_html);
    let succeeded = sandbox.run_scripts(scripts.iter().map(String::as_str));
    info!(
        "[quality_change] executed {succeeded}/{} inline script(s)",
        scripts.len()
    );

    sandbox.settle(SETTLE_BUDGET);

    let mutated = sandbox.page_html()?;
    Ok(collect(&mutated))
}

/// Inspect the mutated markup for the expected decrypted buttons, falling
/// back to a raw manifest-url scan when none materialized.
pub fn collect(mutated_html: &str) -> Vec<ExtractedLink> {
    static BUTTON_SELECTOR: OnceLock<Selector> = OnceLock::new();

    let document = Html::parse_fragment(mutated_html);
    let mut results: Vec<ExtractedLink> = document
        .select(BUTTON_SELECTOR.get_or_init(|| Selector::parse("button.hd_btn").unwrap()))
        .filter_map(|btn| {
            let link = btn.value().attr("data-url")?;
            if link.is_empty() {
                return None;
            }
            Some(ExtractedLink {
                quality: btn.text().collect::<String>().trim().to_owned(),
                link: link.to_owned(),
            })
        })
        .collect();

    if results.is_empty() {
        results = scan_manifest_urls(mutated_html)
            .into_iter()
            .map(|link| ExtractedLink {
                quality: "auto".into(),
                link,
            })
            .collect();
    }

    results
}

fn inline_scripts(fragment_html: &str) -> Vec<String> {
    static SCRIPT_SELECTOR: OnceLock<Selector> = OnceLock::new();

    let document = Html::parse_fragment(fragment_html);
    document
        .select(SCRIPT_SELECTOR.get_or_init(|| Selector::parse("script").unwrap()))
        .filter_map(|el| {
            let body = el.text().collect::<String>();
            if body.trim().is_empty() {
                None
            } else {
                Some(body)
            }
        })
        .collect()
}
