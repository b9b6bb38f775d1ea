//! `segfetch probe <url>` – HEAD only, print the size.

use anyhow::{Context, Result};
use segfetch_core::config;
use segfetch_core::fetch_head::probe_size;
use segfetch_core::transport::{CurlOptions, CurlTransport};

pub async fn run_probe(url: &str) -> Result<()> {
    let cfg = config::load_or_init()?;
    let transport = CurlTransport::new(CurlOptions::from_config(&cfg));
    let size = tokio::task::spawn_blocking({
        let url = url.to_string();
        move || probe_size(&transport, &url)
    })
    .await
    .context("probe task join")??;
    println!("{} bytes", size);
    Ok(())
}
