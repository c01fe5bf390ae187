//! Bundled front-end page

use crate::infrastructure::settings::BridgeSettings;
use axum::response::Html;
use di_axum::Inject;
use log::error;
use std::path::Path;

pub async fn index(Inject(settings): Inject<BridgeSettings>) -> Html<String> {
    let path = Path::new(&settings.static_dir).join("index.html");

    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page),
        Err(e) => {
            error!("could not load {}: {e}", path.display());
            Html(format!(
                "<h1>Error</h1><p>Could not load {}. Ensure the file exists.</p><p>Details: {}</p>",
                escape(&path.display().to_string()),
                escape(&e.to_string()),
            ))
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
