use axum::response::Html;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head><title>polkadot-parachain-exporter</title></head>
<body>
    <ul>
        <li><a href="/metrics">/metrics</a></li>
        <li><a href="/healthz">/healthz</a></li>
    </ul>
</body>
</html>
"#;

/// Fallback for every other path: links to the real endpoints.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
