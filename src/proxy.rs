use axum::{
    http::{header::CONTENT_TYPE, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::debug;

use crate::config::RewriteRule;
use crate::error::Result;

/// Routes forwarding `GET {source}/*path` to `{destination}/{path}` for
/// each rule. The path is forwarded as received, without decoding, and the
/// query string goes along with it.
pub fn rewrite_routes<S>(rules: &[RewriteRule], client: reqwest::Client) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    rules.iter().fold(Router::new(), |router, rule| {
        let route = format!("{}/*path", rule.source.trim_end_matches('/'));
        let rule = rule.clone();
        let client = client.clone();
        router.route(
            &route,
            get(move |uri: Uri| {
                let rule = rule.clone();
                let client = client.clone();
                async move { forward(&client, &rule, &uri).await }
            }),
        )
    })
}

async fn forward(client: &reqwest::Client, rule: &RewriteRule, uri: &Uri) -> Result<Response> {
    let suffix = uri
        .path()
        .strip_prefix(rule.source.trim_end_matches('/'))
        .unwrap_or_else(|| uri.path());
    let target = rule.target(suffix, uri.query());
    debug!(source = %rule.source, %target, "rewriting request");

    let upstream = client.get(&target).send().await?;
    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let body = upstream.bytes().await?;

    let mut response = (status, body).into_response();
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    Ok(response)
}
