use axum::Router;
use reqwest::Client;
use url::Url;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub(crate) async fn serve(router: Router) -> eyre::Result<Url> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            tracing::error!(?err, "Test server error");
        }
    });

    Ok(Url::parse(&format!("http://{addr}/"))?)
}

/// An HTTP client that talks to local test servers directly.
pub(crate) fn local_client() -> eyre::Result<Client> {
    Ok(Client::builder().no_proxy().build()?)
}
