use mtls_certificate_picker::{
    config::Config, routes, CertificateSessionController, CommandDispatcher, FileHandleStore,
    FileKeyStore, TrustPolicy,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mtls_certificate_picker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        key_store = %config.key_store_dir.display(),
        state_file = %config.state_file.display(),
        "Starting mTLS certificate picker on port {}",
        config.port
    );

    let mut trust = TrustPolicy::platform_default();
    if let Some(path) = &config.extra_roots {
        trust = trust.with_additional_pem_file(path)?;
        tracing::info!(path = %path.display(), anchors = trust.anchor_count(), "Loaded extra trust anchors");
    }

    // Headless host: no interactive chooser is attached, so selectCertificate
    // and requestCertificateAccess report NO_ACTIVITY.
    let controller = CertificateSessionController::new(
        Arc::new(FileKeyStore::new(&config.key_store_dir)),
        Arc::new(FileHandleStore::new(&config.state_file)),
    )
    .with_trust_policy(trust)
    .with_timeouts(config.timeouts);

    let app = routes::router(Arc::new(CommandDispatcher::new(Arc::new(controller))));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
