use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Waits for ctrl-c, SIGTERM, or an already cancelled token, and cancels the token.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Can't listen for SIGTERM {e:?}");
                std::future::pending::<()>().await
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt");
        },
        _ = terminate => {
            info!("Received termination signal");
        },
        _ = cancelation.cancelled() => {},
    };
    cancelation.cancel();
}
