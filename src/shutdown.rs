use tracing::{info, warn};

/// Completes on the first SIGINT, SIGTERM or SIGHUP.
#[cfg(unix)]
pub async fn signal() {
    use tokio::signal::unix::{SignalKind, signal as listen};

    let (Ok(mut term), Ok(mut hup)) = (
        listen(SignalKind::terminate()),
        listen(SignalKind::hangup()),
    ) else {
        warn!("Could not install SIGTERM/SIGHUP handlers, only Ctrl-C will stop the bot");
        ctrl_c().await;
        return;
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = term.recv() => info!("Received SIGTERM"),
        _ = hup.recv() => info!("Received SIGHUP"),
    }
}

#[cfg(not(unix))]
pub async fn signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT"),
        Err(e) => {
            warn!("Could not listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
