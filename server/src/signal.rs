use log::debug;

/// Resolves once the process is asked to stop, naming the signal.
#[cfg(windows)]
pub async fn wait_shutdown() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!("error, ctrl_c, {:?}", e);
    }
    "ctrl_c"
}

#[cfg(unix)]
pub async fn wait_shutdown() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(v) => v,
        Err(e) => {
            // 注册不了 SIGTERM 时只等 ctrl_c
            debug!("error, signal, {:?}", e);
            let _ = tokio::signal::ctrl_c().await;
            return "ctrl_c";
        }
    };

    tokio::select! {
        _ = terminate.recv() => "terminate",
        _ = tokio::signal::ctrl_c() => "ctrl_c",
    }
}
