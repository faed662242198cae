//! Process lifecycle signals

use std::io;

/// Resolve when the process is asked to stop (Ctrl+C, or SIGTERM on unix)
///
/// Returns the name of the signal received. Can be awaited again to catch
/// a second signal.
pub async fn shutdown_requested() -> io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
    }
}
