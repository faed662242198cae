// StatsD emitter: timing lines over UDP
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use uptime_core::domain::MetricsTarget;
use uptime_core::port::{EmitError, MetricEmitter};
use uptime_core::{AppError, Result};

/// StatsD timing line: `<name>:<milliseconds>|ms`
pub fn format_timing(name: &str, elapsed: Duration) -> String {
    format!("{}:{:.3}|ms", name, elapsed.as_secs_f64() * 1000.0)
}

/// Fire-and-forget StatsD client
///
/// The target is resolved on every send, so a backend that moves or comes
/// up late is picked up without a restart.
pub struct StatsdEmitter {
    target: String,
    v4: UdpSocket,
    v6: Option<UdpSocket>,
}

impl StatsdEmitter {
    /// Bind local sockets for sending to `target`
    ///
    /// # Errors
    /// - AppError::Internal if no IPv4 socket can be bound
    pub async fn bind(target: &MetricsTarget) -> Result<Self> {
        let v4 = UdpSocket::bind(("0.0.0.0", 0))
            .await
            .map_err(|e| AppError::Internal(format!("StatsD socket bind failed: {e}")))?;

        let v6 = match UdpSocket::bind(("::", 0)).await {
            Ok(socket) => Some(socket),
            Err(e) => {
                debug!(error = %e, "IPv6 unavailable for StatsD, using IPv4 only");
                None
            }
        };

        Ok(Self {
            target: target.address(),
            v4,
            v6,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn socket_for(&self, addr: &SocketAddr) -> Option<&UdpSocket> {
        match addr {
            SocketAddr::V4(_) => Some(&self.v4),
            SocketAddr::V6(_) => self.v6.as_ref(),
        }
    }
}

#[async_trait]
impl MetricEmitter for StatsdEmitter {
    async fn timing(&self, name: &str, elapsed: Duration) -> std::result::Result<(), EmitError> {
        let line = format_timing(name, elapsed);

        let mut addrs = tokio::net::lookup_host(self.target.as_str())
            .await
            .map_err(|e| EmitError::Unresolvable(format!("{}: {e}", self.target)))?;

        let (socket, addr) = addrs
            .find_map(|addr| self.socket_for(&addr).map(|socket| (socket, addr)))
            .ok_or_else(|| EmitError::Unresolvable(self.target.clone()))?;

        match socket.send_to(line.as_bytes(), addr).await {
            Ok(_) => {
                debug!(target_addr = %addr, line = %line, "Metric sent");
                Ok(())
            }
            Err(e) => {
                warn!(target_addr = %addr, error = %e, "StatsD send failed");
                Err(EmitError::Io(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    async fn receiver() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    async fn recv_line(socket: &UdpSocket) -> String {
        let mut buf = [0u8; 512];
        let (n, _) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .expect("no datagram received")
            .unwrap();
        String::from_utf8_lossy(&buf[..n]).into_owned()
    }

    #[test]
    fn test_format_timing() {
        assert_eq!(
            format_timing("uptime.west", Duration::from_micros(250_500)),
            "uptime.west:250.500|ms"
        );
        assert_eq!(format_timing("uptime.east", Duration::ZERO), "uptime.east:0.000|ms");
    }

    #[tokio::test]
    async fn test_timing_sends_datagram() {
        let (socket, port) = receiver().await;
        let emitter = StatsdEmitter::bind(&MetricsTarget::new("127.0.0.1", port))
            .await
            .unwrap();

        emitter
            .timing("uptime.west", Duration::from_millis(42))
            .await
            .unwrap();

        assert_eq!(recv_line(&socket).await, "uptime.west:42.000|ms");
    }

    #[tokio::test]
    async fn test_each_timing_is_its_own_datagram() {
        let (socket, port) = receiver().await;
        let emitter = StatsdEmitter::bind(&MetricsTarget::new("127.0.0.1", port))
            .await
            .unwrap();

        emitter.timing("uptime.west", Duration::from_millis(1)).await.unwrap();
        emitter.timing("uptime.east", Duration::from_millis(2)).await.unwrap();

        assert_eq!(recv_line(&socket).await, "uptime.west:1.000|ms");
        assert_eq!(recv_line(&socket).await, "uptime.east:2.000|ms");
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_reported() {
        let emitter = StatsdEmitter::bind(&MetricsTarget::new("statsd.invalid", 8125))
            .await
            .unwrap();
        let err = assert_err!(emitter.timing("uptime.west", Duration::from_millis(1)).await);
        assert!(matches!(err, EmitError::Unresolvable(_)));
    }
}
