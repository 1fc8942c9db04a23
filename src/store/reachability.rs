//! Connectivity checks against the mock server.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::config::Target;

/// Tests a TCP connection to `host:port` within `timeout`.
pub async fn can_connect_to(host: &str, port: u16, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(host, port, error = %e, "connection refused");
            false
        }
        Err(_) => {
            debug!(host, port, "connection attempt timed out");
            false
        }
    }
}

/// Whether the target's host accepts TCP connections.
///
/// A url whose host and port cannot be read is reported as not running.
pub async fn server_running(target: &Target) -> bool {
    let Some((host, port)) = target.host_port() else {
        warn!(url = %target.url, "cannot read host and port from url");
        return false;
    };
    can_connect_to(&host, port, target.timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detects_listening_socket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(can_connect_to("127.0.0.1", port, Duration::from_secs(1)).await);

        let target = Target {
            url: format!("http://127.0.0.1:{port}"),
            timeout: Duration::from_secs(1),
        };
        assert!(server_running(&target).await);
    }

    #[tokio::test]
    async fn closed_port_is_not_running() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(!can_connect_to("127.0.0.1", port, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn unparseable_url_is_not_running() {
        let target = Target {
            url: "not a url".to_string(),
            timeout: Duration::from_millis(100),
        };
        assert!(!server_running(&target).await);
    }
}
