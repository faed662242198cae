// Heat Uptime Infrastructure - OpenStack Adapters
// Implements: CredentialResolver (Keystone), StackProbe (Heat)

pub mod client;
pub mod heat;
pub mod keystone;

pub use client::http_client;
pub use heat::HeatProbe;
pub use keystone::{IdentityVersion, KeystoneResolver};

#[cfg(test)]
pub(crate) mod test_server {
    use axum::Router;

    /// Serve `app` on an ephemeral local port, returning its base URL
    pub async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// A server that sends 200 headers and the first byte of a JSON body,
    /// then stalls
    pub async fn stalled_body() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = [0u8; 4096];
                    let _ = stream.read(&mut request).await;
                    let _ = stream
                        .write_all(
                            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                              Content-Length: 64\r\n\r\n{",
                        )
                        .await;
                    tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                });
            }
        });
        format!("http://{addr}")
    }

    /// A base URL nothing listens on
    pub async fn closed_port() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }
}
