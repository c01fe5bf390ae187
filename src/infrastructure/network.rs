//! LAN address detection

use tokio::net::UdpSocket;

const LOOPBACK: &str = "127.0.0.1";

/// Address of the interface that routes towards the internet, or loopback.
///
/// Connecting a UDP socket sends no packets; it only selects the outgoing interface.
pub async fn lan_ip() -> String {
    async fn detect() -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect("8.8.8.8:1").await?;
        Ok(socket.local_addr()?.ip().to_string())
    }

    detect().await.unwrap_or_else(|_| LOOPBACK.to_owned())
}
