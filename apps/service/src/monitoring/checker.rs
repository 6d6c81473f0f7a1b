use std::net::{IpAddr, Ipv6Addr};
use std::time::Duration;

use rand::random;
use surge_ping::{Client as PingClient, Config as PingConfig, ICMP, PingIdentifier, PingSequence};
use tokio::time::timeout;

use super::types::ProbeOutcome;

/// A single reachability probe against the tracked address.
///
/// Probes convert every failure into a `ProbeOutcome`; they never return an
/// error and never block past their configured timeout.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    async fn probe(&self, target: &str) -> ProbeOutcome;
}

/// ICMP echo checker
pub struct IcmpChecker {
    count: u32,
    timeout: Duration,
}

impl IcmpChecker {
    pub fn new(count: u32, timeout: Duration) -> Self {
        Self { count, timeout }
    }
}

#[async_trait::async_trait]
impl Checker for IcmpChecker {
    async fn probe(&self, target: &str) -> ProbeOutcome {
        let ip = match resolve(target).await {
            Ok(ip) => ip,
            Err(detail) => return ProbeOutcome::down(detail),
        };

        let config = match ip {
            IpAddr::V4(_) => PingConfig::default(),
            IpAddr::V6(_) => PingConfig::builder().kind(ICMP::V6).build(),
        };
        // Raw ICMP sockets need elevated privileges; a denied socket is an
        // unreachable verdict, not a crash.
        let client = match PingClient::new(&config) {
            Ok(client) => client,
            Err(e) => return ProbeOutcome::down(format!("icmp socket unavailable: {}", e)),
        };

        let mut pinger = client.pinger(ip, PingIdentifier(random())).await;
        pinger.timeout(self.timeout);

        let mut replies = 0u32;
        let mut lines = Vec::with_capacity(self.count as usize);
        for seq in 0..self.count {
            match pinger.ping(PingSequence(seq as u16), &[0u8; 56]).await {
                Ok((_, rtt)) => {
                    replies += 1;
                    lines.push(format!("seq={} time={:.2}ms", seq, rtt.as_secs_f64() * 1000.0));
                }
                Err(e) => lines.push(format!("seq={} {}", seq, e)),
            }
        }

        // Same semantics as ping(8): success if any echo came back
        let detail = lines.join("\n");
        if replies > 0 { ProbeOutcome::up(detail) } else { ProbeOutcome::down(detail) }
    }
}

/// TCP connect checker: a completed handshake on the given port counts as
/// reachable; the connection is dropped immediately, no data is exchanged
pub struct TcpChecker {
    port: u16,
    timeout: Duration,
}

impl TcpChecker {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

#[async_trait::async_trait]
impl Checker for TcpChecker {
    async fn probe(&self, target: &str) -> ProbeOutcome {
        let addr = format!("{}:{}", bracket_host(target), self.port);

        match timeout(self.timeout, tokio::net::TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                ProbeOutcome::up(format!("tcp:{} ok", self.port))
            }
            Ok(Err(e)) => ProbeOutcome::down(format!("tcp:{} {}", self.port, e)),
            Err(_) => ProbeOutcome::down(format!("tcp:{} connect timed out", self.port)),
        }
    }
}

/// HTTP health checker: GET `http://<address><path>`, reachable only on a
/// literal 200. Redirects are not followed, so a 3xx counts as unreachable.
pub struct HttpChecker {
    client: reqwest::Client,
    path: String,
}

impl HttpChecker {
    pub fn new(path: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client, path: path.into() })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn probe(&self, target: &str) -> ProbeOutcome {
        let url = format!("http://{}{}", bracket_host(target), self.path);

        match self.client.get(&url).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                let detail = format!("status:{}", code);
                if code == 200 { ProbeOutcome::up(detail) } else { ProbeOutcome::down(detail) }
            }
            Err(e) => ProbeOutcome::down(e.to_string()),
        }
    }
}

/// IPv6 literals need brackets in `host:port` strings and URLs
fn bracket_host(target: &str) -> String {
    if target.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]", target)
    } else {
        target.to_string()
    }
}

async fn resolve(target: &str) -> Result<IpAddr, String> {
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ip);
    }
    match tokio::net::lookup_host((target, 0)).await {
        Ok(mut addrs) => addrs
            .next()
            .map(|a| a.ip())
            .ok_or_else(|| format!("no address found for {}", target)),
        Err(e) => Err(format!("dns lookup failed for {}: {}", target, e)),
    }
}
