//! The Safe-URL Gate: protocol, IP-literal, and DNS-rebinding filter.
//!
//! Rejects anything that isn't plain HTTP(S), any IP literal inside a private
//! or special-use range, and — via DNS resolution — any hostname that
//! currently resolves to one of those same ranges (the rebinding guard).

use std::net::IpAddr;
use std::sync::OnceLock;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use url::Url;

/// Outcome of a safe-URL check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyDecision {
    pub safe: bool,
    pub reason: Option<String>,
}

impl SafetyDecision {
    fn safe() -> Self {
        Self {
            safe: true,
            reason: None,
        }
    }

    fn unsafe_because(reason: impl Into<String>) -> Self {
        Self {
            safe: false,
            reason: Some(reason.into()),
        }
    }
}

fn blocked_nets() -> &'static [IpNet] {
    static NETS: OnceLock<Vec<IpNet>> = OnceLock::new();
    NETS.get_or_init(|| {
        vec![
            // Loopback
            IpNet::V4(Ipv4Net::new([127, 0, 0, 0].into(), 8).unwrap()),
            IpNet::V6(Ipv6Net::new(std::net::Ipv6Addr::LOCALHOST, 128).unwrap()),
            // RFC1918
            IpNet::V4(Ipv4Net::new([10, 0, 0, 0].into(), 8).unwrap()),
            IpNet::V4(Ipv4Net::new([172, 16, 0, 0].into(), 12).unwrap()),
            IpNet::V4(Ipv4Net::new([192, 168, 0, 0].into(), 16).unwrap()),
            // Link-local
            IpNet::V4(Ipv4Net::new([169, 254, 0, 0].into(), 16).unwrap()),
            IpNet::V6(Ipv6Net::new("fe80::".parse().unwrap(), 10).unwrap()),
            // Unique-local (IPv6)
            IpNet::V6(Ipv6Net::new("fc00::".parse().unwrap(), 7).unwrap()),
            // Invalid / "this network"
            IpNet::V4(Ipv4Net::new([0, 0, 0, 0].into(), 8).unwrap()),
        ]
    })
}

fn is_blocked_ip(ip: IpAddr) -> bool {
    blocked_nets().iter().any(|net| net.contains(&ip))
}

/// The safe-URL gate's public contract. A trait so the crawler can be
/// exercised in tests against a permissive double without binding every
/// fetch to real DNS resolution.
#[async_trait]
pub trait UrlSafetyGate: Send + Sync {
    async fn is_safe(&self, url: &Url) -> SafetyDecision;
}

/// Resolves hosts and rejects requests that target, or DNS-rebind to, a
/// private/loopback/link-local/unique-local address.
pub struct SafeUrlGate {
    resolver: TokioAsyncResolver,
}

impl SafeUrlGate {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio_from_system_conf()
                .unwrap_or_else(|_| {
                    TokioAsyncResolver::tokio(Default::default(), Default::default())
                }),
        }
    }
}

#[async_trait]
impl UrlSafetyGate for SafeUrlGate {
    /// Checks a URL's scheme, IP-literal host, and (if the host is a name)
    /// every A/AAAA record it currently resolves to.
    async fn is_safe(&self, url: &Url) -> SafetyDecision {
        if url.scheme() != "http" && url.scheme() != "https" {
            return SafetyDecision::unsafe_because(format!(
                "unsupported scheme: {}",
                url.scheme()
            ));
        }

        let Some(host) = url.host_str() else {
            return SafetyDecision::unsafe_because("URL has no host");
        };

        if let Ok(ip) = host.parse::<IpAddr>() {
            return if is_blocked_ip(ip) {
                SafetyDecision::unsafe_because(format!("private IP address blocked: {ip}"))
            } else {
                SafetyDecision::safe()
            };
        }

        match self.resolver.lookup_ip(host).await {
            Ok(lookup) => {
                for ip in lookup.iter() {
                    if is_blocked_ip(ip) {
                        return SafetyDecision::unsafe_because(format!(
                            "host {host} resolves to a private IP address: {ip}"
                        ));
                    }
                }
                SafetyDecision::safe()
            }
            // DNS failure is non-fatal: let the fetcher fail naturally.
            Err(_) => SafetyDecision::safe(),
        }
    }
}

impl Default for SafeUrlGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_loopback_ipv4() {
        assert!(is_blocked_ip("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn blocks_loopback_ipv6() {
        assert!(is_blocked_ip("::1".parse().unwrap()));
    }

    #[test]
    fn blocks_rfc1918() {
        assert!(is_blocked_ip("10.0.0.5".parse().unwrap()));
        assert!(is_blocked_ip("172.16.5.5".parse().unwrap()));
        assert!(is_blocked_ip("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn blocks_link_local() {
        assert!(is_blocked_ip("169.254.1.1".parse().unwrap()));
        assert!(is_blocked_ip("fe80::1".parse().unwrap()));
    }

    #[test]
    fn blocks_unique_local_ipv6() {
        assert!(is_blocked_ip("fc00::1".parse().unwrap()));
    }

    #[test]
    fn allows_public_ip() {
        assert!(!is_blocked_ip("93.184.216.34".parse().unwrap()));
    }

    #[tokio::test]
    async fn rejects_ftp_scheme() {
        let gate = SafeUrlGate::new();
        let url = Url::parse("ftp://example.com/").unwrap();
        let decision = gate.is_safe(&url).await;
        assert!(!decision.safe);
    }

    #[tokio::test]
    async fn rejects_ip_literal_loopback() {
        let gate = SafeUrlGate::new();
        let url = Url::parse("http://127.0.0.1/").unwrap();
        let decision = gate.is_safe(&url).await;
        assert!(!decision.safe);
    }

    #[tokio::test]
    async fn rejects_ip_literal_rfc1918() {
        let gate = SafeUrlGate::new();
        let url = Url::parse("http://192.168.1.1/").unwrap();
        let decision = gate.is_safe(&url).await;
        assert!(!decision.safe);
    }
}
