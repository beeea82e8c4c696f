//! Reverse lookups
//!
//! PTR questions never touch the blacklist or the forward cache. Loopback
//! addresses are answered locally; private addresses try the client history
//! and the local DNS server before going upstream; everything else is
//! forwarded.

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata::PTR;
use hickory_proto::rr::{Name, RData, Record};
use sinkhole_domain::{DnsQuery, RecordType};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use tracing::debug;

use super::{Resolution, ResolutionPipeline};

const IPV4_REVERSE_SUFFIX: &str = ".in-addr.arpa.";
const IPV6_REVERSE_SUFFIX: &str = ".ip6.arpa.";

pub fn is_reverse_query(query: &DnsQuery) -> bool {
    query.record_type == RecordType::PTR
        || query.domain.ends_with(IPV4_REVERSE_SUFFIX)
        || query.domain.ends_with(IPV6_REVERSE_SUFFIX)
}

/// Decode the address encoded in a reverse name (`4.3.2.1.in-addr.arpa.`
/// or 32 nibbles under `ip6.arpa.`).
pub fn reverse_name_to_ip(domain: &str) -> Option<IpAddr> {
    let domain = domain.to_ascii_lowercase();
    let domain = if domain.ends_with('.') {
        domain
    } else {
        format!("{}.", domain)
    };

    if let Some(labels) = domain.strip_suffix(IPV4_REVERSE_SUFFIX) {
        let octets: Vec<u8> = labels
            .split('.')
            .rev()
            .map(|label| label.parse::<u8>().ok())
            .collect::<Option<_>>()?;
        let octets: [u8; 4] = octets.try_into().ok()?;
        return Some(IpAddr::V4(Ipv4Addr::from(octets)));
    }

    if let Some(labels) = domain.strip_suffix(IPV6_REVERSE_SUFFIX) {
        let nibbles: Vec<u8> = labels
            .split('.')
            .rev()
            .map(|label| match label.len() {
                1 => u8::from_str_radix(label, 16).ok(),
                _ => None,
            })
            .collect::<Option<_>>()?;
        if nibbles.len() != 32 {
            return None;
        }
        let value = nibbles
            .iter()
            .fold(0u128, |acc, nibble| (acc << 4) | u128::from(*nibble));
        return Some(IpAddr::V6(Ipv6Addr::from(value)));
    }

    None
}

pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_link_local() || v4.is_loopback(),
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unique_local() || v6.is_unicast_link_local(),
    }
}

impl ResolutionPipeline {
    pub(super) async fn resolve_ptr(&self, query: &DnsQuery) -> Resolution {
        let ip = match reverse_name_to_ip(&query.domain) {
            Some(ip) if query.record_type == RecordType::PTR => ip,
            _ => return self.forward(query).await,
        };

        if ip.is_loopback() {
            return self.synthetic_ptr(query, "localhost.");
        }

        if !is_private_or_local(&ip) {
            return self.forward(query).await;
        }

        if let Some(ref history) = self.client_history {
            match history.hostname_for_ip(ip).await {
                Ok(Some(hostname)) => {
                    debug!(ip = %ip, hostname = %hostname, "PTR answered from client history");
                    return self.synthetic_ptr(query, &hostname);
                }
                Ok(None) => {}
                Err(e) => debug!(ip = %ip, error = %e, "Client history lookup failed"),
            }
        }

        if let Some(ref local_dns) = self.local_dns {
            let answer = local_dns.exchange(query).await;
            if !answer.answers.is_empty() {
                debug!(ip = %ip, "PTR answered by local DNS server");
                return Resolution::answered(answer.answers, answer.rcode);
            }
        }

        self.forward(query).await
    }

    async fn forward(&self, query: &DnsQuery) -> Resolution {
        let answer = self.upstream.exchange(query).await;
        Resolution::answered(answer.answers, answer.rcode)
    }

    fn synthetic_ptr(&self, query: &DnsQuery, hostname: &str) -> Resolution {
        let target = if hostname.ends_with('.') {
            hostname.to_string()
        } else {
            format!("{}.", hostname)
        };

        match (Name::from_str(&query.domain), Name::from_str(&target)) {
            (Ok(name), Ok(target)) => {
                let record = Record::from_rdata(name, self.local_ttl, RData::PTR(PTR(target)));
                Resolution::answered(vec![record], ResponseCode::NoError)
            }
            _ => Resolution::failed(),
        }
    }
}
