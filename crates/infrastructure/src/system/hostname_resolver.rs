use async_trait::async_trait;
use hickory_proto::rr::RData;
use sinkhole_application::ports::HostnameResolver;
use sinkhole_domain::{DnsQuery, DomainError, RecordType};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

use crate::dns::pipeline::ptr::is_private_or_local;
use crate::dns::upstream::{UpstreamAnswer, UpstreamExchanger};

/// Client hostnames via PTR lookups: the local DNS server first for private
/// addresses, then the upstream.
pub struct PtrHostnameResolver {
    upstream: Arc<dyn UpstreamExchanger>,
    local_dns: Option<Arc<dyn UpstreamExchanger>>,
}

impl PtrHostnameResolver {
    pub fn new(upstream: Arc<dyn UpstreamExchanger>) -> Self {
        Self {
            upstream,
            local_dns: None,
        }
    }

    pub fn with_local_dns(mut self, local_dns: Option<Arc<dyn UpstreamExchanger>>) -> Self {
        self.local_dns = local_dns;
        self
    }

    pub fn ip_to_reverse_domain(ip: &IpAddr) -> String {
        match ip {
            IpAddr::V4(v4) => {
                let o = v4.octets();
                format!("{}.{}.{}.{}.in-addr.arpa.", o[3], o[2], o[1], o[0])
            }
            IpAddr::V6(v6) => {
                let mut nibbles = Vec::with_capacity(32);
                for byte in v6.octets().iter().rev() {
                    nibbles.push(format!("{:x}", byte & 0x0f));
                    nibbles.push(format!("{:x}", byte >> 4));
                }
                format!("{}.ip6.arpa.", nibbles.join("."))
            }
        }
    }

    fn first_ptr(answer: &UpstreamAnswer) -> Option<String> {
        answer.answers.iter().find_map(|record| match record.data() {
            RData::PTR(ptr) => Some(ptr.to_utf8().trim_end_matches('.').to_string()),
            _ => None,
        })
    }
}

#[async_trait]
impl HostnameResolver for PtrHostnameResolver {
    async fn resolve_hostname(&self, ip: IpAddr) -> Result<Option<String>, DomainError> {
        let query = DnsQuery::new(Self::ip_to_reverse_domain(&ip), RecordType::PTR);
        debug!(ip = %ip, reverse_domain = %query.domain, "Performing PTR lookup");

        if let Some(ref local_dns) = self.local_dns {
            if is_private_or_local(&ip) {
                if let Some(hostname) = Self::first_ptr(&local_dns.exchange(&query).await) {
                    debug!(ip = %ip, hostname = %hostname, "PTR lookup via local DNS server");
                    return Ok(Some(hostname));
                }
            }
        }

        let hostname = Self::first_ptr(&self.upstream.exchange(&query).await);
        if hostname.is_none() {
            debug!(ip = %ip, "PTR lookup returned no records");
        }
        Ok(hostname)
    }
}
