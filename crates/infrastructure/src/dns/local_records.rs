use rustc_hash::FxHashMap;
use sinkhole_application::ports::LocalResolutionPort;
use sinkhole_domain::config::LocalDnsRecord;
use sinkhole_domain::RecordType;
use std::net::IpAddr;
use tracing::warn;

#[derive(Default)]
struct Addresses {
    v4: Option<IpAddr>,
    v6: Option<IpAddr>,
}

impl Addresses {
    fn set(&mut self, ip: IpAddr) {
        match ip {
            IpAddr::V4(_) => self.v4 = Some(ip),
            IpAddr::V6(_) => self.v6 = Some(ip),
        }
    }

    fn for_type(&self, record_type: RecordType) -> Option<IpAddr> {
        match record_type {
            RecordType::A => self.v4,
            RecordType::AAAA => self.v6,
            _ => None,
        }
    }
}

/// Static overrides from `[[dns.local_records]]`.
///
/// Exact names are checked first, then `*.suffix` entries from the most
/// specific suffix outwards. A wildcard never matches the bare suffix.
#[derive(Default)]
pub struct LocalRecordsResolver {
    exact: FxHashMap<String, Addresses>,
    wildcard: FxHashMap<String, Addresses>,
}

impl LocalRecordsResolver {
    pub fn new(records: &[LocalDnsRecord]) -> Self {
        let mut resolver = Self::default();
        for record in records {
            let ip: IpAddr = match record.ip.parse() {
                Ok(ip) => ip,
                Err(_) => {
                    warn!(hostname = %record.hostname, ip = %record.ip, "Skipping local record with invalid IP");
                    continue;
                }
            };

            let fqdn = record.fqdn();
            match fqdn.strip_prefix("*.") {
                Some(suffix) => resolver.wildcard.entry(suffix.to_string()).or_default().set(ip),
                None => resolver.exact.entry(fqdn).or_default().set(ip),
            }
        }
        resolver
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalResolutionPort for LocalRecordsResolver {
    fn find_resolution(&self, domain: &str, record_type: RecordType) -> Option<IpAddr> {
        let domain = domain.trim_end_matches('.').to_ascii_lowercase();

        if let Some(ip) = self.exact.get(&domain).and_then(|a| a.for_type(record_type)) {
            return Some(ip);
        }

        let mut rest = domain.as_str();
        while let Some((_, parent)) = rest.split_once('.') {
            if let Some(ip) = self.wildcard.get(parent).and_then(|a| a.for_type(record_type)) {
                return Some(ip);
            }
            rest = parent;
        }
        None
    }
}
