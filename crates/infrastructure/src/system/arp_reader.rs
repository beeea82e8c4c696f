use async_trait::async_trait;
use sinkhole_application::ports::{ArpReader, ArpTable};
use sinkhole_domain::DomainError;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, warn};

/// `aa:bb:cc:dd:ee:ff` or `aa-bb-cc-dd-ee-ff`.
fn is_valid_mac(mac: &str) -> bool {
    if mac.len() != 17 {
        return false;
    }

    let separator = if mac.contains(':') {
        ':'
    } else if mac.contains('-') {
        '-'
    } else {
        return false;
    };

    let parts: Vec<&str> = mac.split(separator).collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Reads the kernel neighbour table from `/proc/net/arp`.
pub struct LinuxArpReader {
    arp_path: PathBuf,
}

impl LinuxArpReader {
    pub fn new() -> Self {
        Self::with_path("/proc/net/arp")
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            arp_path: path.into(),
        }
    }

    fn parse(content: &str) -> ArpTable {
        let mut table = ArpTable::new();

        // IP address  HW type  Flags  HW address         Mask  Device
        // 192.168.1.1 0x1      0x2    aa:bb:cc:dd:ee:ff  *     eth0
        for line in content.lines().skip(1) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                continue;
            }

            let (ip, flags, mac) = (fields[0], fields[2], fields[3]);

            // 0x2 = complete entry
            if flags != "0x2" || mac == "00:00:00:00:00:00" {
                continue;
            }

            if !is_valid_mac(mac) {
                warn!(ip, mac, "Invalid MAC address in ARP table");
                continue;
            }

            match IpAddr::from_str(ip) {
                Ok(addr) => {
                    table.insert(addr, mac.to_ascii_lowercase());
                }
                Err(e) => warn!(error = %e, ip, "Invalid IP in ARP table"),
            }
        }

        table
    }
}

impl Default for LinuxArpReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArpReader for LinuxArpReader {
    async fn read_arp_table(&self) -> Result<ArpTable, DomainError> {
        let content = fs::read_to_string(&self.arp_path)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to read ARP cache: {}", e)))?;

        let table = Self::parse(&content);
        debug!(entries = table.len(), "ARP table parsed");
        Ok(table)
    }
}
