//! Report types and the on-disk line format
//!
//! Every report occupies exactly one line:
//!
//! ```text
//! 2025-01-09 12:00:00 +1100, 203.0.113.5, ifup
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::error::{Error, Result};

/// Timestamp format used in the log files
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Field separator used in the log files
const FIELD_SEPARATOR: &str = ", ";

/// Address family of a report; each family has its own log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// Family of an address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpFamily::V4,
            IpAddr::V6(_) => IpFamily::V6,
        }
    }

    /// Parse `ip` as a literal of this family
    pub fn parse_literal(self, ip: &str) -> Result<IpAddr> {
        let parsed: IpAddr = ip
            .trim()
            .parse()
            .map_err(|_| Error::invalid_input(format!("'{}' is not an {} address", ip, self)))?;

        if IpFamily::of(&parsed) != self {
            return Err(Error::invalid_input(format!(
                "'{}' is not an {} address",
                ip, self
            )));
        }

        Ok(parsed)
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("IPv4"),
            IpFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// A single WAN IP report
///
/// Reports are created by [`DiagnosticService`](crate::DiagnosticService) when a
/// router submits its address, stamped with the server's write time, and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpReport {
    /// Write time of the report
    pub timestamp: DateTime<FixedOffset>,
    /// Reported address
    pub address: IpAddr,
    /// Free-text reason supplied by the router (e.g. "ifup")
    pub reason: Option<String>,
}

impl IpReport {
    /// Create a report, sanitizing the reason so it fits on one line
    pub fn new(timestamp: DateTime<FixedOffset>, address: IpAddr, reason: Option<&str>) -> Self {
        let reason = reason
            .map(sanitize_reason)
            .filter(|r| !r.is_empty());

        Self {
            timestamp,
            address,
            reason,
        }
    }

    /// Address family, which selects the log this report belongs to
    pub fn family(&self) -> IpFamily {
        IpFamily::of(&self.address)
    }

    /// Reason as displayed, empty when none was given
    pub fn reason_str(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }

    /// Formatted timestamp as written to the log
    pub fn timestamp_str(&self) -> String {
        self.timestamp.format(LOG_TIMESTAMP_FORMAT).to_string()
    }

    /// Render as a log line, including the trailing newline
    pub fn to_line(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}\n",
            self.timestamp_str(),
            self.address,
            self.reason_str(),
            sep = FIELD_SEPARATOR
        )
    }

    /// Parse a log line (with or without its terminator)
    pub fn from_line(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut fields = line.splitn(3, FIELD_SEPARATOR);

        let timestamp = fields
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| Error::event_log(format!("Empty log line: '{}'", line)))?;
        let timestamp = DateTime::parse_from_str(timestamp.trim(), LOG_TIMESTAMP_FORMAT)
            .map_err(|e| Error::event_log(format!("Bad timestamp in '{}': {}", line, e)))?;

        let address = fields
            .next()
            .ok_or_else(|| Error::event_log(format!("Missing address in '{}'", line)))?;
        // Lines without a reason end in ", " which trimming reduces to a trailing comma
        let address: IpAddr = address
            .trim()
            .trim_end_matches(',')
            .parse()
            .map_err(|_| Error::event_log(format!("Bad address in '{}'", line)))?;

        let reason = fields.next().map(str::trim).filter(|r| !r.is_empty());

        Ok(Self {
            timestamp,
            address,
            reason: reason.map(str::to_string),
        })
    }
}

/// Replace control characters so a reason can never split a log line
fn sanitize_reason(reason: &str) -> String {
    reason
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Validate that a string is a plausible DNS domain name
///
/// Basic RFC 1035 checks. Used before handing registrar-supplied names to
/// external resolvers, so a name can never be mistaken for a tool option.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::invalid_input("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::invalid_input(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.trim_end_matches('.').split('.') {
        if label.is_empty() {
            return Err(Error::invalid_input(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::invalid_input(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::invalid_input(format!(
                "Domain label contains invalid characters: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::invalid_input(format!(
                "Domain label cannot start or end with hyphen: '{}'",
                label
            )));
        }
    }

    Ok(())
}
