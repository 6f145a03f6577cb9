//! Typed diagnostic requests
//!
//! Query parameters are interpreted exactly once, here. Everything downstream
//! works with [`DiagRequest`] and never looks at the raw strings again.
//!
//! | Query                                     | Request                     |
//! |-------------------------------------------|-----------------------------|
//! | `wanip4=A&wanip6=B&reason=R&key=K`        | `Report`                    |
//! | `wanip` (bare), `view=WAN`                | `View { Wan, Html }`        |
//! | nothing, `view=DDNS`                      | `View { Ddns, Html }`       |
//! | `json`, `json=DDNS`                       | `View { Ddns, Json }`       |
//! | `json=WAN`                                | `View { Wan, Json }`        |
//!
//! Keys are case-insensitive. `lines=N` and `family=4|6` refine the WAN view.

use std::collections::HashMap;
use std::net::IpAddr;

use crate::error::{Error, Result};
use crate::model::IpFamily;

/// Output format of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Json,
}

/// Which diagnostic view to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Registrar / DNS reconciliation
    Ddns,
    /// WAN IP timeline of one family's log
    Wan {
        family: IpFamily,
        /// Requested line count; `None` means the configured default
        lines: Option<usize>,
    },
}

/// A router submitting its WAN address(es)
#[derive(Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub v4: Option<IpAddr>,
    pub v6: Option<IpAddr>,
    pub reason: Option<String>,
    pub key: String,
}

impl std::fmt::Debug for ReportRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportRequest")
            .field("v4", &self.v4)
            .field("v6", &self.v6)
            .field("reason", &self.reason)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl ReportRequest {
    /// Addresses in the order they are logged
    pub fn addresses(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.v4.iter().chain(self.v6.iter()).copied()
    }
}

/// A parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagRequest {
    Report(ReportRequest),
    View { view: View, format: Format },
}

impl DiagRequest {
    /// Parse query pairs
    ///
    /// Any non-empty address parameter makes this a report; a malformed one
    /// is rejected rather than silently turned into a view.
    pub fn from_query<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.as_ref().to_string()))
            .collect();

        let get = |name: &str| params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        // `wanip=<addr>` predates the per-family parameters
        let v4 = get("wanip4").or_else(|| get("wanip"));
        let v6 = get("wanip6");

        if v4.is_some() || v6.is_some() {
            let v4 = v4.map(|ip| IpFamily::V4.parse_literal(ip)).transpose()?;
            let v6 = v6.map(|ip| IpFamily::V6.parse_literal(ip)).transpose()?;

            return Ok(DiagRequest::Report(ReportRequest {
                v4,
                v6,
                reason: get("reason").map(str::to_string),
                key: params.get("key").cloned().unwrap_or_default(),
            }));
        }

        let (format, wan_requested) = match params.get("json") {
            Some(json) => (Format::Json, json.trim().eq_ignore_ascii_case("WAN")),
            None => (
                Format::Html,
                params.contains_key("wanip")
                    || get("view").is_some_and(|v| v.eq_ignore_ascii_case("WAN")),
            ),
        };

        if !wan_requested {
            return Ok(DiagRequest::View {
                view: View::Ddns,
                format,
            });
        }

        let lines = get("lines")
            .map(|n| {
                n.parse::<usize>()
                    .map_err(|_| Error::invalid_input(format!("lines must be a number, got '{}'", n)))
            })
            .transpose()?;

        let family = match get("family") {
            None | Some("4") => IpFamily::V4,
            Some("6") => IpFamily::V6,
            Some(other) => {
                return Err(Error::invalid_input(format!(
                    "family must be 4 or 6, got '{}'",
                    other
                )));
            }
        };

        Ok(DiagRequest::View {
            view: View::Wan { family, lines },
            format,
        })
    }
}
