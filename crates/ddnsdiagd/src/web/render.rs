//! Presentation of service responses as HTML, JSON or plain text.

use axum::response::{Html, IntoResponse, Json, Response};
use ddns_diag_core::duration::format_duration;
use ddns_diag_core::model::{IpFamily, IpReport};
use ddns_diag_core::reconcile::Reconciliation;
use ddns_diag_core::request::Format;
use ddns_diag_core::service::DiagResponse;
use ddns_diag_core::timeline::TimelineRow;
use serde_json::{Map, Value};
use std::net::IpAddr;

const LAYOUT_TEMPLATE: &str = include_str!("templates/layout.html");

/// Key of the open "held until now" row in the WAN JSON
const OPEN_ROW_KEY: &str = "now";

/// Render a service response
pub fn render(response: &DiagResponse) -> Response {
    match response {
        DiagResponse::Logged(reports) => logged_text(reports).into_response(),
        DiagResponse::Ddns {
            reconciliation,
            format: Format::Html,
        } => Html(ddns_html(reconciliation)).into_response(),
        DiagResponse::Ddns {
            reconciliation,
            format: Format::Json,
        } => Json(ddns_json(reconciliation)).into_response(),
        DiagResponse::Wan {
            family,
            rows,
            format: Format::Html,
        } => Html(wan_html(*family, rows)).into_response(),
        DiagResponse::Wan {
            rows,
            format: Format::Json,
            ..
        } => Json(wan_json(rows)).into_response(),
    }
}

/// The logged lines, exactly as written
pub fn logged_text(reports: &[IpReport]) -> String {
    reports.iter().map(IpReport::to_line).collect()
}

pub fn ddns_html(reconciliation: &Reconciliation) -> String {
    let intro = match (&reconciliation.last_report, reconciliation.last_report_age()) {
        (Some(report), Some(age)) => format!(
            "<p>Last WAN IP was logged {} ago (at {}) with stated reason: {}.</p>",
            format_duration(age),
            escape_html(&report.timestamp_str()),
            escape_html(report.reason_str())
        ),
        _ => "<p>No WAN IP has been logged yet.</p>".to_string(),
    };

    let rows: Vec<String> = reconciliation
        .rows
        .iter()
        .map(|row| {
            let emphasis = if row.mismatch { " class='emphasized'" } else { "" };
            format!(
                "<tr><td>{}</td><td>{}</td><td{}>{}</td></tr>",
                escape_html(&row.domain),
                cell(row.registered_ip),
                emphasis,
                cell(row.resolved_ip)
            )
        })
        .collect();

    page(
        "Dynamic DNS Status Report",
        &intro,
        &header(&["Domain", "Registrar IP", "Apparent IP from DNS"]),
        &rows.join("\n"),
    )
}

/// `{"WAN": [last, ""], "<domain>": [registered, resolved], ...}` in row order
pub fn ddns_json(reconciliation: &Reconciliation) -> Value {
    let map: Map<String, Value> = reconciliation
        .rows
        .iter()
        .map(|row| {
            (
                row.domain.clone(),
                Value::from(vec![cell(row.registered_ip), cell(row.resolved_ip)]),
            )
        })
        .collect();
    Value::Object(map)
}

pub fn wan_html(family: IpFamily, rows: &[TimelineRow]) -> String {
    let rows: Vec<String> = rows
        .iter()
        .map(|row| {
            let [time, ip, held, next, reason] = wan_cells(row);
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&time),
                ip,
                held,
                next,
                escape_html(&reason)
            )
        })
        .collect();

    page(
        &format!("WAN IP Log Report ({})", family),
        "<p>WAN IPs should be logged here every time the WAN IP changes and the DDNS domains should be updated.</p>",
        &header(&["Time", "WAN IP", "Held for", "Changed to", "Reason"]),
        &rows.join("\n"),
    )
}

/// `{"<time>": [ip, held, changedTo, reason], ...}`, most recent first
///
/// Reports logged within the same second share a key; the older one wins
/// and keeps the position of the newer.
pub fn wan_json(rows: &[TimelineRow]) -> Value {
    let mut map = Map::new();
    for row in rows {
        let [time, ip, held, next, reason] = wan_cells(row);
        map.insert(time, Value::from(vec![ip, held, next, reason]));
    }
    Value::Object(map)
}

fn wan_cells(row: &TimelineRow) -> [String; 5] {
    let time = if row.is_open {
        OPEN_ROW_KEY.to_string()
    } else {
        row.changed_at
            .format(ddns_diag_core::model::LOG_TIMESTAMP_FORMAT)
            .to_string()
    };

    [
        time,
        cell(row.ip),
        row.held_for.map(format_duration).unwrap_or_default(),
        cell(row.next_ip),
        row.reason.clone().unwrap_or_default(),
    ]
}

fn cell(ip: Option<IpAddr>) -> String {
    ip.map(|ip| ip.to_string()).unwrap_or_default()
}

fn header(titles: &[&str]) -> String {
    let cells: String = titles.iter().map(|t| format!("<th>{}</th>", t)).collect();
    format!("<tr>{}</tr>", cells)
}

fn page(title: &str, intro: &str, header: &str, rows: &str) -> String {
    fill(
        LAYOUT_TEMPLATE,
        &[
            ("title", title),
            ("intro", intro),
            ("header", header),
            ("rows", rows),
        ],
    )
}

/// Substitute `{{name}}` placeholders in a single pass
///
/// Substituted text is never rescanned, so placeholders inside values stay literal.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        let name = &after[..end];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
