use std::collections::HashMap;

use log::{trace, warn};

use super::error::ParseIssue;
use super::tokenize::{tokenize_entry, KeyValueParser};
use super::{SnapshotStatus, TableSnapshot};

const HEADER: KeyValueParser = KeyValueParser::new(',', ':');

const CONN_RATE: &str = "conn_rate";
const HTTP_REQ_RATE: &str = "http_req_rate";

/// Parse a `show table <name>` response into a snapshot of `requested`.
///
/// ```text
/// # table: fe_http, type: ip, size:1048576, used:1
/// 0x564104c72d60: key=192.168.128.1 use=0 exp=8183 gpc0=0 conn_rate(3000)=40 conn_cur=0 http_req_rate(10000)=19
/// ```
///
/// The first line is the header; entry lines follow until the first blank
/// line. If the header names another table the result is an empty snapshot
/// flagged [`SnapshotStatus::SanityMismatch`]. Values that fail to parse
/// default to zero and are recorded in [`TableSnapshot::issues`].
pub fn parse_table_dump(requested: &str, text: &str) -> TableSnapshot {
    let mut lines = text.lines();

    let header_line = lines.next().unwrap_or_default().trim_start();
    let header = HEADER.parse(header_line.strip_prefix('#').unwrap_or(header_line));

    let found = header.get("table").map(String::as_str).unwrap_or_default();
    if found != requested {
        warn!("Sanity check failed: requested table {:?}, header names {:?}", requested, found);
        return TableSnapshot::mismatch(requested, found);
    }

    let mut issues = Vec::new();

    // A bad `used` degrades to zero instead of discarding the table
    let used = header.get("used").map(String::as_str).unwrap_or_default();
    let entry_count = match used.parse::<u64>() {
        Ok(count) => count,
        Err(_) => {
            warn!("Table {}: header field \"used\" is not a number: {:?}", requested, used);
            issues.push(ParseIssue::Header {
                field: "used".to_string(),
                value: used.to_string(),
            });
            0
        }
    };

    let mut snapshot = TableSnapshot {
        name: requested.to_string(),
        entry_count,
        conn_rate_samples: Vec::new(),
        conn_rate_interval: String::new(),
        http_request_rate_samples: Vec::new(),
        http_request_rate_interval: String::new(),
        status: SnapshotStatus::Ok,
        issues,
    };

    // Line numbers are 1-based and the header is line 1
    let entries = lines.take_while(|line| !line.trim().is_empty());
    for (line_no, line) in (2..).zip(entries) {
        trace!("Table {} entry: {}", requested, line);
        let fields = tokenize_entry(line);

        let conn_rate = rate_value(&fields, CONN_RATE, requested, line_no, &mut snapshot.issues);
        snapshot.conn_rate_samples.push(conn_rate);
        // The window is assumed constant across entries, so only the first one counts
        if snapshot.conn_rate_interval.is_empty() {
            if let Some(window) = fields.get("conn_rate_interval") {
                snapshot.conn_rate_interval = window.clone();
            }
        }

        let http_req_rate = rate_value(&fields, HTTP_REQ_RATE, requested, line_no, &mut snapshot.issues);
        snapshot.http_request_rate_samples.push(http_req_rate);
        if snapshot.http_request_rate_interval.is_empty() {
            if let Some(window) = fields.get("http_req_rate_interval") {
                snapshot.http_request_rate_interval = window.clone();
            }
        }
    }

    snapshot
}

/// Read a numeric field, falling back to zero.
///
/// A missing field is recorded like an unparseable one, with an empty value.
/// Tables that do not track the counter therefore report one issue per entry
/// on every cycle, so that case only logs at trace level.
fn rate_value(
    fields: &HashMap<String, String>,
    field: &str,
    table: &str,
    line: usize,
    issues: &mut Vec<ParseIssue>,
) -> f64 {
    let value = match fields.get(field) {
        Some(value) => value,
        None => {
            trace!("Table {} line {}: field {} is missing", table, line, field);
            issues.push(ParseIssue::Field {
                line,
                field: field.to_string(),
                value: String::new(),
            });
            return 0.0;
        }
    };

    value.parse::<f64>().unwrap_or_else(|_| {
        warn!("Table {} line {}: field {} is not a number: {:?}", table, line, field, value);
        issues.push(ParseIssue::Field {
            line,
            field: field.to_string(),
            value: value.clone(),
        });
        0.0
    })
}
