use std::collections::HashMap;

use log::debug;

/// A parser for delimited key-value pairs, such as a dump header.
/// Keys and values are trimmed.
///
/// ```text
/// # table: fe_http, type: ip, size:1048576, used:1
/// ```
#[derive(Debug, Clone, Copy)]
pub struct KeyValueParser {
    /// Delimiter between key-value pairs
    pair_delimiter: char,

    /// Delimiter between key and value
    kv_delimiter: char,
}

impl KeyValueParser {
    /// Create a new key-value parser
    pub const fn new(pair_delimiter: char, kv_delimiter: char) -> Self {
        Self {
            pair_delimiter,
            kv_delimiter,
        }
    }

    /// Split `text` into a map. Pairs without a key delimiter are skipped.
    pub fn parse(&self, text: &str) -> HashMap<String, String> {
        let mut map = HashMap::new();

        for pair in text.split(self.pair_delimiter) {
            match pair.split_once(self.kv_delimiter) {
                Some((key, value)) => {
                    map.insert(key.trim().to_string(), value.trim().to_string());
                }
                None if pair.trim().is_empty() => {}
                None => debug!("Skipping malformed pair {:?}", pair),
            }
        }

        map
    }
}

/// Split one entry line of a table dump into a field map.
///
/// ```text
/// 0x564104c72d60: key=192.168.128.1 use=0 exp=8183 conn_rate(3000)=40
/// ```
///
/// The leading address is skipped; tokens start at the first one holding an
/// `=`. A `field(window)=value` token yields both `field` and
/// `field_interval`. Any field name is accepted. Malformed tokens are skipped.
pub fn tokenize_entry(line: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();

    for token in line.split_whitespace().skip_while(|t| !t.contains('=')) {
        match split_token(token) {
            Some((field, window, value)) => {
                if let Some(window) = window {
                    fields.insert(format!("{}_interval", field), window.to_string());
                }
                fields.insert(field.to_string(), value.to_string());
            }
            None => debug!("Skipping malformed token {:?}", token),
        }
    }

    fields
}

/// `field=value` or `field(window)=value`
fn split_token(token: &str) -> Option<(&str, Option<&str>, &str)> {
    let (name, value) = token.split_once('=')?;

    let (field, window) = match name.split_once('(') {
        Some((field, rest)) => {
            let window = rest.strip_suffix(')')?;
            if window.contains(['(', ')']) {
                return None;
            }
            (field, Some(window))
        }
        None => (name, None),
    };

    if field.is_empty() || field.contains(')') {
        return None;
    }

    Some((field, window, value))
}
