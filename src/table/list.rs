/// Prefix announcing a table in `show table` output
pub const TABLE_MARKER: &str = "# table: ";

/// Extract table names from a `show table` response, in response order.
///
/// ```text
/// # table: monitoring, type: ip, size:32, used:0
/// # table: fe_https, type: ip, size:1048576, used:0
/// ```
///
/// Lines without the marker are ignored.
pub fn parse_table_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let rest = line.trim_end_matches('\r').strip_prefix(TABLE_MARKER)?;
            let name = match rest.split_once(',') {
                Some((name, _)) => name,
                None => rest,
            }
            .trim();

            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_in_response_order() {
        let text = "# table: monitoring, type: ip, size:32, used:0\n\
                    \n\
                    # table: fe_https, type: ip, size:1048576, used:0\n\
                    \n";

        assert_eq!(parse_table_list(text), vec!["monitoring", "fe_https"]);
    }

    #[test]
    fn test_ignores_unrelated_lines() {
        let text = "Unknown command\n\
                    #table: squashed, type: ip\n\
                    # table: fe_http, type: ip, size:1048576, used:3\n\
                    0x55d1c8d0b3c0: key=10.0.0.1 use=0 exp=0\n";

        assert_eq!(parse_table_list(text), vec!["fe_http"]);
    }

    #[test]
    fn test_crlf_and_missing_comma() {
        let text = "# table: be_api, type: string, size:100, used:1\r\n# table: lonely\r\n# table: , type: ip\r\n";

        assert_eq!(parse_table_list(text), vec!["be_api", "lonely"]);
    }

    #[test]
    fn test_empty_response() {
        assert!(parse_table_list("").is_empty());
        assert!(parse_table_list("\n\n").is_empty());
    }
}
