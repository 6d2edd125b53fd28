//! Parsing helpers for repeatable `k=v` CLI flags (`--label`, `--required-label`).

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid key=value pair {0:?}: expected exactly one '='")]
pub struct KvParseError(pub String);

/// Parses a single `key=value` string.
pub fn parse_kv(entry: &str) -> Result<(String, String), KvParseError> {
    let mut parts = entry.splitn(2, '=');
    let key = parts.next().filter(|s| !s.is_empty());
    let value = parts.next();
    match (key, value) {
        (Some(k), Some(v)) => Ok((k.to_string(), v.to_string())),
        _ => Err(KvParseError(entry.to_string())),
    }
}

/// Parses a list of `key=value` strings into a map, rejecting the whole
/// list if any entry is malformed.
pub fn parse_kv_map<I, S>(entries: I) -> Result<HashMap<String, String>, KvParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|e| parse_kv(e.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_pair() {
        assert_eq!(
            parse_kv("region=us").unwrap(),
            ("region".to_string(), "us".to_string())
        );
    }

    #[test]
    fn value_may_contain_equals() {
        assert_eq!(
            parse_kv("query=a=b").unwrap(),
            ("query".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn rejects_missing_equals() {
        assert!(parse_kv("region").is_err());
    }

    #[test]
    fn rejects_empty_key() {
        assert!(parse_kv("=us").is_err());
    }

    #[test]
    fn builds_map_from_many_pairs() {
        let map = parse_kv_map(["a=1", "b=2"]).unwrap();
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert_eq!(map.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn whole_list_rejected_on_one_bad_entry() {
        assert!(parse_kv_map(["a=1", "bad"]).is_err());
    }
}
