//! Parsing of raw command replies that `fred` does not type for us.

use fred::types::Value;

use super::types::{KeyPage, ParseError};

/// Parse the two-element `SCAN` reply: `[cursor, [key, ...]]`.
pub fn parse_scan_reply(reply: Value) -> Result<KeyPage, ParseError> {
    let parts = match reply {
        Value::Array(parts) => parts,
        other => {
            return Err(ParseError::InvalidScanReply(format!(
                "expected an array, got {:?}",
                other.kind()
            )));
        }
    };

    let mut parts = parts.into_iter();
    let (Some(cursor), Some(keys), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ParseError::InvalidScanReply(
            "expected exactly two elements".to_string(),
        ));
    };

    let cursor = lossy_string(cursor)
        .ok_or_else(|| ParseError::InvalidScanReply("cursor is not a string".to_string()))?;
    // A bad cursor here came from the server, so it is a reply error
    if cursor.parse::<u64>().is_err() {
        return Err(ParseError::InvalidScanReply(format!(
            "cursor '{}' is not numeric",
            cursor
        )));
    }

    let keys = match keys {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                lossy_string(item).ok_or_else(|| {
                    ParseError::InvalidScanReply("key is not a string".to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Value::Null => Vec::new(),
        other => {
            return Err(ParseError::InvalidScanReply(format!(
                "expected a key array, got {:?}",
                other.kind()
            )));
        }
    };

    Ok(KeyPage { keys, cursor })
}

/// Decode a scalar reply as text, replacing invalid UTF-8 with U+FFFD.
///
/// Keys and values are arbitrary bytes on the server; `Value::as_string`
/// gives up on those, which would fail a whole listing over one key.
/// Returns `None` for nil and for non-scalar replies.
pub fn lossy_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        other => other.as_string(),
    }
}
