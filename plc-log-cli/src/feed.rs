//! Notification feed replay
//!
//! Reads change notifications as JSON lines, one object per line:
//!
//! ```text
//! {"symbol": "MAIN.nSpeed", "type_id": "ADST_INT16", "type_name": "INT", "payload": [220, 5]}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use plc_log_recorder::Notification;
use serde::Deserialize;
use std::io::BufRead;

/// Errors reading a feed
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Failed to read feed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed notification on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One notification as written in the feed
#[derive(Debug, Clone, Deserialize)]
struct FeedRecord {
    symbol: String,
    #[serde(default)]
    type_id: String,
    #[serde(default)]
    type_name: String,
    payload: Vec<u8>,
}

impl From<FeedRecord> for Notification {
    fn from(record: FeedRecord) -> Self {
        Notification::new(record.symbol, record.type_id, record.type_name, record.payload)
    }
}

/// Iterate the notifications in a feed
pub fn read_feed<R: BufRead>(reader: R) -> impl Iterator<Item = Result<Notification, FeedError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Err(e) => Some(Err(FeedError::Io(e))),
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    return None;
                }
                Some(
                    serde_json::from_str::<FeedRecord>(trimmed)
                        .map(Notification::from)
                        .map_err(|source| FeedError::Parse {
                            line: index + 1,
                            source,
                        }),
                )
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_feed() {
        let input = r#"
# warm-up
{"symbol": "MAIN.nSpeed", "type_id": "ADST_INT16", "type_name": "INT", "payload": [220, 5]}

{"symbol": "MAIN.bRun", "payload": [1]}
"#;
        let notifications: Vec<Notification> = read_feed(Cursor::new(input))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(notifications.len(), 2);
        assert_eq!(
            notifications[0],
            Notification::new("MAIN.nSpeed", "ADST_INT16", "INT", vec![220, 5])
        );
        assert_eq!(notifications[1].symbol_path, "MAIN.bRun");
        assert_eq!(notifications[1].wire_type_id, "");
    }

    #[test]
    fn test_malformed_line_reports_number() {
        let input = "{\"symbol\": \"a\", \"payload\": [1]}\nnot json\n";
        let results: Vec<_> = read_feed(Cursor::new(input)).collect();

        assert!(results[0].is_ok());
        match &results[1] {
            Err(FeedError::Parse { line, .. }) => assert_eq!(*line, 2),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_payload_out_of_range_rejected() {
        let input = r#"{"symbol": "a", "payload": [256]}"#;
        let results: Vec<_> = read_feed(Cursor::new(input)).collect();
        assert!(matches!(results[0], Err(FeedError::Parse { .. })));
    }
}
