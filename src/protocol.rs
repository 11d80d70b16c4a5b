//! Wire types for the quickfile daemon protocol.
//!
//! Both channels carry newline-delimited JSON, one object per line. Payloads
//! are tagged with a `type` field; unknown response tags decode into
//! `DaemonResponse::Unknown` so new daemon versions never break the client.

use serde::{Deserialize, Serialize};

/// Result cap sent with every search request.
pub const SEARCH_LIMIT: usize = 100;

/// A single matched character position, as a char index into the display path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub char_index: u32,
}

/// One scored file from the daemon's index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Absolute filesystem path; what Confirm hands to the opener.
    pub path: String,
    /// Home-relative, abbreviated path; what the list renders.
    pub display_path: String,
    /// Matched char positions within `display_path`.
    pub matches: Vec<SearchMatch>,
    pub score: i32,
}

/// Body of a `SearchResults` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub results_count: usize,
    pub total_files: usize,
}

/// Requests written on the outbound channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DaemonRequest {
    Search { query: String, limit: Option<usize> },
    Refresh,
    Status,
}

impl DaemonRequest {
    /// Build a search request with the fixed result cap.
    pub fn search(query: impl Into<String>) -> Self {
        DaemonRequest::Search {
            query: query.into(),
            limit: Some(SEARCH_LIMIT),
        }
    }
}

/// Responses pushed by the daemon on the inbound channel.
///
/// `Unknown` absorbs any tag this client does not understand; handlers treat
/// it as a no-op, never a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DaemonResponse {
    SearchResults(SearchResponse),
    RefreshComplete {
        files_count: usize,
    },
    Status {
        files_count: usize,
        last_updated: u64,
    },
    Error {
        message: String,
    },
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn search_request_wire_format() {
        let json = serde_json::to_string(&DaemonRequest::search("main")).unwrap();
        assert_eq!(json, r#"{"type":"Search","query":"main","limit":100}"#);
    }

    #[test]
    fn bodyless_requests_carry_only_the_tag() {
        let status = serde_json::to_string(&DaemonRequest::Status).unwrap();
        assert_eq!(status, r#"{"type":"Status"}"#);
        let refresh = serde_json::to_string(&DaemonRequest::Refresh).unwrap();
        assert_eq!(refresh, r#"{"type":"Refresh"}"#);
    }

    #[test]
    fn search_results_frame_decodes() {
        let line = r#"{"type":"SearchResults","results":[{"path":"/home/u/notes/readme.md","display_path":"~/notes/readme.md","matches":[{"char_index":8}],"score":54}],"results_count":1,"total_files":1234}"#;
        let frame: DaemonResponse = serde_json::from_str(line).unwrap();
        match frame {
            DaemonResponse::SearchResults(body) => {
                assert_eq!(body.results.len(), 1);
                assert_eq!(body.total_files, 1234);
                assert_eq!(body.results[0].matches, vec![SearchMatch { char_index: 8 }]);
            }
            other => panic!("expected SearchResults, got {other:?}"),
        }
    }

    #[test]
    fn error_frame_decodes() {
        let frame: DaemonResponse =
            serde_json::from_str(r#"{"type":"Error","message":"index unavailable"}"#).unwrap();
        assert_eq!(
            frame,
            DaemonResponse::Error {
                message: "index unavailable".into()
            }
        );
    }

    #[test]
    fn unrecognized_tag_decodes_to_unknown() {
        let frame: DaemonResponse =
            serde_json::from_str(r#"{"type":"IndexProgress","done":12}"#).unwrap();
        assert_eq!(frame, DaemonResponse::Unknown);
    }

    #[test]
    fn malformed_line_is_an_error_not_a_panic() {
        assert!(serde_json::from_str::<DaemonResponse>("not json at all").is_err());
        assert!(serde_json::from_str::<DaemonResponse>(r#"{"type":"SearchResults""#).is_err());
    }
}
