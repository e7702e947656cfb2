//! Qualified output addressing.
//!
//! Every node output is published as `nodeId#outputName`. A bare `nodeId`
//! refers to that node's sole output, or to an external data column when no
//! node carries that id. Node ids never contain the delimiter; the
//! manager rejects them.

pub const HANDLE_DELIMITER: char = '#';

/// Builds the qualified id under which `node_id` publishes `output`.
pub fn qualified_id(node_id: &str, output: &str) -> String {
    format!("{node_id}{HANDLE_DELIMITER}{output}")
}

/// Recovers the producing node id from a handle.
pub fn producer_id(handle: &str) -> &str {
    match handle.find(HANDLE_DELIMITER) {
        Some(pos) => &handle[..pos],
        None => handle,
    }
}

/// Splits a handle into its producer id and, if qualified, the output name.
pub fn split(handle: &str) -> (&str, Option<&str>) {
    match handle.split_once(HANDLE_DELIMITER) {
        Some((node, output)) => (node, Some(output)),
        None => (handle, None),
    }
}
