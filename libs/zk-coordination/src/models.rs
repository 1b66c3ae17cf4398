//! Plain data carried out of the registry.

/// One child node of a watched registry path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildData {
    /// Full path of the child, e.g. `/brokers/ids/1`.
    pub path: String,
    /// Node payload. `None` when the node carries no data.
    pub data: Option<Vec<u8>>,
}

impl ChildData {
    /// Create a child entry from its full path and payload.
    pub fn new(path: impl Into<String>, data: Option<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }
}

/// Join a parent path and a child name the way ZooKeeper reports full paths.
pub fn child_path(parent: &str, child: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{child}")
    } else {
        format!("{parent}/{child}")
    }
}
