pub mod credentials;
pub mod encoding;
pub mod service;

use {
    chrono::Utc,
    derive_more::{Display, From, Into},
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

pub type DateTimeUtc = chrono::DateTime<Utc>;

/// Free-form key/value metadata attached to a node by its owner.
///
/// The remote service stores it verbatim and never interprets it.
pub type PrivateMap = BTreeMap<String, String>;

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, From, Into, Display,
)]
pub struct NodeId(pub String);

impl From<&str> for NodeId {
    #[inline]
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A file or directory as reported by the remote service.
///
/// Nodes are plain values: transforming one (for example replacing the name
/// with its encrypted form) produces a new node and leaves the original intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub name: String,
    pub is_directory: bool,
    pub is_trashed: bool,
    pub ctime: DateTimeUtc,
    pub mtime: DateTimeUtc,
    pub mime_type: String,
    pub hash: String,
    pub size: u64,
    pub media_info: Option<MediaInfo>,
    pub private: Option<PrivateMap>,
}

impl Node {
    #[must_use]
    #[inline]
    pub fn with_name(&self, name: String) -> Self {
        Self {
            name,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaInfo {
    Image {
        width: u32,
        height: u32,
    },
    Video {
        width: u32,
        height: u32,
        ms_duration: u64,
    },
}

/// Describes the content of a file that is about to be uploaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub media_info: Option<MediaInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    Removed(NodeId),
    Updated(Node),
}

/// Changes reported by the remote service, in order, plus the cursor
/// that resumes the feed right after them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub changes: Vec<ChangeAction>,
    pub cursor: String,
}

/// Node as persisted in a local snapshot.
///
/// Unlike [`Node`], the name may be missing (the remote root has none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub name: Option<String>,
    pub is_directory: bool,
    pub is_trashed: bool,
    pub size: u64,
    pub private: Option<PrivateMap>,
}

impl From<Node> for NodeRecord {
    #[inline]
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            parent_id: node.parent_id,
            name: Some(node.name),
            is_directory: node.is_directory,
            is_trashed: node.is_trashed,
            size: node.size,
            private: node.private,
        }
    }
}
