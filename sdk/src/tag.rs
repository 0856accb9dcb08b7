//! The `crypt` entry of a node's private metadata tells whether the node's
//! name and content are encrypted, and with which scheme version.

use {
    crate::crypto::Cipher,
    anyhow::Result,
    derive_more::{Display, Error},
    drive_crypt_protocol::{Node, NodeRecord, PrivateMap},
    tracing::warn,
};

pub const CRYPT_KEY: &str = "crypt";
pub const CRYPT_VERSION: &str = "1";

/// A node carries a `crypt` tag with a version this layer cannot handle.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("unsupported crypt version")]
pub struct UnsupportedCryptVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptMode {
    Plain,
    Encrypted,
}

#[inline]
pub fn crypt_mode(private: Option<&PrivateMap>) -> Result<CryptMode, UnsupportedCryptVersion> {
    match private.and_then(|private| private.get(CRYPT_KEY)) {
        None => Ok(CryptMode::Plain),
        Some(version) if version == CRYPT_VERSION => Ok(CryptMode::Encrypted),
        Some(version) => {
            warn!(%version, "rejecting node with unsupported crypt version");
            Err(UnsupportedCryptVersion)
        }
    }
}

/// Private metadata for content created without explicit metadata.
#[must_use]
#[inline]
pub fn default_private() -> PrivateMap {
    PrivateMap::from([(CRYPT_KEY.to_owned(), CRYPT_VERSION.to_owned())])
}

/// Private metadata for newly created content: the supplied entries plus the
/// current `crypt` tag. An existing tag is kept as is.
#[must_use]
#[inline]
pub fn tag_new_content(private: Option<PrivateMap>) -> PrivateMap {
    let mut private = private.unwrap_or_default();
    private
        .entry(CRYPT_KEY.to_owned())
        .or_insert_with(|| CRYPT_VERSION.to_owned());
    private
}

/// Returns the node as the caller should see it: encrypted names are
/// replaced with plaintext, other nodes are returned unchanged.
#[inline]
pub fn decode_node(cipher: &Cipher, node: Node) -> Result<Node> {
    match crypt_mode(node.private.as_ref())? {
        CryptMode::Plain => Ok(node),
        CryptMode::Encrypted => {
            let name = cipher.decrypt_name(&node.name)?;
            Ok(Node { name, ..node })
        }
    }
}

#[inline]
pub fn decode_record(cipher: &Cipher, record: NodeRecord) -> Result<NodeRecord> {
    let Some(name) = &record.name else {
        return Ok(record);
    };
    match crypt_mode(record.private.as_ref())? {
        CryptMode::Plain => Ok(record),
        CryptMode::Encrypted => {
            let name = cipher.decrypt_name(name)?;
            Ok(NodeRecord {
                name: Some(name),
                ..record
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, drive_crypt_protocol::credentials::EncryptionKey};

    fn private(version: &str) -> PrivateMap {
        PrivateMap::from([(CRYPT_KEY.to_owned(), version.to_owned())])
    }

    #[test]
    fn modes() {
        assert_eq!(crypt_mode(None), Ok(CryptMode::Plain));
        assert_eq!(crypt_mode(Some(&PrivateMap::new())), Ok(CryptMode::Plain));
        let other = PrivateMap::from([("color".to_owned(), "red".to_owned())]);
        assert_eq!(crypt_mode(Some(&other)), Ok(CryptMode::Plain));
        assert_eq!(crypt_mode(Some(&private("1"))), Ok(CryptMode::Encrypted));
        assert_eq!(crypt_mode(Some(&default_private())), Ok(CryptMode::Encrypted));
        assert_eq!(
            crypt_mode(Some(&private("-1"))),
            Err(UnsupportedCryptVersion)
        );
        assert_eq!(crypt_mode(Some(&private(""))), Err(UnsupportedCryptVersion));
        assert_eq!(
            crypt_mode(Some(&private("2"))),
            Err(UnsupportedCryptVersion)
        );
    }

    #[test]
    fn new_content_is_tagged() {
        assert_eq!(tag_new_content(None), default_private());
        assert_eq!(tag_new_content(Some(PrivateMap::new())), default_private());

        let other = PrivateMap::from([("color".to_owned(), "red".to_owned())]);
        let tagged = tag_new_content(Some(other));
        assert_eq!(tagged.get("color").map(String::as_str), Some("red"));
        assert_eq!(tagged.get(CRYPT_KEY).map(String::as_str), Some(CRYPT_VERSION));
        assert_eq!(tagged.len(), 2);

        assert_eq!(tag_new_content(Some(private("-1"))), private("-1"));
    }

    #[test]
    fn error_message() {
        assert_eq!(
            anyhow::Error::from(UnsupportedCryptVersion).to_string(),
            "unsupported crypt version"
        );
    }

    #[test]
    fn records() {
        let cipher = Cipher::new(&EncryptionKey::from([3; 64])).unwrap();
        let record = NodeRecord {
            id: "a".into(),
            parent_id: None,
            name: Some(cipher.encrypt_name("name").unwrap()),
            is_directory: false,
            is_trashed: false,
            size: 10,
            private: Some(private("1")),
        };
        let decoded = decode_record(&cipher, record.clone()).unwrap();
        assert_eq!(decoded.name.as_deref(), Some("name"));
        assert_eq!(decoded.private, record.private);

        let root = NodeRecord {
            name: None,
            private: Some(private("-1")),
            ..record.clone()
        };
        assert_eq!(decode_record(&cipher, root.clone()).unwrap(), root);

        let plain = NodeRecord {
            name: Some("plain".to_owned()),
            private: None,
            ..record.clone()
        };
        assert_eq!(decode_record(&cipher, plain.clone()).unwrap(), plain);

        let invalid = NodeRecord {
            private: Some(private("-1")),
            ..record
        };
        assert!(
            decode_record(&cipher, invalid)
                .unwrap_err()
                .is::<UnsupportedCryptVersion>()
        );
    }
}
