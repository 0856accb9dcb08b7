use {
    crate::crypto::Cipher,
    anyhow::{Context, Result},
    drive_crypt_protocol::credentials::EncryptionKey,
    serde::{Deserialize, Serialize},
    std::path::{Path, PathBuf},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub encryption_key: EncryptionKey,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "info".into()
}

impl Config {
    #[must_use]
    #[inline]
    pub fn new(encryption_key: EncryptionKey) -> Self {
        Self {
            encryption_key,
            log_file: None,
            log_filter: default_log_filter(),
        }
    }

    /// Reads a JSON5 config file.
    #[inline]
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs_err::read_to_string(path)?;
        json5::from_str(&text).with_context(|| format!("invalid config: {}", path.display()))
    }

    #[inline]
    pub fn cipher(&self) -> Result<Cipher> {
        Cipher::new(&self.encryption_key)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write, tempfile::NamedTempFile};

    const KEY: &str = "vKh2yQBi1Q0Ul6Ks0ByOoEQd02Bx9X-B5pYQG3Q4eq3zlG1Gwc9k1cnjVCYZ6LlcBIX7bdtlqNuzKc-Jrw4ufw";

    fn write_config(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal() {
        let file = write_config(&format!("{{ encryption_key: \"{KEY}\" }}"));
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.encryption_key.display_unmasked().to_string(), KEY);
        assert_eq!(config.log_file, None);
        assert_eq!(config.log_filter, "info");
        config.cipher().unwrap();
    }

    #[test]
    fn full() {
        let file = write_config(&format!(
            "{{
                // comments are allowed
                encryption_key: '{KEY}',
                log_file: '/tmp/drive-crypt.log',
                log_filter: 'drive_crypt=debug',
            }}"
        ));
        let config = Config::load(file.path()).unwrap();
        assert_eq!(
            config.log_file.as_deref(),
            Some(Path::new("/tmp/drive-crypt.log"))
        );
        assert_eq!(config.log_filter, "drive_crypt=debug");
    }

    #[test]
    fn rejects_bad_key() {
        let file = write_config("{ encryption_key: 'c2hvcnQ' }");
        Config::load(file.path()).unwrap_err();
    }

    #[test]
    fn missing_file() {
        Config::load(Path::new("/nonexistent/drive-crypt.json5")).unwrap_err();
    }
}
