use {
    anyhow::{Result, format_err},
    clap::{Parser, Subcommand},
    std::path::PathBuf,
};

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file. Defaults to `drive-crypt.json5` in the user's config directory.
    #[clap(long)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Print a new random encryption key.
    GenerateKey,
    /// Print the name as it is stored on the remote drive.
    EncryptName { name: String },
    /// Print the plaintext of a name stored on the remote drive.
    DecryptName { name: String },
    /// Encrypt a local file the way its content is stored remotely.
    EncryptFile {
        input: PathBuf,
        output: PathBuf,
        /// Position of the first input byte within the remote file.
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Decrypt content downloaded from the remote drive.
    DecryptFile {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
}

#[inline]
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| format_err!("cannot find config dir"))?;
    Ok(config_dir.join("drive-crypt.json5"))
}
