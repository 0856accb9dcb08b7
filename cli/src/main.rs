mod cli;
mod file;

use {
    crate::{
        cli::{Cli, Command, default_config_path},
        file::transform_file,
    },
    anyhow::Result,
    clap::Parser,
    drive_crypt::config::Config,
    drive_crypt_protocol::credentials::EncryptionKey,
    std::{
        io::{self, Write},
        sync::Mutex,
    },
    tracing::debug,
    tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt},
};

fn setup_logger(config: &Config) -> Result<()> {
    let writer: Box<dyn Write + Send> = match &config.log_file {
        Some(path) => Box::new(
            fs_err::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?,
        ),
        None => Box::new(io::stderr()),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(Mutex::new(writer)))
        .with(EnvFilter::try_new(&config.log_filter)?)
        .init();
    Ok(())
}

#[expect(clippy::print_stdout, reason = "command output")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.command == Command::GenerateKey {
        println!("{}", EncryptionKey::generate().display_unmasked());
        return Ok(());
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)?;
    setup_logger(&config)?;
    debug!(path = %config_path.display(), "loaded config");
    let cipher = config.cipher()?;

    match cli.command {
        Command::GenerateKey => {}
        Command::EncryptName { name } => println!("{}", cipher.encrypt_name(&name)?),
        Command::DecryptName { name } => println!("{}", cipher.decrypt_name(&name)?),
        Command::EncryptFile {
            input,
            output,
            offset,
        }
        | Command::DecryptFile {
            input,
            output,
            offset,
        } => {
            transform_file(&cipher, &input, &output, offset)?;
        }
    }
    Ok(())
}
