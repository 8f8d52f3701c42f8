use std::io::BufRead;

use anyhow::{bail, Context};
use clap::Subcommand;

use crate::auth::hash_password;
use crate::cli::{utils::output_value, OutputFormat};

#[derive(Subcommand)]
pub enum PasswordCommands {
    #[command(about = "Print an argon2 hash (reads stdin when no password is given)")]
    Hash {
        #[arg(help = "Plain-text password")]
        password: Option<String>,
    },
}

pub fn handle(cmd: PasswordCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PasswordCommands::Hash { password } => {
            let password = match password {
                Some(p) => p,
                None => read_line().context("reading password from stdin")?,
            };
            if password.is_empty() {
                bail!("password must not be empty");
            }
            output_value(output_format, "hash", &hash_password(&password)?)
        }
    }
}

fn read_line() -> std::io::Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
