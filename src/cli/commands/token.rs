use clap::Subcommand;

use crate::auth::issue_token;
use crate::cli::{utils::output_value, OutputFormat};
use crate::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Print a signed JWT for an auth_user id")]
    Issue {
        #[arg(help = "auth_user id to embed in the token")]
        user_id: i64,
    },
}

pub fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { user_id } => {
            let token = issue_token(&config::config().security, user_id)?;
            output_value(output_format, "jwt", &token)
        }
    }
}
