//! One-time interactive login.
//!
//! Authorizes the configured session file so `telegram-gateway` can start
//! unattended afterwards. Any authentication failure aborts with a non-zero
//! exit; run it again to retry.

use anyhow::Result;
use clap::Parser;
use dialoguer::{Input, Password};
use telegram_gateway::config::DEFAULT_CONFIG_PATH;
use telegram_gateway::telegram::{generate_session, LoginOutcome, LoginPrompt};
use telegram_gateway::Config;
use tracing::Level;

#[derive(Parser)]
#[command(name = "generate-session")]
#[command(about = "Log in to Telegram and write the gateway session file")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Phone number in international format (prompted if omitted)
    #[arg(long)]
    phone: Option<String>,
}

struct TerminalPrompt {
    phone: Option<String>,
}

impl LoginPrompt for TerminalPrompt {
    fn phone(&self) -> Result<String> {
        if let Some(phone) = &self.phone {
            return Ok(phone.clone());
        }
        Ok(Input::<String>::new()
            .with_prompt("Phone number (international format)")
            .interact_text()?)
    }

    fn code(&self) -> Result<String> {
        Ok(Input::<String>::new()
            .with_prompt("Login code")
            .interact_text()?)
    }

    fn password(&self, hint: Option<&str>) -> Result<String> {
        let prompt = match hint {
            Some(hint) if !hint.is_empty() => format!("Two-step verification password (hint: {})", hint),
            _ => "Two-step verification password".to_string(),
        };
        Ok(Password::new().with_prompt(prompt).interact()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let args = Args::parse();

    let cfg = Config::load(&args.config)?;
    let credentials = cfg.telegram.credentials()?;
    let prompt = TerminalPrompt { phone: args.phone };

    match generate_session(&credentials, &cfg.telegram.session_path, &prompt).await? {
        LoginOutcome::AlreadyAuthorized => {
            println!(
                "Session {} is already authorized.",
                cfg.telegram.session_path.display()
            );
        }
        LoginOutcome::SignedIn(user_id) => {
            println!(
                "Session created successfully for user {} at {}",
                user_id,
                cfg.telegram.session_path.display()
            );
        }
    }

    Ok(())
}
