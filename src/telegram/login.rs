use crate::config::Credentials;
use anyhow::{Context, Result};
use grammers_client::{Client, Config as ClientConfig, InitParams, SignInError};
use grammers_session::Session;
use std::path::Path;
use tracing::info;

/// Source of the interactive answers the login flow needs
pub trait LoginPrompt {
    /// Phone number in international format
    fn phone(&self) -> Result<String>;

    /// Login code sent by Telegram
    fn code(&self) -> Result<String>;

    /// Two-step verification password
    fn password(&self, hint: Option<&str>) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The session file was already authorized
    AlreadyAuthorized,
    /// A new login completed for this user id
    SignedIn(i64),
}

/// Authorize `session_path`, creating the file if needed
///
/// Any authentication failure is returned as-is; there is no retry.
pub async fn generate_session<P: LoginPrompt>(
    credentials: &Credentials,
    session_path: &Path,
    prompt: &P,
) -> Result<LoginOutcome> {
    info!("Logging in...");

    let session = Session::load_file_or_create(session_path).with_context(|| {
        format!("Failed to open session file {}", session_path.display())
    })?;

    let client = Client::connect(ClientConfig {
        session,
        api_id: credentials.api_id,
        api_hash: credentials.api_hash.clone(),
        params: InitParams::default(),
    })
    .await
    .context("Failed to connect to Telegram")?;

    let outcome = if client
        .is_authorized()
        .await
        .context("Failed to check session authorization")?
    {
        LoginOutcome::AlreadyAuthorized
    } else {
        let phone = prompt.phone()?;
        let token = client
            .request_login_code(phone.trim())
            .await
            .context("Failed to request login code")?;

        let code = prompt.code()?;
        let user = match client.sign_in(&token, code.trim()).await {
            Ok(user) => user,
            Err(SignInError::PasswordRequired(password_token)) => {
                let password = prompt.password(password_token.hint())?;
                client
                    .check_password(password_token, password.trim())
                    .await
                    .context("Two-step verification failed")?
            }
            Err(e) => return Err(e).context("Sign in failed"),
        };

        LoginOutcome::SignedIn(user.id())
    };

    client
        .session()
        .save_to_file(session_path)
        .with_context(|| format!("Failed to save session to {}", session_path.display()))?;

    info!("Session saved to {}", session_path.display());

    Ok(outcome)
}
