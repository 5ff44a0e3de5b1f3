//! Sign-in, sign-out and profile commands.
//!
//! # Usage
//!
//! ```bash
//! shop login -e shopper@example.com   # password from SHOP_PASSWORD or prompt
//! shop whoami
//! shop logout
//! ```
//!
//! # Environment Variables
//!
//! - `SHOP_PASSWORD` - Password for `login` (skips the prompt)
//!
//! The interactive prompt does not echo what is typed.

use storefront::account::{sign_in_and_notify, sign_out_and_notify};
use storefront::auth::Credentials;
use storefront::error::{AppError, Result};
use storefront::state::AppState;

use crate::commands::require_online;
use crate::terminal::{TerminalNotifier, read_password};

/// Sign in with email and password.
///
/// # Errors
///
/// Returns an error if Firebase is not configured, the email is malformed
/// or no password is available. Provider rejections are shown as notices
/// instead.
pub async fn login(state: &AppState, email: &str) -> Result<()> {
    require_online(state)?;
    let password = password_or_prompt(std::env::var("SHOP_PASSWORD").ok(), || {
        read_password("Password: ")
    })
    .await
    .map_err(|e| AppError::BadRequest(format!("could not read password: {e}")))?;
    let credentials = Credentials::new(email, password)?;

    sign_in_and_notify(state.auth(), &TerminalNotifier, &credentials).await;
    Ok(())
}

/// The password from the environment, otherwise from `prompt`.
async fn password_or_prompt<F, Fut>(from_env: Option<String>, prompt: F) -> std::io::Result<String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::io::Result<String>>,
{
    match from_env {
        Some(password) if !password.is_empty() => Ok(password),
        _ => prompt().await,
    }
}

/// Sign out.
pub async fn logout(state: &AppState) {
    sign_out_and_notify(state.auth(), &TerminalNotifier).await;
}

/// Show who is signed in.
#[allow(clippy::print_stdout)]
pub fn whoami(state: &AppState) {
    match state.auth().current_user() {
        Some(identity) => {
            let email = identity
                .email
                .as_ref()
                .map_or("(no email)", |e| e.as_str());
            println!("Signed in as {email} ({})", identity.uid);
            println!("Profile picture: {}", identity.avatar_url());
        }
        None => println!("Not signed in. Use `shop login -e <email>`."),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_environment_password_skips_prompt() {
        let password = password_or_prompt(Some("from-env".to_string()), || async {
            Err(std::io::Error::other("prompted although SHOP_PASSWORD was set"))
        })
        .await
        .unwrap();
        assert_eq!(password, "from-env");
    }

    #[tokio::test]
    async fn test_missing_or_empty_environment_password_prompts() {
        for from_env in [None, Some(String::new())] {
            let password = password_or_prompt(from_env, || async { Ok("typed".to_string()) })
                .await
                .unwrap();
            assert_eq!(password, "typed");
        }
    }
}
