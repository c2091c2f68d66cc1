use procdocs_core::auth::{load_stored_session, SignUpOutcome};

use crate::cli::AuthCommands;
use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, context: &Context) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { email, password } => {
            let remote = context.connect().await?;
            let session = remote.auth_client().sign_in(&email, &password).await?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in as {email_label}");
            Ok(())
        }
        AuthCommands::Signup {
            email,
            password,
            confirm_password,
        } => {
            check_password_confirmation(&password, confirm_password.as_deref())?;
            let remote = context.connect().await?;
            match remote.auth_client().sign_up(&email, &password).await? {
                SignUpOutcome::SignedIn(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!("Account created. Signed in as {email_label}");
                }
                SignUpOutcome::ConfirmationRequired => {
                    println!("Account created. Confirm your email before signing in.");
                }
            }
            Ok(())
        }
        AuthCommands::ResetPassword { email, redirect_to } => {
            let remote = context.connect().await?;
            remote
                .auth_client()
                .reset_password_for_email(&email, redirect_to.as_deref())
                .await?;
            println!("Password reset email sent to {}", email.trim());
            Ok(())
        }
        AuthCommands::Status => {
            let session = if context.load_config()?.is_remote_configured() {
                context.connect().await?.session
            } else {
                load_stored_session(&context.open_store().await?).await?
            };

            if let Some(session) = session {
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Signed in as {} (expires_at={})",
                    email_label, session.expires_at
                );
            } else {
                println!("Not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let remote = context.connect().await?;
            let auth = remote.auth_client();
            let Some(session) = auth.stored_session().await? else {
                println!("Not signed in.");
                return Ok(());
            };
            auth.sign_out(&session.access_token).await?;
            println!("Signed out");
            Ok(())
        }
    }
}

pub fn check_password_confirmation(
    password: &str,
    confirmation: Option<&str>,
) -> Result<(), CliError> {
    match confirmation {
        Some(confirmation) if confirmation != password => Err(CliError::PasswordMismatch),
        _ => Ok(()),
    }
}
