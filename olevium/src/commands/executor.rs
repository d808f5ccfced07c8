use super::Command;
use crate::output;
use anyhow::{bail, Context, Result};
use chrono::Local;
use olevium_api::{ApiError, Client, Request};
use olevium_auth::{SecretString, Transport};
use std::io::{BufRead, Write};

const PASSWORD_ENV: &str = "OLEVIUM_PASSWORD";
const RECENT_TRANSACTIONS: u32 = 50;

/// Where login and signup get the password from
pub trait PasswordSource {
    fn password(&self, email: &str) -> Result<SecretString>;
}

impl PasswordSource for SecretString {
    fn password(&self, _email: &str) -> Result<SecretString> {
        Ok(self.clone())
    }
}

/// `OLEVIUM_PASSWORD`, falling back to a prompt on stderr/stdin
pub struct PromptPassword;

impl PasswordSource for PromptPassword {
    fn password(&self, email: &str) -> Result<SecretString> {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            return Ok(SecretString::from(password));
        }

        eprint!("Password for {}: ", email);
        std::io::stderr().flush()?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Could not read password")?;
        let password = line.trim_end_matches(['\r', '\n']);
        if password.is_empty() {
            bail!("Password must not be empty");
        }
        Ok(SecretString::from(password))
    }
}

pub struct Executor<'a, T: Transport> {
    client: &'a Client<T>,
    passwords: &'a dyn PasswordSource,
}

impl<'a, T: Transport> Executor<'a, T> {
    pub fn new(client: &'a Client<T>, passwords: &'a dyn PasswordSource) -> Self {
        Self { client, passwords }
    }

    /// Run one command, writing its report to `out`
    pub async fn execute<W: Write>(&self, command: Command, out: &mut W) -> Result<()> {
        let session = self.client.session();
        if !command.is_public() && session.session().is_none() {
            bail!("Not signed in. Run `olevium login <email>` first.");
        }

        tracing::debug!(?command, "Executing command");

        match command {
            Command::Help => writeln!(out, "{}", super::USAGE)?,

            Command::Login { email } => {
                let password = self.passwords.password(&email)?;
                let signed_in = session.login(&email, &password).await?;
                let name = signed_in
                    .user
                    .as_ref()
                    .map(|user| user.display_name().to_string())
                    .unwrap_or(email);
                writeln!(out, "Signed in as {}", name)?;
            }

            Command::Signup { email, name } => {
                let password = self.passwords.password(&email)?;
                session.signup(&email, &password, name.as_deref()).await?;
                writeln!(out, "Account created for {}", email)?;
            }

            Command::Logout => {
                let was_signed_in = session.session().is_some();
                session.logout().await;
                if was_signed_in {
                    writeln!(out, "Signed out")?;
                } else {
                    writeln!(out, "Not signed in")?;
                }
            }

            Command::Status => output::write_status(out, session)?,

            Command::Accounts => {
                let accounts = self.send(Request::accounts().list()).await?;
                output::write_accounts(out, &accounts)?;
            }

            Command::Categories { kind } => {
                let repository = match kind {
                    Some(kind) => Request::categories().of_kind(kind),
                    None => Request::categories(),
                };
                let categories = self.send(repository.list()).await?;
                output::write_categories(out, &categories)?;
            }

            Command::Transactions { account_id } => {
                let repository = match account_id {
                    Some(account_id) => Request::transactions().with_account(account_id),
                    None => Request::transactions(),
                };
                let mut transactions = self
                    .send(repository.list().limit(RECENT_TRANSACTIONS))
                    .await?;
                transactions.sort();
                output::write_transactions(out, &transactions)?;
            }

            Command::Recurring => {
                let recurring = self.send(Request::recurring().list()).await?;
                output::write_recurring(out, &recurring, Local::now().date_naive())?;
            }

            Command::Dashboard { month } => {
                let summary = self.send(Request::dashboard().summary(month)).await?;
                output::write_dashboard(out, &summary)?;
            }
        }

        Ok(())
    }

    async fn send<R: olevium_api::Endpoint>(&self, request: R) -> Result<R::Response> {
        match self.client.send(request).await {
            Ok(response) => Ok(response),
            Err(err) if err.requires_login() => {
                bail!("Your session has expired. Run `olevium login <email>` to sign in again.")
            }
            Err(ApiError::Validation(message)) => bail!("The server rejected the request: {}", message),
            Err(err) => Err(err.into()),
        }
    }
}
