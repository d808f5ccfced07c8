mod executor;

pub use executor::{Executor, PasswordSource, PromptPassword};

use olevium_api::endpoints::{Month, TransactionKind};
use uuid::Uuid;

pub const USAGE: &str = "\
Usage: olevium <command> [arguments]

Commands:
  login <email>              Sign in (password from OLEVIUM_PASSWORD or prompt)
  signup <email> [name]      Create an account and sign in
  logout                     Sign out and forget the stored session
  status                     Show who is signed in
  accounts                   List accounts and balances
  categories [income|expense]
                             List categories, optionally of one kind
  transactions [account-id]  List recent transactions
  recurring                  List recurring transactions and their next date
  dashboard [YYYY-MM]        Monthly summary
  help                       Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String },
    Signup { email: String, name: Option<String> },
    Logout,
    Status,
    Accounts,
    Categories { kind: Option<TransactionKind> },
    Transactions { account_id: Option<Uuid> },
    Recurring,
    Dashboard { month: Option<Month> },
    Help,
}

impl Command {
    /// Commands that work without a signed-in session
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Self::Login { .. } | Self::Signup { .. } | Self::Logout | Self::Status | Self::Help
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError(String);

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UsageError {}

fn usage_error(message: impl Into<String>) -> UsageError {
    UsageError(message.into())
}

/// Parse command-line arguments (without the program name)
pub fn parse_args<I, S>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let Some(name) = args.next() else {
        return Ok(Command::Help);
    };
    let rest: Vec<String> = args.collect();

    let command = match name.as_str() {
        "login" => {
            let [email] = rest.as_slice() else {
                return Err(usage_error("login takes exactly one argument: <email>"));
            };
            Command::Login {
                email: parse_email(email)?,
            }
        }
        "signup" => {
            let Some((email, name)) = rest.split_first() else {
                return Err(usage_error("signup needs an email address"));
            };
            let name = name.join(" ");
            Command::Signup {
                email: parse_email(email)?,
                name: (!name.trim().is_empty()).then(|| name.trim().to_string()),
            }
        }
        "categories" => Command::Categories {
            kind: optional_arg(&rest, "categories")?
                .map(|kind| kind.parse().map_err(usage_error))
                .transpose()?,
        },
        "transactions" => Command::Transactions {
            account_id: optional_arg(&rest, "transactions")?
                .map(|id| {
                    Uuid::parse_str(id)
                        .map_err(|_| usage_error(format!("'{}' is not a valid account id", id)))
                })
                .transpose()?,
        },
        "dashboard" => Command::Dashboard {
            month: optional_arg(&rest, "dashboard")?
                .map(|month| month.parse().map_err(usage_error))
                .transpose()?,
        },
        "logout" | "status" | "accounts" | "recurring" | "help" | "--help" | "-h" => {
            if !rest.is_empty() {
                return Err(usage_error(format!("{} takes no arguments", name)));
            }
            match name.as_str() {
                "logout" => Command::Logout,
                "status" => Command::Status,
                "accounts" => Command::Accounts,
                "recurring" => Command::Recurring,
                _ => Command::Help,
            }
        }
        other => return Err(usage_error(format!("unknown command '{}'", other))),
    };

    Ok(command)
}

fn optional_arg<'a>(rest: &'a [String], command: &str) -> Result<Option<&'a str>, UsageError> {
    match rest {
        [] => Ok(None),
        [arg] => Ok(Some(arg.as_str())),
        _ => Err(usage_error(format!("{} takes at most one argument", command))),
    }
}

fn parse_email(email: &str) -> Result<String, UsageError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(email.to_string()),
        _ => Err(usage_error(format!("'{}' is not an email address", email))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_shows_help() {
        assert_eq!(parse_args(Vec::<String>::new()), Ok(Command::Help));
        assert_eq!(parse_args(["--help"]), Ok(Command::Help));
    }

    #[test]
    fn login_and_signup() {
        assert_eq!(
            parse_args(["login", "ana@example.com"]),
            Ok(Command::Login {
                email: "ana@example.com".to_string()
            })
        );
        assert_eq!(
            parse_args(["signup", "bo@example.com", "Bo", "Silva"]),
            Ok(Command::Signup {
                email: "bo@example.com".to_string(),
                name: Some("Bo Silva".to_string()),
            })
        );
        assert_eq!(
            parse_args(["signup", "bo@example.com"]),
            Ok(Command::Signup {
                email: "bo@example.com".to_string(),
                name: None,
            })
        );
        assert!(parse_args(["login"]).is_err());
        assert!(parse_args(["login", "not-an-email"]).is_err());
    }

    #[test]
    fn optional_filters() {
        assert_eq!(
            parse_args(["categories", "income"]),
            Ok(Command::Categories {
                kind: Some(TransactionKind::Income)
            })
        );
        assert_eq!(
            parse_args(["dashboard", "2024-06"]),
            Ok(Command::Dashboard {
                month: Some("2024-06".parse().unwrap())
            })
        );
        assert_eq!(
            parse_args(["transactions"]),
            Ok(Command::Transactions { account_id: None })
        );
        assert!(parse_args(["transactions", "abc"]).is_err());
        assert!(parse_args(["dashboard", "June"]).is_err());
        assert!(parse_args(["dashboard", "2024-06", "2024-07"]).is_err());
    }

    #[test]
    fn unknown_or_extra_arguments() {
        let err = parse_args(["budget"]).unwrap_err();
        assert_eq!(err.to_string(), "unknown command 'budget'");
        assert!(parse_args(["status", "now"]).is_err());
    }

    #[test]
    fn public_commands() {
        assert!(Command::Status.is_public());
        assert!(!Command::Accounts.is_public());
    }
}
