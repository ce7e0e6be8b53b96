//! User CLI commands
//!
//! Implements CLI commands for user account management. Every change goes
//! through a [`UserSaver`], so each command leaves one audit entry.

use std::io::{self, BufRead, Write};

use clap::Subcommand;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::display::{format_logs, format_user_details, format_user_list};
use crate::error::{SaverError, SaverResult};
use crate::identity::Identity;
use crate::storage::RecordStore;
use crate::users::{get_user, list_users, Role, Status, UserKind, UserSaver};

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user (enabled immediately)
    Create {
        /// Username; prompted for if omitted
        #[arg(short, long)]
        username: Option<String>,
        /// E-mail address; prompted for if omitted
        #[arg(short, long)]
        email: Option<String>,
        /// Password; prompted for if omitted
        #[arg(short, long, env = "DOCSAVER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Give the user the admin role
        #[arg(long)]
        admin: bool,
    },
    /// List all users
    List,
    /// Show user details
    Show {
        /// Username or e-mail address
        user: String,
    },
    /// Change a user's role
    Role {
        /// Username or e-mail address
        user: String,
        /// New role (admin or user)
        role: String,
    },
    /// Enable a user account
    Enable {
        /// Username or e-mail address
        user: String,
    },
    /// Disable a user account
    Disable {
        /// Username or e-mail address
        user: String,
    },
    /// Change a user's password
    Password {
        /// Username or e-mail address
        user: String,
    },
    /// Generate a new API key for a user
    Apikey {
        /// Username or e-mail address
        user: String,
    },
    /// Show the change log of a user
    Logs {
        /// Username or e-mail address
        user: String,
    },
}

/// Handle a user command
pub fn handle_user_command(
    store: &dyn RecordStore,
    settings: &Settings,
    identity: &Identity,
    cmd: UserCommands,
) -> SaverResult<()> {
    match cmd {
        UserCommands::Create {
            username,
            email,
            password,
            admin,
        } => {
            let username = match username {
                Some(u) => u,
                None => prompt("Username: ")?,
            };
            let email = match email {
                Some(e) => e,
                None => prompt("Email: ")?,
            };
            let password = match password {
                Some(p) => Zeroizing::new(p),
                None => prompt_new_password()?,
            };
            let role = if admin { Role::Admin } else { Role::User };

            let committed = UserSaver::create(store, identity, UserKind::new(settings))?.scope(|saver| {
                saver.set_username(&username)?;
                saver.set_email(&email)?;
                saver.set_password(&password)?;
                saver.set_role(role)?;
                saver.set_status(Status::Enabled)
            })?;

            println!(
                "Created {} '{}'",
                role,
                committed.record.get_str("username").unwrap_or_default()
            );
            println!("  ID: {}", committed.record.id);
        }

        UserCommands::List => {
            let users = list_users(store)?;
            print!("{}", format_user_list(&users));
            if users.is_empty() {
                println!();
            }
        }

        UserCommands::Show { user } => {
            let record = get_user(store, &user)?;
            print!("{}", format_user_details(&record));
        }

        UserCommands::Role { user, role } => {
            let role = Role::parse(&role).ok_or_else(|| {
                SaverError::Validation(format!("Invalid role '{}': use 'admin' or 'user'", role))
            })?;
            let record = get_user(store, &user)?;
            UserSaver::update(store, identity, UserKind::new(settings), record)?
                .scope(|saver| saver.set_role(role))?;
            println!("Set role of '{}' to {}", user, role);
        }

        UserCommands::Enable { user } => set_status(store, settings, identity, &user, Status::Enabled)?,

        UserCommands::Disable { user } => set_status(store, settings, identity, &user, Status::Disabled)?,

        UserCommands::Password { user } => {
            let record = get_user(store, &user)?;
            let password = prompt_new_password()?;
            UserSaver::update(store, identity, UserKind::new(settings), record)?
                .scope(|saver| saver.set_password(&password))?;
            println!("Password changed for '{}'", user);
        }

        UserCommands::Apikey { user } => {
            let record = get_user(store, &user)?;
            let mut key = String::new();
            UserSaver::update(store, identity, UserKind::new(settings), record)?.scope(|saver| {
                key = saver.set_apikey()?;
                Ok(())
            })?;
            println!("New API key for '{}': {}", user, key);
        }

        UserCommands::Logs { user } => {
            let record = get_user(store, &user)?;
            println!("{}", format_logs(&store.logs_for(record.id)?));
        }
    }

    Ok(())
}

fn set_status(
    store: &dyn RecordStore,
    settings: &Settings,
    identity: &Identity,
    user: &str,
    status: Status,
) -> SaverResult<()> {
    let record = get_user(store, user)?;
    UserSaver::update(store, identity, UserKind::new(settings), record)?
        .scope(|saver| saver.set_status(status))?;
    println!("User '{}' is now {}", user, status);
    Ok(())
}

/// Read one line from standard input
fn prompt(label: &str) -> SaverResult<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        return Err(SaverError::Validation(format!("{} cannot be empty", label.trim_end_matches([':', ' ']))));
    }
    Ok(value)
}

/// Ask for a new password twice
fn prompt_new_password() -> SaverResult<Zeroizing<String>> {
    let first = prompt_password("Password: ")?;
    let second = prompt_password("Confirm password: ")?;
    if *first != *second {
        return Err(SaverError::Validation("Passwords do not match".into()));
    }
    Ok(first)
}

fn prompt_password(label: &str) -> SaverResult<Zeroizing<String>> {
    rpassword::prompt_password(label)
        .map(Zeroizing::new)
        .map_err(|e| SaverError::Io(format!("Failed to read password: {}", e)))
}
