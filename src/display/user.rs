//! User display formatting

use crate::audit::HIDDEN_MARKER;
use crate::models::{format_time, Record};

/// Format a list of users as a table
pub fn format_user_list(users: &[Record]) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }

    let field = |user: &Record, key: &str| user.get_str(key).unwrap_or("-").to_string();

    let name_width = users
        .iter()
        .map(|u| field(u, "username").len())
        .max()
        .unwrap_or(8)
        .max(8);
    let email_width = users
        .iter()
        .map(|u| field(u, "email").len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<email_width$}  {:<6}  {}\n",
        "Username",
        "Email",
        "Role",
        "Status",
        name_width = name_width,
        email_width = email_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<email_width$}  {:-<6}  {:-<8}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
        email_width = email_width,
    ));

    for user in users {
        output.push_str(&format!(
            "{:<name_width$}  {:<email_width$}  {:<6}  {}\n",
            field(user, "username"),
            field(user, "email"),
            field(user, "role"),
            field(user, "status"),
            name_width = name_width,
            email_width = email_width,
        ));
    }

    output.push_str(&format!("\nTotal: {} users\n", users.len()));
    output
}

/// Format a single user's details; secrets are masked
pub fn format_user_details(user: &Record) -> String {
    let field = |key: &str| user.get_str(key).unwrap_or("-");
    let secret = |key: &str| {
        if user.get(key).is_some() {
            HIDDEN_MARKER
        } else {
            "(not set)"
        }
    };

    let mut output = String::new();
    output.push_str(&format!("User: {}\n", field("username")));
    output.push_str(&format!("  ID:        {}\n", user.id));
    output.push_str(&format!("  Email:     {}\n", field("email")));
    output.push_str(&format!("  Role:      {}\n", field("role")));
    output.push_str(&format!("  Status:    {}\n", field("status")));
    output.push_str(&format!("  Password:  {}\n", secret("password")));
    output.push_str(&format!("  API key:   {}\n", secret("apikey")));
    output.push_str(&format!("  Created:   {}\n", format_time(&user.created)));
    output.push_str(&format!("  Modified:  {}\n", format_time(&user.modified)));
    output
}
