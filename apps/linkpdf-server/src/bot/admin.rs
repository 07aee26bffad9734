//! Admin-only commands that manage the allow-list

use std::collections::HashSet;

use crate::store::{AllowList, AllowedUser, NewUser, StoreError};

pub const NOT_ADMIN: &str = "❌ You do not have admin rights";

const SEPARATOR: &str = "────────────────────";

pub fn is_admin(admins: &HashSet<i64>, user_id: i64) -> bool {
    admins.contains(&user_id)
}

fn is_numeric_id(arg: &str) -> bool {
    !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit())
}

/// Resolve the `/add_user` argument to a user id, or the reply explaining why not
fn parse_add_target(arg: Option<&str>) -> Result<i64, &'static str> {
    let arg = arg.ok_or("Usage: /add_user <user_id>")?;
    if arg.starts_with('@') {
        return Err("❌ Adding by username is not supported yet. Use the numeric user id.");
    }
    if !is_numeric_id(arg) {
        return Err("❌ Invalid format. Use: /add_user <user_id>");
    }
    arg.parse()
        .map_err(|_| "❌ Invalid format. Use: /add_user <user_id>")
}

pub async fn add_user(
    store: &AllowList,
    caller: i64,
    arg: Option<&str>,
) -> Result<String, StoreError> {
    let user_id = match parse_add_target(arg) {
        Ok(id) => id,
        Err(reply) => return Ok(reply.to_string()),
    };

    store
        .add_user(&NewUser {
            user_id,
            added_by: Some(caller),
            ..Default::default()
        })
        .await?;
    Ok(format!("✅ User {} added to the allow-list", user_id))
}

pub async fn remove_user(store: &AllowList, arg: Option<&str>) -> Result<String, StoreError> {
    let user_id = match arg.filter(|a| is_numeric_id(a)).and_then(|a| a.parse::<i64>().ok()) {
        Some(id) => id,
        None => return Ok("Usage: /remove_user <user_id>".to_string()),
    };

    if store.remove_user(user_id).await? {
        Ok(format!("✅ User {} removed from the allow-list", user_id))
    } else {
        Ok(format!("❌ User {} is not on the allow-list", user_id))
    }
}

pub fn format_user_list(users: &[AllowedUser]) -> String {
    if users.is_empty() {
        return "📝 The allow-list is empty".to_string();
    }

    let mut text = String::from("📋 Allowed users:\n\n");
    for user in users {
        text.push_str(&format!("🆔 ID: {}\n", user.user_id));
        if let Some(username) = user.username.as_deref().filter(|u| !u.is_empty()) {
            text.push_str(&format!("👤 @{}\n", username));
        }
        if let Some(first) = user.first_name.as_deref().filter(|n| !n.is_empty()) {
            text.push_str(&format!("📛 Name: {}", first));
            if let Some(last) = user.last_name.as_deref().filter(|n| !n.is_empty()) {
                text.push(' ');
                text.push_str(last);
            }
            text.push('\n');
        }
        text.push_str(&format!(
            "📅 Added: {}\n",
            user.added_at.format("%Y-%m-%d %H:%M:%S")
        ));
        if let Some(by) = user.added_by {
            text.push_str(&format!("🔑 Added by: {}\n", by));
        }
        text.push_str(SEPARATOR);
        text.push('\n');
    }
    text
}

/// Split `text` into pieces of at most `limit` characters, breaking at
/// line ends where possible
pub fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            for ch in line.chars() {
                if current_len == limit {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(ch);
                current_len += 1;
            }
        } else {
            current.push_str(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub async fn list_users(store: &AllowList, limit: usize) -> Result<Vec<String>, StoreError> {
    let users = store.list_users().await?;
    Ok(chunk_message(&format_user_list(&users), limit))
}

pub async fn stats(
    store: &AllowList,
    admins: &HashSet<i64>,
    caller: i64,
) -> Result<String, StoreError> {
    let count = store.count().await?;
    Ok(format!(
        "📊 Bot statistics:\n\n👥 Allowed users: {}\n🛠️ Admins: {}\n🔧 Your ID: {}",
        count,
        admins.len(),
        caller
    ))
}
