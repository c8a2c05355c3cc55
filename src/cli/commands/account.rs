//! Account command handlers

use crate::config::Config;
use crate::services::AuthService;

use super::{auth_service, read_secret};

pub async fn cmd_register(
    config: &Config,
    username: &str,
    email: &str,
    role_id: i32,
) -> anyhow::Result<()> {
    let service = auth_service(config).await?;

    let password = read_secret("Password")?;
    let confirm = read_secret("Confirm password")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    let account = service.register(username, email, &password, role_id).await?;
    println!(
        "✓ Registered {} (user_id {}, role {})",
        account.username, account.user_id, account.role_id
    );
    Ok(())
}

pub async fn cmd_login(config: &Config, username: &str) -> anyhow::Result<()> {
    let service = auth_service(config).await?;
    let password = read_secret("Password")?;

    let result = service.login(username, &password).await?;
    println!("✓ Authenticated {} (user_id {})", result.username, result.user_id);
    Ok(())
}

pub async fn cmd_change_password(config: &Config, username: &str) -> anyhow::Result<()> {
    let service = auth_service(config).await?;

    let current = read_secret("Current password")?;
    let new_password = read_secret("New password")?;
    let confirm = read_secret("Confirm new password")?;
    if new_password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    service
        .change_password(username, &current, &new_password)
        .await?;
    println!("✓ Password updated for {username}");
    Ok(())
}

pub async fn cmd_unlock(config: &Config, username: &str) -> anyhow::Result<()> {
    let service = auth_service(config).await?;
    service.unlock(username).await?;
    println!("✓ Unlocked {username}");
    Ok(())
}

pub async fn cmd_set_active(config: &Config, username: &str, is_active: bool) -> anyhow::Result<()> {
    let service = auth_service(config).await?;
    service.set_active(username, is_active).await?;

    let state = if is_active { "activated" } else { "deactivated" };
    println!("✓ {username} {state}");
    Ok(())
}

pub async fn cmd_account_status(config: &Config, username: &str, json: bool) -> anyhow::Result<()> {
    let service = auth_service(config).await?;
    let status = service.account_status(username).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{} (user_id {})", status.username, status.user_id);
    println!("{:-<40}", "");
    println!("  Email:           {}", status.email);
    println!("  Role:            {}", status.role_id);
    println!("  Active:          {}", if status.is_active { "yes" } else { "no" });
    println!("  Locked:          {}", if status.is_locked { "yes" } else { "no" });
    println!("  Failed attempts: {}", status.failed_login_attempts);
    println!(
        "  Last login:      {}",
        status.last_login_at.as_deref().unwrap_or("never")
    );
    Ok(())
}
