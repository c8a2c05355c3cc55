//! Credential row command handlers

use crate::config::Config;
use crate::crypto::CipherScheme;
use crate::services::AuthService;

use super::{auth_service, read_secret};

pub async fn cmd_provision(
    config: &Config,
    user_id: i32,
    scheme: Option<CipherScheme>,
) -> anyhow::Result<()> {
    let service = auth_service(config).await?;
    let password = read_secret("Credential value")?;

    let info = service.provision_credential(user_id, &password, scheme).await?;
    println!(
        "✓ Stored credential #{} for user {} ({})",
        info.id,
        info.subject_id,
        info.scheme.map_or("plain", CipherScheme::as_str)
    );
    Ok(())
}

pub async fn cmd_migrate_credential(config: &Config, user_id: i32) -> anyhow::Result<()> {
    let service = auth_service(config).await?;

    if service.migrate_credential(user_id).await? {
        println!("✓ Credential for user {user_id} re-encrypted with aes");
    } else {
        println!("Credential for user {user_id} already uses aes");
    }
    Ok(())
}
