mod account;
mod cipher;
mod credential;
mod init;

pub use account::{
    cmd_account_status, cmd_change_password, cmd_login, cmd_register, cmd_set_active, cmd_unlock,
};
pub use cipher::{cmd_decrypt, cmd_encrypt, cmd_hash_password, cmd_is_encrypted};
pub use credential::{cmd_migrate_credential, cmd_provision};
pub use init::cmd_init;

use std::io::{self, BufRead, Write};

use crate::config::Config;
use crate::db::Store;
use crate::services::SeaOrmAuthService;

async fn auth_service(config: &Config) -> anyhow::Result<SeaOrmAuthService> {
    let store = Store::from_config(config).await?;
    Ok(SeaOrmAuthService::new(store, config.security.clone()))
}

/// Prompts on stderr and reads one line from stdin.
fn read_secret(prompt: &str) -> anyhow::Result<String> {
    eprint!("{prompt}: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
