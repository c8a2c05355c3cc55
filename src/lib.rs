pub mod cli;
pub mod config;
pub mod crypto;
pub mod db;
pub mod entities;
pub mod services;

use clap::Parser;
use cli::{Cli, Commands};
pub use config::Config;
use config::GeneralConfig;
use tracing_subscriber::EnvFilter;

pub async fn run(config: Config) -> anyhow::Result<()> {
    init_tracing(&config.general);
    config.validate()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cli::cmd_init(),

        Commands::Encrypt { scheme, text } => cli::cmd_encrypt(&config, scheme, &text),

        Commands::Decrypt { scheme, text } => cli::cmd_decrypt(&config, scheme, &text),

        Commands::IsEncrypted { scheme, text } => cli::cmd_is_encrypted(&config, scheme, &text),

        Commands::HashPassword { salt } => cli::cmd_hash_password(salt.as_deref()),

        Commands::Register {
            username,
            email,
            role,
        } => cli::cmd_register(&config, &username, &email, role).await,

        Commands::Login { username } => cli::cmd_login(&config, &username).await,

        Commands::ChangePassword { username } => {
            cli::cmd_change_password(&config, &username).await
        }

        Commands::Provision {
            user_id,
            scheme,
            plain,
        } => {
            let scheme = if plain { None } else { Some(scheme) };
            cli::cmd_provision(&config, user_id, scheme).await
        }

        Commands::MigrateCredential { user_id } => {
            cli::cmd_migrate_credential(&config, user_id).await
        }

        Commands::Unlock { username } => cli::cmd_unlock(&config, &username).await,

        Commands::Deactivate { username } => cli::cmd_set_active(&config, &username, false).await,

        Commands::Activate { username } => cli::cmd_set_active(&config, &username, true).await,

        Commands::Status { username, json } => {
            cli::cmd_account_status(&config, &username, json).await
        }
    }
}

/// Logs go to stderr so command output stays pipeable.
fn init_tracing(general: &GeneralConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if general.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
