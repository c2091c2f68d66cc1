use procdocs_core::config::{ClientConfig, ENV_SUPABASE_ANON_KEY, ENV_SUPABASE_URL, ENV_TABLE};
use procdocs_core::util::{is_http_url, normalize_text_option};

use crate::cli::{ConfigCommands, EmptyRemoteArg};
use crate::commands::common::Context;
use crate::error::CliError;

/// Values passed to `config init`; unset fields fall back to the environment
/// and then to the existing file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigInitArgs {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub table: Option<String>,
    pub empty_remote: Option<EmptyRemoteArg>,
    pub timeout: Option<u64>,
}

pub fn run_config(command: ConfigCommands, context: &Context) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            table,
            empty_remote,
            timeout,
        } => run_config_init(
            ConfigInitArgs {
                supabase_url,
                supabase_anon_key,
                table,
                empty_remote,
                timeout,
            },
            context,
        ),
        ConfigCommands::Show => run_config_show(context),
    }
}

pub fn run_config_init(args: ConfigInitArgs, context: &Context) -> Result<(), CliError> {
    let existing = ClientConfig::load_from_path(&context.config_path)?;
    let config = merge_init_config(existing, args, |name| std::env::var(name).ok())?;
    config.save_to_path(&context.config_path)?;

    println!("Saved config to {}", context.config_path.display());
    if !config.is_remote_configured() {
        println!("Supabase URL and anon key are still missing; sync stays offline until set.");
    }
    Ok(())
}

pub fn run_config_show(context: &Context) -> Result<(), CliError> {
    let config = context.load_config()?;
    println!("{}", serde_json::to_string_pretty(&redacted(config))?);
    Ok(())
}

pub fn merge_init_config(
    existing: ClientConfig,
    args: ConfigInitArgs,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig, CliError> {
    let config = ClientConfig {
        supabase_url: normalize_text_option(args.supabase_url)
            .or_else(|| normalize_text_option(lookup(ENV_SUPABASE_URL)))
            .or(existing.supabase_url),
        supabase_anon_key: normalize_text_option(args.supabase_anon_key)
            .or_else(|| normalize_text_option(lookup(ENV_SUPABASE_ANON_KEY)))
            .or(existing.supabase_anon_key),
        table: normalize_text_option(args.table)
            .or_else(|| normalize_text_option(lookup(ENV_TABLE)))
            .or(existing.table),
        empty_remote_policy: args
            .empty_remote
            .map_or(existing.empty_remote_policy, Into::into),
        request_timeout_secs: args
            .timeout
            .or(existing.request_timeout_secs)
            .filter(|secs| *secs > 0),
    }
    .normalized();

    if let Some(url) = &config.supabase_url {
        if !is_http_url(url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    if config.is_remote_configured() {
        config
            .remote_settings()
            .map_err(|error| CliError::Config(error.to_string()))?;
    }
    Ok(config)
}

/// Copy safe to print: the anon key is masked except for its last four chars.
pub fn redacted(mut config: ClientConfig) -> ClientConfig {
    config.supabase_anon_key = config.supabase_anon_key.map(|key| {
        let visible = key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<String>();
        format!("****{visible}")
    });
    config
}
