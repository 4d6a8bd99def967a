//! Fns to read variables from the environment more conveniently and help other functions figure
//! out what environment they're running in.

use std::env;

use lazy_static::lazy_static;
use tracing::debug;

const SECRET_LOG_BLACKLIST: [&str; 1] = ["XIAN_GRAPHQL_API_KEY"];

lazy_static! {
    pub static ref ENV_CONFIG: EnvConfig = get_env_config();
}

fn obfuscate_if_secret(blacklist: &[&str], key: &str, value: &str) -> String {
    if blacklist.contains(&key) {
        let mut last_four = value.to_string();
        last_four.drain(0..value.len().saturating_sub(4));
        format!("****{last_four}")
    } else {
        value.to_string()
    }
}

/// Get an environment variable, encoding found or missing as Option, and panic otherwise.
pub fn get_env_var(key: &str) -> Option<String> {
    let var = match env::var(key) {
        Err(env::VarError::NotPresent) => None,
        Err(e) => panic!("{e}"),
        Ok(var) => Some(var),
    };

    if let Some(ref existing_var) = var {
        let output = obfuscate_if_secret(&SECRET_LOG_BLACKLIST, key, existing_var);
        debug!("env var {key}: {output}");
    } else {
        debug!("env var {key} requested but not found")
    };

    var
}

pub fn get_env_bool(key: &str) -> Option<bool> {
    get_env_var(key).map(|var| match var.to_lowercase().as_str() {
        "true" => true,
        "false" => false,
        "t" => true,
        "f" => false,
        "1" => true,
        "0" => false,
        str => panic!("invalid bool value {str} for {key}"),
    })
}

pub struct EnvConfig {
    pub bind_public_interface: bool,
    /// Block data service GraphQL endpoint the transaction pager queries.
    pub graphql_url: String,
    pub log_json: bool,
    pub log_perf: bool,
    /// Node RPC base URL the stamp rate fetch queries.
    pub node_url: String,
}

pub fn get_env_config() -> EnvConfig {
    EnvConfig {
        bind_public_interface: get_env_bool("BIND_PUBLIC_INTERFACE").unwrap_or(true),
        graphql_url: get_env_var("XIAN_GRAPHQL_URL").expect("XIAN_GRAPHQL_URL is required"),
        log_json: get_env_bool("LOG_JSON").unwrap_or(false),
        log_perf: get_env_bool("LOG_PERF").unwrap_or(false),
        node_url: get_env_var("XIAN_NODE_URL").expect("XIAN_NODE_URL is required"),
    }
}
