//! CLI-side config resolution: profile + flag overrides into an
//! `InventoryConfig`.
//!
//! Core never sees profiles; it receives a pre-built `InventoryConfig`.

use std::time::Duration;

use bunker_config::{Config, Profile};
use bunker_core::{InventoryConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use bunker_config::{config_path, load_config, load_config_or_default};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build an `InventoryConfig` from the config file, profile, and CLI overrides.
///
/// Precedence: flag / env var > profile > `[defaults]`.
pub fn build_inventory_config(
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<InventoryConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let mut profile = match (cfg.profiles.get(&profile_name), &global.api_url) {
        (Some(profile), _) => profile.clone(),
        (None, Some(api_url)) => Profile::new(api_url.clone()),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(ref api_url) = global.api_url {
        if *api_url != profile.api_url {
            // The profile's feed URL belongs to the profile's server.
            profile.ws_url = None;
        }
        profile.api_url.clone_from(api_url);
    }
    if global.ws_url.is_some() {
        profile.ws_url.clone_from(&global.ws_url);
    }

    let mut config = bunker_config::profile_to_inventory_config(&profile, &cfg.defaults)?;
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
