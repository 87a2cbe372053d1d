//! Config subcommand handlers.

use std::io::IsTerminal;

use bunker_config::{Config, Profile};
use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)?,
                _ => output::render_single(&global.output, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init => init(global),

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: bunker config init");
            } else {
                for (name, profile) in &cfg.profiles {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}\t{}", profile.api_url);
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            bunker_config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

/// Create or update a profile.
///
/// With `--api-url` (or `BUNKER_API_URL`) nothing is prompted; otherwise
/// the URL is asked for interactively.
fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config().unwrap_or_else(|_| Config::default());
    let interactive = global.api_url.is_none();

    if interactive && !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "api-url".into(),
            reason: "pass --api-url when running without a terminal".into(),
        });
    }

    let profile_name = match (&global.profile, interactive) {
        (Some(name), _) => name.clone(),
        (None, false) => "default".into(),
        (None, true) => Input::new()
            .with_prompt("Profile name")
            .default("default".into())
            .interact_text()
            .map_err(prompt_err)?,
    };

    let api_url: String = match &global.api_url {
        Some(url) => url.clone(),
        None => Input::new()
            .with_prompt("Inventory API URL")
            .default("http://localhost:8080/api".into())
            .interact_text()
            .map_err(prompt_err)?,
    };

    let mut profile = Profile::new(api_url);
    profile.ws_url.clone_from(&global.ws_url);
    profile.timeout = global.timeout;
    if global.insecure {
        profile.insecure = Some(true);
    }

    // Reject URLs the profile could never resolve.
    bunker_config::profile_to_inventory_config(&profile, &cfg.defaults)?;

    cfg.profiles.insert(profile_name.clone(), profile);
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(profile_name.clone());
    }
    let path = bunker_config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!("Configuration written to {}", path.display());
        eprintln!("  Profile: {profile_name}");
        eprintln!("  Try it: bunker list storage-locations");
    }
    Ok(())
}
