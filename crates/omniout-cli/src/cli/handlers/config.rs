//! Configuration command handlers

use crate::cli::commands::ConfigAction;
use crate::context::AppContext;
use crate::error::{CliError, Result};
use crate::output::{compress_path, json_output, mask_secret};
use console::style;
use omniout_sdk::Config;

/// Handle config subcommands
pub fn handle_config(ctx: &AppContext, action: ConfigAction, json: bool) -> Result<()> {
    match action {
        ConfigAction::Show => show_config(ctx, json),
        ConfigAction::Example => {
            print!("{}", Config::generate_example()?);
            Ok(())
        }
    }
}

fn show_config(ctx: &AppContext, json: bool) -> Result<()> {
    let config = redacted(&ctx.config);

    if json {
        return json_output(&config);
    }

    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| CliError::internal(format!("Failed to render configuration: {e}")))?;

    println!(
        "{} {}",
        style("Data directory:").bold(),
        compress_path(&ctx.data_dir)
    );
    println!();
    print!("{rendered}");
    Ok(())
}

/// Copy of `config` safe to print
fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if !config.oauth.client_secret.is_empty() {
        config.oauth.client_secret = mask_secret(&config.oauth.client_secret);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_masked() {
        let mut config = Config::default();
        config.oauth.client_secret = "super-secret-value".into();

        let shown = redacted(&config);
        assert_eq!(shown.oauth.client_secret, "super-…");
        assert_eq!(shown.oauth.client_id, config.oauth.client_id);
    }
}
