//! Authentication command handlers

use crate::auth::{BrowserNavigator, CallbackServer};
use crate::cli::commands::PasswordLoginOptions;
use crate::context::AppContext;
use crate::error::{CliError, Result};
use crate::output::{
    compress_path, create_spinner, json_output, mask_secret, print_info, print_success,
};
use console::style;
use dialoguer::Password;
use omniout_sdk::{RedirectParams, Session};
use serde_json::json;
use tracing::debug;

/// Handle login command
pub async fn handle_login(ctx: &AppContext, open_browser: bool) -> Result<()> {
    if ctx.client.is_demo() {
        print_info("Demo mode is enabled; no login is needed.");
        return Ok(());
    }

    let mut handler = ctx.redirect_handler()?;
    let mut server = CallbackServer::start(&ctx.config.oauth.redirect_uri).await?;
    debug!("Callback server bound to {}", server.local_addr());

    handler
        .initiate(&BrowserNavigator::new(open_browser))
        .await?;
    print_info("Waiting for the browser to redirect back (Ctrl+C to cancel)...");

    let pending = tokio::select! {
        pending = server.next_redirect() => pending?,
        _ = tokio::signal::ctrl_c() => {
            handler.reset();
            return Err(CliError::internal("Login cancelled"));
        }
    };

    let result = handler.complete_from_redirect(&pending.params).await;
    pending.respond(result.as_ref().map(|_| ()).map_err(|e| e.to_string()));
    server.shutdown().await;

    report_login(&result?);
    Ok(())
}

/// Handle complete-login command
pub async fn handle_complete_login(ctx: &AppContext, redirect_url: &str) -> Result<()> {
    let mut handler = ctx.redirect_handler()?;
    let params = RedirectParams::parse(redirect_url);

    let spinner = create_spinner("Exchanging authorization code...");
    let result = handler.complete_from_redirect(&params).await;
    spinner.finish_and_clear();

    report_login(&result?);
    Ok(())
}

/// Handle login-password command
pub async fn handle_password_login(ctx: &AppContext, options: PasswordLoginOptions) -> Result<()> {
    let password = match options.password {
        Some(password) => password,
        None => Password::new()
            .with_prompt(format!("Password for {}", options.username))
            .interact()?,
    };
    let instance_url = options
        .instance_url
        .unwrap_or_else(|| ctx.config.oauth.login_url.clone());

    let exchanger = ctx.exchanger()?;
    let spinner = create_spinner("Authenticating...");
    let result = exchanger
        .exchange_password(
            &options.username,
            &password,
            &instance_url,
            options.security_token.as_deref(),
        )
        .await;
    spinner.finish_and_clear();

    report_login(&result?);
    Ok(())
}

/// Handle logout command
pub async fn handle_logout(ctx: &AppContext) -> Result<()> {
    let was_authenticated = ctx.client.is_authenticated().await;
    ctx.client.logout().await?;

    if was_authenticated {
        print_success("Logged out");
    } else {
        print_info("Not logged in");
    }
    Ok(())
}

/// Handle status command
pub async fn handle_status(ctx: &AppContext, json: bool) -> Result<()> {
    let session = ctx.sessions.current().await;

    if json {
        return json_output(&json!({
            "authenticated": session.is_some(),
            "instance_url": session.as_ref().map(|s| s.instance_url.as_str()),
            "api_version": session.as_ref().map(|s| s.api_version.as_str()),
            "demo_mode": ctx.config.demo_mode,
            "data_dir": ctx.data_dir,
        }));
    }

    match &session {
        Some(session) => {
            print_success("Logged in");
            println!("  {}: {}", style("Instance").bold(), session.instance_url);
            println!("  {}: v{}", style("API version").bold(), session.api_version);
            println!(
                "  {}: {}",
                style("Access token").bold(),
                mask_secret(&session.access_token)
            );
        }
        None => print_info("Not logged in. Run 'omniout login' to connect your org."),
    }
    if ctx.config.demo_mode {
        print_info("Demo mode is enabled; sample records are served offline.");
    }
    println!(
        "  {}: {}",
        style("Data directory").bold(),
        compress_path(&ctx.data_dir)
    );

    Ok(())
}

fn report_login(session: &Session) {
    print_success(&format!("Logged in to {}", session.instance_url));
}
