//! Sign-in, sign-up and account commands.

use anyhow::{Context, Result};
use greenshield_core::api::models::{Role, SignupRequest};
use greenshield_core::logging::mask_token;
use greenshield_core::navigation::{Route, Tab};

use crate::cli::app::{App, Entry};

#[derive(clap::Args, Debug)]
pub struct SignupArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    phone: String,
    #[arg(long, env = "GREENSHIELD_PASSWORD", hide_env_values = true)]
    password: String,
    /// Repeat of the password (defaults to --password)
    #[arg(long)]
    confirm_password: Option<String>,
    /// Register as a farmer
    #[arg(long, requires = "farm_name")]
    farmer: bool,
    #[arg(long)]
    farm_name: Option<String>,
    #[arg(long)]
    farm_address: Option<String>,
}

/// Opens a public auth screen; false (with a note) when the guard bounced us.
fn open_public(app: &mut App, route: Route) -> bool {
    if let Entry::Redirected(_) = app.enter(route) {
        println!("Already signed in.");
        return false;
    }
    true
}

pub async fn login(app: &mut App, email: &str, password: &str) -> Result<()> {
    if !open_public(app, Route::Login) {
        return Ok(());
    }

    let token = app
        .gateway
        .login(email, password)
        .await
        .context("Sign in failed")?;
    app.session.sign_in(token).await?;
    app.settle();

    println!("Signed in as {}", email.trim().to_lowercase());
    Ok(())
}

pub async fn signup(app: &mut App, args: SignupArgs) -> Result<()> {
    if !open_public(app, Route::Register) {
        return Ok(());
    }

    let confirm = args.confirm_password.unwrap_or_else(|| args.password.clone());
    let request = SignupRequest {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        password: args.password,
        username: args.username,
        phone_number: args.phone,
        role: if args.farmer { Role::Farmer } else { Role::User },
        farm_name: args.farm_name,
        farm_address: args.farm_address,
    };
    request.validate(&confirm).map_err(anyhow::Error::msg)?;
    let request = request.normalized();

    match app.gateway.signup(&request).await.context("Sign up failed")? {
        Some(token) => {
            app.session.sign_in(token).await?;
            app.settle();
            println!("Account created. Signed in as {}", request.email);
        }
        None => {
            app.enter(Route::Otp);
            println!(
                "Account created. Check {} for a code, then run `greenshield verify`.",
                request.email
            );
        }
    }
    Ok(())
}

pub async fn verify(app: &mut App, email: &str, code: &str) -> Result<()> {
    if !open_public(app, Route::Otp) {
        return Ok(());
    }

    let token = app
        .gateway
        .confirm_email(email, code)
        .await
        .context("Verification failed")?;
    match token {
        Some(token) => {
            app.session.sign_in(token).await?;
            app.settle();
            println!("Email confirmed. Signed in as {}", email.trim().to_lowercase());
        }
        None => {
            app.enter(Route::Login);
            println!("Email confirmed. Sign in with `greenshield login`.");
        }
    }
    Ok(())
}

pub async fn resend_code(app: &mut App, email: &str) -> Result<()> {
    if !open_public(app, Route::Otp) {
        return Ok(());
    }
    app.gateway
        .resend_verification(email)
        .await
        .context("Could not resend the code")?;
    println!("A new verification code was sent to {}", email.trim().to_lowercase());
    Ok(())
}

pub async fn forgot_password(app: &mut App, email: &str) -> Result<()> {
    if !open_public(app, Route::ForgotPassword) {
        return Ok(());
    }
    if email.trim().is_empty() {
        anyhow::bail!("Please enter your email");
    }
    app.gateway
        .forgot_password(email)
        .await
        .context("Failed to send code")?;
    app.enter(Route::ResetPassword);
    println!("Reset code sent. Run `greenshield reset-password` with the code.");
    Ok(())
}

pub async fn reset_password(
    app: &mut App,
    email: &str,
    code: &str,
    password: &str,
    confirm: &str,
) -> Result<()> {
    if !open_public(app, Route::ResetPassword) {
        return Ok(());
    }
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }
    app.gateway
        .reset_password(email, code, password)
        .await
        .context("Failed to reset password")?;
    app.enter(Route::Login);
    println!("Password reset. Sign in with your new password.");
    Ok(())
}

pub async fn logout(app: &mut App) -> Result<()> {
    if app.session.sign_out().await {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    app.settle();
    Ok(())
}

pub fn status(app: &App) {
    match app.session.token() {
        Some(token) => println!("Signed in (token {})", mask_token(&token)),
        None => println!("Signed out"),
    }
    if let Some(route) = app.current_route() {
        println!("Screen: {route}");
    }
}

pub async fn profile(app: &mut App) -> Result<()> {
    app.require_session(Route::Tabs(Tab::Profile))?;
    let result = app.gateway.profile().await;
    let profile = result.map_err(|e| app.api_error(e))?;

    println!("{}", profile.display_name());
    let fields = [
        ("Email", profile.email.as_deref()),
        ("Username", profile.username.as_deref()),
        ("Phone", profile.phone_number.as_deref()),
        ("Role", profile.role.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            println!("  {label}: {value}");
        }
    }
    Ok(())
}
