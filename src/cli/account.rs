//! Account commands: sign in/out and the profile.

use crate::api::models::{RegisterRequest, UpdateProfileRequest, User};
use crate::cli::context::CliContext;
use crate::cli::error::{CliError, CliResult};
use crate::cli::prompt::{prompt, prompt_required, value_or_prompt};

pub async fn login(ctx: &CliContext, username: Option<String>) -> CliResult {
    let username = value_or_prompt(username, "Username: ", "Username")?;
    let password = prompt_required("Password: ", "Password")?;

    let user = ctx.auth().login(username.trim(), &password).await?;
    println!("✅ Signed in as {}", user.display_name());
    Ok(())
}

pub async fn register(
    ctx: &CliContext,
    username: Option<String>,
    email: Option<String>,
    nickname: Option<String>,
) -> CliResult {
    let username = value_or_prompt(username, "Username: ", "Username")?;
    let email = value_or_prompt(email, "Email: ", "Email")?;
    let password = prompt_required("Password: ", "Password")?;
    let confirm = prompt("Confirm password: ")?;
    if password != confirm {
        return Err(CliError::usage("Passwords do not match"));
    }

    let request = RegisterRequest {
        username: username.trim().to_string(),
        email: email.trim().to_string(),
        password,
        nickname: nickname.filter(|n| !n.trim().is_empty()),
    };
    let user = ctx.auth().register(&request).await?;
    println!("✅ Registered and signed in as {}", user.display_name());
    Ok(())
}

pub fn logout(ctx: &CliContext) -> CliResult {
    let was_signed_in = ctx.state.session.is_authenticated();
    ctx.auth().logout();
    if was_signed_in {
        println!("✅ Signed out");
    } else {
        println!("Not signed in; stored credentials cleared");
    }
    Ok(())
}

pub async fn whoami(ctx: &CliContext) -> CliResult {
    ctx.require_session()?;
    let user = ctx.auth().fetch_user().await?;
    print_user(&user);
    Ok(())
}

pub async fn profile(
    ctx: &CliContext,
    request: UpdateProfileRequest,
    change_password: bool,
) -> CliResult {
    ctx.require_session()?;
    let auth = ctx.auth();

    if request.is_empty() && !change_password {
        let user = auth.fetch_user().await?;
        print_user(&user);
        return Ok(());
    }

    if !request.is_empty() {
        let user = auth.update_profile(&request).await?;
        println!("✅ Profile updated");
        print_user(&user);
    }

    if change_password {
        let old_password = prompt_required("Current password: ", "Password")?;
        let new_password = prompt_required("New password: ", "Password")?;
        auth.change_password(&old_password, &new_password).await?;
        println!("✅ Password changed");
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("{} (@{})", user.display_name(), user.username);
    println!("  id: {}", user.id);
    println!("  email: {}", user.email);
    if let Some(bio) = user.bio.as_deref().filter(|bio| !bio.is_empty()) {
        println!("  bio: {bio}");
    }
    if let Some(created) = user.created_at {
        println!("  member since: {}", created.format("%Y-%m-%d"));
    }
}
