//! Line-oriented front-end. Each command maps to one controller trigger.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::auth::Field;
use crate::controller::{Controller, Mode};

const HELP: &str = "\
commands:
  mode                  show the current screen
  toggle                switch between sign in and sign up
  set <field> <value>   fill a field (username, password, firstName, lastName,
                        email, contactNumber, address, profilePicture)
  show                  print the form or profile
  submit                sign in or sign up
  edit                  start or stop editing the profile
  save                  save the edited profile
  logout                sign out and clear the cached session
  quit                  leave";

fn mode_title(mode: Mode) -> &'static str {
    match mode {
        Mode::Auth { sign_up: false } => "Welcome Back!",
        Mode::Auth { sign_up: true } => "Create Account",
        Mode::ProfileView => "Profile",
        Mode::ProfileEdit => "Edit Profile",
    }
}

fn render(controller: &Controller) -> String {
    let form = controller.form();
    let mut out = format!("== {} ==\n", mode_title(controller.mode()));
    let fields: &[Field] = match controller.mode() {
        Mode::Auth { sign_up: false } => &[Field::Username, Field::Password],
        Mode::Auth { sign_up: true } => &Field::ALL[..],
        Mode::ProfileView | Mode::ProfileEdit => &Field::ALL[2..],
    };
    if controller.is_logged_in() && form.profile_picture.is_empty() {
        out.push_str("No Profile Picture\n");
    }
    for field in fields {
        let value = form.get(*field);
        let shown = if *field == Field::Password {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        out.push_str(&format!("{}: {}\n", field.label(), shown));
    }
    out
}

fn can_edit(mode: Mode, field: Field) -> bool {
    match mode {
        Mode::Auth { .. } => true,
        Mode::ProfileEdit => !matches!(field, Field::Username | Field::Password),
        Mode::ProfileView => false,
    }
}

/// Runs until `quit` or end of input.
pub async fn run<R, W>(controller: &mut Controller, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    output.write_all(render(controller).as_bytes()).await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        debug!(command, "shell command");

        let reply = match command {
            "help" => HELP.to_string(),
            "mode" => mode_title(controller.mode()).to_string(),
            "show" => render(controller),
            "toggle" => {
                controller.toggle_auth_mode();
                render(controller)
            }
            "set" => {
                let (name, value) = rest.split_once(' ').unwrap_or((rest, ""));
                match name.parse::<Field>() {
                    Ok(field) if can_edit(controller.mode(), field) => {
                        controller.set_field(field, value);
                        format!("{} set", field.label())
                    }
                    Ok(field) => format!("{} cannot be changed here", field.label()),
                    Err(e) => e,
                }
            }
            "submit" => {
                let alert = controller.submit().await;
                format!("{}\n{}", alert, render(controller))
            }
            "edit" => {
                controller.edit_profile();
                render(controller)
            }
            "save" => {
                let alert = controller.save_profile().await;
                format!("{}\n{}", alert, render(controller))
            }
            "logout" => match controller.logout().await {
                Ok(()) => render(controller),
                Err(e) => {
                    error!(error = %e, "logout failed");
                    e.alert().to_string()
                }
            },
            "quit" | "exit" => break,
            other => format!("unknown command: {other} (try `help`)"),
        };

        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(())
}
