// UI layer: interactive terminal menu built on `dialoguer`. It owns
// everything the API client deliberately does not: feature flags, upload
// checks, and what to do with the returned image.

use crate::api::{ApiClient, Operation};
use crate::error::PayloadError;
use crate::payload::{mime_for_path, UploadForm, DEFAULT_COLOR};
use crate::transport::{ApiResponse, Transport};
use anyhow::{bail, Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// One entry of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    RemoveBackground,
    Enhance,
    AddColorBackground,
    Exit,
}

impl MenuAction {
    fn label(self) -> &'static str {
        match self {
            MenuAction::RemoveBackground => "Remove background",
            MenuAction::Enhance => "Enhance image",
            MenuAction::AddColorBackground => "Add color background",
            MenuAction::Exit => "Exit",
        }
    }
}

/// Menu entries allowed by the feature flags, `Exit` always last.
pub fn menu_actions<T: Transport>(api: &ApiClient<T>) -> Vec<MenuAction> {
    let flags = api.config().features;
    let mut actions = Vec::new();
    if flags.enable_background_removal {
        actions.push(MenuAction::RemoveBackground);
    }
    if flags.enable_enhancement {
        actions.push(MenuAction::Enhance);
    }
    if flags.enable_color_background {
        actions.push(MenuAction::AddColorBackground);
    }
    actions.push(MenuAction::Exit);
    actions
}

/// Main interactive menu. Runs until the user chooses "Exit".
pub async fn main_menu<T: Transport>(api: ApiClient<T>) -> Result<()> {
    let actions = menu_actions(&api);
    let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
    loop {
        let selection = Select::new()
            .with_prompt("What do you want to do?")
            .items(&labels)
            .default(0)
            .interact()?;
        let Some(op) = operation_for(actions[selection])? else {
            break;
        };
        // A failed action is reported and the menu comes back.
        if let Err(e) = run_operation(&api, op).await {
            println!("{} {:#}", "Failed:".red(), e);
        }
    }
    Ok(())
}

/// Ask the per-action questions. `None` means the user chose to exit.
fn operation_for(action: MenuAction) -> Result<Option<Operation>> {
    let op = match action {
        MenuAction::RemoveBackground => Operation::RemoveBackground,
        MenuAction::Enhance => {
            let already_background_removed = Confirm::new()
                .with_prompt("Has the background already been removed?")
                .default(true)
                .interact()?;
            Operation::Enhance {
                already_background_removed,
            }
        }
        MenuAction::AddColorBackground => Operation::AddColorBackground,
        MenuAction::Exit => return Ok(None),
    };
    Ok(Some(op))
}

async fn run_operation<T: Transport>(api: &ApiClient<T>, op: Operation) -> Result<()> {
    let path: String = Input::new().with_prompt("Image file path").interact_text()?;
    let path = PathBuf::from(path.trim());
    let mut form = load_upload(api, &path)?;

    if op == Operation::AddColorBackground {
        let color: String = Input::new()
            .with_prompt("Background color (#rrggbb)")
            .default(DEFAULT_COLOR.to_string())
            .interact_text()?;
        form = form.with_color(&color)?;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!("Sending to {}...", api.config().url_for(op)));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = process(api, op, form, &path).await;
    spinner.finish_and_clear();

    let out = result?;
    println!("{} {}", "Saved".green(), out.display());
    Ok(())
}

/// Submit `form` and write the returned image next to `input`. Returns the
/// output path. Non-2xx responses are errors here even when the client
/// passes them through.
pub async fn process<T: Transport>(
    api: &ApiClient<T>,
    op: Operation,
    form: UploadForm,
    input: &Path,
) -> Result<PathBuf> {
    let res = api.submit(op, form).await?;
    if !res.is_success() {
        bail!("{op} failed with HTTP {}: {}", res.status, res.text());
    }
    let out = output_path(input, op);
    save_response(&res, &out)?;
    Ok(out)
}

/// Check the image against the configured upload limits, then read it.
/// Size and type are checked from metadata so oversized files are never
/// loaded.
pub fn load_upload<T: Transport>(api: &ApiClient<T>, path: &Path) -> Result<UploadForm> {
    let mime = mime_for_path(path).ok_or_else(|| PayloadError::UnknownFormat(path.to_path_buf()))?;
    let size = std::fs::metadata(path)
        .with_context(|| format!("failed to read {}", path.display()))?
        .len();
    api.config()
        .check_upload(size, mime)
        .with_context(|| format!("cannot upload {}", path.display()))?;
    Ok(UploadForm::from_file(path)?)
}

/// `photo.jpg` becomes `photo-no-bg.png` and so on, next to the input.
pub fn output_path(input: &Path, op: Operation) -> PathBuf {
    let suffix = match op {
        Operation::RemoveBackground => "no-bg",
        Operation::Enhance {
            already_background_removed: true,
        } => "enhanced-no-bg",
        Operation::Enhance {
            already_background_removed: false,
        } => "enhanced",
        Operation::AddColorBackground => "colored-bg",
    };
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    input.with_file_name(format!("{stem}-{suffix}.png"))
}

fn save_response(res: &ApiResponse, out: &Path) -> Result<()> {
    std::fs::write(out, &res.body)
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!(path = %out.display(), bytes = res.body.len(), "saved result");
    Ok(())
}
