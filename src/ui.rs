// UI layer: an interactive sign-up form built on `dialoguer`.
// All state lives in `RegistrationForm`; this module only prompts,
// prints, and forwards what the user picks.

use crate::api::Backend;
use crate::form::{RegistrationForm, SubmitOutcome};
use crate::models::{Field, LoginRedirect, Mode};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Main menu: pick a sign-up kind or exit.
pub fn main_menu<B: Backend>(api: &B) -> Result<()> {
    let form = RegistrationForm::new();
    loop {
        let items = vec!["Sign up as an individual", "Register a company", "Exit"];
        let selection = Select::new()
            .with_prompt("Create an account")
            .items(&items)
            .default(0)
            .interact()?;
        let mode = match selection {
            0 => Mode::Individual,
            1 => Mode::Company,
            _ => break,
        };
        form.switch_mode(mode);
        if let Some(redirect) = form_menu(&form, api)? {
            show_login(&redirect);
        }
    }
    Ok(())
}

enum Action {
    Edit(Field),
    ChooseImage,
    ClearImage,
    Submit,
    Back,
}

/// Form loop for the active mode. Returns the redirect once the backend
/// accepted the registration, or `None` if the user went back.
fn form_menu<B: Backend>(form: &RegistrationForm, api: &B) -> Result<Option<LoginRedirect>> {
    loop {
        let mode = form.mode();
        print_header(form, mode);

        let mut actions: Vec<Action> = mode.fields().iter().copied().map(Action::Edit).collect();
        actions.push(Action::ChooseImage);
        if form.selected_file().is_some() {
            actions.push(Action::ClearImage);
        }
        actions.push(Action::Submit);
        actions.push(Action::Back);

        let items: Vec<String> = actions.iter().map(|a| describe(form, mode, a)).collect();
        let selection = Select::new().items(&items).default(0).interact()?;

        match &actions[selection] {
            Action::Edit(field) => edit_field(form, *field)?,
            Action::ChooseImage => {
                let path: String = Input::new()
                    .with_prompt(format!("{} file path", mode.image_label()))
                    .interact_text()?;
                form.select_file(&PathBuf::from(path.trim()));
            }
            Action::ClearImage => form.clear_file(),
            Action::Submit => {
                if let Some(redirect) = submit_with_spinner(form, api)? {
                    return Ok(Some(redirect));
                }
            }
            Action::Back => return Ok(None),
        }
    }
}

fn print_header(form: &RegistrationForm, mode: Mode) {
    let title = match mode {
        Mode::Individual => "Individual sign-up",
        Mode::Company => "Company registration",
    };
    println!();
    println!("{}", title.bold());
    if let Some(file) = form.selected_file() {
        println!("{}: {} ({} bytes)", mode.image_label(), file.file_name, file.bytes.len());
    }
    if let Some(error) = form.error() {
        println!("{}", format!("✗ {}", error).red().bold());
    }
}

fn describe(form: &RegistrationForm, mode: Mode, action: &Action) -> String {
    match action {
        Action::Edit(field) => {
            let value = form.value(*field).unwrap_or_default();
            let shown = if field.is_secret() && !value.is_empty() {
                "•".repeat(8)
            } else {
                value
            };
            format!("{}: {}", field.label(), shown)
        }
        Action::ChooseImage => format!("{} (optional)...", mode.image_label()),
        Action::ClearImage => format!("Remove {}", mode.image_label().to_lowercase()),
        Action::Submit => "Submit".into(),
        Action::Back => "Back".into(),
    }
}

/// Prompt for one field. Enumerated fields get a list, passwords are hidden.
fn edit_field(form: &RegistrationForm, field: Field) -> Result<()> {
    let value = if let Some(options) = field.options() {
        let mut choices: Vec<&str> = options.to_vec();
        let optional = field != Field::Role;
        if optional {
            choices.push("(none)");
        }
        let current = form.value(field).unwrap_or_default();
        let default = choices.iter().position(|c| *c == current).unwrap_or(0);
        let picked = Select::new()
            .with_prompt(field.label())
            .items(&choices)
            .default(default)
            .interact()?;
        if optional && picked == choices.len() - 1 {
            String::new()
        } else {
            choices[picked].to_string()
        }
    } else if field.is_secret() {
        Password::new()
            .with_prompt(field.label())
            .allow_empty_password(true)
            .interact()?
    } else {
        Input::<String>::new()
            .with_prompt(field.label())
            .with_initial_text(form.value(field).unwrap_or_default())
            .allow_empty(true)
            .interact_text()?
    };

    if let Err(e) = form.set_field(field, &value) {
        println!("{}", e.to_string().yellow());
    }
    Ok(())
}

fn submit_with_spinner<B: Backend>(form: &RegistrationForm, api: &B) -> Result<Option<LoginRedirect>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("Submitting registration...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = form.submit(api);
    spinner.finish_and_clear();

    Ok(match outcome {
        SubmitOutcome::Completed(redirect) => Some(redirect),
        // The banner already carries the message; it is printed with the form.
        SubmitOutcome::Failed(_) | SubmitOutcome::Busy => None,
    })
}

/// Stand-in for the login view: shows the confirmation it was handed.
fn show_login(redirect: &LoginRedirect) {
    println!();
    println!("{}", redirect.message.as_str().green().bold());
    if redirect.company_login {
        println!("Sign in with your admin account to open the company workspace.");
    } else {
        println!("Sign in with your new account.");
    }
}
