//! Message text for every reply the dispatcher produces.
//!
//! Rendering is pure formatting over already-committed state.

use crate::error::DispatchError;
use crate::protocol::{Action, Choice, Outbound};
use crate::session::InputError;
use chrono::{DateTime, Utc};
use oto_license::{Credential, CredentialKind, Days, UseType};
use oto_registry::RegistryStats;
use oto_types::ActorId;
use std::fmt::Write;

/// Date format shown to actors.
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";

fn display_date(at: DateTime<Utc>) -> String {
    at.format(DISPLAY_DATE_FORMAT).to_string()
}

fn text(actor: ActorId, text: impl Into<String>) -> Outbound {
    Outbound::Text {
        actor,
        text: text.into(),
    }
}

fn menu(actor: ActorId, text: impl Into<String>, choices: Vec<Choice>) -> Outbound {
    Outbound::Menu {
        actor,
        text: text.into(),
        choices,
    }
}

fn use_type_label(use_type: UseType) -> &'static str {
    match use_type {
        UseType::Single => "single-use",
        UseType::Multi => "multi-use",
    }
}

fn use_type_choices(days: Option<Days>) -> Vec<Choice> {
    vec![
        Choice::new(
            "Single use",
            Action::IssueMaster {
                days,
                use_type: UseType::Single,
            },
        ),
        Choice::new(
            "Multi use",
            Action::IssueMaster {
                days,
                use_type: UseType::Multi,
            },
        ),
    ]
}

// ── Menus ────────────────────────────────────────────────────────

/// Main menu. Admins also get the admin panel entry.
pub fn main_menu(actor: ActorId, display_name: &str, privileged: bool) -> Outbound {
    let greeting = if display_name.is_empty() {
        "Hello!".to_string()
    } else {
        format!("Hello {display_name}!")
    };
    let body = format!(
        "OtoService License Bot\n\n{greeting}\n\n\
         Master license: flexible, admin only\n\
         Normal license: bound to one device, time limited\n\n\
         What would you like to do?"
    );
    let mut choices = vec![
        Choice::new("Create Master license", Action::CreateMaster),
        Choice::new("Create Normal license", Action::GetNormal),
        Choice::new("My licenses", Action::MyLicenses),
        Choice::new("Help", Action::Help),
    ];
    if privileged {
        choices.push(Choice::new("Admin panel", Action::Admin));
    }
    menu(actor, body, choices)
}

/// Master duration menu: unlimited, the presets, custom, back.
pub fn master_duration_menu(actor: ActorId, presets: &[Days]) -> Outbound {
    let mut choices = vec![Choice::new("Unlimited", Action::MasterDuration(None))];
    choices.extend(
        presets
            .iter()
            .map(|&days| Choice::new(format!("{days} days"), Action::MasterDuration(Some(days)))),
    );
    choices.push(Choice::new("Custom duration", Action::MasterCustom));
    choices.push(Choice::new("Back", Action::BackToMain));
    menu(
        actor,
        "Create Master license\n\n\
         Choose how long the license stays valid:\n\
         Unlimited never expires, a fixed duration expires after that many days, \
         custom lets you enter the number of days.\n\n\
         Every license is either single-use or multi-use.",
        choices,
    )
}

/// Use-type menu for a chosen Master duration.
pub fn use_type_menu(actor: ActorId, days: Option<Days>) -> Outbound {
    let mut choices = use_type_choices(days);
    choices.push(Choice::new("Back", Action::CreateMaster));
    menu(
        actor,
        "Choose the usage type\n\n\
         Single use: can be redeemed once, then it is spent.\n\
         Multi use: can be redeemed any number of times.",
        choices,
    )
}

/// Use-type menu after a custom duration was typed in.
pub fn custom_duration_accepted(actor: ActorId, days: Days) -> Outbound {
    menu(
        actor,
        format!("Duration: {days} days\n\nChoose the usage type:"),
        use_type_choices(Some(days)),
    )
}

// ── Prompts ──────────────────────────────────────────────────────

/// Asks for a custom Master duration.
pub fn custom_duration_prompt(actor: ActorId, max: u32) -> Outbound {
    text(
        actor,
        format!("Custom duration\n\nHow many days should the license be valid (1-{max})?\n\nExample: 90"),
    )
}

/// Asks for device id and duration of a Normal credential.
pub fn normal_prompt(actor: ActorId, max: u32) -> Outbound {
    text(
        actor,
        format!(
            "Normal license\n\n\
             Send the device id and the duration (1-{max} days) on two lines.\n\n\
             Example:\nabc123def456\n30"
        ),
    )
}

/// Re-prompt after rejected free text.
pub fn input_error(actor: ActorId, error: &InputError) -> Outbound {
    let reason = error.to_string();
    let mut message = String::new();
    let mut chars = reason.chars();
    if let Some(first) = chars.next() {
        message.extend(first.to_uppercase());
        message.extend(chars);
    }
    message.push('.');
    text(actor, message)
}

/// Reply to free text while no interaction is pending.
pub fn idle_hint(actor: ActorId) -> Outbound {
    text(actor, "Use /start for the menu or /help for help.")
}

/// Reply to an unrecognized command.
pub fn unknown_command(actor: ActorId, name: &str) -> Outbound {
    text(
        actor,
        format!("Unknown command {name}. Use /start for the menu or /help for help."),
    )
}

// ── Results ──────────────────────────────────────────────────────

/// Issuance result: code, use type and lifetime.
pub fn issued(actor: ActorId, credential: &Credential) -> Outbound {
    let mut body = String::new();
    match credential.kind() {
        CredentialKind::Master => {
            let use_type = UseType::from_single_use(credential.is_single_use());
            let _ = write!(
                body,
                "Master license created\n\nCode: {}\nUsage: {}\n",
                credential.code(),
                use_type_label(use_type)
            );
        }
        CredentialKind::Normal => {
            let _ = write!(
                body,
                "Normal license created\n\nCode: {}\nDevice: {}\n",
                credential.code(),
                credential.device_id().unwrap_or_default()
            );
        }
    }
    match credential.expires_at() {
        None => body.push_str("Duration: unlimited"),
        Some(expires_at) => {
            let days = (expires_at - credential.created_at()).num_days();
            let _ = write!(
                body,
                "Duration: {days} days (expires {})",
                display_date(expires_at)
            );
        }
    }
    text(actor, body)
}

/// The actor's own credentials with validity marks.
pub fn listing(actor: ActorId, credentials: &[Credential], now: DateTime<Utc>) -> Outbound {
    if credentials.is_empty() {
        return text(actor, "You have no licenses yet.");
    }
    let mut body = String::from("Your licenses:\n");
    for credential in credentials {
        let mark = if credential.is_valid_at(now) { "[valid]" } else { "[invalid]" };
        let _ = write!(body, "\n{mark} {}\n{}\n", credential.code(), credential.kind());
        if credential.kind() == CredentialKind::Master {
            let usage = match (credential.is_single_use(), credential.is_consumed()) {
                (false, _) => "multi-use",
                (true, false) => "not used yet",
                (true, true) => "used",
            };
            let _ = writeln!(body, "{usage}");
        }
        let _ = writeln!(body, "Created {}", display_date(credential.created_at()));
    }
    text(actor, body.trim_end().to_string())
}

/// Admin panel with global counts. Never shows codes.
pub fn admin_panel(actor: ActorId, stats: &RegistryStats) -> Outbound {
    text(
        actor,
        format!(
            "Admin panel\n\n\
             Users: {}\n\
             Licenses: {}\n\
             - Master: {}\n\
             - Normal: {}\n\
             Consumed single-use: {}\n\n\
             Commands:\n\
             /master - create a Master license\n\
             /stats - show these statistics",
            stats.total_users,
            stats.total_credentials,
            stats.by_kind.master,
            stats.by_kind.normal,
            stats.consumed_single_use
        ),
    )
}

/// Help text.
pub fn help(actor: ActorId) -> Outbound {
    text(
        actor,
        "Help\n\n\
         Master license:\n\
         - created by admins only\n\
         - unlimited or time limited\n\
         - single-use or multi-use\n\
         - verifiable offline\n\n\
         Normal license:\n\
         - bound to one device\n\
         - time limited, up to one year\n\
         - open to everyone\n\n\
         Commands: /start /master /normal /licenses /stats /help",
    )
}

/// Rejection text for a failed request.
pub fn error(actor: ActorId, error: &DispatchError) -> Outbound {
    let body = match error {
        DispatchError::Unauthorized { action, .. }
            if *action == Action::CreateMaster.privilege_description() =>
        {
            "Only admins can create Master licenses.\n\nUse /normal for a Normal license.".to_string()
        }
        DispatchError::Unauthorized { .. } => "This feature is for admins only.".to_string(),
        DispatchError::Validation(reason) => format!("Invalid request: {reason}."),
        DispatchError::IssuanceExhausted { .. } => {
            "Could not create a license right now. Please try again.".to_string()
        }
        DispatchError::Registry(_) => {
            format!("Request failed: {error}.")
        }
    };
    text(actor, body)
}
