//! Transport-neutral event types and selection tokens.
//!
//! Selection tokens are the callback strings attached to menu choices.
//! They stay compatible with the ones the original chat bot emitted, so
//! menus rendered by older transports keep working:
//!
//! ```text
//! create_master
//! master_unlimited | master_{n} | master_custom
//! unlimited_single | unlimited_multi
//! days_{n}_single  | days_{n}_multi
//! get_normal | my_licenses | help | admin | back_to_main
//! ```

use crate::error::{DispatchError, DispatchResult};
use oto_license::{Days, UseType};
use oto_types::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An event arriving from the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    /// A slash command such as `/start`.
    Command {
        actor: ActorId,
        #[serde(default)]
        display_name: String,
        /// Command name, with or without the leading slash.
        name: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// A menu choice was picked.
    Selection { actor: ActorId, token: String },
    /// A plain text message.
    FreeText { actor: ActorId, text: String },
}

impl Inbound {
    /// Creates a command event with no arguments.
    pub fn command(actor: ActorId, display_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Command {
            actor,
            display_name: display_name.into(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Creates a selection event.
    pub fn selection(actor: ActorId, token: impl Into<String>) -> Self {
        Self::Selection {
            actor,
            token: token.into(),
        }
    }

    /// Creates a free-text event.
    pub fn text(actor: ActorId, text: impl Into<String>) -> Self {
        Self::FreeText {
            actor,
            text: text.into(),
        }
    }

    /// Returns the actor who sent the event.
    #[must_use]
    pub fn actor(&self) -> ActorId {
        match self {
            Self::Command { actor, .. } | Self::Selection { actor, .. } | Self::FreeText { actor, .. } => *actor,
        }
    }
}

/// One menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub token: String,
}

impl Choice {
    /// Creates a choice that selects `action`.
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            token: action.token(),
        }
    }
}

/// A render instruction for the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Text with selectable choices.
    Menu {
        actor: ActorId,
        text: String,
        choices: Vec<Choice>,
    },
    /// Plain text.
    Text { actor: ActorId, text: String },
}

impl Outbound {
    /// Returns the recipient.
    #[must_use]
    pub fn actor(&self) -> ActorId {
        match self {
            Self::Menu { actor, .. } | Self::Text { actor, .. } => *actor,
        }
    }

    /// Returns the message body.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Menu { text, .. } | Self::Text { text, .. } => text,
        }
    }

    /// Returns the menu choices; empty for plain text.
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        match self {
            Self::Menu { choices, .. } => choices,
            Self::Text { .. } => &[],
        }
    }

    /// Returns the tokens of all choices, in order.
    #[must_use]
    pub fn tokens(&self) -> Vec<&str> {
        self.choices().iter().map(|c| c.token.as_str()).collect()
    }
}

/// A decoded selection token or command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Open the Master duration menu.
    CreateMaster,
    /// Pick a Master duration; `None` is unlimited. Opens the use-type menu.
    MasterDuration(Option<Days>),
    /// Ask for a custom Master duration as free text.
    MasterCustom,
    /// Issue a Master credential.
    IssueMaster {
        days: Option<Days>,
        use_type: UseType,
    },
    /// Ask for device id and duration as free text.
    GetNormal,
    /// List the actor's own credentials.
    MyLicenses,
    Help,
    /// Global counts.
    Admin,
    /// Main menu.
    BackToMain,
}

impl Action {
    /// Decodes a selection token. Day counts must lie in `1..=master_max`.
    pub fn parse(token: &str, master_max: u32) -> DispatchResult<Self> {
        let invalid = || DispatchError::Validation(format!("unknown selection: {token}"));
        let days = |n: &str| {
            n.parse::<u32>()
                .ok()
                .and_then(|n| Days::bounded(n, master_max).ok())
                .ok_or_else(|| DispatchError::Validation(format!("duration out of range: {token}")))
        };

        let action = match token {
            "create_master" => Self::CreateMaster,
            "master_unlimited" => Self::MasterDuration(None),
            "master_custom" => Self::MasterCustom,
            "unlimited_single" => Self::IssueMaster {
                days: None,
                use_type: UseType::Single,
            },
            "unlimited_multi" => Self::IssueMaster {
                days: None,
                use_type: UseType::Multi,
            },
            "get_normal" => Self::GetNormal,
            "my_licenses" => Self::MyLicenses,
            "help" => Self::Help,
            "admin" => Self::Admin,
            "back_to_main" => Self::BackToMain,
            _ => {
                if let Some(n) = token.strip_prefix("master_") {
                    Self::MasterDuration(Some(days(n)?))
                } else if let Some(rest) = token.strip_prefix("days_") {
                    let (n, tag) = rest.split_once('_').ok_or_else(invalid)?;
                    let use_type = match tag {
                        "single" => UseType::Single,
                        "multi" => UseType::Multi,
                        _ => return Err(invalid()),
                    };
                    Self::IssueMaster {
                        days: Some(days(n)?),
                        use_type,
                    }
                } else {
                    return Err(invalid());
                }
            }
        };
        Ok(action)
    }

    /// Maps a command name (with or without `/`) to its action.
    ///
    /// `/start` maps to [`Action::BackToMain`]. Unknown names give `None`.
    #[must_use]
    pub fn from_command(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('/').to_ascii_lowercase();
        match name.as_str() {
            "start" => Some(Self::BackToMain),
            "help" => Some(Self::Help),
            "master" => Some(Self::CreateMaster),
            "normal" => Some(Self::GetNormal),
            "licenses" => Some(Self::MyLicenses),
            "stats" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Encodes the action as a selection token.
    #[must_use]
    pub fn token(&self) -> String {
        match self {
            Self::CreateMaster => "create_master".to_string(),
            Self::MasterDuration(None) => "master_unlimited".to_string(),
            Self::MasterDuration(Some(days)) => format!("master_{days}"),
            Self::MasterCustom => "master_custom".to_string(),
            Self::IssueMaster { days: None, use_type } => {
                format!("unlimited_{}", use_type.tag().to_ascii_lowercase())
            }
            Self::IssueMaster {
                days: Some(days),
                use_type,
            } => format!("days_{days}_{}", use_type.tag().to_ascii_lowercase()),
            Self::GetNormal => "get_normal".to_string(),
            Self::MyLicenses => "my_licenses".to_string(),
            Self::Help => "help".to_string(),
            Self::Admin => "admin".to_string(),
            Self::BackToMain => "back_to_main".to_string(),
        }
    }

    /// Returns true for actions only admins may take.
    #[must_use]
    pub const fn requires_privilege(&self) -> bool {
        matches!(
            self,
            Self::CreateMaster
                | Self::MasterDuration(_)
                | Self::MasterCustom
                | Self::IssueMaster { .. }
                | Self::Admin
        )
    }

    /// Describes a privileged action for rejection messages.
    #[must_use]
    pub const fn privilege_description(&self) -> &'static str {
        match self {
            Self::Admin => "view the admin panel",
            _ => "create Master licenses",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}
