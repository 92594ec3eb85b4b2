//! Device → category → alarm dialogue.
//!
//! [`resolve`] is the pure state machine: given the current session and one
//! user utterance it decides the next session and the reply. [`Dialogue`]
//! binds it to a knowledge table and an injected [`SessionStore`].

use std::sync::Arc;

use serde::Deserialize;

use crate::knowledge::KnowledgeTable;
use crate::session::{SessionState, SessionStore};
use crate::text::{normalize, truncate};


/// Input that restarts the flow from any step.
pub const RESTART_COMMAND: &str = "/start";

/// Prompt sent when a flow starts.
pub const WELCOME_TEXT: &str =
    "Welcome to the network alarm assistant.\nWhich device are you troubleshooting?";

/// How a recognized but uncovered `(device, category)` selection is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedCategoryPolicy {
    /// Stay at the category step and offer the categories again.
    #[default]
    Hold,
    /// Advance to the alarm step for the chosen category anyway.
    Advance,
}

/// What a reply represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Flow (re)started; device choices follow.
    Welcome,
    /// Selection accepted; the next step's choices follow.
    Prompt,
    /// Input not valid at the current step; the same choices follow.
    Invalid,
    /// Selection recognized but no entries are published for it.
    Unsupported,
    /// Final resolution text; the session has been cleared.
    Resolution,
}

/// Reply text plus the choices valid for the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// What this reply represents.
    pub kind: ReplyKind,
    /// Text to show the user.
    pub text: String,
    /// Display labels the user may pick next. Empty after a resolution.
    pub choices: Vec<String>,
}

/// Outcome of one resolver step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Session after this step; `None` means the session is cleared.
    pub next: Option<SessionState>,
    /// Reply for the user.
    pub reply: Reply,
}

fn device_choices(table: &KnowledgeTable) -> Vec<String> {
    table.devices().iter().map(|d| d.label.clone()).collect()
}

fn category_choices(table: &KnowledgeTable) -> Vec<String> {
    table.categories().iter().map(|c| c.label.clone()).collect()
}

fn alarm_choices(table: &KnowledgeTable, category: &str) -> Vec<String> {
    table
        .alarms(category)
        .iter()
        .map(|e| e.alarm.clone())
        .collect()
}

fn device_label<'a>(table: &'a KnowledgeTable, key: &'a str) -> &'a str {
    table.device(key).map(|d| d.label.as_str()).unwrap_or(key)
}

fn category_label<'a>(table: &'a KnowledgeTable, key: &'a str) -> &'a str {
    table.category(key).map(|c| c.label.as_str()).unwrap_or(key)
}

/// The welcome reply offering every device.
pub fn welcome(table: &KnowledgeTable) -> Reply {
    Reply {
        kind: ReplyKind::Welcome,
        text: WELCOME_TEXT.to_string(),
        choices: device_choices(table),
    }
}

/// Decide the next session state and reply for one utterance.
///
/// An unknown session always receives the welcome prompt, whatever the input.
/// Invalid input never changes the state; the reply repeats the step's choices.
/// A matched alarm returns the stored resolution text verbatim and clears the
/// session.
pub fn resolve(
    table: &KnowledgeTable,
    policy: UnsupportedCategoryPolicy,
    current: Option<&SessionState>,
    input: &str,
) -> Transition {
    let Some(state) = current else {
        return Transition {
            next: Some(SessionState::AwaitingDevice),
            reply: welcome(table),
        };
    };
    let shown = input.trim();

    match state {
        SessionState::AwaitingDevice => match table.device(input) {
            Some(device) => Transition {
                next: Some(SessionState::AwaitingCategory {
                    device: device.key.clone(),
                }),
                reply: Reply {
                    kind: ReplyKind::Prompt,
                    text: format!("{} selected. Which alarm category?", device.label),
                    choices: category_choices(table),
                },
            },
            None => Transition {
                next: Some(state.clone()),
                reply: Reply {
                    kind: ReplyKind::Invalid,
                    text: format!(
                        "\"{}\" is not a supported device. Please choose one of the devices below.",
                        shown
                    ),
                    choices: device_choices(table),
                },
            },
        },

        SessionState::AwaitingCategory { device } => match table.category(input) {
            Some(category) if table.is_covered(device, &category.key) => Transition {
                next: Some(SessionState::AwaitingAlarm {
                    device: device.clone(),
                    category: category.key.clone(),
                }),
                reply: Reply {
                    kind: ReplyKind::Prompt,
                    text: format!(
                        "{} alarms for {}. Which alarm are you seeing?",
                        category.label,
                        device_label(table, device)
                    ),
                    choices: alarm_choices(table, &category.key),
                },
            },
            Some(category) => {
                let unsupported = format!(
                    "{} alarms for {} are not yet supported.",
                    category.label,
                    device_label(table, device)
                );
                match policy {
                    UnsupportedCategoryPolicy::Hold => Transition {
                        next: Some(state.clone()),
                        reply: Reply {
                            kind: ReplyKind::Unsupported,
                            text: format!("{unsupported} Please choose another category."),
                            choices: category_choices(table),
                        },
                    },
                    UnsupportedCategoryPolicy::Advance => Transition {
                        next: Some(SessionState::AwaitingAlarm {
                            device: device.clone(),
                            category: category.key.clone(),
                        }),
                        reply: Reply {
                            kind: ReplyKind::Unsupported,
                            text: unsupported,
                            choices: alarm_choices(table, &category.key),
                        },
                    },
                }
            }
            None => Transition {
                next: Some(state.clone()),
                reply: Reply {
                    kind: ReplyKind::Invalid,
                    text: format!(
                        "\"{}\" is not an alarm category. Please choose one of the categories below.",
                        shown
                    ),
                    choices: category_choices(table),
                },
            },
        },

        SessionState::AwaitingAlarm { category, .. } => match table.lookup(category, input) {
            Some(entry) => Transition {
                next: None,
                reply: Reply {
                    kind: ReplyKind::Resolution,
                    text: entry.text.clone(),
                    choices: Vec::new(),
                },
            },
            None => Transition {
                next: Some(state.clone()),
                reply: Reply {
                    kind: ReplyKind::Invalid,
                    text: format!(
                        "\"{}\" is not a known {} alarm. Please choose one of the alarms below.",
                        shown,
                        category_label(table, category).to_lowercase()
                    ),
                    choices: alarm_choices(table, category),
                },
            },
        },
    }
}

/// Dialogue service bound to one front-end's session store.
pub struct Dialogue {
    table: Arc<KnowledgeTable>,
    store: Arc<dyn SessionStore>,
    policy: UnsupportedCategoryPolicy,
}

impl Dialogue {
    /// Create a dialogue over a shared table and a front-end's own store.
    pub fn new(
        table: Arc<KnowledgeTable>,
        store: Arc<dyn SessionStore>,
        policy: UnsupportedCategoryPolicy,
    ) -> Self {
        Self {
            table,
            store,
            policy,
        }
    }

    /// The knowledge table this dialogue answers from.
    pub fn table(&self) -> &KnowledgeTable {
        &self.table
    }

    /// The session store this dialogue writes to.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Current session state for `key`.
    pub fn state(&self, key: &str) -> Option<SessionState> {
        self.store.get(key)
    }

    /// Reset `key` to the device step and return the welcome prompt.
    pub fn restart(&self, key: &str) -> Reply {
        self.store.put(key, SessionState::AwaitingDevice);
        tracing::debug!(session = key, "dialogue restarted");
        welcome(&self.table)
    }

    /// Feed one user message for `key` through the resolver.
    ///
    /// The restart command resets the flow from any step.
    pub fn handle(&self, key: &str, input: &str) -> Reply {
        if normalize(input) == RESTART_COMMAND {
            return self.restart(key);
        }

        let mut reply = None;
        self.store.update(key, &mut |current| {
            let transition = resolve(&self.table, self.policy, current, input);
            reply = Some(transition.reply);
            transition.next
        });
        // `update` always invokes the closure exactly once.
        let reply = reply.unwrap_or_else(|| welcome(&self.table));

        tracing::debug!(
            session = key,
            input = %truncate(input.trim(), 40),
            kind = ?reply.kind,
            "dialogue step"
        );
        reply
    }
}
