//! Command classification
//!
//! Raw text is matched against [`RULES`] in order and the first rule that
//! produces a command wins. Several forms overlap (`show last 3` vs
//! `show last 3 prompts`, `!kazbot help x` vs `!kazbot <integration>`), so
//! the order is part of the contract. Rules match whole phrases or tokens,
//! never bare substrings.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Window-scoped analytics and export rules
//! - 1.1.0: Lifecycle and integration lookup rules
//! - 1.0.0: Memory, export and analytics phrases

use crate::features::analytics::ExportKind;
use crate::features::lifecycle::LifecycleAction;
use crate::features::modules::normalize_module_name;
use regex::Regex;
use std::sync::OnceLock;

/// Memory, prompt and answer inspection commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryCommand {
    ListMemory,
    ListMemoryFull,
    ShowLast(usize),
    ResetMemory,
    ListPrompts,
    ShowLastPrompts(usize),
    ShowFullPrompts,
    ClearPrompts,
    ListAnswers,
    ShowLastAnswers(usize),
    ShowFullAnswers,
    ClearAnswers,
}

/// A classified inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Export(ExportKind),
    StaticHelp,
    ListIntegrations,
    Lifecycle { action: LifecycleAction, module: String },
    SessionAnalytics,
    IntegrationLookup { name: String },
    Memory(MemoryCommand),
    ShowAnalytics,
    /// Recognised command shape with unusable arguments
    Malformed { reason: String },
    /// Not a command; the original text goes to the AI
    Fallback(String),
}

/// Handler routing key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Export,
    StaticHelp,
    ListIntegrations,
    Lifecycle,
    SessionAnalytics,
    IntegrationLookup,
    Memory,
    ShowAnalytics,
    Malformed,
    Fallback,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Export(_) => CommandKind::Export,
            Command::StaticHelp => CommandKind::StaticHelp,
            Command::ListIntegrations => CommandKind::ListIntegrations,
            Command::Lifecycle { .. } => CommandKind::Lifecycle,
            Command::SessionAnalytics => CommandKind::SessionAnalytics,
            Command::IntegrationLookup { .. } => CommandKind::IntegrationLookup,
            Command::Memory(_) => CommandKind::Memory,
            Command::ShowAnalytics => CommandKind::ShowAnalytics,
            Command::Malformed { .. } => CommandKind::Malformed,
            Command::Fallback(_) => CommandKind::Fallback,
        }
    }
}

/// Text prepared once for all rules
pub struct RuleInput<'a> {
    /// Trimmed, original case
    pub trimmed: &'a str,
    /// Trimmed and lowercased
    pub folded: String,
    /// `folded` without a leading `!`
    pub normalized: String,
    /// `trimmed` without a leading `!`, original case
    pub normalized_original: &'a str,
    /// Integration names recognised by `!kazbot <name>`
    pub known_integrations: &'a [String],
}

impl<'a> RuleInput<'a> {
    pub fn new(text: &'a str, known_integrations: &'a [String]) -> Self {
        let trimmed = text.trim();
        let folded = trimmed.to_lowercase();
        let normalized = folded.strip_prefix('!').unwrap_or(&folded).trim_start().to_string();
        let normalized_original = trimmed.strip_prefix('!').unwrap_or(trimmed).trim_start();
        Self {
            trimmed,
            folded,
            normalized,
            normalized_original,
            known_integrations,
        }
    }
}

pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&RuleInput) -> Option<Command>,
}

/// Classification rules, highest priority first
pub const RULES: &[Rule] = &[
    Rule { name: "export", apply: export_rule },
    Rule { name: "static-help", apply: static_help_rule },
    Rule { name: "list-integrations", apply: list_integrations_rule },
    Rule { name: "lifecycle", apply: lifecycle_rule },
    Rule { name: "session-analytics", apply: session_analytics_rule },
    Rule { name: "session-export", apply: session_export_rule },
    Rule { name: "integration-lookup", apply: integration_lookup_rule },
    Rule { name: "memory", apply: memory_rule },
    Rule { name: "show-analytics", apply: show_analytics_rule },
];

/// Classify `text`; anything no rule claims is a fallback
pub fn classify(text: &str, known_integrations: &[String]) -> Command {
    let input = RuleInput::new(text, known_integrations);
    RULES
        .iter()
        .find_map(|rule| (rule.apply)(&input))
        .unwrap_or_else(|| Command::Fallback(text.to_string()))
}

fn export_rule(input: &RuleInput) -> Option<Command> {
    let kind = match input.folded.as_str() {
        "export memory as json" => ExportKind::Memory,
        "export prompts as json" => ExportKind::Prompts,
        "export answers as markdown" => ExportKind::Answers,
        _ => return None,
    };
    Some(Command::Export(kind))
}

fn static_help_rule(input: &RuleInput) -> Option<Command> {
    (input.folded == "kazbot help!").then_some(Command::StaticHelp)
}

fn list_integrations_rule(input: &RuleInput) -> Option<Command> {
    (input.normalized == "kazbot command services").then_some(Command::ListIntegrations)
}

fn lifecycle_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^kazbot\s+(init|close|status|restart|help)(?:\s+(.*))?$").ok()
    })
    .as_ref()
}

fn lifecycle_rule(input: &RuleInput) -> Option<Command> {
    let caps = lifecycle_regex()?.captures(input.normalized_original)?;
    let action: LifecycleAction = caps.get(1)?.as_str().parse().ok()?;
    let module = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

    if module.is_empty() {
        return Some(Command::Malformed {
            reason: format!(
                "Please name a module, e.g. `!kazbot {} Weather`. Use `!kazbot command services` to list modules.",
                action.as_str()
            ),
        });
    }
    Some(Command::Lifecycle {
        action,
        module: module.to_string(),
    })
}

fn session_analytics_rule(input: &RuleInput) -> Option<Command> {
    (input.folded == "!kazbot show session analytics").then_some(Command::SessionAnalytics)
}

fn session_export_rule(input: &RuleInput) -> Option<Command> {
    let kind = match input.folded.strip_prefix("!kazbot export session ")?.trim() {
        "answers" => ExportKind::SessionAnswers,
        "memory" => ExportKind::SessionMemory,
        "prompts" => ExportKind::SessionPrompts,
        _ => return None,
    };
    Some(Command::Export(kind))
}

fn integration_lookup_rule(input: &RuleInput) -> Option<Command> {
    const PREFIX: &str = "!kazbot ";
    let prefix = input.trimmed.get(..PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    let remainder = input.trimmed[PREFIX.len()..].trim();
    let wanted = normalize_module_name(remainder);
    if wanted.is_empty() {
        return None;
    }
    input
        .known_integrations
        .iter()
        .any(|name| normalize_module_name(name) == wanted)
        .then(|| Command::IntegrationLookup {
            name: remainder.to_string(),
        })
}

fn memory_rule(input: &RuleInput) -> Option<Command> {
    let command = match input.folded.as_str() {
        "list memory" => MemoryCommand::ListMemory,
        "list memory full" => MemoryCommand::ListMemoryFull,
        "reset memory" => MemoryCommand::ResetMemory,
        "list prompts" => MemoryCommand::ListPrompts,
        "show full prompts" => MemoryCommand::ShowFullPrompts,
        "clear prompts" => MemoryCommand::ClearPrompts,
        "list answers" => MemoryCommand::ListAnswers,
        "show full answers" => MemoryCommand::ShowFullAnswers,
        "clear answers" => MemoryCommand::ClearAnswers,
        _ => return show_last_rule(input),
    };
    Some(Command::Memory(command))
}

/// `show last <N>[ prompts|answers]`, decided by the fourth token
fn show_last_rule(input: &RuleInput) -> Option<Command> {
    let mut tokens = input.folded.split_whitespace();
    if tokens.next() != Some("show") || tokens.next() != Some("last") {
        return None;
    }

    let Some(n) = tokens
        .next()
        .and_then(|t| t.parse::<usize>().ok())
        .filter(|n| *n > 0)
    else {
        return Some(Command::Malformed {
            reason: "`show last` needs a positive number, e.g. `show last 3` or `show last 3 prompts`."
                .to_string(),
        });
    };

    let command = match tokens.next() {
        Some("prompts") => MemoryCommand::ShowLastPrompts(n),
        Some("answers") => MemoryCommand::ShowLastAnswers(n),
        _ => MemoryCommand::ShowLast(n),
    };
    Some(Command::Memory(command))
}

fn show_analytics_rule(input: &RuleInput) -> Option<Command> {
    (input.folded == "show analytics").then_some(Command::ShowAnalytics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec!["Microsoft Entra".to_string(), "Weather".to_string()]
    }

    fn c(text: &str) -> Command {
        classify(text, &known())
    }

    fn rule(name: &str) -> &'static Rule {
        RULES.iter().find(|r| r.name == name).unwrap()
    }

    fn apply(name: &str, text: &str) -> Option<Command> {
        let names = known();
        (rule(name).apply)(&RuleInput::new(text, &names))
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "export",
                "static-help",
                "list-integrations",
                "lifecycle",
                "session-analytics",
                "session-export",
                "integration-lookup",
                "memory",
                "show-analytics"
            ]
        );
    }

    #[test]
    fn test_export_rule() {
        assert_eq!(apply("export", "  Export Memory as JSON "), Some(Command::Export(ExportKind::Memory)));
        assert_eq!(apply("export", "export prompts as json"), Some(Command::Export(ExportKind::Prompts)));
        assert_eq!(apply("export", "export answers as markdown"), Some(Command::Export(ExportKind::Answers)));
        assert_eq!(apply("export", "export answers as json"), None);
    }

    #[test]
    fn test_static_help_rule() {
        assert_eq!(apply("static-help", "KazBot Help!"), Some(Command::StaticHelp));
        assert_eq!(apply("static-help", "!kazbot help!"), None);
    }

    #[test]
    fn test_list_integrations_rule() {
        assert_eq!(apply("list-integrations", "!kazbot command services"), Some(Command::ListIntegrations));
        assert_eq!(apply("list-integrations", "kazbot command services"), Some(Command::ListIntegrations));
        assert_eq!(apply("list-integrations", "kazbot command services now"), None);
    }

    #[test]
    fn test_lifecycle_rule() {
        assert_eq!(
            apply("lifecycle", "!kazbot init Microsoft Entra"),
            Some(Command::Lifecycle {
                action: LifecycleAction::Init,
                module: "Microsoft Entra".to_string()
            })
        );
        assert_eq!(
            apply("lifecycle", "KAZBOT Restart  weather "),
            Some(Command::Lifecycle {
                action: LifecycleAction::Restart,
                module: "weather".to_string()
            })
        );
        assert!(matches!(apply("lifecycle", "!kazbot close"), Some(Command::Malformed { .. })));
        assert_eq!(apply("lifecycle", "!kazbot initialize weather"), None);
        assert_eq!(apply("lifecycle", "!kazbot reboot weather"), None);
    }

    #[test]
    fn test_session_rules() {
        assert_eq!(apply("session-analytics", "!KazBot show session analytics"), Some(Command::SessionAnalytics));
        assert_eq!(apply("session-analytics", "kazbot show session analytics"), None);
        assert_eq!(
            apply("session-export", "!kazbot export session answers"),
            Some(Command::Export(ExportKind::SessionAnswers))
        );
        assert_eq!(
            apply("session-export", "!kazbot export session memory"),
            Some(Command::Export(ExportKind::SessionMemory))
        );
        assert_eq!(
            apply("session-export", "!kazbot export session prompts"),
            Some(Command::Export(ExportKind::SessionPrompts))
        );
        assert_eq!(apply("session-export", "!kazbot export session files"), None);
    }

    #[test]
    fn test_integration_lookup_rule() {
        assert_eq!(
            apply("integration-lookup", "!kazbot microsoftentra"),
            Some(Command::IntegrationLookup {
                name: "microsoftentra".to_string()
            })
        );
        assert!(apply("integration-lookup", "!kazbot WEATHER").is_some());
        assert_eq!(apply("integration-lookup", "!kazbot stocks"), None);
        assert_eq!(apply("integration-lookup", "kazbot weather"), None);
    }

    #[test]
    fn test_memory_rule() {
        assert_eq!(apply("memory", "list memory"), Some(Command::Memory(MemoryCommand::ListMemory)));
        assert_eq!(apply("memory", "List Memory Full"), Some(Command::Memory(MemoryCommand::ListMemoryFull)));
        assert_eq!(apply("memory", "clear answers"), Some(Command::Memory(MemoryCommand::ClearAnswers)));
        assert_eq!(apply("memory", "show last 5"), Some(Command::Memory(MemoryCommand::ShowLast(5))));
        assert_eq!(apply("memory", "list memory please"), None);
    }

    #[test]
    fn test_show_last_variants() {
        assert_eq!(c("show last 3 prompts"), Command::Memory(MemoryCommand::ShowLastPrompts(3)));
        assert_eq!(c("show last 3 answers"), Command::Memory(MemoryCommand::ShowLastAnswers(3)));
        assert_eq!(
            c("show last 3 prompts about answers"),
            Command::Memory(MemoryCommand::ShowLastPrompts(3))
        );
        assert_eq!(c("show last 2 messages"), Command::Memory(MemoryCommand::ShowLast(2)));
        assert!(matches!(c("show last prompts"), Command::Malformed { .. }));
        assert!(matches!(c("show last"), Command::Malformed { .. }));
        assert!(matches!(c("show last -1"), Command::Malformed { .. }));
        assert!(matches!(c("show last 0"), Command::Malformed { .. }));
        assert!(matches!(c("show last 0 prompts"), Command::Malformed { .. }));
        assert!(matches!(c("show lastest news"), Command::Fallback(_)));
    }

    #[test]
    fn test_show_analytics_rule() {
        assert_eq!(c("Show Analytics"), Command::ShowAnalytics);
        assert_eq!(c("!kazbot show session analytics"), Command::SessionAnalytics);
    }

    #[test]
    fn test_priority_between_overlapping_rules() {
        // `help` is a lifecycle action, so it wins over an integration named like the remainder
        assert_eq!(
            c("!kazbot help weather"),
            Command::Lifecycle {
                action: LifecycleAction::Help,
                module: "weather".to_string()
            }
        );
        assert_eq!(c("kazbot help!"), Command::StaticHelp);
        assert_eq!(c("!kazbot command services"), Command::ListIntegrations);
    }

    #[test]
    fn test_fallback_keeps_original_text() {
        assert_eq!(
            c("What's the Weather in Oslo?"),
            Command::Fallback("What's the Weather in Oslo?".to_string())
        );
        assert_eq!(c("!kazbot stocks"), Command::Fallback("!kazbot stocks".to_string()));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(c("list prompts").kind(), CommandKind::Memory);
        assert_eq!(c("hello").kind(), CommandKind::Fallback);
        assert_eq!(c("!kazbot status weather").kind(), CommandKind::Lifecycle);
    }
}
