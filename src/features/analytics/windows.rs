//! Window-scoped aggregation of a session's message log
//!
//! A message belongs to a window when `init_time <= timestamp <= closed_at`,
//! with an open window ending at `now`. Membership is decided by timestamp,
//! never by position in the log.

use crate::core::{Message, Sender};
use crate::features::lifecycle::ModuleWindow;
use chrono::{DateTime, Utc};

/// Usage within one module window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowStats {
    pub module_name: String,
    pub total: usize,
    pub prompts: usize,
    pub answers: usize,
    pub init_time: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Sum over all windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTotals {
    pub total: usize,
    pub prompts: usize,
    pub answers: usize,
}

pub fn in_window(message: &Message, window: &ModuleWindow, now: DateTime<Utc>) -> bool {
    let end = window.closed_at.unwrap_or(now);
    message.timestamp >= window.init_time && message.timestamp <= end
}

/// Messages of one window, in log order
pub fn messages_in_window<'a>(
    messages: &'a [Message],
    window: &ModuleWindow,
    now: DateTime<Utc>,
) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|m| in_window(m, window, now))
        .collect()
}

/// Messages falling in any of the windows, in log order, each at most once
pub fn messages_in_any_window<'a>(
    messages: &'a [Message],
    windows: &[ModuleWindow],
    now: DateTime<Utc>,
) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|m| windows.iter().any(|w| in_window(m, w, now)))
        .collect()
}

/// Per-window stats in window creation order
pub fn aggregate(messages: &[Message], windows: &[ModuleWindow], now: DateTime<Utc>) -> Vec<WindowStats> {
    windows
        .iter()
        .map(|window| {
            let scoped = messages_in_window(messages, window, now);
            WindowStats {
                module_name: window.module_name.clone(),
                total: scoped.len(),
                prompts: scoped.iter().filter(|m| m.from == Sender::User).count(),
                answers: scoped.iter().filter(|m| m.from == Sender::Bot).count(),
                init_time: window.init_time,
                closed_at: window.closed_at,
            }
        })
        .collect()
}

pub fn totals(stats: &[WindowStats]) -> WindowTotals {
    stats.iter().fold(WindowTotals::default(), |acc, s| WindowTotals {
        total: acc.total + s.total,
        prompts: acc.prompts + s.prompts,
        answers: acc.answers + s.answers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn window(name: &str, start: i64, end: Option<i64>) -> ModuleWindow {
        ModuleWindow {
            module_name: name.to_string(),
            init_time: t(start),
            closed_at: end.map(t),
        }
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let messages = vec![
            Message::new(Sender::User, "before", t(9)),
            Message::new(Sender::User, "at start", t(10)),
            Message::new(Sender::Bot, "middle", t(15)),
            Message::new(Sender::Bot, "at end", t(20)),
            Message::new(Sender::User, "after", t(21)),
        ];
        let w = window("Weather", 10, Some(20));

        let texts: Vec<_> = messages_in_window(&messages, &w, t(100))
            .into_iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(texts, vec!["at start", "middle", "at end"]);
    }

    #[test]
    fn test_open_window_runs_until_now() {
        let messages = vec![
            Message::new(Sender::User, "q", t(5)),
            Message::new(Sender::Bot, "a", t(50)),
        ];
        let w = window("Weather", 0, None);
        assert_eq!(messages_in_window(&messages, &w, t(10)).len(), 1);
        assert_eq!(messages_in_window(&messages, &w, t(50)).len(), 2);
    }

    #[test]
    fn test_aggregate_keeps_creation_order() {
        let messages = vec![
            Message::new(Sender::User, "q1", t(1)),
            Message::new(Sender::Bot, "a1", t(2)),
            Message::new(Sender::User, "q2", t(11)),
            Message::new(Sender::Bot, "a2", t(12)),
            Message::new(Sender::User, "q3", t(21)),
        ];
        let windows = vec![
            window("Weather", 0, Some(5)),
            window("Stocks", 10, Some(15)),
            window("Weather", 20, None),
        ];

        let stats = aggregate(&messages, &windows, t(30));
        let names: Vec<_> = stats.iter().map(|s| s.module_name.as_str()).collect();
        assert_eq!(names, vec!["Weather", "Stocks", "Weather"]);
        assert_eq!((stats[0].prompts, stats[0].answers), (1, 1));
        assert_eq!((stats[1].prompts, stats[1].answers), (1, 1));
        assert_eq!((stats[2].total, stats[2].prompts, stats[2].answers), (1, 1, 0));

        assert_eq!(
            totals(&stats),
            WindowTotals {
                total: 5,
                prompts: 3,
                answers: 2
            }
        );
    }

    #[test]
    fn test_union_has_no_duplicates() {
        let messages = vec![
            Message::new(Sender::User, "edge", t(10)),
            Message::new(Sender::User, "outside", t(30)),
        ];
        let windows = vec![window("A", 0, Some(10)), window("B", 10, Some(20))];
        let scoped = messages_in_any_window(&messages, &windows, t(40));
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].text, "edge");
    }

    #[test]
    fn test_no_windows() {
        let messages = vec![Message::new(Sender::User, "q", t(1))];
        assert!(aggregate(&messages, &[], t(2)).is_empty());
        assert!(messages_in_any_window(&messages, &[], t(2)).is_empty());
    }
}
