//! Interactive console dialogue.
//!
//! Choices are printed as a numbered list; typing a number picks that choice,
//! anything else is sent to the dialogue as typed.

use std::io::{BufRead, Write};

use alarmbot_core::dialogue::RESTART_COMMAND;
use alarmbot_core::{Dialogue, Reply, ReplyKind};

/// Words that end the chat loop.
const QUIT_WORDS: &[&str] = &["quit", "exit"];

/// Render a reply with its choices numbered from 1.
pub(crate) fn format_reply(reply: &Reply) -> String {
    let mut out = reply.text.clone();
    out.push('\n');
    for (i, choice) in reply.choices.iter().enumerate() {
        out.push_str(&format!("  {}) {}\n", i + 1, choice));
    }
    out
}

/// Map a typed line to dialogue input: a valid number selects that choice.
pub(crate) fn pick_choice(choices: &[String], line: &str) -> String {
    let line = line.trim();
    match line.parse::<usize>() {
        Ok(n) if (1..=choices.len()).contains(&n) => choices[n - 1].clone(),
        _ => line.to_string(),
    }
}

/// Run the dialogue for `key` until EOF or a quit word.
pub(crate) fn run_chat<R: BufRead, W: Write>(
    dialogue: &Dialogue,
    key: &str,
    input: R,
    mut output: W,
) -> std::io::Result<()> {
    let mut reply = dialogue.handle(key, RESTART_COMMAND);
    write!(output, "{}", format_reply(&reply))?;
    writeln!(output, "(type a number or a name, \"quit\" to leave)")?;

    for line in input.lines() {
        let line = line?;
        if QUIT_WORDS.contains(&line.trim().to_lowercase().as_str()) {
            break;
        }

        let message = pick_choice(&reply.choices, &line);
        reply = dialogue.handle(key, &message);
        writeln!(output)?;
        write!(output, "{}", format_reply(&reply))?;

        // After a resolution the next message starts over.
        if reply.kind == ReplyKind::Resolution {
            reply = dialogue.restart(key);
            writeln!(output)?;
            write!(output, "{}", format_reply(&reply))?;
        }
        output.flush()?;
    }

    tracing::debug!(session = key, "chat ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use alarmbot_core::knowledge::CIRCUIT_PACK_FAILED;
    use alarmbot_core::{KnowledgeTable, MemorySessionStore, UnsupportedCategoryPolicy};

    use super::*;

    fn dialogue() -> Dialogue {
        Dialogue::new(
            Arc::new(KnowledgeTable::builtin().unwrap()),
            Arc::new(MemorySessionStore::new()),
            UnsupportedCategoryPolicy::Hold,
        )
    }

    fn chat(input: &str) -> String {
        let mut out = Vec::new();
        run_chat(&dialogue(), "cli:test", Cursor::new(input), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_pick_choice_by_number() {
        let choices = vec!["Ciena".to_string(), "Huawei".to_string()];
        assert_eq!(pick_choice(&choices, "2"), "Huawei");
        assert_eq!(pick_choice(&choices, " 1 "), "Ciena");
    }

    #[test]
    fn test_pick_choice_out_of_range_passes_through() {
        let choices = vec!["Ciena".to_string()];
        assert_eq!(pick_choice(&choices, "0"), "0");
        assert_eq!(pick_choice(&choices, "5"), "5");
        assert_eq!(pick_choice(&choices, "ciena"), "ciena");
        assert_eq!(pick_choice(&[], "1"), "1");
    }

    #[test]
    fn test_format_reply_numbers_choices() {
        let reply = Reply {
            kind: ReplyKind::Prompt,
            text: "Pick one".to_string(),
            choices: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(format_reply(&reply), "Pick one\n  1) A\n  2) B\n");
    }

    #[test]
    fn test_chat_by_numbers_reaches_resolution() {
        // Ciena, Hardware, Circuit Pack Failed.
        let out = chat("1\n1\n1\nquit\n");
        assert!(out.contains(CIRCUIT_PACK_FAILED));
        // The welcome prompt is shown again after the resolution.
        assert_eq!(out.matches("Which device are you troubleshooting?").count(), 2);
    }

    #[test]
    fn test_chat_by_names_reaches_resolution() {
        let out = chat("ciena\nHARDWARE\ncircuit pack failed\n");
        assert!(out.contains(CIRCUIT_PACK_FAILED));
    }

    #[test]
    fn test_chat_stops_on_quit() {
        let out = chat("quit\nciena\n");
        assert!(!out.contains("  1) Hardware"));
    }

    #[test]
    fn test_chat_ends_on_eof() {
        let out = chat("");
        assert!(out.contains("  1) Ciena"));
    }
}
