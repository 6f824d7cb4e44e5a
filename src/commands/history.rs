use crate::cli::HistoryCommand;
use crate::conversation::{ConversationStore, IndexEntry, Session, SessionId};
use crate::error::{ConvlogError, Result};
use crate::storage::Storage;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub fn handle_history<S: Storage>(
    store: &ConversationStore<S>,
    command: HistoryCommand,
) -> Result<()> {
    match command {
        HistoryCommand::List => {
            let sessions = store.list_sessions()?;

            if sessions.is_empty() {
                println!("{}", "No conversation history found.".yellow());
                return Ok(());
            }

            println!("\nConversation History:");
            build_session_table(&sessions).printstd();
            println!();
            println!(
                "Use {} to read a session.",
                "convlog history show <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id, json } => {
            let session = load_existing(store, &id)?;
            if json {
                let raw = serde_json::to_string_pretty(&session).map_err(ConvlogError::from)?;
                println!("{}", raw);
            } else {
                print_transcript(&session);
            }
        }
        HistoryCommand::Reindex => {
            let report = store.reindex()?;
            println!(
                "{}",
                format!(
                    "Rebuilt index with {} session(s)",
                    report.index.sessions.len()
                )
                .green()
            );
            for path in &report.skipped {
                println!("{} {}", "Skipped unreadable".yellow(), path.display());
            }
        }
    }

    Ok(())
}

fn load_existing<S: Storage>(store: &ConversationStore<S>, id: &SessionId) -> Result<Session> {
    store
        .load_session(id)?
        .ok_or_else(|| ConvlogError::NotFound(format!("session {}", id)).into())
}

fn build_session_table(sessions: &[IndexEntry]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Created".bold(),
        "Last Updated".bold(),
        "File".bold()
    ]);

    for entry in sessions {
        table.add_row(prettytable::row![
            entry.session_id.as_str().cyan(),
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.updated_at.format("%Y-%m-%d %H:%M"),
            entry.filename
        ]);
    }

    table
}

fn print_transcript(session: &Session) {
    println!("=== Session {} ===", session.session_id);
    println!("User:    {}", session.user.id);
    println!("Created: {}", session.created_at.to_rfc3339());
    println!("Updated: {}", session.updated_at.to_rfc3339());
    for (key, value) in &session.metadata {
        println!("{}: {}", key, value);
    }
    println!();

    for message in &session.messages {
        println!(
            "{} {}",
            message.role.colored_tag(),
            message.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        println!("{}", message.content);
        println!();
    }
}
