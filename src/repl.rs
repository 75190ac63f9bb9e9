use crate::core::db::{format_value, Connection, Driver, ResultSet};
use crate::core::Result;
use serde_json::{Map, Value as JsonValue};
use std::io::{BufRead, Write};

/// Represents a parsed REPL command.
#[derive(Debug, PartialEq)]
pub enum Command {
    Use(String),
    Create(String),
    Drop(String),
    Info,
    Help,
    Quit,
    Sql(String),
    Unknown(String),
}

/// Parses a user input string into a corresponding `Command`.
///
/// If the input starts with a colon (`:`), it is interpreted as a command.
/// Otherwise, it is treated as a SQL statement.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let Some(trimmed) = input.strip_prefix(':') else {
        return Command::Sql(input.to_string());
    };
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    match parts.as_slice() {
        ["use", name] => Command::Use(name.to_string()),
        ["create", name] => Command::Create(name.to_string()),
        ["drop", name] => Command::Drop(name.to_string()),
        ["info"] => Command::Info,
        ["help"] => Command::Help,
        ["quit"] | ["exit"] | ["q"] => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    }
}

const HELP: &str = "\
Commands:
  :use NAME     select the default database
  :create NAME  create a database
  :drop NAME    drop a database
  :info         show connector and host information
  :help         show this help
  :quit         leave
Anything else is sent as SQL.";

/// How result sets are printed.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    pub json: bool,
    pub null_text: String,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat {
            json: false,
            null_text: "NULL".to_string(),
        }
    }
}

/// Whether the REPL keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Renders a result set as tab-separated text or JSON lines.
pub fn render_result(set: &ResultSet, format: &OutputFormat) -> Result<String> {
    let mut lines = Vec::with_capacity(set.len() + 2);
    if format.json {
        for row in set {
            let mut object = Map::new();
            for (field, value) in row.iter() {
                object.insert(field.name.clone(), json_value(value));
            }
            lines.push(serde_json::to_string(&JsonValue::Object(object))?);
        }
    } else {
        lines.push(set.column_names().join("\t"));
        for row in set {
            let cells: Vec<String> = row
                .iter()
                .map(|(_, value)| match value {
                    None => format.null_text.clone(),
                    Some(_) => format_value(value),
                })
                .collect();
            lines.push(cells.join("\t"));
        }
        lines.push(format!("({} row{})", set.len(), if set.len() == 1 { "" } else { "s" }));
    }
    Ok(lines.join("\n"))
}

fn json_value(value: Option<&[u8]>) -> JsonValue {
    match value {
        None => JsonValue::Null,
        Some(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) if !text.contains('\0') => JsonValue::String(text.to_string()),
            _ => {
                let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                JsonValue::String(format!("0x{}", hex))
            }
        },
    }
}

/// Executes one command against the connection, writing its output.
///
/// Statement failures are printed and do not end the session; only I/O and
/// encoding failures are returned.
pub fn run_command<D: Driver, W: Write>(
    conn: &mut Connection<D>,
    command: Command,
    format: &OutputFormat,
    out: &mut W,
) -> Result<Flow> {
    let outcome = match command {
        Command::Quit => return Ok(Flow::Quit),
        Command::Help => {
            writeln!(out, "{}", HELP)?;
            return Ok(Flow::Continue);
        }
        Command::Unknown(input) => {
            writeln!(out, "Unknown command: {} (try :help)", input)?;
            return Ok(Flow::Continue);
        }
        Command::Info => {
            writeln!(
                out,
                "client: {} ({})",
                Connection::<D>::client_info().unwrap_or_default(),
                Connection::<D>::client_version()
            )?;
            writeln!(out, "host: {}", conn.host_info().unwrap_or_default())?;
            writeln!(out, "database: {}", conn.current_database().unwrap_or("(none)"))?;
            return Ok(Flow::Continue);
        }
        Command::Use(name) => conn
            .select_database(&name)
            .map(|_| format!("Database changed to {}", name)),
        Command::Create(name) => conn
            .create_database(&name)
            .map(|_| format!("Database {} created", name)),
        Command::Drop(name) => conn
            .delete_database(&name)
            .map(|_| format!("Database {} dropped", name)),
        Command::Sql(sql) if sql.is_empty() => return Ok(Flow::Continue),
        Command::Sql(sql) => match conn.execute(&sql) {
            Ok(Some(set)) => render_result(&set, format),
            Ok(None) => Ok("Query OK".to_string()),
            Err(e) => Err(e),
        },
    };

    match outcome {
        Ok(text) => writeln!(out, "{}", text)?,
        Err(e) => writeln!(out, "ERROR: {}", e)?,
    }
    Ok(Flow::Continue)
}

/// Runs the interactive loop until `:quit` or end of input.
pub fn run_repl<D: Driver, R: BufRead, W: Write>(
    conn: &mut Connection<D>,
    format: &OutputFormat,
    input: R,
    mut out: W,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        if run_command(conn, parse_command(&line), format, &mut out)? == Flow::Quit {
            break;
        }
        out.flush()?;
    }
    Ok(())
}
