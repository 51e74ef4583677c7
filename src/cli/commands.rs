//! CLI commands
//!
//! Special commands that can be executed in the REPL.
//!
//! Plain words only count as a command when they make up the whole line, so
//! chat such as "clear skies today" reaches the planner. `trip` needs its `|`
//! separated fields and `set` needs a known setting. A leading `/` always
//! marks a command.

use crate::core::{Config, ResponseMode, Result};
use crate::planner::{TravelMode, TripForm};
use crate::web::ChatFrontEnd;

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Send as a chat message
    Continue(String),
    /// Submit a trip form
    Trip(TripForm),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// History cleared
    Clear,
}

/// Parse and handle special commands
pub fn handle_command(
    input: &str,
    front_end: &mut ChatFrontEnd,
    config: &Config,
) -> Result<CommandResult> {
    let input = input.trim();
    let (explicit, line) = match input.strip_prefix('/') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, input),
    };
    let parts: Vec<&str> = line.splitn(2, char::is_whitespace).collect();
    let cmd = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    if !explicit && !is_command_line(&cmd, args) {
        return Ok(CommandResult::Continue(input.to_string()));
    }

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "clear" | "reset" => {
            front_end.clear();
            Ok(CommandResult::Clear)
        }

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "modes" => Ok(CommandResult::Handled(format!(
            "Travel modes: {}",
            TravelMode::ALL.map(|m| m.label()).join(", ")
        ))),

        "status" => {
            let messages = front_end
                .store()
                .get(front_end.session_key())
                .map(|c| c.len())
                .unwrap_or(0);
            let status = format!(
                "Wayfinder Status:\n\
                 ─────────────────────────────\n\
                 Model:      {}\n\
                 Entry:      {}\n\
                 Session:    {} ({} messages)\n\
                 Responses:  {}\n\
                 API key:    {}",
                config.gemini.model,
                front_end.agent_name(),
                front_end.session_key(),
                messages,
                match front_end.response_mode() {
                    ResponseMode::Last => "last step only",
                    ResponseMode::EachStep => "every step",
                },
                if config.has_api_key() { "set" } else { "missing" }
            );
            Ok(CommandResult::Handled(status))
        }

        "trip" => parse_trip(args),

        "set" => handle_set_command(args, front_end),

        _ => Ok(CommandResult::Handled(format!(
            "Unknown command: /{}. Type 'help' for available commands.",
            cmd
        ))),
    }
}

/// Whether a line without a `/` prefix is meant as a command
fn is_command_line(cmd: &str, args: &str) -> bool {
    match cmd {
        "exit" | "quit" | "q" | "clear" | "reset" | "help" | "?" | "modes" | "status" => {
            args.is_empty()
        }
        "trip" => args.contains('|'),
        "set" => {
            let key = args.split_whitespace().next().unwrap_or("");
            key.eq_ignore_ascii_case("responses") || key.eq_ignore_ascii_case("response_mode")
        }
        _ => false,
    }
}

/// `trip <start> | <destination> [| <mode>]`
fn parse_trip(args: &str) -> Result<CommandResult> {
    let fields: Vec<&str> = args.split('|').map(|s| s.trim()).collect();
    if fields.len() < 2 || fields.len() > 3 {
        return Ok(CommandResult::Handled(
            "Usage: trip <start> | <destination> [| <mode>]\n\
             Example: trip Jurong East | Marina Bay Sands | MRT/Train"
                .to_string(),
        ));
    }

    let mode = match fields.get(2) {
        Some(mode) => mode.parse()?,
        None => TravelMode::All,
    };
    let form = TripForm::new(fields[0], fields[1], mode);
    form.to_prompt()?;
    Ok(CommandResult::Trip(form))
}

/// Handle 'set' subcommands
fn handle_set_command(args: &str, front_end: &mut ChatFrontEnd) -> Result<CommandResult> {
    let parts: Vec<&str> = args.splitn(2, ' ').collect();
    let key = parts[0].to_lowercase();
    let value = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match key.as_str() {
        "responses" | "response_mode" => {
            if value.is_empty() {
                return Ok(CommandResult::Handled(
                    "Usage: set responses <last|each_step>".to_string(),
                ));
            }
            let mode: ResponseMode = value.parse()?;
            front_end.set_response_mode(mode);
            Ok(CommandResult::Handled(format!("Response mode set to: {}", value)))
        }
        "" => Ok(CommandResult::Handled(
            "Usage: set responses <last|each_step>".to_string(),
        )),
        _ => Ok(CommandResult::Handled(format!(
            "Unknown setting: {}. Available: responses",
            key
        ))),
    }
}

/// Generate help text
fn help_text() -> String {
    r#"Wayfinder Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit Wayfinder
  clear, reset     Clear chat and start a new session
  status           Show current configuration
  modes            List travel modes

  trip <start> | <destination> [| <mode>]
                   Plan a journey, e.g.
                   trip Jurong | Marina Bay | Bus
  set responses <last|each_step>
                   Show only the final report, or every step's answer

Commands may also start with '/', e.g. /clear.
Anything else is sent to the planner as a chat message.
─────────────────────────────────────────────"#
        .to_string()
}
