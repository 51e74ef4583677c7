//! Interactive REPL for Wayfinder
//!
//! The terminal surface over the same front end the web page uses. The REPL
//! is synchronous: each submission blocks on the runtime until the run is
//! complete.

use std::io::{self, BufRead, Write};

use tokio::runtime::Runtime;

use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, Result};
use crate::web::{ChatFrontEnd, ChatMessage};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    config: Config,
    front_end: ChatFrontEnd,
    runtime: Runtime,
}

impl Repl {
    /// Create a REPL with its own runtime
    pub fn new(config: Config, front_end: ChatFrontEnd) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            config,
            front_end,
            runtime,
        })
    }

    /// Send one message and wait for the replies
    pub fn ask(&mut self, text: &str) -> Result<Vec<ChatMessage>> {
        self.runtime.block_on(self.front_end.submit_text(text))
    }

    /// Run the REPL
    pub fn run(&mut self) -> Result<()> {
        self.print_banner();

        if !self.config.has_api_key() {
            println!("Warning: no GOOGLE_API_KEY set. Requests will fail until one is provided.\n");
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            let replies = match handle_command(input, &mut self.front_end, &self.config) {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Clear) => {
                    println!("Chat cleared.\n");
                    continue;
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                    continue;
                }
                Ok(CommandResult::Trip(form)) => {
                    println!("Planning your transport...");
                    self.runtime.block_on(self.front_end.submit_trip(&form))
                }
                Ok(CommandResult::Continue(text)) => {
                    println!("Planning your transport...");
                    self.ask(&text)
                }
                Err(e) => {
                    eprintln!("{}\n", e.user_message());
                    continue;
                }
            };

            match replies {
                Ok(replies) => print_replies(&replies),
                Err(e) => eprintln!("\nError: {}\n", e.user_message()),
            }
        }

        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        println!();
        println!("Wayfinder - Transport Planner Agent");
        println!("Plan your travel with AI-powered transport recommendations.");
        println!();
        println!("Model:    {}", self.config.gemini.model);
        println!("Session:  {}", self.front_end.session_key());
        println!();
        println!("Commands: help, trip, modes, clear, status, exit");
        println!("─────────────────────────────────────────────────────────────");
    }
}

/// Print assistant replies, labelled when there is more than one step
pub fn print_replies(replies: &[ChatMessage]) {
    for reply in replies {
        match &reply.label {
            Some(label) => println!("\n[{}]\n{}\n", label, reply.content),
            None => println!("\nAssistant:\n{}\n", reply.content),
        }
    }
}
