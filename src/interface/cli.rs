use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "workflow-copilot",
    about = "Plans, runs and explains workflow actions for operators and supervisors"
)]
pub struct Cli {
    #[arg(long, global = true, default_value = "data/config.yaml")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP/SSE server
    Serve(ServeArgs),
    /// Ask one question and print the JSON result
    Ask(AskArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Overrides `server.listen` from the config file
    #[arg(long)]
    pub listen: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct AskArgs {
    #[arg(long)]
    pub question: String,
    /// Workflow backend credential (base64 `user:password`)
    #[arg(long)]
    pub credential: String,
    /// Print answer fragments as they arrive
    #[arg(long)]
    pub stream: bool,
}

impl Cli {
    /// Only the server mirrors logs to stdout; `ask` keeps stdout for its JSON.
    pub fn logs_to_stdout(&self) -> bool {
        matches!(self.command, Command::Serve(_))
    }
}
