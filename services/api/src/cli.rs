use crate::demo::{run_demo, run_evaluate_all, DemoArgs, EvaluateAllArgs};
use crate::server;
use admissions::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Admissions Workflow Service",
    about = "Run and demonstrate the admission workflow and interviewer scheduling engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run application workflow jobs against a seeded in-memory store
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommand,
    },
    /// Walk through interviewer scheduling and application advancement end to end
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum WorkflowCommand {
    /// Advance every non-terminal application as far as its signals allow
    EvaluateAll(EvaluateAllArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Populate the in-memory store with demo staff and applications
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Workflow {
            command: WorkflowCommand::EvaluateAll(args),
        } => run_evaluate_all(args),
        Command::Demo(args) => run_demo(args),
    }
}
