mod commands;
mod terminal;

use commands::{CommandLine, Commands, inspect, run};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose, commands.quiet);
    print::banner(commands.quiet);

    match commands.command {
        Commands::Run(args) => {
            print::header("registration is open", commands.quiet);
            let cfg = args.into_config(commands.snapshot_file, commands.audit_file);
            run::run(cfg, commands.quiet).await
        }
        Commands::Inspect => {
            print::header("saved participants", commands.quiet);
            inspect::inspect(&commands.snapshot_file, &commands.audit_file)
        }
    }
}
