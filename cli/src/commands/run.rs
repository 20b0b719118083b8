use raffle_common::config::Config;
use raffle_core::{LotterySupervisor, Outcome};

use crate::terminal::input::StdinSource;
use crate::terminal::print;

const PROMPT: &str = "Enter a unique username to register: ";

pub async fn run(cfg: Config, quiet: bool) -> anyhow::Result<()> {
    print_settings(&cfg, quiet);

    let supervisor = LotterySupervisor::new(cfg);
    let _listener = supervisor.interrupt().listen();
    let mut input = StdinSource::spawn(PROMPT);

    match supervisor.run(&mut input).await {
        Outcome::Winner {
            winner,
            participants,
        } => print::winner(winner.as_str(), participants),
        Outcome::ClosedEmpty => print::no_participants(quiet),
        Outcome::Interrupted {
            participants,
            saved,
        } => print::interrupted(participants, saved),
    }

    Ok(())
}

fn print_settings(cfg: &Config, quiet: bool) {
    if quiet {
        return;
    }

    print::aligned_line("Registration", print::human_duration(cfg.registration_period));
    print::aligned_line(
        "Extension",
        format!(
            "{} if fewer than {} users",
            print::human_duration(cfg.extension_period),
            cfg.min_participants
        ),
    );
    print::aligned_line("Backup", cfg.snapshot_file.display().to_string());
    print::aligned_line("Audit log", cfg.audit_file.display().to_string());
    print::print_status("You will be prompted to enter your username.");
}
