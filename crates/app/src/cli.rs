use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use vault_core::model::{CertTrack, ModuleId, ModuleKind, TaskId, TaskStatus};
use vault_core::quiz::QuizMode;

/// Certification readiness tracker.
#[derive(Parser, Debug)]
#[command(name = "vault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database URL or file path
    #[arg(long = "db", global = true, env = "VAULT_DB_URL", default_value = "sqlite://vault.sqlite3")]
    pub db_url: String,

    /// Certification track (cissp, securityplus, awssap)
    #[arg(short, long, global = true, env = "VAULT_TRACK", default_value = "cissp")]
    pub track: CertTrack,

    /// Print JSON instead of text where supported
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the readiness dashboard for the track
    Readiness {
        /// Minutes since the study session started (drives fatigue)
        #[arg(long, default_value_t = 0)]
        session_minutes: i64,
    },

    /// Run a drill interactively
    Drill {
        /// Drill JSON document; defaults to the bundled drill for the track
        #[arg(short, long, conflicts_with = "module")]
        file: Option<PathBuf>,

        /// Play a quiz module from the vault (uses the module's track)
        #[arg(long)]
        module: Option<ModuleId>,

        #[arg(short, long, value_enum, default_value_t = ModeArg::Practice)]
        mode: ModeArg,

        /// Shuffle question order
        #[arg(long)]
        shuffle: bool,

        /// Delay before a diagnostic answer advances, in milliseconds
        #[arg(long, default_value_t = 800)]
        advance_ms: u64,
    },

    /// Manage the remediation board
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Browse and manage study modules; lists the track's vault by default
    Modules {
        #[command(subcommand)]
        action: Option<ModuleAction>,
    },

    /// Insert sample activity and modules for the track
    Seed,
}

#[derive(Subcommand, Debug)]
pub enum ModuleAction {
    /// List modules grouped by blueprint domain
    List,

    /// Ingest a module into the track's vault
    Add {
        title: String,

        /// Blueprint domain code or label; defaults to the first domain
        #[arg(short, long, default_value = "")]
        domain: String,

        /// quiz, diagram, lab or legacy
        #[arg(short, long)]
        kind: ModuleKind,

        /// JSON config document for quiz, diagram and lab modules
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stored asset path for legacy modules
        #[arg(long)]
        asset: Option<String>,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Remove a module
    Delete { id: ModuleId },
}

#[derive(Subcommand, Debug)]
pub enum TaskAction {
    /// Print every lane
    List,

    /// Add a manual task
    Add { title: String },

    /// Move a task to another lane
    Move { id: TaskId, status: TaskStatus },

    /// Delete a task
    Delete { id: TaskId },

    /// Delete every completed task
    Purge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Practice,
    Diagnostic,
}

impl From<ModeArg> for QuizMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Practice => QuizMode::Practice,
            ModeArg::Diagnostic => QuizMode::Diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_task_move() {
        let id = TaskId::generate();
        let cli = Cli::try_parse_from([
            "vault",
            "--track",
            "aws-sap",
            "tasks",
            "move",
            &id.to_string(),
            "in-progress",
        ])
        .unwrap();

        assert_eq!(cli.track, CertTrack::AwsSap);
        match cli.command {
            Commands::Tasks {
                action: TaskAction::Move { id: parsed, status },
            } => {
                assert_eq!(parsed, id);
                assert_eq!(status, TaskStatus::InProgress);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn drill_defaults_to_practice() {
        let cli = Cli::try_parse_from(["vault", "drill"]).unwrap();
        let Commands::Drill { file, module, mode, shuffle, advance_ms } = cli.command else {
            panic!("expected drill");
        };
        assert!(file.is_none());
        assert!(module.is_none());
        assert_eq!(mode, ModeArg::Practice);
        assert!(!shuffle);
        assert_eq!(advance_ms, 800);
    }

    #[test]
    fn drill_module_conflicts_with_file() {
        let cli = Cli::try_parse_from(["vault", "drill", "--module", "4"]).unwrap();
        let Commands::Drill { module, .. } = cli.command else {
            panic!("expected drill");
        };
        assert_eq!(module, Some(ModuleId::new(4)));

        assert!(Cli::try_parse_from(["vault", "drill", "--module", "4", "-f", "x.json"]).is_err());
    }

    #[test]
    fn modules_lists_by_default() {
        let cli = Cli::try_parse_from(["vault", "modules"]).unwrap();
        assert!(matches!(cli.command, Commands::Modules { action: None }));

        let cli = Cli::try_parse_from([
            "vault", "modules", "add", "Ports", "--kind", "interactive", "-d", "d4",
        ])
        .unwrap();
        let Commands::Modules {
            action: Some(ModuleAction::Add { title, kind, domain, .. }),
        } = cli.command
        else {
            panic!("expected modules add");
        };
        assert_eq!(title, "Ports");
        assert_eq!(kind, ModuleKind::Lab);
        assert_eq!(domain, "d4");
    }
}
