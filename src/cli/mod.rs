//! CLI module for casetrack
//!
//! Provides the command-line interface using clap.

pub mod commands;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{load_config, load_session, SessionOverrides};
use crate::errors::{CaseError, Result};
use crate::fs::{find_workspace_root, resolve_cwd};
use crate::machine::StepMachine;
use crate::repository::HttpRepository;
use crate::schemas::{CaseDraft, Step};
use crate::view::StepFilter;

/// Casetrack - Track disciplinary cases through their six steps
#[derive(Parser, Debug)]
#[command(name = "casetrack")]
#[command(version)]
#[command(about = "Track disciplinary cases through their six steps")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress info-level output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Override the working directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Act as this user id instead of the stored session
    #[arg(long, global = true, env = "CASETRACK_USER_ID")]
    pub user_id: Option<u64>,

    /// Act with this role instead of the stored session
    #[arg(long, global = true)]
    pub role: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,
}

impl Cli {
    /// Default log filter for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    pub fn session_overrides(&self) -> SessionOverrides {
        SessionOverrides {
            user_id: self.user_id,
            role: self.role.clone(),
        }
    }
}

/// Step-1 form fields
#[derive(Args, Debug, Clone)]
pub struct DraftArgs {
    /// Affected employee user id
    #[arg(long)]
    pub employee: u64,

    /// Category id
    #[arg(long)]
    pub category: u64,

    #[arg(long)]
    pub description: String,

    #[arg(long)]
    pub impact: String,

    /// Observed conduct
    #[arg(long)]
    pub conduct: String,
}

impl From<DraftArgs> for CaseDraft {
    fn from(args: DraftArgs) -> Self {
        CaseDraft {
            affected_user_id: args.employee,
            category_id: args.category,
            description: args.description,
            impact: args.impact,
            observed_conduct: args.conduct,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List cases for the session user
    List {
        /// List cases raised against the session user
        #[arg(long)]
        employee: bool,

        /// Only cases at this step (1-6, a step key, or "all")
        #[arg(long, default_value = "all")]
        step: StepFilter,

        /// Match employee, category or supervisor names
        #[arg(long, default_value = "")]
        search: String,

        /// Output as JSON
        #[arg(long, conflicts_with = "csv")]
        json: bool,

        /// Output as CSV
        #[arg(long)]
        csv: bool,
    },

    /// Show how many cases are at each step
    Counts {
        /// Count cases raised against the session user
        #[arg(long)]
        employee: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a case and its step records
    Show {
        case_id: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a step of a case, repairing the step pointer if needed
    Open { case_id: u64, step: Step },

    /// Create a case (step 1)
    Create {
        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Correct the step-1 data of a case
    Edit {
        case_id: u64,

        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Save the record of a step (2-6)
    Save {
        case_id: u64,
        step: Step,

        /// Field as key=value; repeatable
        #[arg(long = "field", short = 'f', value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
    },

    /// Complete a step and continue to the next one
    Advance { case_id: u64, step: Step },

    /// Close a case
    Close {
        case_id: u64,
        step: Step,

        #[arg(long)]
        justification: String,
    },

    /// Attach an evidence file to the step-2 record
    Evidence {
        case_id: u64,
        file: PathBuf,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete an evidence file
    EvidenceDelete { case_id: u64, evidence_id: u64 },

    /// List case categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse a `key=value` argument
pub fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got {:?}", s)),
    }
}

/// Collect `key=value` pairs into a JSON object
pub fn fields_object(pairs: &[(String, String)]) -> Value {
    let mut map = Map::new();
    for (key, value) in pairs {
        map.insert(key.clone(), Value::String(value.clone()));
    }
    Value::Object(map)
}

/// Build a machine talking to the configured backend
pub fn open_machine(cli: &Cli) -> Result<StepMachine<HttpRepository>> {
    let root = workspace_root(cli.cwd.as_deref())?;
    let config = load_config(&root)?;
    let session = load_session(&root, &cli.session_overrides())?;
    let repo = HttpRepository::new(&config, &session);
    StepMachine::new(repo, session, config)
}

fn workspace_root(cwd: Option<&Path>) -> Result<PathBuf> {
    find_workspace_root(&resolve_cwd(cwd))
}

/// Ask a yes/no question, defaulting to no
pub fn ask(prompt: &str, input: &mut impl BufRead, out: &mut impl Write) -> Result<bool> {
    write!(out, "{} [y/N] ", prompt)?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "s" | "si" | "sí"
    ))
}

/// Confirmation source for the interactive commands
pub fn stdin_confirm(assume_yes: bool) -> impl FnMut(&str) -> Result<bool> {
    move |prompt| {
        if assume_yes {
            return Ok(true);
        }
        let stdin = std::io::stdin();
        let stderr = std::io::stderr();
        ask(prompt, &mut stdin.lock(), &mut stderr.lock())
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| CaseError::InvalidJson(e.to_string()))?;
    writeln!(out, "{}", text)?;
    Ok(())
}
