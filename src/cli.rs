// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "auditbee")]
#[command(version)]
#[command(about = "LLM-backed security audit agent", long_about = None)]
pub struct Cli {
    /// File to audit, relative to the workspace (default: vulnerable_script.py)
    pub target: Option<String>,

    /// LLM provider (ollama, openai, anthropic)
    #[arg(short, long, env = "AUDITBEE_PROVIDER")]
    pub provider: Option<String>,

    /// Model name
    #[arg(short, long, env = "AUDITBEE_MODEL")]
    pub model: Option<String>,

    /// Workspace directory the tools operate in (default: current directory)
    #[arg(short, long)]
    pub workspace: Option<String>,

    /// Directory for persisted fix suggestions
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Send the target to a cloud provider even if secrets are detected
    #[arg(long)]
    pub allow_secrets: bool,

    /// Show the prompt sent to the LLM
    #[arg(long)]
    pub show_prompt: bool,

    /// Print the prompt and tool schemas, make no network call
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Initialize config file
    Init,
    /// Show current configuration
    Config,
    /// Run diagnostics (config, provider connectivity, target files)
    Doctor,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
