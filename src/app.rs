// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::io::IsTerminal;
use std::path::PathBuf;

use console::style;
use dialoguer::Confirm;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::{Cli, Commands};
use crate::config::{Config, Provider};
use crate::domain::EventKind;
use crate::error::{Error, Result};
use crate::services::{agent::AuditAgent, llm, prompt, safety, settings, tools::ToolRegistry};

pub struct App {
    cli: Cli,
    config: Config,
    cancel_token: CancellationToken,
}

impl App {
    pub fn new(cli: Cli) -> Result<Self> {
        let config = Config::load(&cli)?;
        debug!(
            provider = %config.provider,
            model = %config.model,
            target = %config.target_file,
            "config loaded"
        );
        let cancel_token = CancellationToken::new();
        Ok(Self {
            cli,
            config,
            cancel_token,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup Ctrl+C handler with CancellationToken
        let cancel = self.cancel_token.clone();
        tokio::spawn(async move {
            signal::ctrl_c().await.ok();
            cancel.cancel();
        });

        // Handle subcommands
        if let Some(ref cmd) = self.cli.command {
            return self.handle_command(cmd).await;
        }

        self.run_audit().await
    }

    fn workspace(&self) -> PathBuf {
        self.cli
            .workspace
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    async fn run_audit(&mut self) -> Result<()> {
        if self.cancel_token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let workspace = self.workspace();
        let target_path = workspace.join(&self.config.target_file);

        self.print_status(&format!("Auditing {}...", self.config.target_file));

        // Step 1: Pre-flight on the target
        if !target_path.exists() {
            return Err(Error::TargetNotFound {
                path: self.config.target_file.clone(),
            });
        }

        let target_content = std::fs::read_to_string(&target_path)?;
        self.check_secrets(&target_content)?;

        // Step 2: Audited settings summary (schema-free, non-fatal)
        let settings_path = workspace.join(&self.config.settings_file);
        match settings::load_summary(&settings_path) {
            Some(summary) if !summary.security.is_empty() => {
                self.print_info("Security settings in scope:");
                for (key, value) in &summary.security {
                    eprintln!("  - {key}: {value}");
                }
            }
            Some(_) => {
                self.print_info(&format!(
                    "{} has no security section",
                    self.config.settings_file
                ));
            }
            None => {
                self.print_warning(&format!(
                    "Settings file {} missing or unparsable; continuing",
                    self.config.settings_file
                ));
            }
        }

        // Step 3: Compose the task
        let registry = ToolRegistry::for_audit(&self.config.output_dir);
        let task = prompt::audit_task(&self.config.target_file, &self.config.settings_file);

        if self.cli.show_prompt || self.cli.dry_run {
            eprintln!("{}", style("--- SYSTEM PROMPT ---").dim());
            eprintln!("{}", prompt::system_prompt(&registry.specs()));
            eprintln!("{}", style("--- TASK ---").dim());
            eprintln!("{task}");
            eprintln!("{}", style("--- END PROMPT ---").dim());
        }

        if self.cli.dry_run {
            self.print_info("Dry run: no model contacted");
            return Ok(());
        }

        if self.cancel_token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Step 4: Provider pre-flight
        self.print_status(&format!(
            "Contacting {} ({})...",
            self.config.provider, self.config.model
        ));

        let provider = llm::create_provider(&self.config)?;
        debug!(provider = provider.name(), "verifying provider");
        provider.verify().await?;

        // Step 5: Run the audit loop
        let agent = AuditAgent::new(
            provider.as_ref(),
            &registry,
            &workspace,
            self.config.max_iterations,
            self.config.max_tool_output_chars,
        )
        .with_progress(std::io::stderr().is_terminal());

        let outcome = agent.run(&task, &self.cancel_token).await?;

        // Step 6: Print the report
        eprintln!();
        eprintln!("{}", style("=== AUDIT REPORT ===").bold());
        println!("{}", outcome.report);
        eprintln!("{}", style("=== END REPORT ===").bold());

        let tool_calls = outcome
            .events
            .iter()
            .filter(|e| e.kind == EventKind::ToolCall)
            .count();
        self.print_info(&format!("{tool_calls} tool calls during this audit"));

        let suggested = outcome
            .events
            .iter()
            .any(|e| e.kind == EventKind::ToolCall && e.detail.starts_with("suggest_fix_tool"));
        if suggested {
            eprintln!(
                "{} Fix suggestions saved under {}",
                style("✓").green().bold(),
                workspace.join(&self.config.output_dir).display()
            );
        } else {
            warn!("model finished without calling suggest_fix_tool");
            self.print_warning("No fix suggestion was persisted this run");
        }

        Ok(())
    }

    /// Secrets in the target stop cloud uploads unless explicitly allowed.
    fn check_secrets(&self, content: &str) -> Result<()> {
        let secrets = safety::scan_for_secrets(content);
        if secrets.is_empty() || self.cli.allow_secrets {
            return Ok(());
        }

        warn!(count = secrets.len(), "potential secrets in target file");
        self.print_warning("Potential secrets detected in the target:");
        for s in &secrets {
            eprintln!("  {} (line ~{})", s.pattern_name, s.line);
        }

        if self.config.provider == Provider::Ollama {
            self.print_info("Proceeding with local Ollama (data stays local)");
            return Ok(());
        }

        let is_interactive = std::io::stdout().is_terminal() && std::io::stdin().is_terminal();
        if is_interactive {
            let confirm = Confirm::new()
                .with_prompt(format!(
                    "Send the file to {} anyway?",
                    self.config.provider
                ))
                .default(false)
                .interact()?;
            if confirm {
                return Ok(());
            }
        }

        Err(Error::SecretsDetected {
            patterns: secrets.into_iter().map(|s| s.pattern_name).collect(),
        })
    }

    async fn handle_command(&self, cmd: &Commands) -> Result<()> {
        match cmd {
            Commands::Init => {
                let path = Config::create_default()?;
                println!("Created config: {}", path.display());
                Ok(())
            }
            Commands::Config => {
                println!("Provider: {}", self.config.provider);
                println!("Model: {}", self.config.model);
                println!("Ollama host: {}", self.config.ollama_host);
                println!("Target file: {}", self.config.target_file);
                println!("Settings file: {}", self.config.settings_file);
                println!("Output dir: {}", self.config.output_dir);
                println!("Max iterations: {}", self.config.max_iterations);
                println!("Timeout: {}s", self.config.timeout_secs);
                println!("Temperature: {}", self.config.temperature);
                println!("Max tokens: {}", self.config.max_tokens);
                Ok(())
            }
            Commands::Doctor => self.run_doctor().await,
            Commands::Completions { shell } => {
                let mut cmd = <Cli as clap::CommandFactory>::command();
                clap_complete::generate(*shell, &mut cmd, "auditbee", &mut std::io::stdout());
                Ok(())
            }
        }
    }

    async fn run_doctor(&self) -> Result<()> {
        eprintln!("{} Running diagnostics...\n", style("→").cyan());

        // Config summary
        eprintln!("{}", style("Configuration").bold().underlined());
        eprintln!("  Provider:    {}", self.config.provider);
        eprintln!("  Model:       {}", self.config.model);
        eprintln!("  Timeout:     {}s", self.config.timeout_secs);
        if let Some(ref path) = Config::config_path() {
            let status = if path.exists() { "found" } else { "not found" };
            eprintln!("  Config file: {} ({})", path.display(), status);
        }
        eprintln!();

        // Provider connectivity
        eprintln!("{}", style("Provider Check").bold().underlined());
        match self.config.provider {
            Provider::Ollama => {
                eprint!("  Ollama ({}): ", self.config.ollama_host);
                let provider = llm::create_provider(&self.config)?;
                match provider.verify().await {
                    Ok(()) => {
                        eprintln!("{}", style("OK").green().bold());
                        eprintln!(
                            "  Model '{}': {}",
                            self.config.model,
                            style("available").green()
                        );
                    }
                    Err(Error::OllamaNotRunning { .. }) => {
                        eprintln!("{}", style("NOT RUNNING").red().bold());
                        eprintln!("  Start with: {}", style("ollama serve").yellow());
                    }
                    Err(Error::ModelNotFound { ref available, .. }) => {
                        eprintln!("{}", style("connected").green());
                        eprintln!(
                            "  Model '{}': {}",
                            self.config.model,
                            style("NOT FOUND").red().bold()
                        );
                        eprintln!(
                            "  Pull with: {}",
                            style(format!("ollama pull {}", self.config.model)).yellow()
                        );
                        if !available.is_empty() {
                            eprintln!("  Available: {}", available.join(", "));
                        }
                    }
                    Err(e) => {
                        eprintln!("{}: {}", style("ERROR").red().bold(), e);
                    }
                }
            }
            other => {
                eprint!("  {} API key: ", other);
                if self.config.api_key.is_some() {
                    eprintln!("{}", style("configured").green());
                } else {
                    eprintln!("{}", style("MISSING").red().bold());
                }
            }
        }
        eprintln!();

        // Audit targets
        let workspace = self.workspace();
        eprintln!("{}", style("Audit Targets").bold().underlined());
        let target = workspace.join(&self.config.target_file);
        if target.exists() {
            eprintln!("  Target: {}", style("found").green());
        } else {
            eprintln!(
                "  Target {}: {}",
                self.config.target_file,
                style("NOT FOUND").red().bold()
            );
        }
        let settings_path = workspace.join(&self.config.settings_file);
        match settings::load_summary(&settings_path) {
            Some(summary) => eprintln!(
                "  Settings: {} ({} security keys)",
                style("found").green(),
                summary.security.len()
            ),
            None => eprintln!("  Settings: {}", style("missing or unparsable").yellow()),
        }

        eprintln!();
        eprintln!("{} Diagnostics complete.", style("✓").green().bold());

        Ok(())
    }

    // ─── Output Helpers ───

    fn print_status(&self, msg: &str) {
        eprintln!("{} {}", style("→").cyan(), msg);
    }

    fn print_info(&self, msg: &str) {
        eprintln!("{} {}", style("info:").cyan(), msg);
    }

    fn print_warning(&self, msg: &str) {
        eprintln!("{} {}", style("warning:").yellow().bold(), msg);
    }
}
