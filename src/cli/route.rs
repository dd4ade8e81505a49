//! CLI route: single route table and run context. Builds a session per flow and hands
//! reports to presentation.

use crate::cli::menu::{self, PromptConfirmation};
use crate::cli::parse::{Commands, ConfigCommands};
use crate::cli::presentation::{
    format_creation_report, format_deletion_report, format_environment_report,
    format_validation_json, format_validation_text, BarProgress,
};
use crate::cli::{command_name, map_error};
use crate::cloud::AzCli;
use crate::command::{CommandExecutor, ProcessRunner};
use crate::config::{ConfigLoader, ManagerConfig};
use crate::dispatch::Dispatcher;
use crate::error::ManagerError;
use crate::journal::{run_timestamp, RunArtifacts, RunJournal};
use crate::pipeline::{
    check_environment, ensure_logged_in, run_creation, run_deletion, run_validation, AssumeYes,
    Confirmation, Session,
};
use crate::report::{export_csv, write_creation_summary, write_deletion_summary, write_validation_results};
use crate::resource::{read_snapshot_ids, read_vm_list};
use crate::workers::WorkerContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runtime context for CLI execution: effective configuration, workspace root and the
/// async runtime the flows run on.
pub struct RunContext {
    config: ManagerConfig,
    workspace_root: PathBuf,
    runtime: Runtime,
}

/// A session plus the Ctrl-C listener feeding its cancellation token.
struct ActiveSession {
    session: Session,
    listener: JoinHandle<()>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ManagerError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::with_config(workspace_root, config)
    }

    pub fn with_config(workspace_root: PathBuf, config: ManagerConfig) -> Result<Self, ManagerError> {
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ManagerError::ConfigError(messages.join("; "))
        })?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            config,
            workspace_root,
            runtime,
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table. No command means the menu.
    pub fn execute(&self, command: Option<&Commands>) -> Result<String, ManagerError> {
        let name = command_name(command);
        let started = Instant::now();
        info!(command = %name, "executing command");
        let result = self.execute_inner(command);
        match &result {
            Ok(_) => info!(command = %name, elapsed_ms = started.elapsed().as_millis() as u64, "command finished"),
            Err(e) => warn!(command = %name, error = %e, "command failed"),
        }
        result
    }

    fn execute_inner(&self, command: Option<&Commands>) -> Result<String, ManagerError> {
        match command {
            None | Some(Commands::Menu) => self.handle_menu(),
            Some(Commands::Create { ticket, vm_list }) => {
                self.handle_create(ticket.as_deref(), vm_list.as_deref())
            }
            Some(Commands::Validate {
                input,
                save,
                format,
                max_workers,
            }) => self.handle_validate(input.as_deref(), *save, format, *max_workers),
            Some(Commands::Delete {
                input,
                yes,
                export_csv,
                max_workers,
            }) => self.handle_delete(input.as_deref(), *yes, export_csv.as_deref(), *max_workers),
            Some(Commands::Check) => self.handle_check(),
            Some(Commands::Config { command }) => self.handle_config(command),
        }
    }

    /// Paths from flags and configuration are relative to the workspace root.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    fn log_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.log_dir)
    }

    fn snapshot_list(&self) -> PathBuf {
        self.resolve(&self.config.paths.snapshot_list_path())
    }

    fn open_session(&self, max_workers: Option<usize>) -> Result<ActiveSession, ManagerError> {
        let artifacts = RunArtifacts::new(self.log_dir(), run_timestamp())
            .with_snapshot_list(self.config.paths.snapshot_list.clone());
        let journal = Arc::new(RunJournal::with_artifacts(artifacts)?);

        let runner = Arc::new(ProcessRunner::new(self.config.executor.command_timeout()));
        let executor = CommandExecutor::new(runner, self.config.executor.retry_policy())
            .with_journal(Arc::clone(&journal));
        let cli = AzCli::new(self.config.cli.program.clone());
        let ctx = WorkerContext::new(executor, cli, journal);

        let workers = max_workers.unwrap_or(self.config.dispatch.max_workers);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let listener = self.runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping after in-flight work");
                token.cancel();
            }
        });

        let session = Session::new(ctx, Dispatcher::new(workers), self.config.pipeline_settings())
            .with_cancellation(cancel);
        Ok(ActiveSession { session, listener })
    }

    fn handle_create(&self, ticket: Option<&str>, vm_list: Option<&Path>) -> Result<String, ManagerError> {
        let vm_list = self.resolve(vm_list.unwrap_or(&self.config.paths.vm_list));
        let lines = read_vm_list(&vm_list)?;
        let ticket = match ticket {
            Some(ticket) => ticket.to_string(),
            None => menu::prompt_ticket()?,
        };

        let active = self.open_session(None)?;
        let progress = BarProgress::new();
        let report = self
            .runtime
            .block_on(run_creation(&active.session, lines, &ticket, &progress));

        let artifacts = active.session.context().journal.artifacts();
        let summary = artifacts.creation_summary();
        write_creation_summary(&summary, &report)?;
        let output = format_creation_report(
            &report,
            &[
                ("Summary", summary.as_path()),
                ("Detail log", artifacts.detail_log().as_path()),
                ("Snapshot list", artifacts.snapshot_ids().as_path()),
            ],
        );
        if report.interrupted() {
            println!("{}", output);
            return Err(ManagerError::Interrupted);
        }
        Ok(output)
    }

    fn handle_validate(
        &self,
        input: Option<&Path>,
        save: bool,
        format: &str,
        max_workers: Option<usize>,
    ) -> Result<String, ManagerError> {
        if format != "text" && format != "json" {
            return Err(ManagerError::ConfigError(format!(
                "Invalid output format: {} (must be 'text' or 'json')",
                format
            )));
        }
        let input = input
            .map(|p| self.resolve(p))
            .unwrap_or_else(|| self.snapshot_list());
        let ids = read_snapshot_ids(&input)?;
        if ids.is_empty() {
            warn!(input = %input.display(), "no snapshot ids to validate");
            return Ok(format!("Warning: no snapshot ids found in {}", input.display()));
        }

        let mut active = self.open_session(max_workers)?;
        let progress = BarProgress::new();
        let report = self.runtime.block_on(async {
            active.session.load_subscriptions().await;
            run_validation(&active.session, ids, &progress).await
        })?;

        let mut output = if format == "json" {
            format_validation_json(&report)?
        } else {
            format_validation_text(&report)
        };
        if save {
            let path = active.session.context().journal.artifacts().validation_results();
            write_validation_results(&path, &report)?;
            output.push_str(&format!("\nResults saved: {}", path.display()));
        }
        Ok(output)
    }

    fn handle_delete(
        &self,
        input: Option<&Path>,
        yes: bool,
        export: Option<&Path>,
        max_workers: Option<usize>,
    ) -> Result<String, ManagerError> {
        let input = match input {
            Some(path) => self.resolve(path),
            None => self.resolve(&menu::prompt_path(
                "Snapshot id file to delete",
                &self.snapshot_list().display().to_string(),
            )?),
        };
        let ids = read_snapshot_ids(&input)?;
        if ids.is_empty() {
            warn!(input = %input.display(), "no snapshot ids to delete");
            return Ok(format!("Warning: no snapshot ids found in {}", input.display()));
        }

        let confirm: &dyn Confirmation = if yes { &AssumeYes } else { &PromptConfirmation };
        let mut active = self.open_session(max_workers)?;
        let progress = BarProgress::new();
        let report = self.runtime.block_on(async {
            ensure_logged_in(active.session.context()).await?;
            let names = active.session.load_subscriptions().await;
            info!(subscriptions = names, "subscription directory ready");
            run_deletion(&active.session, ids, confirm, &progress).await
        })?;

        let artifacts = active.session.context().journal.artifacts();
        let summary = artifacts.deletion_summary();
        write_deletion_summary(&summary, &report)?;
        let detail_log = artifacts.detail_log();
        let mut listed: Vec<(&str, &Path)> =
            vec![("Summary", summary.as_path()), ("Detail log", detail_log.as_path())];

        let csv_path = export.map(|p| self.resolve(p));
        if let Some(path) = &csv_path {
            let rows = export_csv(path, &report.aggregate)?;
            info!(rows, path = %path.display(), "exported deletion results");
            listed.push(("CSV export", path.as_path()));
        }

        let output = format_deletion_report(&report, &listed);
        if report.interrupted {
            println!("{}", output);
            return Err(ManagerError::Interrupted);
        }
        Ok(output)
    }

    fn handle_check(&self) -> Result<String, ManagerError> {
        let active = self.open_session(None)?;
        let report = self
            .runtime
            .block_on(check_environment(active.session.context()));
        Ok(format_environment_report(&report))
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<String, ManagerError> {
        match command {
            ConfigCommands::Show => self
                .config
                .to_toml()
                .map_err(|e| ManagerError::ConfigError(format!("Failed to render configuration: {}", e))),
            ConfigCommands::Path => Ok(match ConfigLoader::global_config_path() {
                Some(path) => path.display().to_string(),
                None => "No global configuration directory is available on this system".to_string(),
            }),
        }
    }

    fn handle_menu(&self) -> Result<String, ManagerError> {
        let default_vm_list = self.resolve(&self.config.paths.vm_list).display().to_string();
        let default_snapshot_list = self.snapshot_list().display().to_string();
        loop {
            let action = menu::select_action()?;
            let default_csv = format!("deletion_results_{}.csv", run_timestamp());
            let Some(command) =
                menu::prompt_command(action, &default_vm_list, &default_snapshot_list, &default_csv)?
            else {
                break;
            };
            match self.execute(Some(&command)) {
                Ok(output) => println!("{}\n", output),
                Err(e) => eprintln!("{}\n", map_error(&e)),
            }
        }
        Ok("Goodbye.".to_string())
    }
}
