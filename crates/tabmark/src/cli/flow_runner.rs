//! Headless popup flow runner: replays steps against a fixture-backed session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabmark_core::{EngineConfig, MemoryPlatform, PopupSession};
use tracing::{debug, info};

use super::flow::{FlowStep, PopupFlow, RefreshTarget};
use super::flow_assert::{assert_flow, FlowSnapshot};
use super::inspect::{open_fixture, runtime};
use super::keymap::{command_for, PopupCommand};

#[derive(Debug, Subcommand)]
pub enum FlowCommand {
    /// Run a popup flow JSON script
    Run(FlowRunArgs),
}

#[derive(Debug, Args)]
pub struct FlowRunArgs {
    /// Path to the flow JSON
    pub flow: PathBuf,

    /// Fixture to run against (overrides env.fixture)
    #[arg(long)]
    pub fixture: Option<PathBuf>,

    /// Directory for run.json and failure.json
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct StepMeta {
    index: usize,
    kind: &'static str,
    label: Option<String>,
    /// Whether the step waited on the platform.
    platform_call: bool,
    error: Option<String>,
    snapshot: FlowSnapshot,
}

#[derive(Debug, Serialize)]
struct FlowFailure {
    step_index: usize,
    label: Option<String>,
    failures: Vec<String>,
    snapshot: FlowSnapshot,
}

#[derive(Debug, Serialize)]
struct RunRecord {
    flow: String,
    fixture: String,
    completed: bool,
    steps: Vec<StepMeta>,
}

pub fn run(command: FlowCommand, config: &EngineConfig) -> Result<()> {
    match command {
        FlowCommand::Run(args) => run_flow(args, config),
    }
}

fn run_flow(args: FlowRunArgs, config: &EngineConfig) -> Result<()> {
    let raw = fs::read_to_string(&args.flow)
        .with_context(|| format!("Failed to read flow {}", args.flow.display()))?;
    let flow = PopupFlow::parse(&raw)
        .with_context(|| format!("Failed to load flow {}", args.flow.display()))?;
    let fixture = resolve_fixture(&args, &flow)?;

    let (platform, session) = open_fixture(&fixture, config)?;
    let rt = runtime()?;
    let mut runner = FlowRunner {
        session,
        platform,
        last_error: None,
    };

    let mut steps = Vec::with_capacity(flow.steps.len());
    let mut failure = None;
    for (index, step) in flow.steps.iter().enumerate() {
        debug!(index, kind = step.kind(), "running flow step");
        let platform_call = rt.block_on(runner.run_step(step));
        let snapshot = runner.snapshot();

        if let FlowStep::Assert { assert, label } = step {
            if let Err(err) = assert_flow(assert, &snapshot) {
                failure = Some(FlowFailure {
                    step_index: index,
                    label: label.clone(),
                    failures: err.failures,
                    snapshot: snapshot.clone(),
                });
            }
        }

        steps.push(StepMeta {
            index,
            kind: step.kind(),
            label: step.label().map(str::to_string),
            platform_call,
            error: runner.last_error.clone(),
            snapshot,
        });
        if failure.is_some() {
            break;
        }
    }

    if let Some(out) = &args.out {
        let record = RunRecord {
            flow: args.flow.display().to_string(),
            fixture: fixture.display().to_string(),
            completed: failure.is_none(),
            steps,
        };
        write_artifacts(out, &record, failure.as_ref())?;
    }
    runner.session.close();

    if let Some(failure) = failure {
        let label = failure
            .label
            .as_deref()
            .map(|l| format!(" ({})", l))
            .unwrap_or_default();
        for line in &failure.failures {
            eprintln!("  - {}", line);
        }
        bail!("flow failed at step {}{}", failure.step_index, label);
    }

    info!(steps = flow.steps.len(), "flow completed");
    println!("Flow completed: {} steps", flow.steps.len());
    Ok(())
}

fn resolve_fixture(args: &FlowRunArgs, flow: &PopupFlow) -> Result<PathBuf> {
    if let Some(path) = &args.fixture {
        return Ok(path.clone());
    }
    let Some(relative) = &flow.env.fixture else {
        bail!("flow has no env.fixture; pass --fixture");
    };
    let base = args.flow.parent().unwrap_or_else(|| Path::new("."));
    Ok(base.join(relative))
}

fn write_artifacts(out: &Path, record: &RunRecord, failure: Option<&FlowFailure>) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("create {}", out.display()))?;
    fs::write(out.join("run.json"), serde_json::to_string_pretty(record)?)
        .context("write run.json")?;
    if let Some(failure) = failure {
        fs::write(out.join("failure.json"), serde_json::to_string_pretty(failure)?)
            .context("write failure.json")?;
    }
    Ok(())
}

struct FlowRunner {
    session: PopupSession,
    platform: Arc<MemoryPlatform>,
    last_error: Option<String>,
}

impl FlowRunner {
    fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot::capture(&self.session, &self.platform, self.last_error.as_deref())
    }

    /// Run one step. Returns whether it waited on the platform.
    ///
    /// Platform errors are kept in `last_error` for later assertions; they do
    /// not stop the flow.
    async fn run_step(&mut self, step: &FlowStep) -> bool {
        match step {
            FlowStep::Action {
                key,
                select_dir,
                view,
                focus,
                toggle,
                ..
            } => {
                if let Some(key) = key {
                    // Keys were validated when the flow was parsed.
                    if let Some(command) = command_for(key) {
                        self.execute(command).await;
                        return command.is_async();
                    }
                }
                if let Some(id) = select_dir {
                    self.session.bookmarks().select_dir(id.clone());
                }
                if let Some(view) = view {
                    self.session.bookmarks().set_view(*view);
                }
                if let Some(index) = focus {
                    self.session.tabs().set_focus_index(*index);
                }
                if let Some(id) = toggle {
                    self.session.tabs().toggle_check(*id);
                }
                false
            }
            FlowStep::Refresh { target, .. } => {
                self.refresh(*target).await;
                true
            }
            FlowStep::FailNext {
                call,
                error,
                message,
                ..
            } => {
                let message = message.as_deref().unwrap_or("scripted failure");
                self.platform.fail_next(*call, error.error(message));
                false
            }
            FlowStep::Assert { .. } => false,
        }
    }

    async fn execute(&mut self, command: PopupCommand) {
        let tabs = self.session.tabs();
        let outcome = match command {
            PopupCommand::MoveFocus(delta) => {
                tabs.move_focus_index(delta);
                return;
            }
            PopupCommand::FocusEnd(end) => {
                tabs.set_focus_index_end(end);
                return;
            }
            PopupCommand::ToggleFocused => {
                tabs.toggle_check_focused();
                return;
            }
            PopupCommand::ToggleAll => {
                tabs.toggle_check_all();
                return;
            }
            PopupCommand::ClearSelection => {
                self.session.bookmarks().clear_selection();
                return;
            }
            PopupCommand::SetView(view) => {
                self.session.bookmarks().set_view(view);
                return;
            }
            PopupCommand::CloseChecked => {
                Some(self.session.close_checked_tabs().await.map(|_| ()))
            }
            PopupCommand::CloseFocused => Some(self.session.close_focused_tab().await.map(|_| ())),
            PopupCommand::ActivateFocused => {
                Some(self.session.activate_focused_tab().await.map(|_| ()))
            }
            PopupCommand::Refresh => None,
        };
        match outcome {
            Some(result) => self.last_error = result.err().map(|e| e.to_string()),
            None => self.refresh(RefreshTarget::All).await,
        }
    }

    async fn refresh(&mut self, target: RefreshTarget) {
        let errors: Vec<String> = match target {
            RefreshTarget::All => {
                let report = self.session.refresh_all().await;
                [report.tabs.err(), report.tree.err()]
                    .into_iter()
                    .flatten()
                    .map(|e| e.to_string())
                    .collect()
            }
            RefreshTarget::Tabs => self
                .session
                .fetch_tabs()
                .await
                .err()
                .into_iter()
                .map(|e| e.to_string())
                .collect(),
            RefreshTarget::Tree => self
                .session
                .fetch_tree()
                .await
                .err()
                .into_iter()
                .map(|e| e.to_string())
                .collect(),
        };
        self.last_error = if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        };
    }
}
