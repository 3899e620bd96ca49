//! `tide` command line: run a task through the agent loop, chat with a
//! persistent history, or let solo mode build and deploy a project.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use tide::core::registry::CapabilityRegistry;
use tide::core::types::{Role, Turn};
use tide::error::OrchestratorError;
use tide::exit_codes;
use tide::io::config::{DEFAULT_CONFIG_PATH, TideConfig, load_config, write_config};
use tide::io::credentials::ReasonerCredentials;
use tide::io::history::HistoryStore;
use tide::io::openai::OpenAiReasoner;
use tide::io::prompt::render_solo_prompt;
use tide::orchestrator::{LoopConfig, LoopEvent, Orchestrator};
use tide::tools::{builder_capabilities, solo_capabilities};

/// Observations longer than this are shortened in the loop trace.
const TRACE_PREVIEW_CHARS: usize = 500;

#[derive(Parser)]
#[command(name = "tide", version, about = "Bounded think-act-observe agent loop")]
struct Cli {
    /// Config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// History file, overriding `history_path` from the config.
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config file.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Run one task to a final answer and save the history.
    Run {
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
    },
    /// Autonomous mode: plan, build and deploy without a history file.
    Solo {
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
    },
    /// Interactive session on top of the saved history. Type `exit` to quit.
    Chat,
    /// Print the saved history.
    History,
}

fn main() {
    tide::logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Init { force } => cmd_init(&cli.config, *force),
        Command::Run { task } => cmd_run(&settings(&cli)?, &task.join(" ")),
        Command::Solo { task } => cmd_solo(&settings(&cli)?, &task.join(" ")),
        Command::Chat => cmd_chat(&settings(&cli)?),
        Command::History => cmd_history(&settings(&cli)?),
    }
}

fn settings(cli: &Cli) -> Result<TideConfig> {
    let mut cfg =
        load_config(&cli.config).with_context(|| format!("load {}", cli.config.display()))?;
    if let Some(path) = &cli.history {
        cfg.history_path = path.clone();
    }
    Ok(cfg)
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &TideConfig::default())
        .with_context(|| format!("write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_run(cfg: &TideConfig, task: &str) -> Result<i32> {
    let reasoner = match connect(cfg) {
        Ok(reasoner) => reasoner,
        Err(err) => return Ok(report(&err)),
    };
    let registry = CapabilityRegistry::new(builder_capabilities(&cfg.tools)?)?;
    let mut orchestrator = Orchestrator::new(reasoner, registry, LoopConfig::builder(cfg))
        .with_history(HistoryStore::new(&cfg.history_path), false)
        .with_observer(print_event);
    orchestrator.load()?;

    let code = finish(orchestrator.run(task));
    orchestrator.save()?;
    Ok(code)
}

fn cmd_solo(cfg: &TideConfig, task: &str) -> Result<i32> {
    let reasoner = match connect(cfg) {
        Ok(reasoner) => reasoner,
        Err(err) => return Ok(report(&err)),
    };
    let registry = CapabilityRegistry::new(solo_capabilities(&cfg.tools)?)?;
    let prompt = render_solo_prompt(&registry.catalog())?;
    let mut orchestrator = Orchestrator::new(reasoner, registry, LoopConfig::solo(cfg))
        .with_observer(print_event);
    orchestrator.seed_system_prompt(prompt);

    eprintln!("solo task: {task}");
    Ok(finish(orchestrator.run(task)))
}

fn cmd_chat(cfg: &TideConfig) -> Result<i32> {
    let reasoner = match connect(cfg) {
        Ok(reasoner) => reasoner,
        Err(err) => return Ok(report(&err)),
    };
    let registry = CapabilityRegistry::new(builder_capabilities(&cfg.tools)?)?;
    let mut orchestrator = Orchestrator::new(reasoner, registry, LoopConfig::builder(cfg))
        .with_history(HistoryStore::new(&cfg.history_path), cfg.autosave)
        .with_observer(print_event);

    let restored = orchestrator.load()?;
    if restored > 0 {
        println!("restored {restored} turns from {}", cfg.history_path.display());
        for turn in orchestrator.transcript().turns() {
            print_turn(turn);
        }
    }
    println!("tide chat - type 'exit' to quit");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("flush stdout")?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("read stdin")?;
        let task = line.trim();
        if task == "exit" {
            break;
        }
        if task.is_empty() {
            continue;
        }
        match orchestrator.run(task) {
            Ok(answer) => println!("{answer}"),
            Err(err) => eprintln!("error: {err}"),
        }
    }

    if !cfg.autosave {
        orchestrator.save()?;
    }
    orchestrator.flush().context("save history")?;
    Ok(exit_codes::OK)
}

fn cmd_history(cfg: &TideConfig) -> Result<i32> {
    let transcript = HistoryStore::new(&cfg.history_path).load()?;
    if transcript.is_empty() {
        println!("no history at {}", cfg.history_path.display());
        return Ok(exit_codes::OK);
    }
    for turn in transcript.turns() {
        print_turn(turn);
    }
    Ok(exit_codes::OK)
}

fn connect(cfg: &TideConfig) -> Result<OpenAiReasoner, OrchestratorError> {
    let credentials = ReasonerCredentials::from_env()
        .map_err(|err| OrchestratorError::Configuration(format!("{err:#}")))?;
    OpenAiReasoner::new(
        credentials,
        &cfg.reasoner.model,
        Duration::from_secs(cfg.reasoner.timeout_secs),
    )
    .map_err(|err| OrchestratorError::Configuration(format!("{err:#}")))
}

fn finish(outcome: Result<String, OrchestratorError>) -> i32 {
    match outcome {
        Ok(answer) => {
            println!("{answer}");
            exit_codes::OK
        }
        Err(err) => report(&err),
    }
}

fn report(err: &OrchestratorError) -> i32 {
    eprintln!("error: {err}");
    err.exit_code()
}

fn print_event(event: &LoopEvent<'_>) {
    match event {
        LoopEvent::RequestSent {
            iteration,
            max_iterations,
        } => eprintln!("--- request {iteration}/{max_iterations} ---"),
        LoopEvent::Thought { content } => eprintln!("thought: {content}"),
        LoopEvent::Invoking { invocation } => eprintln!(
            "executing {} with args: {}",
            invocation.capability, invocation.arguments
        ),
        LoopEvent::Observed { observation, .. } => {
            eprintln!("observation: {}", preview(observation));
        }
        LoopEvent::Missed { invocation } => {
            eprintln!("capability '{}' not found", invocation.capability);
        }
        LoopEvent::Answer { .. } => eprintln!("--- final answer ---"),
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TRACE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn print_turn(turn: &Turn) {
    if turn.role == Role::Tool {
        println!(
            "tool ({}, {}): {}",
            turn.capability.as_deref().unwrap_or("?"),
            turn.invocation_ref.as_deref().unwrap_or("?"),
            turn.content
        );
        return;
    }
    println!("{}: {}", turn.role.as_str(), turn.content);
    for invocation in &turn.invocations {
        println!(
            "  -> {} {} [{}]",
            invocation.capability, invocation.arguments, invocation.id
        );
    }
}
