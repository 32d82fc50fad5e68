// SPDX-License-Identifier: MIT
//
// n-subst — a headless driver for substitute-command composition.
//
// It wires the two crates together against an in-memory command line:
//
//   n-cmdline → parsing, the toggle engine, the command-line buffer
//   n-compose → config, session state, refresh scheduler, dashboard
//
// A script replays what a user would do on the command line. Each step runs
// as one host callback, followed by one event-loop turn that delivers host
// events and runs deferred writes:
//
//   script step → MemoryHost / Controller → event queue → deferred writes
//
// Script lines:
//
//   enter [word]      open the command line (composing from `word` if given)
//   type <text>       type text, one char at a time
//   backspace         delete the char before the cursor
//   key <name>        press a keymapped key, e.g. <M-r>
//   op <operation>    apply an operation, e.g. toggle_flag:i
//   tick <ms>         advance the clock
//   show              print the line, cursor and panel
//   leave             close the command line
//
// Blank lines and lines starting with `;` are ignored.

use std::io::{self, Read};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use n_cmdline::Operation;
use n_compose::{Config, Controller, Host, MemoryHost, Settings};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Replay a command-line script through a compose session
#[derive(Parser, Debug)]
#[command(name = "n-subst", version, about)]
struct Cli {
    /// Script to replay (reads stdin when omitted)
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Config file (default: ~/.config/n-subst/config.yaml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the default config as YAML and exit
    #[arg(long)]
    dump_config: bool,

    /// Print the state after every step
    #[arg(short, long)]
    trace: bool,
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Enter(Option<String>),
    Type(String),
    Backspace,
    Key(String),
    Op(Operation),
    Tick(u64),
    Show,
    Leave,
}

impl Step {
    /// Parse one script line. `None` for blanks and comments.
    fn parse(line: &str) -> Result<Option<Self>> {
        let trimmed = line.trim_start();
        if trimmed.trim_end().is_empty() || trimmed.starts_with(';') {
            return Ok(None);
        }

        let (word, rest) = trimmed.split_once(' ').unwrap_or((trimmed.trim_end(), ""));
        let step = match word {
            "enter" => {
                let captured = rest.trim_end();
                Self::Enter((!captured.is_empty()).then(|| captured.to_string()))
            }
            "type" => Self::Type(rest.to_string()),
            "backspace" => Self::Backspace,
            "key" => Self::Key(rest.trim().to_string()),
            "op" => Self::Op(rest.trim().parse()?),
            "tick" => Self::Tick(
                rest.trim()
                    .parse()
                    .with_context(|| format!("invalid tick duration `{}`", rest.trim()))?,
            ),
            "show" => Self::Show,
            "leave" => Self::Leave,
            other => bail!("unknown step `{other}`"),
        };
        Ok(Some(step))
    }
}

fn parse_script(source: &str) -> Result<Vec<Step>> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            Step::parse(line)
                .with_context(|| format!("line {}", i + 1))
                .transpose()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

struct Replay {
    ctl: Controller<MemoryHost>,
    now: Instant,
}

impl Replay {
    fn new(settings: Settings) -> Self {
        Self {
            ctl: Controller::new(MemoryHost::new(), settings),
            now: Instant::now(),
        }
    }

    fn run(&mut self, step: &Step) -> Result<()> {
        tracing::debug!(?step, "replaying");
        match step {
            Step::Enter(captured) => self.ctl.host_mut().open(captured.as_deref()),
            Step::Type(text) => self.ctl.host_mut().type_str(text)?,
            Step::Backspace => self.ctl.host_mut().backspace()?,
            Step::Key(name) => {
                if !self.ctl.handle_key(name) {
                    tracing::warn!("key {name} did nothing");
                }
            }
            Step::Op(op) => {
                if !self.ctl.apply(*op) {
                    tracing::warn!("{op} did nothing");
                }
            }
            Step::Tick(ms) => {
                self.now += Duration::from_millis(*ms);
                self.ctl.tick(self.now);
            }
            Step::Show => self.show(),
            Step::Leave => self.ctl.host_mut().close(),
        }
        self.turn();
        Ok(())
    }

    /// One event-loop turn. Echoes of a deferred write arrive in the same
    /// turn, so keep going until the host is quiet.
    fn turn(&mut self) {
        loop {
            while let Some(event) = self.ctl.host_mut().poll_event() {
                self.ctl.handle(event);
            }
            if self.ctl.deferred_len() == 0 {
                break;
            }
            self.ctl.run_deferred(self.now);
        }
    }

    fn show(&self) {
        let host = self.ctl.host();
        if !host.is_open() {
            println!("(command line closed)");
            return;
        }
        println!(":{}", host.line());
        println!("{}^ {}", " ".repeat(host.cursor() + 1), host.cursor());
        if let Some(panel) = host.panel() {
            for line in panel {
                println!("  │ {line}");
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if cli.dump_config {
        print!("{}", Config::default().to_yaml().context("serializing default config")?);
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref()).context("loading config")?;

    let source = match &cli.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading script from stdin")?;
            buf
        }
    };
    let steps = parse_script(&source)?;

    let mut replay = Replay::new(settings);
    for step in &steps {
        replay.run(step)?;
        if cli.trace {
            replay.show();
        }
    }
    if !cli.trace {
        replay.show();
    }
    Ok(())
}
