use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

use j2py_common::Config;
use j2py_emitter::BuildStack;

use crate::args::CliArgs;
use crate::events::{Event, Replayer, parse_events};

/// What to print once the tree is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Program,
    TreeDump,
}

impl OutputMode {
    pub fn from_args(args: &CliArgs) -> Self {
        if args.dump_tree {
            OutputMode::TreeDump
        } else {
            OutputMode::Program
        }
    }
}

pub fn load_config(args: &CliArgs) -> Result<Config> {
    Config::from_files(&args.config, !args.no_defaults)
}

pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read event stream {}", path.display())),
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("failed to read event stream from stdin")?;
            Ok(source)
        }
    }
}

/// Build a tree from `events` under `config` and render it.
pub fn translate(config: &Config, events: &[Event], mode: OutputMode) -> Result<String> {
    let mut stack = BuildStack::new(config).context("invalid emitter configuration")?;
    Replayer::new(&mut stack).replay(events)?;
    let translation = stack.finish().context("event stream is incomplete")?;
    match mode {
        OutputMode::TreeDump => Ok(translation.dump_tree()),
        OutputMode::Program => translation
            .render()
            .context("failed to render translated module"),
    }
}

pub fn run(args: &CliArgs) -> Result<()> {
    let config = load_config(args)?;
    let source = read_input(args.input_path().map(|path| path.as_path()))?;
    let events = parse_events(&source)?;
    let text = translate(&config, &events, OutputMode::from_args(args))?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = text.len(), "wrote module");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("failed to write to stdout")?;
            stdout.flush().context("failed to flush stdout")?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/driver_tests.rs"]
mod driver_tests;
