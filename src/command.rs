// src/command.rs

use std::str::FromStr;

use anyhow::{anyhow, bail, Result};

use crate::render::chart::ChartType;

pub const HELP: &str = "\
commands:
  metric <name|number>  show another metric
  chart line|bar        switch chart type
  reload                fetch the sheet again
  list                  list metrics
  dump                  print the dataset as JSON
  help                  this text
  quit                  exit";

/// One line typed at the viewer prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Metric(String),
    Chart(ChartType),
    Reload,
    List,
    Dump,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };
        let need_arg = |what: &str| -> Result<()> {
            if arg.is_empty() {
                Err(anyhow!("`{}` needs {}", verb, what))
            } else {
                Ok(())
            }
        };

        match verb.to_lowercase().as_str() {
            "metric" | "m" => {
                need_arg("a metric name or number")?;
                Ok(Command::Metric(arg.to_string()))
            }
            "chart" | "c" => {
                need_arg("line or bar")?;
                Ok(Command::Chart(arg.parse()?))
            }
            "reload" | "r" => Ok(Command::Reload),
            "list" | "ls" => Ok(Command::List),
            "dump" => Ok(Command::Dump),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "" => bail!("empty command"),
            other => bail!("unknown command `{}`", other),
        }
    }
}
