//! Interactive session: one `ClientState` and one form per tool, kept across lines.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

use mathsolver_core::{Direction, FormState, HistoryStore, Operation, PreferenceStore};
use mathsolver_session::{ClientState, Notification, Orchestrator, Surfaces};

use crate::terminal::TerminalSurfaces;

const HELP: &str = "\
Type an expression to run it through the current tool.

  :tool derivative|integral|limit   switch tool
  :set var <name>                   variable of the current tool
  :set definite on|off              definite integral
  :set lower <v> / :set upper <v>   integral bounds
  :set point <v>                    limit point
  :set dir both|+|-                 limit direction
  :history [query]                  list (or search) past calculations
  :rerun <id>                       run a history entry again
  :clear                            clear history
  :theme                            toggle light/dark
  :help                             this text
  :quit                             leave";

enum Flow {
    Continue,
    Quit,
}

pub struct Shell<'a, S> {
    orch: Orchestrator<'a>,
    store: &'a S,
    state: ClientState,
    forms: [FormState; 3],
}

impl<'a, S: HistoryStore + PreferenceStore> Shell<'a, S> {
    pub fn new(orch: Orchestrator<'a>, store: &'a S) -> Self {
        Self {
            orch,
            store,
            state: ClientState::new(),
            forms: Default::default(),
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Read lines until `:quit` or end of input.
    pub fn run<O: Write, E: Write>(
        &mut self,
        input: impl BufRead,
        surfaces: &mut TerminalSurfaces<O, E>,
    ) -> Result<()> {
        surfaces.line("MathSolver shell. :help for commands.");
        for line in input.lines() {
            let line = line.context("reading input")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let flow = if let Some(command) = line.strip_prefix(':') {
                match self.command(command, surfaces) {
                    Ok(flow) => flow,
                    Err(e) => {
                        surfaces.notify(Notification::error(format!("{e:#}")));
                        Flow::Continue
                    }
                }
            } else {
                self.submit(line, surfaces);
                Flow::Continue
            };
            if let Flow::Quit = flow {
                break;
            }
        }
        Ok(())
    }

    fn submit<O: Write, E: Write>(
        &mut self,
        expression: &str,
        surfaces: &mut TerminalSurfaces<O, E>,
    ) {
        let tool = self.state.current_tool();
        let form = &mut self.forms[tool.index()];
        form.expression = expression.to_string();
        let form = form.clone();
        self.orch.submit_form(&mut self.state, surfaces, tool, &form);
    }

    fn command<O: Write, E: Write>(
        &mut self,
        command: &str,
        surfaces: &mut TerminalSurfaces<O, E>,
    ) -> Result<Flow> {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "q" | "quit" | "exit" => return Ok(Flow::Quit),
            "help" | "h" => surfaces.line(HELP),
            "tool" | "t" => {
                let tool: Operation = arg.parse().map_err(anyhow::Error::msg)?;
                self.state.switch_tool(tool);
                surfaces.line(&format!("Tool: {}", tool.title()));
            }
            "set" => self.set_field(arg)?,
            "history" => {
                let entries = if arg.is_empty() {
                    self.store.all()?
                } else {
                    self.store.filter(arg)?
                };
                surfaces.print_history(&entries);
            }
            "rerun" => {
                let id: i64 = arg
                    .parse()
                    .with_context(|| format!("invalid history id: {arg}"))?;
                let loaded = self.orch.load_from_history(&mut self.state, surfaces, id);
                if let Some(entry) = loaded {
                    let form = &mut self.forms[entry.kind.index()];
                    form.expression = entry.expression;
                    let form = form.clone();
                    self.orch.submit_form(&mut self.state, surfaces, entry.kind, &form);
                }
            }
            "clear" => {
                self.store.clear()?;
                surfaces.notify(Notification::success("History cleared"));
            }
            "theme" => {
                let theme = self.store.theme()?.toggled();
                self.store.set_theme(theme)?;
                surfaces.line(&format!("Theme: {theme}"));
            }
            other => bail!("unknown command :{other} (try :help)"),
        }
        Ok(Flow::Continue)
    }

    fn set_field(&mut self, arg: &str) -> Result<()> {
        let (field, value) = arg
            .split_once(char::is_whitespace)
            .map(|(f, v)| (f, v.trim()))
            .unwrap_or((arg, ""));
        let form = &mut self.forms[self.state.current_tool().index()];
        match field {
            "var" | "variable" => form.variable = value.to_string(),
            "lower" => form.lower = value.to_string(),
            "upper" => form.upper = value.to_string(),
            "point" => form.point = value.to_string(),
            "definite" => {
                form.definite = match value {
                    "on" | "true" | "yes" => true,
                    "off" | "false" | "no" => false,
                    other => bail!("expected on or off, got {other:?}"),
                }
            }
            "dir" | "direction" => form.direction = parse_direction(value)?,
            other => bail!("unknown field {other:?}"),
        }
        Ok(())
    }
}

fn parse_direction(s: &str) -> Result<Direction> {
    match s {
        "both" | "+-" | "" => Ok(Direction::PlusMinus),
        "+" | "plus" | "right" => Ok(Direction::Plus),
        "-" | "minus" | "left" => Ok(Direction::Minus),
        other => bail!("invalid direction: {other}"),
    }
}
