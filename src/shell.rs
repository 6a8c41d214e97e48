//! Interactive command shell driving the controller.

use crate::app::PermissionControl;
use crate::cli_style::{self, get_styles, CommandHelp, TableBuilder};
use crate::controller::{format_interval, Controller};
use crate::delivery::NotificationSurface;
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(styles = get_styles(), name = "", disable_help_subcommand = true)]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Deliver one guide notification shortly.
    Now,

    /// Schedule periodic guide notifications.
    Start,

    /// Stop periodic guide notifications.
    Stop,

    /// Request permission to post notifications.
    Permission,

    /// Grant notification permission, as the user would in the dialog.
    Allow,

    /// Refuse notification permission.
    Deny,

    /// Show the status line, job state and permission.
    Status,

    /// Show the notifications currently visible.
    Shade,

    /// List registered jobs.
    Jobs,

    /// Show this help.
    Help,

    /// Close this program.
    #[command(alias = "quit")]
    Exit,
}

const COMMANDS_HELP: &[CommandHelp] = &[
    CommandHelp {
        name: "now",
        args: "",
        description: "Deliver one guide notification shortly",
    },
    CommandHelp {
        name: "start",
        args: "",
        description: "Schedule periodic guide notifications",
    },
    CommandHelp {
        name: "stop",
        args: "",
        description: "Stop periodic guide notifications",
    },
    CommandHelp {
        name: "jobs",
        args: "",
        description: "List registered jobs",
    },
    CommandHelp {
        name: "permission",
        args: "",
        description: "Request permission to post notifications",
    },
    CommandHelp {
        name: "allow",
        args: "",
        description: "Grant notification permission",
    },
    CommandHelp {
        name: "deny",
        args: "",
        description: "Refuse notification permission",
    },
    CommandHelp {
        name: "shade",
        args: "",
        description: "Show visible notifications",
    },
    CommandHelp {
        name: "status",
        args: "",
        description: "Show status, job state and permission",
    },
    CommandHelp {
        name: "help",
        args: "",
        description: "Show this help",
    },
    CommandHelp {
        name: "exit",
        args: "",
        description: "Close this program",
    },
];

#[derive(Debug, PartialEq, Eq)]
pub enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

pub struct Shell {
    controller: Arc<Controller>,
    permission: PermissionControl,
    surface: Arc<dyn NotificationSurface>,
}

impl Shell {
    pub fn new(
        controller: Arc<Controller>,
        permission: PermissionControl,
        surface: Arc<dyn NotificationSurface>,
    ) -> Self {
        Self {
            controller,
            permission,
            surface,
        }
    }

    /// Parse and run one input line.
    pub fn execute_line(&self, line: &str) -> CommandExecutionResult {
        let line = line.trim();
        if line.is_empty() {
            return CommandExecutionResult::Ok;
        }

        let args = shlex::split(line)
            .unwrap_or_else(|| line.split_whitespace().map(String::from).collect());
        let cli =
            InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

        let cli = match cli {
            Ok(cli) => cli,
            Err(e) => return CommandExecutionResult::Error(e.render().to_string()),
        };

        match cli.command {
            InnerCommand::Now => cli_style::print_success(&self.controller.run_once()),
            InnerCommand::Start => cli_style::print_success(&self.controller.start_periodic()),
            InnerCommand::Stop => cli_style::print_success(&self.controller.stop_periodic()),
            InnerCommand::Permission => {
                cli_style::print_info(&self.controller.request_permission())
            }
            InnerCommand::Allow => {
                self.permission.decide(true);
                cli_style::print_success("Permission granted");
            }
            InnerCommand::Deny => {
                self.permission.decide(false);
                cli_style::print_warning("Permission denied");
            }
            InnerCommand::Status => self.print_status(),
            InnerCommand::Shade => self.print_shade(),
            InnerCommand::Jobs => self.print_jobs(),
            InnerCommand::Help => cli_style::print_help(COMMANDS_HELP),
            InnerCommand::Exit => return CommandExecutionResult::Exit,
        }
        CommandExecutionResult::Ok
    }

    fn print_status(&self) {
        cli_style::print_section_header("Status");
        cli_style::print_key_value_highlight("Status", &self.controller.status());
        cli_style::print_key_value("Job", self.controller.job_name());
        cli_style::print_key_value("State", &self.controller.job_state().to_string());
        let granted = if self.controller.permission_granted() {
            "granted"
        } else {
            "not granted"
        };
        cli_style::print_key_value("Permission", granted);
        cli_style::print_section_footer();
    }

    fn print_shade(&self) {
        let visible = self.surface.visible();
        if visible.is_empty() {
            cli_style::print_empty_list("No notifications");
            return;
        }
        for (id, notification) in &visible {
            cli_style::print_notification(*id, notification, false);
        }
    }

    fn print_jobs(&self) {
        let jobs = self.controller.registry().jobs();
        if jobs.is_empty() {
            cli_style::print_empty_list("No jobs registered");
            return;
        }
        let mut table = TableBuilder::new(vec!["Name", "State", "Policy", "Interval", "Id"]);
        for job in jobs {
            let (interval, id) = match &job.handle {
                Some(handle) => (format_interval(handle.interval), handle.id.to_string()),
                None => ("-".to_string(), "-".to_string()),
            };
            table.add_row(vec![
                job.name,
                job.state.to_string(),
                job.policy.to_string(),
                interval,
                id,
            ]);
        }
        table.print();
    }

    /// Blocking read-eval loop. Returns on `exit`, Ctrl-C or Ctrl-D.
    pub fn run(self) -> Result<()> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .build();
        let mut rl = Editor::<ShellHelper, FileHistory>::with_config(config)?;
        rl.set_helper(Some(ShellHelper::new()));

        let prompt = cli_style::get_prompt();
        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    match self.execute_line(&line) {
                        CommandExecutionResult::Ok => {}
                        CommandExecutionResult::Exit => break,
                        CommandExecutionResult::Error(err) => {
                            cli_style::print_error(err.trim_end());
                        }
                    }
                }
                Err(rustyline::error::ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(rustyline::error::ReadlineError::Eof) => {
                    println!("CTRL-D: exiting.");
                    break;
                }
                Err(e) => {
                    cli_style::print_error(&format!("{:?}", e));
                    break;
                }
            }
        }
        Ok(())
    }
}

#[derive(rustyline_derive::Hinter)]
struct ShellHelper {
    commands_names: Vec<String>,
}

impl ShellHelper {
    fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        ShellHelper { commands_names }
    }
}

impl Completer for ShellHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .cloned()
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for ShellHelper {}
impl Validator for ShellHelper {}
impl Helper for ShellHelper {}
