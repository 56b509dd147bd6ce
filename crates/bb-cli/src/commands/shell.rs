//! Interactive break desk: a line-command front end over the service.
//!
//! One process, one store; breaks started here stay visible until the
//! process exits. Service-level rejections (already active, at capacity,
//! wrong break id) are ordinary outcomes and are printed, never fatal.

use std::fmt::Write as _;
use std::io::{self, BufRead as _, Write as _};
use std::str::FromStr;

use anyhow::Result;
use chrono::{NaiveDate, Utc};

use bb_core::{BreakId, DailySummary, DepartmentStats, User};
use bb_service::{BreakHistoryEntry, BreakService};

use super::types::render_availability;

const HELP: &str = "\
commands:
  login <username>          act as this user
  start <code>              start a break of the given type
  end [id]                  end the current break (optionally by id)
  status                    show the current break
  summary [YYYY-MM-DD]      daily summary (default: today)
  history [YYYY-MM-DD]      break history (default: today)
  stats <dept> [YYYY-MM-DD] department statistics
  availability              break type capacity
  users                     list users
  quit                      exit
";

/// A parsed shell command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Login(String),
    Start(String),
    End(Option<i64>),
    Status,
    Summary(Option<NaiveDate>),
    History(Option<NaiveDate>),
    Stats {
        department: String,
        date: Option<NaiveDate>,
    },
    Availability,
    Users,
    Help,
    Quit,
}

fn parse_date(arg: Option<&str>) -> Result<Option<NaiveDate>, String> {
    arg.map(|s| {
        s.parse()
            .map_err(|_| format!("invalid date: {s} (expected YYYY-MM-DD)"))
    })
    .transpose()
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let Some(keyword) = parts.next() else {
            return Err("empty command".to_string());
        };
        let first = parts.next();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments for '{keyword}'"));
        }

        let only_one = |value: Option<&str>| -> Result<(), String> {
            if value.is_some() {
                Err(format!("too many arguments for '{keyword}'"))
            } else {
                Ok(())
            }
        };

        match keyword {
            "login" => {
                only_one(second)?;
                first
                    .map(|name| Self::Login(name.to_string()))
                    .ok_or_else(|| "usage: login <username>".to_string())
            }
            "start" => {
                only_one(second)?;
                first
                    .map(|code| Self::Start(code.to_string()))
                    .ok_or_else(|| "usage: start <code>".to_string())
            }
            "end" => {
                only_one(second)?;
                let id = first
                    .map(|raw| raw.parse().map_err(|_| format!("invalid break id: {raw}")))
                    .transpose()?;
                Ok(Self::End(id))
            }
            "status" => {
                only_one(first)?;
                Ok(Self::Status)
            }
            "summary" => {
                only_one(second)?;
                Ok(Self::Summary(parse_date(first)?))
            }
            "history" => {
                only_one(second)?;
                Ok(Self::History(parse_date(first)?))
            }
            "stats" => {
                let department = first.ok_or_else(|| "usage: stats <dept> [date]".to_string())?;
                Ok(Self::Stats {
                    department: department.to_string(),
                    date: parse_date(second)?,
                })
            }
            "availability" => {
                only_one(first)?;
                Ok(Self::Availability)
            }
            "users" => {
                only_one(first)?;
                Ok(Self::Users)
            }
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command: {other} (try 'help')")),
        }
    }
}

/// Runs the interactive loop until EOF or `quit`.
pub fn run(service: &BreakService) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut current_user: Option<User> = None;

    println!("break desk ready; type 'help' for commands");
    loop {
        match &current_user {
            Some(user) => write!(stdout, "{}> ", user.username)?,
            None => write!(stdout, "> ")?,
        }
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => execute(service, &mut current_user, &command),
            Err(message) => println!("{message}"),
        }
    }
    Ok(())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn execute(service: &BreakService, current_user: &mut Option<User>, command: &Command) {
    match command {
        Command::Login(username) => match service.store().user_by_username(username) {
            Some(user) => {
                println!("acting as {}", user.username);
                *current_user = Some(user);
            }
            None => println!("unknown user: {username}"),
        },
        Command::Start(code) => {
            let Some(user) = current_user.as_ref() else {
                println!("log in first: login <username>");
                return;
            };
            match service.start_break(user.id, code) {
                Ok(started) => println!(
                    "break {} started: {}",
                    started.entry.id, started.break_type.name
                ),
                Err(err) => println!("cannot start: {err}"),
            }
        }
        Command::End(id) => {
            let Some(user) = current_user.as_ref() else {
                println!("log in first: login <username>");
                return;
            };
            let break_id = match id {
                Some(raw) => BreakId::new(*raw),
                None => match service.active_break(user.id) {
                    Some((entry, _)) => entry.id,
                    None => {
                        println!("no active break");
                        return;
                    }
                },
            };
            match service.end_break(break_id, user.id) {
                Ok(ended) => {
                    println!(
                        "break ended after {} min ({})",
                        ended.entry.duration_minutes.unwrap_or(0),
                        ended.break_type.name
                    );
                    print!("{}", render_summary(&ended.summary));
                }
                Err(err) => println!("cannot end: {err}"),
            }
        }
        Command::Status => {
            let Some(user) = current_user.as_ref() else {
                println!("log in first: login <username>");
                return;
            };
            match service.active_break(user.id) {
                Some((entry, break_type)) => {
                    let since = entry
                        .start_time
                        .map_or_else(|| "unknown".to_string(), |t| t.format("%H:%M").to_string());
                    println!("on {} since {since} (break {})", break_type.name, entry.id);
                }
                None => println!("no active break"),
            }
        }
        Command::Summary(date) => {
            let Some(user) = current_user.as_ref() else {
                println!("log in first: login <username>");
                return;
            };
            let summary = service.daily_summary(user.id, date.unwrap_or_else(today));
            print!("{}", render_summary(&summary));
        }
        Command::History(date) => {
            let Some(user) = current_user.as_ref() else {
                println!("log in first: login <username>");
                return;
            };
            let history = service.break_history(user.id, date.unwrap_or_else(today));
            print!("{}", render_history(&history));
        }
        Command::Stats { department, date } => {
            let Some(found) = service.store().department_by_code(department) else {
                println!("unknown department: {department}");
                return;
            };
            match service.department_stats(found.id, date.unwrap_or_else(today)) {
                Ok(stats) => print!("{}", render_stats(&stats)),
                Err(err) => println!("{err}"),
            }
        }
        Command::Availability => print!("{}", render_availability(&service.availability())),
        Command::Users => {
            for user in service.store().users() {
                let department = user
                    .department_id
                    .and_then(|id| service.store().department(id))
                    .map_or_else(String::new, |d| format!(" [{}]", d.code));
                let display = user.name.as_deref().unwrap_or("-");
                println!("{:<12} {display}{department}", user.username);
            }
        }
        Command::Help => print!("{HELP}"),
        Command::Quit => {}
    }
}

fn render_summary(summary: &DailySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "used {} min, remaining {} min, exceeded {} min",
        summary.total_used, summary.total_remaining, summary.total_exceeded
    );
    for usage in &summary.break_type_usage {
        let _ = writeln!(
            out,
            "  {} ({}): {} of {} min",
            usage.code, usage.name, usage.duration_used, usage.duration_limit
        );
    }
    out
}

fn render_stats(stats: &DepartmentStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", stats.department_name, stats.department_code);
    let _ = writeln!(out, "  employees: {}", stats.employee_count);
    let _ = writeln!(
        out,
        "  total: {} min, average {:.1} min per employee",
        stats.total_break_minutes, stats.average_break_minutes
    );
    let _ = writeln!(out, "  over budget: {}", stats.exceeded_count);
    for stat in &stats.break_type_stats {
        let _ = writeln!(
            out,
            "  {}: {} min total, {:.1} min average",
            stat.break_type_name, stat.total_usage, stat.average_usage
        );
    }
    out
}

fn render_history(entries: &[BreakHistoryEntry]) -> String {
    if entries.is_empty() {
        return "no breaks recorded\n".to_string();
    }
    let mut out = String::new();
    for item in entries {
        let name = item
            .break_type
            .as_ref()
            .map_or("unknown type", |t| t.name.as_str());
        let start = item
            .entry
            .start_time
            .map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string());
        if item.entry.active {
            let _ = writeln!(out, "  {start}  {name} (active)");
        } else {
            let _ = writeln!(
                out,
                "  {start}  {name}, {} min",
                item.entry.duration_minutes.unwrap_or(0)
            );
        }
    }
    out
}
