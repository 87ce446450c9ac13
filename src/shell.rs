//! Query commands shared by the one-shot CLI and the interactive shell.

use clap::{Parser, Subcommand};
use color_eyre::Result;
use serde_json::Value;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::commands;
use crate::moco::{CachedMocoClient, UserFilter};

/// A MOCO query
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Query {
  /// Time entries between two dates (YYYY-MM-DD, inclusive)
  Activities {
    start_date: String,
    end_date: String,
    /// Only entries booked on this project
    #[arg(long)]
    project: Option<u64>,
  },
  /// Projects assigned to you
  Projects,
  /// Search assigned projects by name or description
  SearchProjects { query: Vec<String> },
  /// Tasks of an assigned project
  Tasks { project_id: u64 },
  /// Search the user directory
  Users {
    query: Vec<String>,
    /// Include archived users
    #[arg(long)]
    archived: bool,
    /// Only users carrying this tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
  },
  /// Holiday entitlement for a year
  Holidays { year: i32 },
  /// Holidays taken in a year
  TakenHolidays { year: i32 },
  /// Sick days in a year
  SickDays { year: i32 },
  /// Public holidays in a year
  PublicHolidays { year: i32 },
  /// Presences between two dates (YYYY-MM-DD, inclusive)
  Presences { start_date: String, end_date: String },
}

/// Run a query and return its result as JSON.
pub async fn execute(client: &CachedMocoClient, query: &Query) -> Result<Value> {
  let value = match query {
    Query::Activities {
      start_date,
      end_date,
      project,
    } => serde_json::to_value(client.get_activities(start_date, end_date, *project).await?)?,
    Query::Projects => serde_json::to_value(client.get_projects().await?)?,
    Query::SearchProjects { query } => {
      serde_json::to_value(client.search_projects(&query.join(" ")).await?)?
    }
    Query::Tasks { project_id } => {
      serde_json::to_value(client.get_project_tasks(*project_id).await?)?
    }
    Query::Users {
      query,
      archived,
      tags,
    } => {
      let filter = UserFilter {
        include_archived: *archived,
        tags: (!tags.is_empty()).then(|| tags.clone()),
      };
      serde_json::to_value(client.search_users(&query.join(" "), &filter).await?)?
    }
    Query::Holidays { year } => serde_json::to_value(client.get_user_holidays(*year).await?)?,
    Query::TakenHolidays { year } => serde_json::to_value(client.get_taken_holidays(*year).await?)?,
    Query::SickDays { year } => serde_json::to_value(client.get_taken_sick_days(*year).await?)?,
    Query::PublicHolidays { year } => {
      serde_json::to_value(client.get_public_holidays(*year).await?)?
    }
    Query::Presences {
      start_date,
      end_date,
    } => serde_json::to_value(client.get_user_presences(start_date, end_date).await?)?,
  };

  Ok(value)
}

/// One line of shell input, parsed
#[derive(Debug, PartialEq)]
pub enum ShellAction {
  Empty,
  Query(Query),
  CacheClear,
  Help,
  Quit,
}

#[derive(Parser, Debug)]
#[command(name = "moco", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
  #[command(subcommand)]
  query: Query,
}

/// Parse a shell line. Commands may be given by name or alias.
pub fn parse_line(line: &str) -> std::result::Result<ShellAction, String> {
  let mut tokens: Vec<&str> = line.split_whitespace().collect();
  let Some(first) = tokens.first().copied() else {
    return Ok(ShellAction::Empty);
  };

  let Some(command) = commands::resolve(first) else {
    return Err(match commands::get_suggestions(first).first() {
      Some(cmd) => format!("Unknown command '{}'. Did you mean '{}'?", first, cmd.name),
      None => format!("Unknown command '{}'. Type 'help' for a list of commands.", first),
    });
  };

  match command.name {
    "help" => Ok(ShellAction::Help),
    "quit" => Ok(ShellAction::Quit),
    "cache-clear" => Ok(ShellAction::CacheClear),
    name => {
      tokens[0] = name;
      ShellLine::try_parse_from(tokens)
        .map(|line| ShellAction::Query(line.query))
        .map_err(|e| e.to_string())
    }
  }
}

/// Interactive session over a single client, so repeated queries hit the cache.
pub async fn run(client: &CachedMocoClient) -> Result<()> {
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut stdout = std::io::stdout();

  println!("MOCO shell. Type 'help' for commands, 'quit' to leave.");

  loop {
    print!("moco> ");
    stdout.flush()?;

    let Some(line) = lines.next_line().await? else {
      break;
    };

    match parse_line(&line) {
      Ok(ShellAction::Empty) => {}
      Ok(ShellAction::Quit) => break,
      Ok(ShellAction::Help) => println!("{}", commands::help_text()),
      Ok(ShellAction::CacheClear) => {
        client.invalidate_cache();
        info!("cache cleared");
        println!("Cache cleared");
      }
      Ok(ShellAction::Query(query)) => match execute(client, &query).await {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(e) => eprintln!("Error: {}", e),
      },
      Err(message) => eprintln!("{}", message),
    }
  }

  Ok(())
}
