/// Shell commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available shell commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "activities",
    aliases: &["a", "act"],
    usage: "activities <start> <end> [--project <id>]",
    description: "Time entries between two dates",
  },
  Command {
    name: "projects",
    aliases: &["p", "proj"],
    usage: "projects",
    description: "Projects assigned to you",
  },
  Command {
    name: "search-projects",
    aliases: &["sp"],
    usage: "search-projects <query>",
    description: "Search assigned projects by name or description",
  },
  Command {
    name: "tasks",
    aliases: &["t"],
    usage: "tasks <project-id>",
    description: "Tasks of an assigned project",
  },
  Command {
    name: "users",
    aliases: &["u"],
    usage: "users [--archived] [--tag <tag>]... [query]",
    description: "Search the user directory",
  },
  Command {
    name: "holidays",
    aliases: &["h"],
    usage: "holidays <year>",
    description: "Holiday entitlement for a year",
  },
  Command {
    name: "taken-holidays",
    aliases: &["th", "vacation"],
    usage: "taken-holidays <year>",
    description: "Holidays taken in a year",
  },
  Command {
    name: "sick-days",
    aliases: &["sd", "sick"],
    usage: "sick-days <year>",
    description: "Sick days in a year",
  },
  Command {
    name: "public-holidays",
    aliases: &["ph"],
    usage: "public-holidays <year>",
    description: "Public holidays in a year",
  },
  Command {
    name: "presences",
    aliases: &["pr"],
    usage: "presences <start> <end>",
    description: "Presences between two dates",
  },
  Command {
    name: "cache-clear",
    aliases: &["cc", "refresh"],
    usage: "cache-clear",
    description: "Drop cached projects and users",
  },
  Command {
    name: "help",
    aliases: &["?"],
    usage: "help",
    description: "Show this list",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Leave the shell",
  },
];

/// Find the command whose name or alias is exactly `input`
pub fn resolve(input: &str) -> Option<&'static Command> {
  let input_lower = input.to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == input_lower || cmd.aliases.contains(&input_lower.as_str()))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Help text listing every command
pub fn help_text() -> String {
  let width = COMMANDS.iter().map(|c| c.usage.len()).max().unwrap_or(0);
  COMMANDS
    .iter()
    .map(|c| format!("  {:width$}  {}", c.usage, c.description, width = width))
    .collect::<Vec<_>>()
    .join("\n")
}
