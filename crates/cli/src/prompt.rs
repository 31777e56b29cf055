//! Terminal prompts for the interactive survey session.

use anyhow::Result;
use providers::Participant;
use std::io::{self, BufRead, Write};
use survey_core::models::{Rating, AGE_RANGES, EDUCATIONS, GENDERS, PROFESSIONS};

/// What the participant asked for at a question prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Rate(Rating),
    Back,
    Quit,
}

pub fn parse_action(input: &str) -> Option<Action> {
    let trimmed = input.trim();
    match trimmed {
        "b" | "back" => Some(Action::Back),
        "q" | "quit" => Some(Action::Quit),
        "u" | "unknown" | "Unknown" => Some(Action::Rate(Rating::Unknown)),
        other => Rating::parse(other).map(Action::Rate),
    }
}

/// Read until the participant enters a valid action. EOF quits.
pub fn read_action() -> Result<Action> {
    loop {
        let Some(line) = read_line("> ")? else {
            return Ok(Action::Quit);
        };
        if let Some(action) = parse_action(&line) {
            return Ok(action);
        }
        println!("Enter 1-5, u (unknown), b (back) or q (quit).");
    }
}

pub fn confirm(question: &str) -> Result<bool> {
    let answer = read_line(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.as_deref().map(str::trim), Some("y") | Some("Y")))
}

/// Prompt for one value from a fixed option list; empty input skips.
pub fn pick_option(label: &str, options: &[&str]) -> Result<Option<String>> {
    println!("{}:", label);
    for (i, option) in options.iter().enumerate() {
        println!("  {}. {}", i + 1, option);
    }
    loop {
        let Some(line) = read_line("  choice (blank to skip): ")? else {
            return Ok(None);
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.parse::<usize>() {
            Ok(n) if n >= 1 && n <= options.len() => {
                return Ok(Some(options[n - 1].to_string()))
            }
            _ => println!("Enter a number between 1 and {}.", options.len()),
        }
    }
}

/// Collect participant info; name/email given on the command line skip their
/// prompts. Everything is optional, mirroring the survey form.
pub fn collect_participant(
    name: Option<String>,
    email: Option<String>,
    skip_demographics: bool,
) -> Result<Participant> {
    let name = match name {
        Some(name) => name,
        None => read_line("Your name (optional): ")?.unwrap_or_default().trim().to_string(),
    };
    let email = match email {
        Some(email) => email,
        None => read_line("Your email (optional): ")?.unwrap_or_default().trim().to_string(),
    };

    let mut participant = Participant {
        name,
        email,
        ..Participant::default()
    };
    if !skip_demographics {
        participant.gender = pick_option("Gender", GENDERS)?;
        participant.age_range = pick_option("Age range", AGE_RANGES)?;
        participant.education = pick_option("Education", EDUCATIONS)?;
        participant.profession = pick_option("Profession", PROFESSIONS)?;
    }
    Ok(participant)
}

/// One prompted line from stdin; `None` on EOF.
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ratings_and_navigation() {
        assert_eq!(parse_action("3"), Some(Action::Rate(Rating::Three)));
        assert_eq!(parse_action(" 5 "), Some(Action::Rate(Rating::Five)));
        assert_eq!(parse_action("u"), Some(Action::Rate(Rating::Unknown)));
        assert_eq!(parse_action("unknown"), Some(Action::Rate(Rating::Unknown)));
        assert_eq!(parse_action("b"), Some(Action::Back));
        assert_eq!(parse_action("q"), Some(Action::Quit));
        assert_eq!(parse_action("0"), None);
        assert_eq!(parse_action("next"), None);
    }
}
