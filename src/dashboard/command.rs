use crate::model::{CaseType, LeadStatus, Selector, Severity};
use crate::query::MAX_PAGE;
use crate::refine::{SortDirection, SortKey};

use super::FilterChange;

/// One line typed into a watch session.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Filter(FilterChange),
    NextPage,
    PrevPage,
    Page(u64),
    Search(String),
    Sort(SortKey, SortDirection),
    Expand(String),
    Refresh,
    AutoRefresh(bool),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  next | prev | page N          move between pages
  score N                       minimum lead score (0 = any)
  severity all|fatal|serious_injury|injury|unknown
  case all|truck|pedestrian|auto|motorcycle|unknown
  status all|new|reviewing|contacted|done|closed|ignore
  search TEXT                   filter this page (empty clears)
  sort score|time [asc|desc]
  expand ID                     show or hide row detail
  refresh                       fetch again now
  auto on|off                   toggle the periodic refresh
  quit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        match word.to_lowercase().as_str() {
            "" | "r" | "refresh" => Ok(Command::Refresh),
            "n" | "next" => Ok(Command::NextPage),
            "p" | "prev" => Ok(Command::PrevPage),
            "page" => rest
                .parse::<u64>()
                .ok()
                .filter(|p| (1..=MAX_PAGE).contains(p))
                .map(Command::Page)
                .ok_or_else(|| format!("invalid page '{rest}'")),
            "score" => rest
                .parse::<f64>()
                .ok()
                .filter(|s| s.is_finite() && *s >= 0.0)
                .map(|s| Command::Filter(FilterChange::MinScore(s)))
                .ok_or_else(|| format!("invalid score '{rest}'")),
            "severity" | "sev" => Selector::<Severity>::parse(rest)
                .map(|s| Command::Filter(FilterChange::Severity(s)))
                .ok_or_else(|| format!("invalid severity '{rest}'")),
            "case" => Selector::<CaseType>::parse(rest)
                .map(|s| Command::Filter(FilterChange::CaseType(s)))
                .ok_or_else(|| format!("invalid case type '{rest}'")),
            "status" => Selector::<LeadStatus>::parse(rest)
                .map(|s| Command::Filter(FilterChange::Status(s)))
                .ok_or_else(|| format!("invalid status '{rest}'")),
            "search" | "/" => Ok(Command::Search(rest.to_string())),
            "sort" => {
                let mut parts = rest.split_whitespace();
                let key = parts
                    .next()
                    .and_then(SortKey::parse)
                    .ok_or_else(|| format!("invalid sort key '{rest}'"))?;
                let direction = match parts.next() {
                    Some(d) => {
                        SortDirection::parse(d).ok_or_else(|| format!("invalid direction '{d}'"))?
                    }
                    None => SortDirection::Descending,
                };
                Ok(Command::Sort(key, direction))
            }
            "expand" | "x" => {
                if rest.is_empty() {
                    Err("expand needs a row id".to_string())
                } else {
                    Ok(Command::Expand(rest.to_string()))
                }
            }
            "auto" => match rest.to_lowercase().as_str() {
                "on" | "true" | "1" => Ok(Command::AutoRefresh(true)),
                "off" | "false" | "0" => Ok(Command::AutoRefresh(false)),
                _ => Err(format!("invalid auto setting '{rest}', expected on or off")),
            },
            "help" | "?" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command '{other}', try 'help'")),
        }
    }
}
