//! Prompt commands.
//!
//! One command per input line, whitespace separated:
//!
//! | Command                    | Effect                                      |
//! |----------------------------|---------------------------------------------|
//! | `more` / `n`               | sentinel edge: fetch the next page          |
//! | `sort <key> [asc\|desc]`   | change sort order (resets the feed)         |
//! | `search [term...]`         | set or clear the search term (resets)       |
//! | `filter <id>`              | toggle a saved filter (resets)              |
//! | `reload`                   | reset with the current context              |
//! | `show`                     | print the loaded items                      |
//! | `open <item>`              | print an item and its neighbours            |
//! | `tags <item>`              | print an item's tags                        |
//! | `tag <item> <tag>`         | toggle a tag on an item                     |
//! | `help`                     | print this table                            |
//! | `quit` / `q`               | exit                                        |

use std::str::FromStr;

use gallery_core::context::{SortDirection, SortKey};
use gallery_core::types::{FilterId, ItemId, TagId};

pub const HELP: &str = "\
more | n                 fetch the next page
sort <key> [asc|desc]    date_created, date_modified, filename, checksum, id
search [term...]         set the search term, or clear it
filter <id>              toggle a saved filter
reload                   start the feed over
show                     list loaded items
open <item>              show an item with its neighbours
tags <item>              list an item's tags
tag <item> <tag>         toggle a tag on an item
quit | q                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    More,
    Sort(SortKey, Option<SortDirection>),
    /// `None` clears the search.
    Search(Option<String>),
    Filter(FilterId),
    Reload,
    Show,
    Open(ItemId),
    Tags(ItemId),
    Tag(ItemId, TagId),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },

    #[error("{0}")]
    Invalid(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = words.collect();

        match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("more" | "n", []) => Ok(Command::More),
            ("reload", []) => Ok(Command::Reload),
            ("show" | "ls", []) => Ok(Command::Show),
            ("help" | "?", _) => Ok(Command::Help),
            ("quit" | "q" | "exit", []) => Ok(Command::Quit),

            ("sort", [key]) => Ok(Command::Sort(parse_sort_key(key)?, None)),
            ("sort", [key, dir]) => Ok(Command::Sort(
                parse_sort_key(key)?,
                Some(
                    dir.to_ascii_lowercase()
                        .parse::<SortDirection>()
                        .map_err(|e| CommandError::Invalid(e.to_string()))?,
                ),
            )),
            ("sort", _) => Err(CommandError::Usage {
                command: "sort",
                expected: "<key> [asc|desc]",
            }),

            ("search", []) => Ok(Command::Search(None)),
            ("search", terms) => Ok(Command::Search(Some(terms.join(" ")))),

            ("filter", [id]) => Ok(Command::Filter(parse_id(id)?)),
            ("filter", _) => Err(CommandError::Usage {
                command: "filter",
                expected: "<id>",
            }),

            ("open", [id]) => Ok(Command::Open(parse_id(id)?)),
            ("open", _) => Err(CommandError::Usage {
                command: "open",
                expected: "<item>",
            }),

            ("tags", [id]) => Ok(Command::Tags(parse_id(id)?)),
            ("tags", _) => Err(CommandError::Usage {
                command: "tags",
                expected: "<item>",
            }),

            ("tag", [item, tag]) => Ok(Command::Tag(parse_id(item)?, parse_id(tag)?)),
            ("tag", _) => Err(CommandError::Usage {
                command: "tag",
                expected: "<item> <tag>",
            }),

            ("more" | "n" | "reload" | "show" | "ls" | "quit" | "q" | "exit", _) => {
                Err(CommandError::Invalid(format!("'{head}' takes no arguments")))
            }
            _ => Err(CommandError::Unknown(head.to_string())),
        }
    }
}

fn parse_sort_key(raw: &str) -> Result<SortKey, CommandError> {
    raw.parse::<SortKey>()
        .map_err(|e| CommandError::Invalid(e.to_string()))
}

fn parse_id(raw: &str) -> Result<i64, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::Invalid(format!("'{raw}' is not a valid id")))
}
