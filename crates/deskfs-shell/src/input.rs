//! Parses a typed command line into an [`InputAction`].
//!
//! Paths stay as strings here; the [`App`](crate::app::App) resolves them
//! against the current folder before building core commands.

use deskfs_core::nav::filter::{SortDirection, SortField};

/// Actions that can result from one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Blank line.
    Noop,
    /// List a folder (current folder when `None`).
    List { path: Option<String>, all: bool },
    /// Change the current folder.
    ChangeDir(String),
    /// Print the current folder's path.
    PrintDir,
    /// Draw the subtree below a folder.
    Tree(Option<String>),
    /// Print a file's content.
    Show(String),
    /// Print a node's details.
    Info(String),
    /// Create a folder.
    MakeDir(String),
    /// Create an empty file.
    Touch(String),
    /// Replace (or create) a file with the given text.
    Write { path: String, content: String },
    /// Move a node into a folder.
    Move { source: String, target: String },
    /// Rename a node in place.
    Rename { path: String, name: String },
    /// Trash a node.
    Remove(String),
    /// List the trash ledger.
    Trash,
    /// Restore a trash entry by index.
    Restore(usize),
    /// Purge a trash entry by index.
    Purge(usize),
    /// Purge every trash entry.
    EmptyTrash,
    /// Hold a node for copying.
    Copy(String),
    /// Hold a node for moving.
    Cut(String),
    /// Paste into a folder (current folder when `None`).
    Paste(Option<String>),
    /// Show what the clipboard holds.
    Clipboard,
    /// Drop the clipboard contents.
    ClearClipboard,
    /// Substring search. Flags override the configured defaults.
    Find {
        query: String,
        hidden: bool,
        content: bool,
    },
    /// Fuzzy name search.
    Fuzzy(String),
    /// Add a favorite.
    Favorite(String),
    /// Remove a favorite.
    Unfavorite(String),
    /// List favorites.
    Favorites,
    /// Toggle the hidden flag.
    SetHidden(String, bool),
    /// Toggle the read-only flag.
    SetReadOnly(String, bool),
    /// Change how listings are sorted.
    Sort(SortField, SortDirection),
    /// Persist a snapshot now.
    Save,
    /// Print the command reference.
    Help,
    /// Leave the shell.
    Quit,
}

/// Parses one input line.
///
/// # Errors
///
/// Returns a usage message for unknown commands and missing or malformed
/// arguments.
pub fn parse_line(line: &str) -> Result<InputAction, String> {
    let tokens = tokenize(line)?;
    let Some((command, args)) = tokens.split_first() else {
        return Ok(InputAction::Noop);
    };

    let action = match command.as_str() {
        "ls" | "dir" => {
            let all = args.iter().any(|a| a == "-a");
            let path = args.iter().find(|a| !a.starts_with('-')).cloned();
            InputAction::List { path, all }
        }
        "cd" => InputAction::ChangeDir(args.first().cloned().unwrap_or_else(|| "/".to_string())),
        "pwd" => InputAction::PrintDir,
        "tree" => InputAction::Tree(args.first().cloned()),
        "cat" | "open" => InputAction::Show(one(args, "cat <path>")?),
        "stat" | "info" => InputAction::Info(one(args, "stat <path>")?),
        "mkdir" => InputAction::MakeDir(one(args, "mkdir <path>")?),
        "touch" => InputAction::Touch(one(args, "touch <path>")?),
        "write" => {
            let (path, rest) = args
                .split_first()
                .ok_or_else(|| usage("write <path> <text...>"))?;
            InputAction::Write {
                path: path.clone(),
                content: unescape(&rest.join(" ")),
            }
        }
        "mv" => {
            let (source, target) = two(args, "mv <path> <folder>")?;
            InputAction::Move { source, target }
        }
        "rename" | "ren" => {
            let (path, name) = two(args, "rename <path> <new-name>")?;
            InputAction::Rename { path, name }
        }
        "rm" | "del" => InputAction::Remove(one(args, "rm <path>")?),
        "trash" => InputAction::Trash,
        "restore" => InputAction::Restore(index(args, "restore <index>")?),
        "purge" => InputAction::Purge(index(args, "purge <index>")?),
        "empty-trash" => InputAction::EmptyTrash,
        "copy" | "cp" => InputAction::Copy(one(args, "copy <path>")?),
        "cut" => InputAction::Cut(one(args, "cut <path>")?),
        "paste" => InputAction::Paste(args.first().cloned()),
        "clip" => match args.first().map(String::as_str) {
            None => InputAction::Clipboard,
            Some("clear") => InputAction::ClearClipboard,
            Some(_) => return Err(usage("clip [clear]")),
        },
        "find" => {
            let hidden = args.iter().any(|a| a == "-a");
            let content = args.iter().any(|a| a == "-c");
            let query: Vec<&str> = args
                .iter()
                .filter(|a| *a != "-a" && *a != "-c")
                .map(String::as_str)
                .collect();
            if query.is_empty() {
                return Err(usage("find [-a] [-c] <query>"));
            }
            InputAction::Find {
                query: query.join(" "),
                hidden,
                content,
            }
        }
        "fuzzy" | "ff" => {
            if args.is_empty() {
                return Err(usage("fuzzy <query>"));
            }
            InputAction::Fuzzy(args.join(" "))
        }
        "fav" => InputAction::Favorite(one(args, "fav <path>")?),
        "unfav" => InputAction::Unfavorite(one(args, "unfav <path>")?),
        "favs" => InputAction::Favorites,
        "hide" => InputAction::SetHidden(one(args, "hide <path>")?, true),
        "unhide" => InputAction::SetHidden(one(args, "unhide <path>")?, false),
        "lock" => InputAction::SetReadOnly(one(args, "lock <path>")?, true),
        "unlock" => InputAction::SetReadOnly(one(args, "unlock <path>")?, false),
        "sort" => {
            let usage_text = "sort <manual|name|size|date|type> [asc|desc]";
            let field = args
                .first()
                .ok_or_else(|| usage(usage_text))?
                .parse::<SortField>()?;
            let direction = match args.get(1).map(String::as_str) {
                None | Some("asc") => SortDirection::Ascending,
                Some("desc") => SortDirection::Descending,
                Some(_) => return Err(usage(usage_text)),
            };
            InputAction::Sort(field, direction)
        }
        "save" => InputAction::Save,
        "help" | "?" => InputAction::Help,
        "quit" | "exit" | "q" => InputAction::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(action)
}

/// Splits on whitespace, keeping double-quoted runs together.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Turns `\n` and `\t` escapes into real characters.
fn unescape(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}

fn usage(text: &str) -> String {
    format!("usage: {text}")
}

fn one(args: &[String], text: &str) -> Result<String, String> {
    match args {
        [only] => Ok(only.clone()),
        _ => Err(usage(text)),
    }
}

fn two(args: &[String], text: &str) -> Result<(String, String), String> {
    match args {
        [a, b] => Ok((a.clone(), b.clone())),
        _ => Err(usage(text)),
    }
}

fn index(args: &[String], text: &str) -> Result<usize, String> {
    one(args, text)?
        .parse()
        .map_err(|_| usage(text))
}

/// Command reference printed by `help`.
pub const HELP: &str = "\
Navigation:
  ls [-a] [path]          list a folder (-a shows hidden)
  cd <path>               change folder (.. and / work)
  pwd                     print current path
  tree [path]             draw a subtree
  cat <path>              print a file
  stat <path>             show node details
Editing:
  mkdir <path>            create a folder
  touch <path>            create an empty file
  write <path> <text...>  replace file content (\\n for newlines)
  mv <path> <folder>      move into a folder
  rename <path> <name>    rename in place
  hide|unhide <path>      toggle hidden
  lock|unlock <path>      toggle read-only
Trash:
  rm <path>               move to trash
  trash                   list trash entries
  restore <index>         restore an entry
  purge <index>           delete an entry for good
  empty-trash             purge everything
Clipboard:
  copy|cut <path>         hold a node
  paste [folder]          paste into a folder
  clip [clear]            show or clear the clipboard
Search & favorites:
  find [-a] [-c] <query>  substring search (-a hidden, -c content)
  fuzzy <query>           fuzzy name search
  fav|unfav <path>        add or remove a favorite
  favs                    list favorites
Other:
  sort <field> [asc|desc] listing order
  save                    write a snapshot now
  help                    this text
  quit                    leave";
