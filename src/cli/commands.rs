use crate::cli::args::DirectoryArgs;
use crate::directory::Action;

/// One line typed at the interactive directory prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Navigate(Action),
    Reload,
    Help,
    Quit,
}

pub const REPL_HELP: &str = "commands: open <department> | all | back | filter [department] | search [term] | reload | help | quit";

fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    }
}

/// `Ok(None)` for a blank line.
pub fn parse_repl_line(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = split_command(line);
    let command = match word.to_lowercase().as_str() {
        "open" | "o" => {
            if rest.is_empty() {
                return Err("open needs a department name".to_string());
            }
            ReplCommand::Navigate(Action::OpenDepartment(rest.to_string()))
        }
        "all" | "a" => ReplCommand::Navigate(Action::ShowAll),
        "back" | "b" => ReplCommand::Navigate(Action::Back),
        "filter" | "f" => {
            let department = (!rest.is_empty()).then(|| rest.to_string());
            ReplCommand::Navigate(Action::SetFilter(department))
        }
        "search" | "s" | "/" => ReplCommand::Navigate(Action::Search(rest.to_string())),
        "reload" | "r" => ReplCommand::Reload,
        "help" | "h" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => return Err(format!("unknown command '{other}' ({REPL_HELP})")),
    };
    Ok(Some(command))
}

/// The actions that reproduce the view requested on the command line.
pub fn initial_actions(args: &DirectoryArgs) -> Vec<Action> {
    let mut actions = Vec::new();
    if let Some(department) = args.department.as_ref() {
        actions.push(Action::OpenDepartment(department.clone()));
    } else if args.all {
        actions.push(Action::ShowAll);
        if let Some(filter) = args.filter.as_ref() {
            actions.push(Action::SetFilter(Some(filter.clone())));
        }
    }
    if let Some(term) = args.search.as_ref() {
        actions.push(Action::Search(term.clone()));
    }
    actions
}
