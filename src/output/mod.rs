pub mod dashboard;

use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;

use crate::directory::{
    DepartmentCard, Directory, DirectoryKind, DirectoryRecord, EmptyReason, Layout, LoadStatus,
    ViewMode,
};
use crate::model::{Student, Teacher};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Up to two letters taken from the first two words of a name.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|part| part.chars().next())
        .collect();
    if letters.is_empty() {
        "??".to_string()
    } else {
        letters.to_uppercase()
    }
}

/// How a record is drawn as a card in the text renderer.
pub trait CardView: DirectoryRecord {
    fn course_heading(&self) -> String;
    fn course_lines(&self) -> Vec<String>;
    fn no_courses(&self) -> &'static str;
}

const STUDENT_COURSE_PREVIEW: usize = 3;

impl CardView for Student {
    fn course_heading(&self) -> String {
        format!("Enrolled Courses ({})", self.courses.len())
    }

    fn course_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .courses
            .iter()
            .take(STUDENT_COURSE_PREVIEW)
            .map(|c| format!("{} ({})", c.name, c.code))
            .collect();
        if self.courses.len() > STUDENT_COURSE_PREVIEW {
            lines.push(format!("+{} more", self.courses.len() - STUDENT_COURSE_PREVIEW));
        }
        lines
    }

    fn no_courses(&self) -> &'static str {
        "No courses enrolled."
    }
}

impl CardView for Teacher {
    fn course_heading(&self) -> String {
        format!("Teaching Courses ({})", self.courses.len())
    }

    fn course_lines(&self) -> Vec<String> {
        self.courses
            .iter()
            .map(|c| format!("{} ({}) - {} Students", c.name, c.code, c.student_count))
            .collect()
    }

    fn no_courses(&self) -> &'static str {
        "No courses assigned."
    }
}

fn render_card<R: CardView>(out: &mut String, record: &R) {
    let name = record.display_name().to_uppercase();
    out.push_str(&format!(
        "  {} {}\n",
        format!("[{}]", initials(&name)).bold().cyan(),
        name.bold().white()
    ));
    out.push_str(&format!(
        "       {} {}\n",
        format!("#{}", record.id()).dimmed(),
        record.group_key()
    ));
    out.push_str(&format!("       {}\n", record.course_heading().bold()));
    let lines = record.course_lines();
    if lines.is_empty() {
        out.push_str(&format!("         {}\n", record.no_courses().italic()));
    }
    for line in lines {
        out.push_str(&format!("         - {line}\n"));
    }
    out.push('\n');
}

fn render_department_card(out: &mut String, card: &DepartmentCard, kind: DirectoryKind) {
    out.push_str(&format!(
        "  {} {:<32} {}\n",
        ">".bold().green(),
        card.name.bold().white(),
        format!("{} {}", card.count, kind.plural()).green()
    ));
}

fn navigation_hint(mode: &ViewMode) -> &'static str {
    match mode {
        ViewMode::Departments => "open <department> | all | search <term>",
        ViewMode::SingleDepartment(_) => "back | all | search <term>",
        ViewMode::AllFlat(_) => "back | filter [department] | search <term>",
    }
}

pub fn render_directory_text<R: CardView>(dir: &Directory<R>) -> String {
    let kind = dir.kind();
    let headline = dir.headline();
    let mut out = String::new();
    out.push_str(&format!(
        ":: {} :: {}\n",
        headline.title.bold().white(),
        headline.count_text.cyan()
    ));
    if !dir.view().search().raw().is_empty() {
        out.push_str(&format!(":: {:<10}: {}\n", "Search", dir.view().search().raw()));
    }
    if let ViewMode::AllFlat(_) = dir.view().mode() {
        let options = dir
            .index()
            .departments()
            .map(|d| format!("{d} ({})", dir.index().count(d)))
            .join(", ");
        let current = dir.view().selected_department().unwrap_or("All Departments");
        out.push_str(&format!(":: {:<10}: {}  [{}]\n", "Filter", current, options));
    }
    out.push('\n');

    match dir.layout() {
        Layout::Loading => {
            out.push_str(&format!("  {}\n", kind.loading_message().yellow()));
        }
        Layout::Empty(reason) => {
            out.push_str(&format!("  {}\n", reason.message(kind).italic()));
        }
        Layout::Departments(cards) => {
            for card in &cards {
                render_department_card(&mut out, card, kind);
            }
        }
        Layout::Records(records) => {
            for record in records {
                render_card(&mut out, record);
            }
        }
    }
    out.push('\n');
    out.push_str(&format!("{}\n", navigation_hint(dir.view().mode()).dimmed()));
    out
}

#[derive(Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
enum Content<'a, R> {
    Loading { message: String },
    Empty { reason: EmptyReason, message: String },
    Departments { departments: Vec<DepartmentCard> },
    Records { records: Vec<&'a R> },
}

#[derive(Serialize)]
pub struct DirectorySnapshot<'a, R> {
    kind: DirectoryKind,
    status: &'static str,
    view: &'a ViewMode,
    search: &'a str,
    title: String,
    count_text: String,
    total: usize,
    #[serde(flatten)]
    content: Content<'a, R>,
}

pub fn directory_snapshot<R: DirectoryRecord>(dir: &Directory<R>) -> DirectorySnapshot<'_, R> {
    let kind = dir.kind();
    let headline = dir.headline();
    let content = match dir.layout() {
        Layout::Loading => Content::Loading {
            message: kind.loading_message(),
        },
        Layout::Empty(reason) => Content::Empty {
            reason,
            message: reason.message(kind),
        },
        Layout::Departments(departments) => Content::Departments { departments },
        Layout::Records(records) => Content::Records { records },
    };
    DirectorySnapshot {
        kind,
        status: match dir.status() {
            LoadStatus::Loading => "loading",
            LoadStatus::Ready => "ready",
            LoadStatus::Failed(_) => "failed",
        },
        view: dir.view().mode(),
        search: dir.view().search().raw(),
        title: headline.title,
        count_text: headline.count_text,
        total: dir.index().total(),
        content,
    }
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn render_directory<R: CardView + Serialize>(dir: &Directory<R>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_directory_text(dir),
        OutputFormat::Json => {
            let mut out = render_json(&directory_snapshot(dir));
            out.push('\n');
            out
        }
    }
}
