use crate::model::{Student, Teacher};

/// Which roster a directory shows. Drives endpoint paths and every
/// user-facing noun.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryKind {
    Students,
    Teachers,
}

impl DirectoryKind {
    /// Path segment of `/{slug}/{resource}/detailed`.
    pub fn resource(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Teachers => "teachers",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Self::Students => "Students",
            Self::Teachers => "Teachers",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            Self::Students => "Student",
            Self::Teachers => "Teacher",
        }
    }

    pub fn loading_message(self) -> String {
        format!("Loading {} data...", self.singular().to_lowercase())
    }

    /// Teacher rosters are shown alphabetically; student rosters keep server order.
    pub fn sorts_by_name(self) -> bool {
        matches!(self, Self::Teachers)
    }
}

/// Capabilities the directory engine needs from a person record.
pub trait DirectoryRecord {
    const KIND: DirectoryKind;

    fn id(&self) -> i64;

    fn display_name(&self) -> &str;

    /// Department bucket; compared exactly, no case folding or trimming.
    fn group_key(&self) -> &str;

    /// Every field the search box looks at, in no particular order.
    fn searchable_text(&self) -> Vec<&str>;
}

impl DirectoryRecord for Student {
    const KIND: DirectoryKind = DirectoryKind::Students;

    fn id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.full_name
    }

    fn group_key(&self) -> &str {
        &self.department
    }

    fn searchable_text(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(1 + self.courses.len() * 2);
        out.push(self.full_name.as_str());
        for course in &self.courses {
            out.push(course.name.as_str());
            out.push(course.code.as_str());
        }
        out
    }
}

impl DirectoryRecord for Teacher {
    const KIND: DirectoryKind = DirectoryKind::Teachers;

    fn id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.full_name
    }

    fn group_key(&self) -> &str {
        &self.department
    }

    fn searchable_text(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(2 + self.courses.len() * 2);
        out.push(self.full_name.as_str());
        out.push(self.department.as_str());
        for course in &self.courses {
            out.push(course.name.as_str());
            out.push(course.code.as_str());
        }
        out
    }
}
