use chrono::{DateTime, Local, NaiveDateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use super::{render_json, OutputFormat};
use crate::model::{Cat, ClassInfo, Course, CourseWithCount, CurrentUser, RosterEntry};
use crate::schedule::{self, CatUrgency, ScheduledCat, UpcomingClass, WeekSlot};
use crate::session::Session;

fn section(out: &mut String, title: &str) {
    out.push_str(&format!(":: {}\n", title.bold().white()));
}

fn finish(out: String, value: &impl Serialize, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => out,
        OutputFormat::Json => {
            let mut json = render_json(value);
            json.push('\n');
            json
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ClassesReport<'a> {
    pub upcoming: Option<UpcomingClass<'a>>,
    pub week: Vec<WeekSlot<'a>>,
}

impl<'a> ClassesReport<'a> {
    pub fn build(classes: &'a [ClassInfo], now: NaiveDateTime) -> Self {
        use chrono::Datelike;
        Self {
            upcoming: schedule::upcoming_class(classes, now),
            week: schedule::classes_this_week(classes, now.weekday()),
        }
    }
}

fn class_times(class: &ClassInfo) -> String {
    if class.end_time.is_empty() {
        class.start_time.clone()
    } else {
        format!("{} - {}", class.start_time, class.end_time)
    }
}

pub fn render_classes(report: &ClassesReport<'_>, format: OutputFormat) -> String {
    let mut out = String::new();
    section(&mut out, "Next Class");
    match &report.upcoming {
        Some(next) => {
            out.push_str(&format!("  {}\n", next.class.course_name.bold().green()));
            out.push_str(&format!(
                "  {}, {}\n",
                next.display_day(),
                class_times(next.class)
            ));
            out.push_str(&format!("  {}\n", next.class.venue));
            out.push_str(&format!("  Semester: {}\n", next.class.semester));
        }
        None => out.push_str(&format!("  {}\n", "No upcoming classes scheduled.".italic())),
    }
    out.push('\n');

    section(&mut out, "Classes This Week");
    if report.week.is_empty() {
        out.push_str(&format!("  {}\n", "No classes scheduled for your courses.".italic()));
    }
    for slot in &report.week {
        let line = format!(
            "{:<28} {:<10} {:<14} {}",
            slot.class.course_name,
            slot.class.day_of_week,
            class_times(slot.class),
            slot.class.venue
        );
        if slot.is_today {
            out.push_str(&format!("  {} {}\n", "*".bold().green(), line.bold()));
        } else {
            out.push_str(&format!("    {line}\n"));
        }
    }
    finish(out, report, format)
}

#[derive(Clone, Debug, Serialize)]
pub struct CatsReport<'a> {
    pub alerts: Vec<ScheduledCat<'a>>,
    pub upcoming: Vec<ScheduledCat<'a>>,
}

impl<'a> CatsReport<'a> {
    pub fn build(cats: &'a [Cat], now: DateTime<Utc>) -> Self {
        Self {
            alerts: schedule::cat_alerts(cats, now),
            upcoming: schedule::upcoming_cats(cats, now),
        }
    }
}

fn urgency_label(urgency: CatUrgency) -> String {
    match urgency {
        CatUrgency::Urgent => urgency.label().red().bold().to_string(),
        CatUrgency::Approaching => urgency.label().yellow().to_string(),
        CatUrgency::Upcoming => urgency.label().blue().to_string(),
    }
}

pub fn render_cats(report: &CatsReport<'_>, format: OutputFormat) -> String {
    let mut out = String::new();
    if !report.alerts.is_empty() {
        section(&mut out, "Upcoming CAT(s) !");
        for alert in &report.alerts {
            out.push_str(&format!("  - {}\n", alert.cat.course_name));
        }
        out.push('\n');
    }

    section(&mut out, "Upcoming CATs");
    if report.upcoming.is_empty() {
        out.push_str(&format!("  {}\n", "No upcoming CATs.".italic()));
    }
    for cat in &report.upcoming {
        let local = cat.at.with_timezone(&Local);
        out.push_str(&format!(
            "  {:<28} {}  (in {} days)  {}\n",
            cat.cat.course_name.to_uppercase().bold(),
            local.format("%Y-%m-%d %H:%M"),
            cat.days_until,
            urgency_label(cat.urgency)
        ));
    }
    finish(out, report, format)
}

/// A teacher's weekly schedule; `classes` should already be sorted.
pub fn render_schedule(classes: &[ClassInfo], format: OutputFormat) -> String {
    let mut out = String::new();
    section(&mut out, "Weekly Schedule");
    if classes.is_empty() {
        out.push_str(&format!("  {}\n", "No classes scheduled.".italic()));
    }
    for class in classes {
        out.push_str(&format!(
            "  {:<10} {:<14} {:<10} {:<28} {}\n",
            class.day_of_week.bold(),
            class_times(class),
            class.course_code,
            class.course_name,
            class.venue
        ));
    }
    finish(out, &classes, format)
}

pub fn render_courses(department: &str, courses: &[Course], format: OutputFormat) -> String {
    let mut out = String::new();
    section(&mut out, &format!("Courses in {department}"));
    if courses.is_empty() {
        out.push_str(&format!("  {}\n", "No courses found.".italic()));
    }
    for course in courses {
        out.push_str(&format!("  {:<10} {}\n", course.code.cyan(), course.name));
    }
    finish(out, &courses, format)
}

#[derive(Serialize)]
struct SessionReport<'a> {
    signed_in: bool,
    user: Option<&'a CurrentUser>,
}

pub fn render_session(session: &Session, format: OutputFormat) -> String {
    let mut out = String::new();
    match session.user() {
        Some(user) => out.push_str(&format!(
            ":: Signed in as {} ({}, {}) #{}\n",
            user.fullname.bold().white(),
            user.role,
            user.department,
            user.id
        )),
        None => out.push_str(":: Not signed in.\n"),
    }
    let report = SessionReport {
        signed_in: session.user().is_some(),
        user: session.user(),
    };
    finish(out, &report, format)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StudentGroup<'a> {
    pub student: &'a str,
    pub courses: Vec<&'a RosterEntry>,
}

/// Registrations grouped by student name, students in first-seen order.
pub fn group_roster(entries: &[RosterEntry]) -> Vec<StudentGroup<'_>> {
    let mut groups: Vec<StudentGroup<'_>> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|g| g.student == entry.student) {
            Some(group) => group.courses.push(entry),
            None => groups.push(StudentGroup {
                student: &entry.student,
                courses: vec![entry],
            }),
        }
    }
    groups
}

fn enrolled_section(out: &mut String, courses: &[Course]) {
    section(out, "My Enrolled Courses");
    if courses.is_empty() {
        out.push_str(&format!(
            "  {}\n",
            "You haven't enrolled in any courses yet.".italic()
        ));
    }
    for course in courses {
        out.push_str(&format!("  {:<10} {}\n", course.code.cyan(), course.name));
    }
}

fn department_courses_section(out: &mut String, courses: &[Course]) {
    section(out, "Department Courses");
    if courses.is_empty() {
        out.push_str(&format!("  {}\n", "No courses found.".italic()));
    }
    for course in courses {
        out.push_str(&format!("  {:<10} {}\n", course.code.cyan(), course.name));
    }
}

fn teacher_courses_section(out: &mut String, courses: &[CourseWithCount]) {
    section(out, "My Courses");
    if courses.is_empty() {
        out.push_str(&format!("  {}\n", "No courses assigned yet.".italic()));
    }
    for course in courses {
        out.push_str(&format!(
            "  {} ({}) - {} Student(s) Enrolled\n",
            course.name, course.code, course.student_count
        ));
    }
}

fn roster_section(out: &mut String, students: Option<&[StudentGroup<'_>]>) {
    let Some(students) = students else {
        section(out, "My Students");
        out.push_str(&format!("  {}\n", "Pass --slug to list your students.".italic()));
        return;
    };
    section(out, &format!("My Students ({})", students.len()));
    if students.is_empty() {
        out.push_str(&format!("  {}\n", "No registered students yet.".italic()));
    }
    for group in students {
        out.push_str(&format!("  {}\n", group.student.bold()));
        for entry in &group.courses {
            out.push_str(&format!(
                "    - {} ({}) - {}\n",
                entry.course,
                entry.code,
                entry.status.green()
            ));
        }
    }
}

/// A role's dashboard: everything the landing page of that role shows.
#[derive(Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard<'a> {
    Student {
        user: Option<&'a CurrentUser>,
        classes: ClassesReport<'a>,
        cats: CatsReport<'a>,
        enrolled: &'a [Course],
        department_courses: &'a [Course],
    },
    Teacher {
        user: Option<&'a CurrentUser>,
        courses: &'a [CourseWithCount],
        /// `None` when no tenant slug was given to look the roster up.
        students: Option<Vec<StudentGroup<'a>>>,
        schedule: &'a [ClassInfo],
        cats: CatsReport<'a>,
    },
}

pub fn render_dashboard(dashboard: &Dashboard<'_>, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return finish(String::new(), dashboard, format);
    }
    let mut body = String::new();
    let user = match dashboard {
        Dashboard::Student {
            user,
            classes,
            cats,
            enrolled,
            department_courses,
        } => {
            body.push_str(&render_classes(classes, OutputFormat::Text));
            body.push('\n');
            enrolled_section(&mut body, enrolled);
            body.push('\n');
            department_courses_section(&mut body, department_courses);
            body.push('\n');
            body.push_str(&render_cats(cats, OutputFormat::Text));
            user
        }
        Dashboard::Teacher {
            user,
            courses,
            students,
            schedule,
            cats,
        } => {
            teacher_courses_section(&mut body, courses);
            body.push('\n');
            roster_section(&mut body, students.as_deref());
            body.push('\n');
            body.push_str(&render_schedule(schedule, OutputFormat::Text));
            body.push('\n');
            body.push_str(&render_cats(cats, OutputFormat::Text));
            user
        }
    };
    let mut out = String::new();
    if let Some(user) = user {
        out.push_str(&format!(
            ":: Welcome, {} ({})\n\n",
            user.fullname.bold().white(),
            user.department
        ));
    }
    out.push_str(&body);
    out
}
