use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CourseRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TeacherCourse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub student_count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Student {
    pub id: i64,
    #[serde(rename = "fullname", default)]
    pub full_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub courses: Vec<CourseRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Teacher {
    pub id: i64,
    #[serde(rename = "fullname", default)]
    pub full_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub courses: Vec<TeacherCourse>,
}

/// One weekly class slot as returned by `/student/{id}/classes` and
/// `/teacher/{id}/schedule`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClassInfo {
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub day_of_week: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub semester: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Cat {
    pub id: i64,
    #[serde(default)]
    pub course_id: i64,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub teacher_id: i64,
    #[serde(default)]
    pub cat_datetime: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Course {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub department: String,
}

/// A course a teacher is assigned, from `/teacher/{id}/courses-with-count`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CourseWithCount {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub student_count: u32,
}

/// One (student, course) registration in a teacher's roster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RosterEntry {
    #[serde(default)]
    pub student: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
}

// The backend serializes an empty Go slice as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
