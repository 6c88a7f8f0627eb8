use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::cancel::{CancellationSource, RequestSlot};
use crate::client::{ApiClient, ClientError, Fetched};
use crate::directory::{
    normalize, Action, Directory, DirectoryKind, DirectoryRecord, EmptyReason, Layout, SearchTerm,
    ShapeError, ViewMode, ViewState,
};
use crate::model::{Student, Teacher};
use crate::session::{fetch_session, Session};

fn sample_students() -> Vec<Student> {
    serde_json::from_value(json!([
        {"id": 1, "fullname": "Ann Lee", "department": "Math",
         "courses": [{"name": "Algebra", "code": "MA101"}]},
        {"id": 2, "fullname": "Bo Chen", "department": "Physics", "courses": []}
    ]))
    .unwrap()
}

fn loaded(records: Vec<Student>) -> Directory<Student> {
    let mut dir = Directory::new();
    dir.load(records);
    dir
}

fn names<R: DirectoryRecord>(records: &[&R]) -> Vec<String> {
    records.iter().map(|r| r.display_name().to_string()).collect()
}

/// Answers one request per canned response and reports each request line's path.
async fn stub_server(responses: Vec<(u16, String)>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (path_tx, path_rx) = mpsc::channel(16);
    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
            let head = String::from_utf8_lossy(&buf);
            let path = head
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or_default()
                .to_string();
            let _ = path_tx.send(path).await;
            let response = format!(
                "HTTP/1.1 {status} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    (format!("http://{addr}"), path_rx)
}

// Example scenarios

#[test]
fn departments_mode_groups_by_department() {
    let dir = loaded(sample_students());
    assert_eq!(dir.index().count("Math"), 1);
    assert_eq!(dir.index().count("Physics"), 1);
    match dir.layout() {
        Layout::Departments(cards) => {
            assert_eq!(cards.len(), 2);
            assert!(cards.iter().all(|c| c.count == 1));
        }
        other => panic!("expected department cards, got {other:?}"),
    }
}

#[test]
fn opening_a_department_shows_its_roster() {
    let mut dir = loaded(sample_students());
    dir.apply(Action::OpenDepartment("Math".to_string())).unwrap();
    assert_eq!(
        dir.view().mode(),
        &ViewMode::SingleDepartment("Math".to_string())
    );
    assert_eq!(names(&dir.filtered()), vec!["Ann Lee"]);
    let headline = dir.headline();
    assert_eq!(headline.title, "Students in Math");
    assert_eq!(headline.count_text, "Showing 1 Students");
}

#[test]
fn search_from_departments_bypasses_cards() {
    let mut dir = loaded(sample_students());
    dir.apply(Action::Search("alg".to_string())).unwrap();
    match dir.layout() {
        Layout::Records(records) => assert_eq!(names(&records), vec!["Ann Lee"]),
        other => panic!("expected records, got {other:?}"),
    }
}

#[test]
fn unmatched_search_from_departments_reports_no_matches() {
    let mut dir = loaded(sample_students());
    assert_eq!(*dir.view().mode(), ViewMode::Departments);
    dir.apply(Action::Search("zzz".to_string())).unwrap();
    assert_eq!(dir.layout(), Layout::Empty(EmptyReason::NoSearchMatches));
    assert_eq!(
        EmptyReason::NoSearchMatches.message(Student::KIND),
        "No students found matching your search."
    );

    let teachers: Vec<Teacher> = serde_json::from_value(json!([
        {"id": 1, "fullname": "Ann Lee", "department": "Math", "courses": []}
    ]))
    .unwrap();
    let mut dir: Directory<Teacher> = Directory::new();
    dir.load(teachers);
    dir.apply(Action::Search("zzz".to_string())).unwrap();
    assert_eq!(dir.layout(), Layout::Empty(EmptyReason::NoSearchMatches));
    assert_eq!(
        EmptyReason::NoSearchMatches.message(DirectoryKind::Teachers),
        "No teachers found matching your search."
    );
    assert_eq!(
        EmptyReason::Ungrouped.message(DirectoryKind::Students),
        "Students found, but no departments listed."
    );
}

#[tokio::test]
async fn server_error_shows_the_no_data_empty_state() {
    let (base, _paths) = stub_server(vec![(500, "{\"error\":\"boom\"}".to_string())]).await;
    let client = ApiClient::new(&base, 5, None).unwrap();
    let mut slot = RequestSlot::default();
    let token = slot.begin();
    let mut dir: Directory<Student> = Directory::new();
    assert!(dir.is_loading());

    let fetched = client.students_detailed("acme", &token).await;
    assert!(matches!(
        fetched,
        Fetched::Failed(ClientError::Status { status: 500, .. })
    ));
    assert!(dir.commit(&token, fetched));

    assert!(!dir.is_loading());
    assert!(dir.records().is_empty());
    match dir.layout() {
        Layout::Empty(reason) => {
            assert_eq!(reason, EmptyReason::NoData);
            assert_eq!(
                reason.message(dir.kind()),
                "No students or departments found."
            );
        }
        other => panic!("expected empty state, got {other:?}"),
    }
}

#[test]
fn flat_view_with_department_filter() {
    let mut dir = loaded(sample_students());
    dir.apply(Action::ShowAll).unwrap();
    dir.apply(Action::SetFilter(Some("Math".to_string()))).unwrap();
    dir.apply(Action::Search(String::new())).unwrap();
    assert_eq!(names(&dir.filtered()), vec!["Ann Lee"]);
    assert_eq!(
        dir.headline().count_text,
        "Showing 1 Students in Math (Total: 2)"
    );
}

#[test]
fn course_code_search_in_flat_view() {
    let mut dir = loaded(sample_students());
    dir.apply(Action::ShowAll).unwrap();
    dir.apply(Action::Search("MA101".to_string())).unwrap();
    assert_eq!(names(&dir.filtered()), vec!["Ann Lee"]);
}

// Properties

fn varied_students() -> Vec<Student> {
    let departments = ["Math", "Physics", "math", "Biology", "Math "];
    (0..25)
        .map(|i| Student {
            id: i,
            full_name: format!("Student {i} {}", ["Alba", "Alder", "Bryn"][i as usize % 3]),
            department: departments[i as usize % departments.len()].to_string(),
            courses: Vec::new(),
        })
        .collect()
}

#[test]
fn grouping_accounts_for_every_record() {
    let records = varied_students();
    let dir = loaded(records.clone());
    let sum: usize = dir.index().departments().map(|d| dir.index().count(d)).sum();
    assert_eq!(sum, records.len());
    assert!(records.iter().all(|r| dir.index().contains(&r.department)));
    // casing and whitespace are kept apart
    assert_eq!(dir.index().len(), 5);
}

#[test]
fn longer_search_terms_only_narrow() {
    let records = varied_students();
    let terms = ["a", "al", "ald", "alder"];
    let results: Vec<Vec<i64>> = terms
        .iter()
        .map(|t| {
            let term = SearchTerm::new(*t);
            records
                .iter()
                .filter(|r| term.matches(*r))
                .map(|r| r.id)
                .collect()
        })
        .collect();
    for pair in results.windows(2) {
        assert!(pair[1].iter().all(|id| pair[0].contains(id)));
    }
    assert!(!results[3].is_empty());
}

#[test]
fn normalizing_a_list_twice_changes_nothing() {
    let body = json!([{"id": 1}, {"id": 2}, "odd"]);
    let once = normalize(body);
    let twice = normalize(serde_json::Value::Array(once.items.clone()));
    assert_eq!(once.items, twice.items);
    assert!(twice.failure.is_none());
}

#[test]
fn departments_mode_never_has_a_selection() {
    let mut view = ViewState::new();
    let steps = vec![
        Action::OpenDepartment("Math".to_string()),
        Action::Back,
        Action::ShowAll,
        Action::SetFilter(Some("Physics".to_string())),
        Action::Search("bo".to_string()),
        Action::Back,
        Action::Search("ann".to_string()),
        Action::OpenDepartment("Physics".to_string()),
        Action::ShowAll,
        Action::Back,
    ];
    for action in steps {
        let _ = view.apply(action);
        if view.mode() == &ViewMode::Departments {
            assert!(view.selected_department().is_none());
        }
    }
}

#[test]
fn empty_search_returns_scope_unchanged() {
    let records = varied_students();
    let mut view = ViewState::new();
    view.apply(Action::ShowAll).unwrap();
    view.apply(Action::SetFilter(Some("Math".to_string()))).unwrap();
    view.apply(Action::Search("   ".to_string())).unwrap();
    let scope: Vec<i64> = view.scope(&records).iter().map(|r| r.id).collect();
    let filtered: Vec<i64> = view.filtered(&records).iter().map(|r| r.id).collect();
    assert_eq!(scope, filtered);
    assert!(!scope.is_empty());
}

// Client against a local stub

#[tokio::test]
async fn fetch_drops_undecodable_elements_and_hits_tenant_path() {
    let body = json!([
        {"id": 1, "fullname": "Ann Lee", "department": "Math", "courses": null},
        "garbage",
        {"id": 3, "fullname": "Cy Doe", "department": "Math"}
    ])
    .to_string();
    let (base, mut paths) = stub_server(vec![(200, body)]).await;
    let client = ApiClient::new(&base, 5, None).unwrap();
    let token = CancellationSource::new().token();

    let fetched = client.students_detailed("acme", &token).await;
    assert_eq!(paths.recv().await.unwrap(), "/acme/students/detailed");
    let records = fetched.into_records();
    assert_eq!(records.len(), 2);
    assert!(records[0].courses.is_empty());
}

#[tokio::test]
async fn non_array_bodies_read_as_no_records() {
    let (base, _paths) = stub_server(vec![
        (200, "null".to_string()),
        (200, "{\"error\":\"nope\"}".to_string()),
    ])
    .await;
    let client = ApiClient::new(&base, 5, None).unwrap();
    let token = CancellationSource::new().token();
    for _ in 0..2 {
        let fetched = client.teachers_detailed("acme", &token).await;
        assert!(matches!(
            fetched,
            Fetched::Failed(ClientError::Shape {
                source: ShapeError::NotAnArray { .. },
                ..
            })
        ));
    }
}

#[tokio::test]
async fn cancelled_fetch_never_reaches_the_directory() {
    let body = json!([{"id": 1, "fullname": "Ann Lee", "department": "Math"}]).to_string();
    let (base, _paths) = stub_server(vec![(200, body)]).await;
    let client = ApiClient::new(&base, 5, None).unwrap();
    let source = CancellationSource::new();
    let token = source.token();
    source.cancel();

    let fetched = client.students_detailed("acme", &token).await;
    assert!(matches!(fetched, Fetched::Cancelled));
    let mut dir: Directory<Student> = Directory::new();
    assert!(!dir.commit(&token, fetched));
    assert!(dir.is_loading());
}

#[test]
fn superseded_load_is_ignored() {
    let mut slot = RequestSlot::default();
    let first = slot.begin();
    let second = slot.begin();
    let mut dir: Directory<Student> = Directory::new();

    assert!(dir.commit(&second, Fetched::Loaded(sample_students())));
    assert!(!dir.commit(&first, Fetched::Loaded(Vec::new())));
    assert_eq!(dir.records().len(), 2);
    assert_eq!(slot.issued(), 2);
}

#[tokio::test]
async fn teacher_roster_is_ordered_by_name() {
    let body = json!([
        {"id": 1, "fullname": "Zed Park", "department": "Art", "courses": []},
        {"id": 2, "fullname": "ann Ito", "department": "Art", "courses": []},
        {"id": 3, "fullname": "Bo Chen", "department": "Math",
         "courses": [{"name": "Algebra", "code": "MA101", "student_count": 12}]}
    ])
    .to_string();
    let (base, mut paths) = stub_server(vec![(200, body)]).await;
    let client = ApiClient::new(&base, 5, None).unwrap();
    let token = CancellationSource::new().token();

    let mut dir: Directory<Teacher> = Directory::new();
    let fetched = client.teachers_detailed("acme", &token).await;
    assert_eq!(paths.recv().await.unwrap(), "/acme/teachers/detailed");
    dir.commit(&token, fetched);
    let order: Vec<_> = dir.records().iter().map(|t| t.full_name.as_str()).collect();
    assert_eq!(order, vec!["ann Ito", "Bo Chen", "Zed Park"]);
    assert_eq!(dir.records()[1].courses[0].student_count, 12);
}

#[tokio::test]
async fn session_is_anonymous_on_unauthorized() {
    let user = json!({"id": 9, "fullname": "Ann Lee", "role": "student", "department": "Math"});
    let (base, mut paths) = stub_server(vec![
        (401, "{\"error\":\"unauthorized\"}".to_string()),
        (200, user.to_string()),
    ])
    .await;
    let client = ApiClient::new(&base, 5, Some("session=abc")).unwrap();

    assert_eq!(fetch_session(&client).await, Session::Anonymous);
    assert_eq!(paths.recv().await.unwrap(), "/me");

    let session = fetch_session(&client).await;
    assert_eq!(session.user().map(|u| u.id), Some(9));
}

#[tokio::test]
async fn unreachable_server_reads_as_no_session() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = ApiClient::new(&format!("http://{addr}"), 2, None).unwrap();
    assert_eq!(fetch_session(&client).await, Session::Anonymous);
}

#[tokio::test]
async fn student_dashboard_panels_hit_their_paths() {
    let enrolled = json!([{"id": 4, "name": "Algebra", "code": "MA101"}]).to_string();
    let department = json!([
        {"id": 4, "name": "Algebra", "code": "MA101"},
        {"id": 5, "name": "Calculus", "code": "MA201"}
    ])
    .to_string();
    let (base, mut paths) = stub_server(vec![(200, enrolled), (200, department)]).await;
    let client = ApiClient::new(&base, 5, None).unwrap();
    assert_eq!(client.base_url().as_str(), format!("{base}/"));
    let token = CancellationSource::new().token();

    let courses = client.student_courses(7, &token).await.into_records();
    assert_eq!(paths.recv().await.unwrap(), "/student/7/courses");
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].code, "MA101");

    let courses = client.student_department_courses(7, &token).await.into_records();
    assert_eq!(paths.recv().await.unwrap(), "/student/7/department-courses");
    assert_eq!(courses.len(), 2);
}

#[tokio::test]
async fn teacher_dashboard_panels_hit_their_paths() {
    let courses = json!([
        {"id": 3, "name": "Optics", "code": "PH210", "student_count": 2},
        {"id": 4, "name": "Waves", "code": "PH220", "student_count": null}
    ])
    .to_string();
    let roster = json!([
        {"student": "Ann Lee", "course": "Optics", "code": "PH210", "status": "active"},
        {"student": "Bo Chen", "course": "Optics", "code": "PH210", "status": "active"},
        {"student": "Ann Lee", "course": "Waves", "code": "PH220", "status": "pending"}
    ])
    .to_string();
    let (base, mut paths) = stub_server(vec![(200, courses), (200, roster)]).await;
    let client = ApiClient::new(&base, 5, None).unwrap();
    let token = CancellationSource::new().token();

    let courses = client.teacher_courses(7, &token).await.into_records();
    assert_eq!(paths.recv().await.unwrap(), "/teacher/7/courses-with-count");
    let counts: Vec<u32> = courses.iter().map(|c| c.student_count).collect();
    assert_eq!(counts, vec![2, 0]);

    let roster = client.teacher_students("acme", 7, &token).await.into_records();
    assert_eq!(paths.recv().await.unwrap(), "/acme/teacher/7/students");
    let groups = crate::output::dashboard::group_roster(&roster);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].student, "Ann Lee");
    assert_eq!(groups[0].courses.len(), 2);
}
