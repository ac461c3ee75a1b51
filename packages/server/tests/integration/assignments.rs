use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn teacher_can_create_an_assignment_for_an_owned_team() {
    let app = TestApp::spawn().await;
    let teacher = app.create_teacher("prof", 50001).await;
    let team_id = app.create_team(&teacher, "Math", "ABC123").await;

    let res = app
        .post_with_token(
            routes::ASSIGNMENTS,
            &json!({
                "name": "Problem Set 1",
                "description": "Chapters 1-3",
                "deadline": "2099-01-01T00:00:00Z",
                "team_id": team_id,
            }),
            &teacher,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["name"], "Problem Set 1");
    assert_eq!(res.body["team_id"], team_id);
}

#[tokio::test]
async fn creating_for_another_teachers_team_is_forbidden() {
    let app = TestApp::spawn().await;
    let owner = app.create_teacher("prof", 50001).await;
    let other = app.create_teacher("other", 50002).await;
    let team_id = app.create_team(&owner, "Math", "ABC123").await;

    let res = app
        .post_with_token(
            routes::ASSIGNMENTS,
            &json!({
                "name": "PS1",
                "deadline": "2099-01-01T00:00:00Z",
                "team_id": team_id,
            }),
            &other,
        )
        .await;

    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn students_cannot_create_assignments() {
    let app = TestApp::spawn().await;
    let teacher = app.create_teacher("prof", 50001).await;
    let team_id = app.create_team(&teacher, "Math", "ABC123").await;
    let student = app.create_student("stu", 60004001).await;

    let res = app
        .post_with_token(
            routes::ASSIGNMENTS,
            &json!({
                "name": "PS1",
                "deadline": "2099-01-01T00:00:00Z",
                "team_id": team_id,
            }),
            &student,
        )
        .await;

    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn unknown_team_is_not_found() {
    let app = TestApp::spawn().await;
    let teacher = app.create_teacher("prof", 50001).await;

    let res = app
        .post_with_token(
            routes::ASSIGNMENTS,
            &json!({
                "name": "PS1",
                "deadline": "2099-01-01T00:00:00Z",
                "team_id": 4242,
            }),
            &teacher,
        )
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn team_listing_is_ordered_by_deadline() {
    let app = TestApp::spawn().await;
    let teacher = app.create_teacher("prof", 50001).await;
    let team_id = app.create_team(&teacher, "Math", "ABC123").await;
    app.create_assignment(&teacher, team_id, "Later", "2099-06-01T00:00:00Z")
        .await;
    app.create_assignment(&teacher, team_id, "Sooner", "2099-01-01T00:00:00Z")
        .await;

    let res = app
        .get_with_token(&routes::team_assignments(team_id), &teacher)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    let names: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Sooner", "Later"]);
}

#[tokio::test]
async fn mine_lists_only_the_callers_assignments() {
    let app = TestApp::spawn().await;
    let prof = app.create_teacher("prof", 50001).await;
    let other = app.create_teacher("other", 50002).await;
    let team_a = app.create_team(&prof, "Math", "AAA111").await;
    let team_b = app.create_team(&other, "Bio", "BBB222").await;
    app.create_assignment(&prof, team_a, "PS1", "2099-01-01T00:00:00Z")
        .await;
    app.create_assignment(&other, team_b, "Lab", "2099-01-01T00:00:00Z")
        .await;

    let res = app.get_with_token(routes::ASSIGNMENTS_MINE, &prof).await;
    let names: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["PS1"]);
}

#[tokio::test]
async fn update_round_trips_and_is_owner_only() {
    let app = TestApp::spawn().await;
    let teacher = app.create_teacher("prof", 50001).await;
    let other = app.create_teacher("other", 50002).await;
    let team_id = app.create_team(&teacher, "Math", "ABC123").await;
    let assignment_id = app
        .create_assignment(&teacher, team_id, "PS1", "2099-01-01T00:00:00Z")
        .await;

    let res = app
        .patch_with_token(
            &routes::assignment(assignment_id),
            &json!({"deadline": "2099-02-01T00:00:00Z"}),
            &other,
        )
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .patch_with_token(
            &routes::assignment(assignment_id),
            &json!({"deadline": "2099-02-01T00:00:00Z"}),
            &teacher,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let fetched = app
        .get_with_token(&routes::assignment(assignment_id), &teacher)
        .await;
    assert_eq!(fetched.body["deadline"], "2099-02-01T00:00:00Z");
    assert_eq!(fetched.body["name"], "PS1");
}

#[tokio::test]
async fn delete_cascades_submissions() {
    let app = TestApp::spawn().await;
    let teacher = app.create_teacher("prof", 50001).await;
    let team_id = app.create_team(&teacher, "Math", "ABC123").await;
    let student = app.create_student("stu", 60004001).await;
    app.join_team(&student, "ABC123").await;
    let assignment_id = app
        .create_assignment(&teacher, team_id, "PS1", "2099-01-01T00:00:00Z")
        .await;
    let submission_id = app
        .create_submission(&student, assignment_id, "My answer")
        .await;

    let res = app
        .delete_with_token(&routes::assignment(assignment_id), &teacher)
        .await;
    assert_eq!(res.status, 204);

    let res = app
        .get_with_token(&routes::submission(submission_id), &student)
        .await;
    assert_eq!(res.status, 404);
}
