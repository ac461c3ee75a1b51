use crate::common::{TestApp, routes};

const PDF_BYTES: &[u8] = b"%PDF-1.4 fake but good enough";

async fn setup_assignment() -> (TestApp, String, i32) {
    let app = TestApp::spawn().await;
    let teacher = app.create_teacher("prof", 50001).await;
    let team_id = app.create_team(&teacher, "Math", "ABC123").await;
    let assignment_id = app
        .create_assignment(&teacher, team_id, "PS1", "2099-01-01T00:00:00Z")
        .await;
    (app, teacher, assignment_id)
}

#[tokio::test]
async fn teacher_can_attach_a_brief_to_an_assignment() {
    let (app, teacher, assignment_id) = setup_assignment().await;

    let res = app
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "brief.pdf",
            "application/pdf",
            PDF_BYTES.to_vec(),
            &[("assignment_id", assignment_id.to_string())],
            &teacher,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    let doc = &res.body["documents"][0];
    assert_eq!(doc["filename"], "brief.pdf");
    assert_eq!(doc["assignment_id"], assignment_id);
    assert!(doc["submission_id"].is_null());

    // The document shows up on the assignment detail view.
    let detail = app
        .get_with_token(&routes::assignment(assignment_id), &teacher)
        .await;
    assert_eq!(detail.body["documents"][0]["filename"], "brief.pdf");
}

#[tokio::test]
async fn uploaded_bytes_round_trip_through_download() {
    let (app, teacher, assignment_id) = setup_assignment().await;

    let res = app
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "brief.pdf",
            "application/pdf",
            PDF_BYTES.to_vec(),
            &[("assignment_id", assignment_id.to_string())],
            &teacher,
        )
        .await;
    let id = res.body["documents"][0]["id"].as_str().unwrap().to_string();
    let url = res.body["documents"][0]["url"].as_str().unwrap().to_string();
    assert_eq!(url, routes::document_download(&id));

    let download = app.get_with_token(&url, &teacher).await;
    assert_eq!(download.status, 200);
    assert_eq!(download.text.as_bytes(), PDF_BYTES);
}

#[tokio::test]
async fn upload_without_a_parent_is_rejected() {
    let (app, teacher, _) = setup_assignment().await;

    let res = app
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "brief.pdf",
            "application/pdf",
            PDF_BYTES.to_vec(),
            &[],
            &teacher,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn upload_with_two_parents_is_rejected() {
    let (app, teacher, assignment_id) = setup_assignment().await;

    let res = app
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "brief.pdf",
            "application/pdf",
            PDF_BYTES.to_vec(),
            &[
                ("assignment_id", assignment_id.to_string()),
                ("submission_id", "1".to_string()),
            ],
            &teacher,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unsupported_content_types_are_rejected() {
    let (app, teacher, assignment_id) = setup_assignment().await;

    let res = app
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "virus.exe",
            "application/octet-stream",
            b"MZ...".to_vec(),
            &[("assignment_id", assignment_id.to_string())],
            &teacher,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn attaching_to_a_missing_parent_is_not_found() {
    let (app, teacher, _) = setup_assignment().await;

    let res = app
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "brief.pdf",
            "application/pdf",
            PDF_BYTES.to_vec(),
            &[("assignment_id", "424242".to_string())],
            &teacher,
        )
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn only_the_parents_owner_may_attach() {
    let (app, _, assignment_id) = setup_assignment().await;
    let other = app.create_teacher("other", 50002).await;

    let res = app
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "brief.pdf",
            "application/pdf",
            PDF_BYTES.to_vec(),
            &[("assignment_id", assignment_id.to_string())],
            &other,
        )
        .await;

    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn a_student_can_attach_files_to_their_own_submission() {
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
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "work.pdf",
            "application/pdf",
            PDF_BYTES.to_vec(),
            &[("submission_id", submission_id.to_string())],
            &student,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    // The attachment rides along with the submission.
    let sub = app
        .get_with_token(&routes::submission(submission_id), &student)
        .await;
    assert_eq!(sub.body["documents"][0]["filename"], "work.pdf");
}

#[tokio::test]
async fn delete_removes_the_document() {
    let (app, teacher, assignment_id) = setup_assignment().await;

    let res = app
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "brief.pdf",
            "application/pdf",
            PDF_BYTES.to_vec(),
            &[("assignment_id", assignment_id.to_string())],
            &teacher,
        )
        .await;
    let id = res.body["documents"][0]["id"].as_str().unwrap().to_string();

    let res = app.delete_with_token(&routes::document(&id), &teacher).await;
    assert_eq!(res.status, 204);

    let res = app.get_with_token(&routes::document(&id), &teacher).await;
    assert_eq!(res.status, 404);
}
