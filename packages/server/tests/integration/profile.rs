use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn profile_update_round_trips_with_untouched_fields() {
    let app = TestApp::spawn().await;
    let token = app.create_student("alice", 60004001).await;

    let res = app
        .patch_with_token(
            routes::STUDENT_ME,
            &json!({"description": "Now studying physics"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    // Updated field merged with previously-unmodified ones.
    let me = app.get_with_token(routes::STUDENT_ME, &token).await;
    assert_eq!(me.body["description"], "Now studying physics");
    assert_eq!(me.body["username"], "alice");
    assert_eq!(me.body["email"], "alice@example.edu");
    assert_eq!(me.body["sapid"], 60004001);
}

#[tokio::test]
async fn empty_update_changes_nothing() {
    let app = TestApp::spawn().await;
    let token = app.create_student("alice", 60004001).await;

    let res = app
        .patch_with_token(routes::STUDENT_ME, &json!({}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["username"], "alice");
}

#[tokio::test]
async fn updating_email_to_a_taken_one_conflicts() {
    let app = TestApp::spawn().await;
    app.create_student("alice", 60004001).await;
    let bob = app.create_student("bob", 60004002).await;

    let res = app
        .patch_with_token(
            routes::STUDENT_ME,
            &json!({"email": "alice@example.edu"}),
            &bob,
        )
        .await;

    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CONFLICT");
}

#[tokio::test]
async fn avatar_upload_sets_pfp_and_serves_bytes() {
    let app = TestApp::spawn().await;
    let token = app.create_student("alice", 60004001).await;

    // ASCII payload so the text-body comparison below is exact.
    let png = b"fake png bytes".to_vec();
    let res = app
        .upload_with_token(
            routes::STUDENT_AVATAR,
            "image",
            "me.png",
            "image/png",
            png.clone(),
            &[],
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let pfp = res.body["pfp"].as_str().expect("pfp should be set");
    let id = res.id();
    assert_eq!(pfp, routes::student_avatar(id));

    let img = app.get_without_token(&routes::student_avatar(id)).await;
    assert_eq!(img.status, 200);
    assert_eq!(img.text.as_bytes(), png.as_slice());
}

#[tokio::test]
async fn avatar_upload_rejects_non_image_types() {
    let app = TestApp::spawn().await;
    let token = app.create_student("alice", 60004001).await;

    let res = app
        .upload_with_token(
            routes::STUDENT_AVATAR,
            "image",
            "resume.pdf",
            "application/pdf",
            b"%PDF-1.4".to_vec(),
            &[],
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn search_matches_username_substring_and_exact_sapid() {
    let app = TestApp::spawn().await;
    let token = app.create_student("annabel", 60004001).await;
    app.create_student("bernard", 60004002).await;

    let res = app
        .get_with_token(&routes::students_search("NAB"), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let names: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["annabel"]);

    let res = app
        .get_with_token(&routes::students_search("60004002"), &token)
        .await;
    let names: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["bernard"]);
}

#[tokio::test]
async fn delete_me_removes_the_account() {
    let app = TestApp::spawn().await;
    let token = app.create_student("alice", 60004001).await;

    let res = app.delete_with_token(routes::STUDENT_ME, &token).await;
    assert_eq!(res.status, 204);

    // Gate now resolves nothing for the token's subject.
    let me = app.get_with_token(routes::STUDENT_ME, &token).await;
    assert_eq!(me.status, 404);
}
