use serde_json::json;

use crate::common::{TestApp, routes};

async fn setup_batch() -> (TestApp, String, i32) {
    let app = TestApp::spawn().await;
    let teacher = app.create_teacher("prof", 50001).await;
    let res = app
        .post_with_token(
            routes::QUESTION_GENERATIONS,
            &json!({"name": "Midterm draft"}),
            &teacher,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let id = res.id();
    (app, teacher, id)
}

#[tokio::test]
async fn teacher_can_create_a_batch() {
    let (_, _, id) = setup_batch().await;
    assert!(id > 0);
}

#[tokio::test]
async fn students_cannot_create_batches() {
    let app = TestApp::spawn().await;
    let student = app.create_student("stu", 60004001).await;

    let res = app
        .post_with_token(
            routes::QUESTION_GENERATIONS,
            &json!({"name": "Nope"}),
            &student,
        )
        .await;

    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn output_starts_null_and_stores_verbatim() {
    let (app, teacher, id) = setup_batch().await;

    let fetched = app
        .get_with_token(&routes::question_generation(id), &teacher)
        .await;
    assert!(fetched.body["output"].is_null());

    let paper = json!({
        "questions": [
            {"q": "Define a monoid.", "marks": 5},
            {"q": "State the pumping lemma.", "marks": 10},
        ]
    });
    let res = app
        .put_with_token(
            &routes::question_generation_output(id),
            &json!({"output": paper}),
            &teacher,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let fetched = app
        .get_with_token(&routes::question_generation(id), &teacher)
        .await;
    assert_eq!(fetched.body["output"], paper);
}

#[tokio::test]
async fn only_the_owner_can_store_output() {
    let (app, _, id) = setup_batch().await;
    let other = app.create_teacher("other", 50002).await;

    let res = app
        .put_with_token(
            &routes::question_generation_output(id),
            &json!({"output": {"stolen": true}}),
            &other,
        )
        .await;

    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn mine_lists_batches_with_documents() {
    let (app, teacher, id) = setup_batch().await;

    let upload = app
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "source.pdf",
            "application/pdf",
            b"%PDF-1.4 source material".to_vec(),
            &[("question_generation_id", id.to_string())],
            &teacher,
        )
        .await;
    assert_eq!(upload.status, 201, "{}", upload.text);

    let res = app
        .get_with_token(routes::QUESTION_GENERATIONS_MINE, &teacher)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body[0]["id"], id);
    assert_eq!(res.body[0]["documents"][0]["filename"], "source.pdf");
}

#[tokio::test]
async fn rename_keeps_output() {
    let (app, teacher, id) = setup_batch().await;
    app.put_with_token(
        &routes::question_generation_output(id),
        &json!({"output": {"questions": []}}),
        &teacher,
    )
    .await;

    let res = app
        .patch_with_token(
            &routes::question_generation(id),
            &json!({"name": "Midterm final"}),
            &teacher,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "Midterm final");
    assert!(!res.body["output"].is_null());
}

#[tokio::test]
async fn delete_removes_the_batch_and_its_documents() {
    let (app, teacher, id) = setup_batch().await;

    let upload = app
        .upload_with_token(
            routes::DOCUMENTS,
            "file",
            "source.pdf",
            "application/pdf",
            b"%PDF-1.4 source material".to_vec(),
            &[("question_generation_id", id.to_string())],
            &teacher,
        )
        .await;
    let doc_id = upload.body["documents"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = app
        .delete_with_token(&routes::question_generation(id), &teacher)
        .await;
    assert_eq!(res.status, 204);

    assert_eq!(
        app.get_with_token(&routes::question_generation(id), &teacher)
            .await
            .status,
        404
    );
    assert_eq!(
        app.get_with_token(&routes::document(&doc_id), &teacher)
            .await
            .status,
        404
    );
}
