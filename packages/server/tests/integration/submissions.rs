use serde_json::json;

use crate::common::{TestApp, routes};

mod deadline {
    use super::*;

    #[tokio::test]
    async fn submission_before_the_deadline_succeeds() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        let student = app.create_student("stu", 60004001).await;
        app.join_team(&student, "ABC123").await;
        let assignment_id = app
            .create_assignment(&teacher, team_id, "PS1", "2099-01-01T00:00:00Z")
            .await;

        let res = app
            .post_with_token(
                &routes::assignment_submissions(assignment_id),
                &json!({"description": "My answer"}),
                &student,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["description"], "My answer");
        assert!(res.body["marks"].is_null());
    }

    #[tokio::test]
    async fn submission_after_the_deadline_is_rejected() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        let student = app.create_student("stu", 60004001).await;
        app.join_team(&student, "ABC123").await;
        let assignment_id = app
            .create_assignment(&teacher, team_id, "Old", "2020-01-01T00:00:00Z")
            .await;

        let res = app
            .post_with_token(
                &routes::assignment_submissions(assignment_id),
                &json!({"description": "Too late"}),
                &student,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .contains("Deadline has passed"),
            "{}",
            res.text
        );
    }

    #[tokio::test]
    async fn non_members_cannot_submit() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        let outsider = app.create_student("out", 60004002).await;
        let assignment_id = app
            .create_assignment(&teacher, team_id, "PS1", "2099-01-01T00:00:00Z")
            .await;

        let res = app
            .post_with_token(
                &routes::assignment_submissions(assignment_id),
                &json!({"description": "sneaky"}),
                &outsider,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn teachers_cannot_submit() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        let assignment_id = app
            .create_assignment(&teacher, team_id, "PS1", "2099-01-01T00:00:00Z")
            .await;

        let res = app
            .post_with_token(
                &routes::assignment_submissions(assignment_id),
                &json!({"description": "nope"}),
                &teacher,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}

mod reads {
    use super::*;

    async fn setup() -> (TestApp, String, String, i32, i32) {
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
        (app, teacher, student, assignment_id, submission_id)
    }

    #[tokio::test]
    async fn students_see_their_own_submissions() {
        let (app, _, student, _, submission_id) = setup().await;

        let res = app.get_with_token(routes::SUBMISSIONS_MINE, &student).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body[0]["id"], submission_id);
    }

    #[tokio::test]
    async fn the_assignments_teacher_sees_the_grading_view() {
        let (app, teacher, _, assignment_id, _) = setup().await;

        let res = app
            .get_with_token(&routes::assignment_submissions(assignment_id), &teacher)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body[0]["student_username"], "stu");
        assert_eq!(res.body[0]["student_sapid"], 60004001);
    }

    #[tokio::test]
    async fn other_teachers_cannot_see_the_grading_view() {
        let (app, _, _, assignment_id, _) = setup().await;
        let other = app.create_teacher("other", 50002).await;

        let res = app
            .get_with_token(&routes::assignment_submissions(assignment_id), &other)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn by_student_and_assignment_returns_the_most_recent() {
        let (app, teacher, student, assignment_id, _) = setup().await;
        let second = app
            .create_submission(&student, assignment_id, "Revised answer")
            .await;

        let me = app.get_with_token(routes::STUDENT_ME, &student).await;
        let student_id = me.id();

        let res = app
            .get_with_token(
                &routes::assignment_student_submission(assignment_id, student_id),
                &teacher,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], second);
        assert_eq!(res.body["description"], "Revised answer");
    }

    #[tokio::test]
    async fn unrelated_students_cannot_read_a_submission() {
        let (app, _, _, _, submission_id) = setup().await;
        let other = app.create_student("other", 60004002).await;

        let res = app
            .get_with_token(&routes::submission(submission_id), &other)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod grading {
    use super::*;

    async fn setup() -> (TestApp, String, String, i32) {
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
        (app, teacher, student, submission_id)
    }

    #[tokio::test]
    async fn the_teacher_can_set_marks_and_remarks() {
        let (app, teacher, _, submission_id) = setup().await;

        let res = app
            .patch_with_token(
                &routes::submission(submission_id),
                &json!({"marks": 85, "remarks": "Good work"}),
                &teacher,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["marks"], 85);
        assert_eq!(res.body["remarks"], "Good work");
    }

    #[tokio::test]
    async fn the_student_cannot_set_marks() {
        let (app, _, student, submission_id) = setup().await;

        let res = app
            .patch_with_token(
                &routes::submission(submission_id),
                &json!({"marks": 100}),
                &student,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn the_student_can_revise_the_description() {
        let (app, _, student, submission_id) = setup().await;

        let res = app
            .patch_with_token(
                &routes::submission(submission_id),
                &json!({"description": "Revised"}),
                &student,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["description"], "Revised");
    }

    #[tokio::test]
    async fn negative_marks_are_rejected() {
        let (app, teacher, _, submission_id) = setup().await;

        let res = app
            .patch_with_token(
                &routes::submission(submission_id),
                &json!({"marks": -5}),
                &teacher,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn the_owner_can_delete_a_submission() {
        let (app, _, student, submission_id) = setup().await;

        let res = app
            .delete_with_token(&routes::submission(submission_id), &student)
            .await;
        assert_eq!(res.status, 204);

        let res = app
            .get_with_token(&routes::submission(submission_id), &student)
            .await;
        assert_eq!(res.status, 404);
    }
}
