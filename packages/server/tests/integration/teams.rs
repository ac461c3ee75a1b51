use serde_json::json;

use crate::common::{TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn teacher_can_create_a_team() {
        let app = TestApp::spawn().await;
        let token = app.create_teacher("prof", 50001).await;

        let res = app
            .post_with_token(
                routes::TEAMS,
                &json!({"name": "Math", "code": "ABC123"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "Math");
        assert_eq!(res.body["code"], "ABC123");
        assert!(res.body["teacher_id"].is_number());
    }

    #[tokio::test]
    async fn student_cannot_create_a_team() {
        let app = TestApp::spawn().await;
        let token = app.create_student("stu", 60004001).await;

        let res = app
            .post_with_token(
                routes::TEAMS,
                &json!({"name": "Math", "code": "ABC123"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn duplicate_code_conflicts() {
        let app = TestApp::spawn().await;
        let token = app.create_teacher("prof", 50001).await;
        app.create_team(&token, "Math", "ABC123").await;

        let res = app
            .post_with_token(
                routes::TEAMS,
                &json!({"name": "Other", "code": "ABC123"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn missing_name_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.create_teacher("prof", 50001).await;

        let res = app
            .post_with_token(routes::TEAMS, &json!({"name": "", "code": "X1"}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod join {
    use super::*;

    #[tokio::test]
    async fn student_can_join_by_code() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        let student = app.create_student("stu", 60004001).await;

        let res = app
            .post_with_token(routes::TEAM_JOIN, &json!({"code": "ABC123"}), &student)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["id"], team_id);

        let mine = app.get_with_token(routes::TEAMS_MINE, &student).await;
        assert_eq!(mine.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_code_is_not_found() {
        let app = TestApp::spawn().await;
        let student = app.create_student("stu", 60004001).await;

        let res = app
            .post_with_token(routes::TEAM_JOIN, &json!({"code": "NOPE"}), &student)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn second_join_conflicts_instead_of_duplicating_membership() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        let student = app.create_student("stu", 60004001).await;

        app.join_team(&student, "ABC123").await;

        let res = app
            .post_with_token(routes::TEAM_JOIN, &json!({"code": "ABC123"}), &student)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        // Exactly one membership row behind the detail view.
        let detail = app.get_with_token(&routes::team(team_id), &student).await;
        assert_eq!(detail.body["members"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn teacher_cannot_join_by_code() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        app.create_team(&teacher, "Math", "ABC123").await;

        let res = app
            .post_with_token(routes::TEAM_JOIN, &json!({"code": "ABC123"}), &teacher)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod members {
    use super::*;

    #[tokio::test]
    async fn owner_can_add_a_student_by_sapid() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        app.create_student("stu", 60004001).await;

        let res = app
            .post_with_token(
                &routes::team_members(team_id),
                &json!({"sapid": 60004001}),
                &teacher,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["sapid"], 60004001);
        assert_eq!(res.body["username"], "stu");
    }

    #[tokio::test]
    async fn adding_an_unknown_sapid_is_not_found() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;

        let res = app
            .post_with_token(
                &routes::team_members(team_id),
                &json!({"sapid": 999999}),
                &teacher,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn adding_an_existing_member_conflicts() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        let student = app.create_student("stu", 60004001).await;
        app.join_team(&student, "ABC123").await;

        // Same constraint path as join-by-code, so the two enrollment
        // routes behave symmetrically.
        let res = app
            .post_with_token(
                &routes::team_members(team_id),
                &json!({"sapid": 60004001}),
                &teacher,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn non_owner_cannot_add_members() {
        let app = TestApp::spawn().await;
        let owner = app.create_teacher("prof", 50001).await;
        let other = app.create_teacher("other", 50002).await;
        let team_id = app.create_team(&owner, "Math", "ABC123").await;
        app.create_student("stu", 60004001).await;

        let res = app
            .post_with_token(
                &routes::team_members(team_id),
                &json!({"sapid": 60004001}),
                &other,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn owner_can_remove_a_member() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        let student = app.create_student("stu", 60004001).await;
        app.join_team(&student, "ABC123").await;

        let detail = app.get_with_token(&routes::team(team_id), &teacher).await;
        let student_id = detail.body["members"][0]["id"].as_i64().unwrap() as i32;

        let res = app
            .delete_with_token(&routes::team_member(team_id, student_id), &teacher)
            .await;
        assert_eq!(res.status, 204);

        let detail = app.get_with_token(&routes::team(team_id), &teacher).await;
        assert!(detail.body["members"].as_array().unwrap().is_empty());
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn detail_view_nests_teacher_members_and_assignments() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        let student = app.create_student("stu", 60004001).await;
        app.join_team(&student, "ABC123").await;
        app.create_assignment(&teacher, team_id, "PS1", "2099-01-01T00:00:00Z")
            .await;

        let res = app.get_with_token(&routes::team(team_id), &student).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["teacher"]["username"], "prof");
        assert_eq!(res.body["members"][0]["username"], "stu");
        assert_eq!(res.body["assignments"][0]["name"], "PS1");
    }

    #[tokio::test]
    async fn mine_lists_owned_teams_for_a_teacher() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        app.create_team(&teacher, "Math", "AAA111").await;
        app.create_team(&teacher, "Physics", "BBB222").await;

        let res = app.get_with_token(routes::TEAMS_MINE, &teacher).await;
        assert_eq!(res.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_is_owner_only() {
        let app = TestApp::spawn().await;
        let owner = app.create_teacher("prof", 50001).await;
        let other = app.create_teacher("other", 50002).await;
        let team_id = app.create_team(&owner, "Math", "ABC123").await;

        let res = app
            .patch_with_token(&routes::team(team_id), &json!({"name": "Maths"}), &other)
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .patch_with_token(&routes::team(team_id), &json!({"name": "Maths"}), &owner)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Maths");
    }

    #[tokio::test]
    async fn deleting_a_team_removes_memberships_and_assignments() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("prof", 50001).await;
        let team_id = app.create_team(&teacher, "Math", "ABC123").await;
        let student = app.create_student("stu", 60004001).await;
        app.join_team(&student, "ABC123").await;
        let assignment_id = app
            .create_assignment(&teacher, team_id, "PS1", "2099-01-01T00:00:00Z")
            .await;

        let res = app.delete_with_token(&routes::team(team_id), &teacher).await;
        assert_eq!(res.status, 204);

        assert_eq!(
            app.get_with_token(&routes::team(team_id), &teacher)
                .await
                .status,
            404
        );
        assert_eq!(
            app.get_with_token(&routes::assignment(assignment_id), &teacher)
                .await
                .status,
            404
        );
        let mine = app.get_with_token(routes::TEAMS_MINE, &student).await;
        assert!(mine.body.as_array().unwrap().is_empty());
    }
}
