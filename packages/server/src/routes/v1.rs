use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{
    assignment, document, question_generation, student, submission, teacher, team,
};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/students", student_routes())
        .nest("/teachers", teacher_routes())
        .nest("/teams", team_routes())
        .nest("/assignments", assignment_routes())
        .nest("/submissions", submission_routes())
        .nest("/documents", document_routes())
        .nest("/question-generations", question_generation_routes())
}

fn student_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(student::register))
        .routes(routes!(student::login))
        .routes(routes!(student::me, student::update_me, student::delete_me))
        .routes(routes!(student::upload_avatar))
        .routes(routes!(student::list_students))
        .routes(routes!(student::search_students))
        .routes(routes!(student::get_student))
        .routes(routes!(student::get_avatar))
}

fn teacher_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(teacher::register))
        .routes(routes!(teacher::login))
        .routes(routes!(teacher::me, teacher::update_me, teacher::delete_me))
        .routes(routes!(teacher::upload_avatar))
        .routes(routes!(teacher::list_teachers))
        .routes(routes!(teacher::search_teachers))
        .routes(routes!(teacher::get_teacher))
        .routes(routes!(teacher::get_avatar))
}

fn team_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(team::list_teams, team::create_team))
        .routes(routes!(team::list_my_teams))
        .routes(routes!(team::join_team))
        .routes(routes!(team::get_team, team::update_team, team::delete_team))
        .routes(routes!(team::add_member))
        .routes(routes!(team::remove_member))
        .routes(routes!(assignment::list_team_assignments))
}

fn assignment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            assignment::list_assignments,
            assignment::create_assignment
        ))
        .routes(routes!(assignment::list_my_assignments))
        .routes(routes!(
            assignment::get_assignment,
            assignment::update_assignment,
            assignment::delete_assignment
        ))
        .routes(routes!(
            submission::create_submission,
            submission::list_assignment_submissions
        ))
        .routes(routes!(submission::get_student_submission))
}

fn submission_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(submission::list_my_submissions))
        .routes(routes!(
            submission::get_submission,
            submission::update_submission,
            submission::delete_submission
        ))
}

fn document_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(document::upload_documents))
        .routes(routes!(document::get_document, document::delete_document))
        .routes(routes!(document::download_document))
}

fn question_generation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(question_generation::create_question_generation))
        .routes(routes!(question_generation::list_my_question_generations))
        .routes(routes!(
            question_generation::get_question_generation,
            question_generation::update_question_generation,
            question_generation::delete_question_generation
        ))
        .routes(routes!(question_generation::store_output))
}
