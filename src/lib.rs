pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    attempt_service::AttemptService, audit_service::AuditService, exam_service::ExamService,
    profile_service::ProfileService, question_service::QuestionService,
    role_service::RoleResolver, subject_service::SubjectService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub role_resolver: RoleResolver,
    pub profile_service: ProfileService,
    pub subject_service: SubjectService,
    pub exam_service: ExamService,
    pub question_service: QuestionService,
    pub attempt_service: AttemptService,
    pub audit_service: AuditService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let role_resolver = RoleResolver::new(pool.clone());
        let profile_service = ProfileService::new(pool.clone());
        let subject_service = SubjectService::new(pool.clone());
        let exam_service = ExamService::new(pool.clone());
        let question_service = QuestionService::new(pool.clone());
        let attempt_service = AttemptService::new(pool.clone());
        let audit_service = AuditService::new(pool.clone());

        Self {
            pool,
            role_resolver,
            profile_service,
            subject_service,
            exam_service,
            question_service,
            attempt_service,
            audit_service,
        }
    }
}
