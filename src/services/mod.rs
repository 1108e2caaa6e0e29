pub mod attempt_service;
pub mod audit_service;
pub mod exam_service;
pub mod profile_service;
pub mod question_service;
pub mod role_service;
pub mod scoring_service;
pub mod subject_service;
