pub mod audit_log;
pub mod exam;
pub mod exam_attempt;
pub mod profile;
pub mod question;
pub mod student_answer;
pub mod subject;
