//! Per-table authorization predicates.
//!
//! Every storage-touching service entry point builds the ownership facts for
//! the row in question and asks the matching predicate before doing anything
//! else. The predicates are pure and synchronous; role resolution happens
//! once per request in the auth middleware (see
//! [`crate::services::role_service`]) and never inside a predicate, so no
//! check can recurse into the table it protects.

use uuid::Uuid;

use crate::models::profile::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

/// The authenticated principal with its storage-resolved role.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Profiles: owners read and update their own row, admins read and update
/// any row. Creation and deletion happen outside this API (the identity
/// provider owns the lifecycle), so both are denied across the board.
pub fn can_access_profile(actor: &Actor, owner_id: Uuid, action: Action) -> bool {
    match action {
        Action::Read | Action::Update => actor.is_admin() || actor.id == owner_id,
        Action::Create | Action::Delete => false,
    }
}

/// Subjects, exams and questions share one rule: admins get full CRUD,
/// students get read access to active rows only.
pub fn can_access_catalog(actor: &Actor, row_is_active: bool, action: Action) -> bool {
    if actor.is_admin() {
        return true;
    }
    action == Action::Read && row_is_active
}

/// Exam attempts: admins read everything (grading and audit views); a
/// student creates, reads and updates only attempts that carry their own
/// student_id. Nobody deletes an attempt.
pub fn can_access_attempt(actor: &Actor, attempt_student_id: Uuid, action: Action) -> bool {
    match action {
        Action::Read => actor.is_admin() || actor.id == attempt_student_id,
        Action::Create | Action::Update => !actor.is_admin() && actor.id == attempt_student_id,
        Action::Delete => false,
    }
}

/// Student answers inherit ownership from their parent attempt.
pub fn can_access_answer(actor: &Actor, attempt_student_id: Uuid, action: Action) -> bool {
    can_access_attempt(actor, attempt_student_id, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [Action; 4] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
    ];

    fn student(id: Uuid) -> Actor {
        Actor {
            id,
            role: Role::Student,
        }
    }

    fn admin() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role: Role::Admin,
        }
    }

    #[test]
    fn profile_owner_reads_and_updates_own_row() {
        let owner = Uuid::new_v4();
        let actor = student(owner);
        assert!(can_access_profile(&actor, owner, Action::Read));
        assert!(can_access_profile(&actor, owner, Action::Update));
        assert!(!can_access_profile(&actor, owner, Action::Create));
        assert!(!can_access_profile(&actor, owner, Action::Delete));
    }

    #[test]
    fn profile_other_student_denied_everything() {
        let actor = student(Uuid::new_v4());
        let other = Uuid::new_v4();
        for action in ALL_ACTIONS {
            assert!(!can_access_profile(&actor, other, action));
        }
    }

    #[test]
    fn profile_admin_reads_and_updates_any_row() {
        let actor = admin();
        let other = Uuid::new_v4();
        assert!(can_access_profile(&actor, other, Action::Read));
        assert!(can_access_profile(&actor, other, Action::Update));
        assert!(!can_access_profile(&actor, other, Action::Create));
        assert!(!can_access_profile(&actor, other, Action::Delete));
    }

    #[test]
    fn catalog_admin_full_crud() {
        let actor = admin();
        for active in [true, false] {
            for action in ALL_ACTIONS {
                assert!(can_access_catalog(&actor, active, action));
            }
        }
    }

    #[test]
    fn catalog_student_reads_active_rows_only() {
        let actor = student(Uuid::new_v4());
        assert!(can_access_catalog(&actor, true, Action::Read));
        assert!(!can_access_catalog(&actor, false, Action::Read));
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert!(!can_access_catalog(&actor, true, action));
            assert!(!can_access_catalog(&actor, false, action));
        }
    }

    #[test]
    fn attempt_student_owner_creates_reads_updates() {
        let owner = Uuid::new_v4();
        let actor = student(owner);
        assert!(can_access_attempt(&actor, owner, Action::Create));
        assert!(can_access_attempt(&actor, owner, Action::Read));
        assert!(can_access_attempt(&actor, owner, Action::Update));
        assert!(!can_access_attempt(&actor, owner, Action::Delete));
    }

    #[test]
    fn attempt_other_student_denied_everything() {
        let actor = student(Uuid::new_v4());
        let other = Uuid::new_v4();
        for action in ALL_ACTIONS {
            assert!(!can_access_attempt(&actor, other, action));
        }
    }

    #[test]
    fn attempt_admin_reads_only() {
        let actor = admin();
        let any_student = Uuid::new_v4();
        assert!(can_access_attempt(&actor, any_student, Action::Read));
        assert!(!can_access_attempt(&actor, any_student, Action::Create));
        assert!(!can_access_attempt(&actor, any_student, Action::Update));
        assert!(!can_access_attempt(&actor, any_student, Action::Delete));
    }

    #[test]
    fn answer_matrix_matches_parent_attempt() {
        let owner = Uuid::new_v4();
        let owner_actor = student(owner);
        let stranger = student(Uuid::new_v4());
        let admin_actor = admin();
        for action in ALL_ACTIONS {
            assert_eq!(
                can_access_answer(&owner_actor, owner, action),
                can_access_attempt(&owner_actor, owner, action)
            );
            assert_eq!(
                can_access_answer(&stranger, owner, action),
                can_access_attempt(&stranger, owner, action)
            );
            assert_eq!(
                can_access_answer(&admin_actor, owner, action),
                can_access_attempt(&admin_actor, owner, action)
            );
        }
    }
}
