//! Deterministic storage identities for conversations and users.

use uuid::Uuid;

/// Namespace under which thread ids and non-UUID user ids are hashed
pub fn conversation_namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"mailpilot.conversation_id")
}

/// Stored conversation id for a caller-supplied thread id
pub fn conversation_id_for(thread_id: &str) -> Uuid {
    Uuid::new_v5(&conversation_namespace(), thread_id.as_bytes())
}

/// Stored user id: the id itself when it is a UUID, otherwise a UUIDv5 of `user_{id}`
pub fn user_id_for(user_id: &str) -> Uuid {
    Uuid::parse_str(user_id).unwrap_or_else(|_| {
        Uuid::new_v5(&conversation_namespace(), format!("user_{}", user_id).as_bytes())
    })
}

/// Both storage identities for one sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
}

impl ConversationKey {
    pub fn derive(thread_id: &str, user_id: &str) -> Self {
        Self {
            conversation_id: conversation_id_for(thread_id),
            user_id: user_id_for(user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_id_is_stable() {
        assert_eq!(conversation_id_for("default-thread"), conversation_id_for("default-thread"));
        assert_eq!(conversation_id_for("t1").get_version_num(), 5);
    }

    #[test]
    fn test_namespace_seed_is_fixed() {
        // Changing the seed orphans every stored conversation
        let expected = Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"mailpilot.conversation_id");
        assert_eq!(conversation_namespace(), expected);
        assert_eq!(conversation_id_for("default-thread"), Uuid::new_v5(&expected, b"default-thread"));
    }

    #[test]
    fn test_distinct_threads_get_distinct_ids() {
        let ids: std::collections::HashSet<Uuid> = ["t1", "t2", "T1", "", "default-thread"]
            .iter()
            .map(|t| conversation_id_for(t))
            .collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_uuid_user_id_is_kept() {
        let raw = "7f1c6a52-8d4e-4c1b-9b0e-2f3a4b5c6d7e";
        assert_eq!(user_id_for(raw), Uuid::parse_str(raw).unwrap());
    }

    #[test]
    fn test_plain_user_id_is_hashed() {
        let expected = Uuid::new_v5(&conversation_namespace(), b"user_default-user");
        assert_eq!(user_id_for("default-user"), expected);
        assert_ne!(user_id_for("default-user"), user_id_for("other-user"));
    }

    #[test]
    fn test_thread_and_user_ids_differ_for_same_string() {
        assert_ne!(conversation_id_for("alice"), user_id_for("alice"));
    }
}
