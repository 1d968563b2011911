use crate::domain::UserId;

// ============== Authorization ==============

/// An empty allow-list leaves the bot open to everyone; otherwise only listed
/// users pass. Updates without a sender never pass a non-empty list.
pub fn is_authorized(user_id: Option<UserId>, allowed_users: &[i64]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }
    let Some(user_id) = user_id else {
        return false;
    };
    allowed_users.contains(&user_id.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_is_open() {
        assert!(is_authorized(Some(UserId(7)), &[]));
        assert!(is_authorized(None, &[]));
    }

    #[test]
    fn allow_list_restricts_users() {
        let allowed = [1, 2];
        assert!(is_authorized(Some(UserId(2)), &allowed));
        assert!(!is_authorized(Some(UserId(3)), &allowed));
        assert!(!is_authorized(None, &allowed));
    }
}
