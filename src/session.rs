//! The acting user for the current process. Mock role-based identity:
//! logging in picks a matching seed user, and the name travels into every
//! authored mutation.

use crate::models::{AppUser, UserRole};

#[derive(Default)]
pub struct Session {
    user: Option<AppUser>,
}

impl Session {
    pub fn login(&mut self, users: &[AppUser], role: UserRole, team: Option<&str>) {
        let picked = match role {
            UserRole::Admin => users.iter().find(|u| u.role == UserRole::Admin),
            UserRole::Installer => users
                .iter()
                .find(|u| u.role == UserRole::Installer && u.team.as_deref() == team)
                .or_else(|| users.iter().find(|u| u.role == UserRole::Installer)),
        };
        self.user = picked.cloned();
    }

    pub fn logout(&mut self) {
        self.user = None;
    }

    pub fn user(&self) -> Option<&AppUser> {
        self.user.as_ref()
    }

    pub fn user_name(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.name.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role == UserRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn admin_login_picks_the_admin() {
        let users = seed::users();
        let mut session = Session::default();
        session.login(&users, UserRole::Admin, None);
        assert!(session.is_admin());
        assert_eq!(session.user_name(), "James Fordan");
    }

    #[test]
    fn installer_login_matches_team_or_falls_back() {
        let users = seed::users();
        let mut session = Session::default();

        session.login(&users, UserRole::Installer, Some("Team 2"));
        assert_eq!(session.user_name(), "Dave Chen");
        assert!(!session.is_admin());

        session.login(&users, UserRole::Installer, Some("Team 9"));
        assert_eq!(session.user_name(), "Mike Torres");
    }

    #[test]
    fn logout_clears_the_user() {
        let users = seed::users();
        let mut session = Session::default();
        session.login(&users, UserRole::Admin, None);
        session.logout();
        assert!(session.user().is_none());
        assert!(!session.is_admin());
    }
}
