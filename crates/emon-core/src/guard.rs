//! Route guard: decides whether a view renders or where to send the user.
//!
//! Guarding is a pure function of the session's derived flags. Nothing here
//! fetches; the decision is re-evaluated on every navigation.

use core::fmt;

use crate::session::Session;

/// A navigable view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Login,
    Dashboard,
    SensorDetail(i64),
    HouseDetail(i64),
    Alerts,
    AlertCreate,
    Settings,
    AdminDashboard,
    AdminHouses,
    AdminSensors,
}

/// Who may see a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Public,
    User,
    Admin,
}

/// The session classes the guard distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Unauthenticated,
    AuthenticatedNonAdmin,
    AuthenticatedAdmin,
}

/// Frame a view renders inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shell {
    /// No frame (public views).
    Bare,
    /// The standard authenticated layout.
    Standard,
    /// The admin layout.
    Admin,
}

/// Outcome of guarding an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Shell),
    RedirectTo(View),
}

/// Outcome of a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render { view: View, shell: Shell },
    Redirect(View),
}

impl View {
    /// Parse a route path. Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<View> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let view = match segments.as_slice() {
            ["login"] => View::Login,
            ["dashboard"] => View::Dashboard,
            ["sensor", id] => View::SensorDetail(id.parse().ok()?),
            ["house", id] => View::HouseDetail(id.parse().ok()?),
            ["alerts"] => View::Alerts,
            ["alerts", "create"] => View::AlertCreate,
            ["settings"] => View::Settings,
            ["admin", "dashboard"] => View::AdminDashboard,
            ["admin", "houses"] => View::AdminHouses,
            ["admin", "sensors"] => View::AdminSensors,
            _ => return None,
        };
        Some(view)
    }

    /// Canonical route path.
    pub fn path(&self) -> String {
        match self {
            View::Login => "/login".to_string(),
            View::Dashboard => "/dashboard".to_string(),
            View::SensorDetail(id) => format!("/sensor/{id}"),
            View::HouseDetail(id) => format!("/house/{id}"),
            View::Alerts => "/alerts".to_string(),
            View::AlertCreate => "/alerts/create".to_string(),
            View::Settings => "/settings".to_string(),
            View::AdminDashboard => "/admin/dashboard".to_string(),
            View::AdminHouses => "/admin/houses".to_string(),
            View::AdminSensors => "/admin/sensors".to_string(),
        }
    }

    pub fn area(&self) -> Area {
        match self {
            View::Login => Area::Public,
            View::AdminDashboard | View::AdminHouses | View::AdminSensors => Area::Admin,
            _ => Area::User,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl Access {
    /// Classify a session from its derived flags.
    pub fn of(session: &Session) -> Access {
        match (session.is_authenticated(), session.is_admin()) {
            (false, _) => Access::Unauthenticated,
            (true, false) => Access::AuthenticatedNonAdmin,
            (true, true) => Access::AuthenticatedAdmin,
        }
    }
}

/// Guard an area for a class of session.
///
/// Redirects discard the attempted destination; there is no "return to".
pub fn guard(area: Area, access: Access) -> Decision {
    match (area, access) {
        (Area::Public, _) => Decision::Allow(Shell::Bare),
        (_, Access::Unauthenticated) => Decision::RedirectTo(View::Login),
        (Area::User, _) => Decision::Allow(Shell::Standard),
        (Area::Admin, Access::AuthenticatedNonAdmin) => Decision::RedirectTo(View::Dashboard),
        (Area::Admin, Access::AuthenticatedAdmin) => Decision::Allow(Shell::Admin),
    }
}

/// Guard a known view.
pub fn resolve(session: &Session, view: View) -> Navigation {
    match guard(view.area(), Access::of(session)) {
        Decision::Allow(shell) => Navigation::Render { view, shell },
        Decision::RedirectTo(target) => Navigation::Redirect(target),
    }
}

/// Parse and guard a path. Unknown paths redirect to the dashboard.
pub fn navigate(session: &Session, path: &str) -> Navigation {
    match View::parse(path) {
        Some(view) => resolve(session, view),
        None => Navigation::Redirect(View::Dashboard),
    }
}

/// Follow redirects until something renders.
///
/// Returns the rendered view, its shell, and the views redirected through.
pub fn land(session: &Session, path: &str) -> (View, Shell, Vec<View>) {
    let mut hops = Vec::new();
    let mut next = navigate(session, path);
    loop {
        match next {
            Navigation::Render { view, shell } => return (view, shell, hops),
            Navigation::Redirect(view) => {
                hops.push(view);
                next = resolve(session, view);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emon_types::UserProfile;
    use proptest::prelude::*;

    fn session(access: Access) -> Session {
        let user = |staff| UserProfile {
            id: 1,
            username: "u".to_string(),
            email: String::new(),
            is_staff: staff,
            date_joined: None,
            settings: None,
        };
        match access {
            Access::Unauthenticated => Session::default(),
            Access::AuthenticatedNonAdmin => Session {
                token: Some("t".to_string()),
                user: Some(user(false)),
                ..Session::default()
            },
            Access::AuthenticatedAdmin => Session {
                token: Some("t".to_string()),
                user: Some(user(true)),
                ..Session::default()
            },
        }
    }

    #[test]
    fn test_admin_guard_matrix() {
        assert_eq!(
            guard(Area::Admin, Access::Unauthenticated),
            Decision::RedirectTo(View::Login)
        );
        assert_eq!(
            guard(Area::Admin, Access::AuthenticatedNonAdmin),
            Decision::RedirectTo(View::Dashboard)
        );
        assert_eq!(
            guard(Area::Admin, Access::AuthenticatedAdmin),
            Decision::Allow(Shell::Admin)
        );
    }

    #[test]
    fn test_user_guard() {
        assert_eq!(
            guard(Area::User, Access::Unauthenticated),
            Decision::RedirectTo(View::Login)
        );
        assert_eq!(
            guard(Area::User, Access::AuthenticatedNonAdmin),
            Decision::Allow(Shell::Standard)
        );
        assert_eq!(
            guard(Area::User, Access::AuthenticatedAdmin),
            Decision::Allow(Shell::Standard)
        );
    }

    #[test]
    fn test_token_without_profile_is_not_admin() {
        let pending = Session {
            token: Some("t".to_string()),
            auth_loading: true,
            ..Session::default()
        };
        assert_eq!(Access::of(&pending), Access::AuthenticatedNonAdmin);
        assert_eq!(
            navigate(&pending, "/admin/houses"),
            Navigation::Redirect(View::Dashboard)
        );
    }

    #[test]
    fn test_parse_routes() {
        assert_eq!(View::parse("/sensor/42"), Some(View::SensorDetail(42)));
        assert_eq!(View::parse("/house/7/"), Some(View::HouseDetail(7)));
        assert_eq!(View::parse("/alerts/create"), Some(View::AlertCreate));
        assert_eq!(View::parse("/alerts?status=unread"), Some(View::Alerts));
        assert_eq!(View::parse("/sensor/abc"), None);
        assert_eq!(View::parse("/"), None);
        assert_eq!(View::parse("/register"), None);
    }

    #[test]
    fn test_unknown_path_lands_on_dashboard_or_login() {
        let anon = session(Access::Unauthenticated);
        assert_eq!(navigate(&anon, "/nowhere"), Navigation::Redirect(View::Dashboard));
        assert_eq!(
            land(&anon, "/nowhere"),
            (View::Login, Shell::Bare, vec![View::Dashboard, View::Login])
        );

        let user = session(Access::AuthenticatedNonAdmin);
        assert_eq!(
            land(&user, "/admin/sensors"),
            (View::Dashboard, Shell::Standard, vec![View::Dashboard])
        );
    }

    #[test]
    fn test_login_renders_for_everyone() {
        for access in [
            Access::Unauthenticated,
            Access::AuthenticatedNonAdmin,
            Access::AuthenticatedAdmin,
        ] {
            assert_eq!(
                navigate(&session(access), "/login"),
                Navigation::Render {
                    view: View::Login,
                    shell: Shell::Bare
                }
            );
        }
    }

    fn any_view() -> impl Strategy<Value = View> {
        prop_oneof![
            Just(View::Login),
            Just(View::Dashboard),
            any::<u32>().prop_map(|id| View::SensorDetail(i64::from(id))),
            any::<u32>().prop_map(|id| View::HouseDetail(i64::from(id))),
            Just(View::Alerts),
            Just(View::AlertCreate),
            Just(View::Settings),
            Just(View::AdminDashboard),
            Just(View::AdminHouses),
            Just(View::AdminSensors),
        ]
    }

    fn any_access() -> impl Strategy<Value = Access> {
        prop_oneof![
            Just(Access::Unauthenticated),
            Just(Access::AuthenticatedNonAdmin),
            Just(Access::AuthenticatedAdmin),
        ]
    }

    proptest! {
        #[test]
        fn test_path_parses_back(view in any_view()) {
            prop_assert_eq!(View::parse(&view.path()), Some(view));
        }

        #[test]
        fn test_navigation_is_deterministic(view in any_view(), access in any_access()) {
            let s = session(access);
            prop_assert_eq!(navigate(&s, &view.path()), navigate(&s, &view.path()));
        }

        #[test]
        fn test_rendered_shell_matches_area(view in any_view(), access in any_access()) {
            let s = session(access);
            if let Navigation::Render { view: rendered, shell } = navigate(&s, &view.path()) {
                prop_assert_eq!(rendered, view);
                let expected = match view.area() {
                    Area::Public => Shell::Bare,
                    Area::User => Shell::Standard,
                    Area::Admin => Shell::Admin,
                };
                prop_assert_eq!(shell, expected);
            }
        }

        #[test]
        fn test_landing_always_renders(path in "[a-z/0-9]{0,24}", access in any_access()) {
            let (view, _, hops) = land(&session(access), &path);
            prop_assert!(hops.len() <= 2);
            if access == Access::Unauthenticated {
                prop_assert_eq!(view, View::Login);
            }
        }
    }
}
