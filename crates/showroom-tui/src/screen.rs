//! Screen trait and screen identifier enum.

use std::fmt;

/// Identifies each TUI screen. The public screens are navigable by number
/// keys; the auth screens are reached through actions only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Home, // 1
    Showcase, // 2
    Reviews,  // 3
    /// Admin landing screen — 4, admins only.
    AdminHome,
    AdminCars,    // 5
    AdminUsers,   // 6
    AdminReviews, // 7
    /// Sign-in form — not in the tab bar.
    Login,
    /// Account creation form — not in the tab bar.
    Signup,
}

impl ScreenId {
    /// Public screens in tab-bar order.
    pub const PUBLIC: [ScreenId; 3] = [Self::Home, Self::Showcase, Self::Reviews];

    /// Admin screens appended to the tab bar for admin sessions.
    pub const ADMIN: [ScreenId; 4] = [
        Self::AdminHome,
        Self::AdminCars,
        Self::AdminUsers,
        Self::AdminReviews,
    ];

    /// Whether this screen requires an admin session.
    pub fn requires_admin(self) -> bool {
        matches!(
            self,
            Self::AdminHome | Self::AdminCars | Self::AdminUsers | Self::AdminReviews
        )
    }

    /// Numeric key for this screen. Auth screens have none.
    pub fn number(self) -> u8 {
        match self {
            Self::Home => 1,
            Self::Showcase => 2,
            Self::Reviews => 3,
            Self::AdminHome => 4,
            Self::AdminCars => 5,
            Self::AdminUsers => 6,
            Self::AdminReviews => 7,
            Self::Login | Self::Signup => 0,
        }
    }

    /// Screen from a numeric key. Returns None for out-of-range.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Home),
            2 => Some(Self::Showcase),
            3 => Some(Self::Reviews),
            4 => Some(Self::AdminHome),
            5 => Some(Self::AdminCars),
            6 => Some(Self::AdminUsers),
            7 => Some(Self::AdminReviews),
            _ => None,
        }
    }

    /// Label for the tab bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Catalogue",
            Self::Showcase => "Showcase",
            Self::Reviews => "Reviews",
            Self::AdminHome => "Admin",
            Self::AdminCars => "Cars",
            Self::AdminUsers => "Users",
            Self::AdminReviews => "Moderation",
            Self::Login => "Sign in",
            Self::Signup => "Sign up",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_roundtrip() {
        for id in ScreenId::PUBLIC.into_iter().chain(ScreenId::ADMIN) {
            assert_eq!(ScreenId::from_number(id.number()), Some(id));
        }
        assert_eq!(ScreenId::Login.number(), 0);
        assert_eq!(ScreenId::from_number(0), None);
    }

    #[test]
    fn admin_screens_are_gated() {
        assert!(ScreenId::AdminCars.requires_admin());
        assert!(!ScreenId::Reviews.requires_admin());
    }
}
