//! Navigation and screen switching utilities.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenKind {
    Users,
    Providers,
    Bookings,
    Subscriptions,
    Reviews,
    Notifications,
    Plans,
}

impl ScreenKind {
    pub fn title(&self) -> &'static str {
        match self {
            ScreenKind::Users => "Users",
            ScreenKind::Providers => "Providers",
            ScreenKind::Bookings => "Bookings",
            ScreenKind::Subscriptions => "Subscriptions",
            ScreenKind::Reviews => "Reviews",
            ScreenKind::Notifications => "Notifications",
            ScreenKind::Plans => "Plans",
        }
    }

    pub fn all() -> &'static [ScreenKind] {
        &[
            ScreenKind::Users,
            ScreenKind::Providers,
            ScreenKind::Bookings,
            ScreenKind::Subscriptions,
            ScreenKind::Reviews,
            ScreenKind::Notifications,
            ScreenKind::Plans,
        ]
    }

    pub fn index(&self) -> usize {
        Self::all()
            .iter()
            .position(|s| s == self)
            .unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<ScreenKind> {
        Self::all().get(index).copied()
    }

    pub fn next(&self) -> ScreenKind {
        let idx = self.index();
        let all = Self::all();
        all[(idx + 1) % all.len()]
    }

    pub fn previous(&self) -> ScreenKind {
        let idx = self.index();
        let all = Self::all();
        let prev = if idx == 0 { all.len() - 1 } else { idx - 1 };
        all[prev]
    }
}
