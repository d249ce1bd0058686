use super::RouteEntry;
use crate::{
    paths::{RouteDescriptor, RouteTier, protected, user},
    session::ROLE_USER,
};

/// Protected Route Entries
///
/// Two groups live here:
/// - the protected tier, open to any signed-in identity. The dashboard is the
///   default landing route, so it must never reject an authenticated visitor.
/// - the user tier, the citizen's own adoptions and reports, restricted to the
///   'user' role.
pub fn entries() -> Vec<RouteEntry> {
    let signed_in = |descriptor: RouteDescriptor, view: &'static str| {
        RouteEntry::new(RouteTier::Protected, descriptor, view).signed_in()
    };
    let citizen = |descriptor: RouteDescriptor, view: &'static str| {
        RouteEntry::new(RouteTier::User, descriptor, view).guarded([ROLE_USER])
    };

    vec![
        // --- Protected tier ---
        signed_in(protected::DASHBOARD, "DashboardPage"),
        signed_in(protected::PROFILE, "ProfilePage"),
        signed_in(protected::SETTINGS, "SettingsPage"),
        // --- User tier ---
        // GET /user/adoptions
        // Squares the citizen has adopted.
        citizen(user::MY_ADOPTIONS, "MyAdoptionsPage"),
        citizen(user::ADOPTION_DETAIL, "AdoptionDetailPage"),
        // GET /user/reports
        // Condition reports the citizen has filed.
        citizen(user::MY_REPORTS, "MyReportsPage"),
        citizen(user::REPORT_DETAIL, "ReportDetailPage"),
        // GET /user/squares/{squareId}/reports/new
        citizen(user::NEW_REPORT, "NewReportPage"),
    ]
}
