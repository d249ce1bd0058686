use super::RouteEntry;
use crate::{
    paths::{RouteDescriptor, RouteTier, admin},
    session::ROLE_ADMIN,
};

/// Admin Route Entries
///
/// Moderation screens for squares, users and incoming reports. Every entry is
/// guarded by the 'admin' role; a signed-in non-admin is sent to the default
/// landing route, an anonymous visitor to login.
pub fn entries() -> Vec<RouteEntry> {
    let entry = |descriptor: RouteDescriptor, view: &'static str| {
        RouteEntry::new(RouteTier::Admin, descriptor, view).guarded([ROLE_ADMIN])
    };

    vec![
        // GET /admin
        // Overview counters and the pending-report queue.
        entry(admin::DASHBOARD, "AdminDashboardPage"),
        entry(admin::USERS, "AdminUsersPage"),
        entry(admin::USER_DETAIL, "AdminUserDetailPage"),
        entry(admin::SQUARES, "AdminSquaresPage"),
        entry(admin::SQUARE_DETAIL, "AdminSquareDetailPage"),
        // GET /admin/reports
        // Reports awaiting review, newest first.
        entry(admin::REPORTS, "AdminReportsPage"),
        entry(admin::REPORT_DETAIL, "AdminReportDetailPage"),
    ]
}
