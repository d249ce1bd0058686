use super::RouteEntry;
use crate::paths::{RouteDescriptor, RouteTier, public};

/// Public Route Entries
///
/// Pages anyone may open, signed in or not: the landing page, the square
/// catalogue and the authentication screens. No resolver stages are attached.
pub fn entries() -> Vec<RouteEntry> {
    let entry = |descriptor: RouteDescriptor, view: &'static str| {
        RouteEntry::new(RouteTier::Public, descriptor, view)
    };

    vec![
        // GET /
        entry(public::HOME, "HomePage"),
        // GET /login
        // Target of every unauthenticated redirect issued by the guards.
        entry(public::LOGIN, "LoginPage"),
        // GET /register
        entry(public::REGISTER, "RegisterPage"),
        // GET /squares
        // Browsable list of public squares available for adoption.
        entry(public::SQUARES, "SquaresPage"),
        // GET /squares/{id}
        entry(public::SQUARE_DETAIL, "SquareDetailPage"),
        // GET /about
        entry(public::ABOUT, "AboutPage"),
    ]
}
