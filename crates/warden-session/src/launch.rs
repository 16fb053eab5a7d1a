//! Launch-location handling.
//!
//! A host can ask for a forced sign-out by opening the app with
//! `?logout=true`. The request is honored before anything else at startup
//! and the parameter is removed from the location so a reload doesn't
//! sign the user out again.

use warden_identity::Url;

/// Query parameter that requests a logout at launch.
pub const LOGOUT_PARAM: &str = "logout";

/// Returns `true` if `location` requests a logout, scrubbing the parameter
/// from it in place. Other query parameters are kept in their original
/// order. A location that doesn't request a logout is left untouched.
pub fn take_logout_request(location: &mut Url) -> bool {
    let mut requested = false;
    let kept: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(key, value)| {
            if key == LOGOUT_PARAM && value == "true" {
                requested = true;
                false
            } else {
                true
            }
        })
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if !requested {
        return false;
    }

    if kept.is_empty() {
        location.set_query(None);
    } else {
        location.query_pairs_mut().clear().extend_pairs(kept);
    }
    true
}
