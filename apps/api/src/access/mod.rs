pub mod policy;

use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use crate::access::policy::{classify, Tier};
use crate::store::Store;

/// Computes the requester's tier from the subscription state as stored right now.
///
/// A failed profile lookup downgrades to `AuthenticatedFree`; it never fails
/// the request and never grants more than the free tier.
pub async fn resolve_tier(store: &dyn Store, user_id: Option<Uuid>, today: NaiveDate) -> Tier {
    let Some(id) = user_id else {
        return Tier::Anonymous;
    };
    match store.find_profile(id).await {
        Ok(profile) => classify(Some(id), profile.as_ref(), today),
        Err(e) => {
            warn!("Profile lookup failed for user {id}, serving free tier: {e}");
            Tier::AuthenticatedFree
        }
    }
}
