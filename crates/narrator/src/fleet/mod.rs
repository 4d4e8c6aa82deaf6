/*!
Process fleet: one [`Server`] per admitted running application.

The [`ServerProvider`] decides which processes are admitted; the reconciler
applies running-application diffs to the live set.
*/

mod reconcile;
mod server;

pub(crate) use reconcile::Fleet;
pub use server::{Server, ServerProvider};
