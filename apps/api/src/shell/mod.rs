//! Session shell: owns every piece of per-session state and is the only
//! writer of it. Handlers translate HTTP into session actions; collaborator
//! calls are sequenced in `sequencing`.

pub mod handlers;
pub mod sequencing;
pub mod session;
pub mod store;

pub use store::SessionStore;
