//! SurrealDB repository implementations.

mod member;
mod organization;

pub use member::SurrealMemberRepository;
pub use organization::SurrealOrganizationRepository;
