//! Visitors that accumulate derived facts during a history walk.

pub mod changelog;
pub mod release;

pub use changelog::ChangelogVisitor;
pub use release::ReleaseNumberVisitor;
