pub mod contact_message;
pub mod insight;
pub mod office;
pub mod publication;
pub mod stats;
pub mod subscriber;
pub mod team;
pub mod user;

pub(crate) fn default_true() -> bool {
    true
}
