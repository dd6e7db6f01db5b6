pub mod annotate;
pub mod compare;
pub mod detect;
pub mod inspect;
pub mod list;
pub mod plot;
