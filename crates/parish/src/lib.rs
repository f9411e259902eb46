//! `vestry-parish` — parish-life domain entities (parishes and masses).

pub mod mass;
pub mod parish;

pub use mass::{Mass, MassChanges, MassDraft};
pub use parish::{Parish, ParishChanges, ParishDraft};
