//! Pages of the smoothie front end, independent of how they are displayed.

pub mod card;
pub mod create;
pub mod form;
pub mod list;
pub mod update;
