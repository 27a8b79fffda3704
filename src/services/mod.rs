//! Domain services used by the page routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the page-level business sequences (which rows to
//! read, in what order, what to insert) so route handlers can stay focused
//! on form parsing, cookies, and rendering. Every function takes the
//! backend as `&dyn Backend` plus the caller's access token.

pub mod account;
pub mod doctor;
pub mod guard;
pub mod link;
pub mod password;
pub mod patient;
pub mod pdf;
