//! Core library for `PartnerBoard`.
//!
//! Holds the two collections behind the landing page's admin panels — the
//! five fixed ad slots and the list of partner websites — together with the
//! persistence adapter that mirrors them into a [`StorageBackend`], the
//! change-notification channel, and the [`Board`] facade that wires them up
//! from a [`BoardConfig`].
//!
//! Every mutating call finishes its durable write before it returns. A failed
//! write does not roll back the in-memory change; it is reported alongside
//! the result as a [`Saved::warning`].
//!
//! [`StorageBackend`]: partnerboard_storage::StorageBackend
//! [`Board`]: board::Board
//! [`BoardConfig`]: config::BoardConfig
//! [`Saved::warning`]: persistence::Saved::warning

pub mod ad_block;
pub mod board;
pub mod config;
pub mod error;
pub mod events;
pub mod persistence;
pub mod website;

#[cfg(test)]
mod testing;
