//! Core of the terminal lottery.
//!
//! One run owns a [`registry::UserRegistry`], a [`window::WindowPolicy`] and a
//! [`store::PersistenceStore`]. The [`supervisor::LotterySupervisor`] wires
//! them together with the background [`announcer`] and the
//! [`interrupt`] handling, and reads registrations from a
//! [`input::LineSource`].

pub mod announcer;
pub mod draw;
pub mod input;
pub mod interrupt;
pub mod registry;
pub mod store;
pub mod supervisor;
pub mod window;

pub use supervisor::{LotterySupervisor, Outcome};
