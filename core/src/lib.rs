//! City HUD simulation core.
//!
//! A synchronous, typed message bus and the stateful consumers that hang
//! off it: a settlement ledger, a money accrual engine, and a HUD
//! projection layer, driven once per frame by [`engine::SimEngine`].

pub mod accrual;
pub mod bus;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod growth;
pub mod hud;
pub mod journal;
pub mod ledger;
pub mod name_generator;
pub mod render;
pub mod rng;
pub mod subsystem;
pub mod types;
