//! # Counter Commands
//!
//! Every operation the counter can perform. The shell parses operator
//! input and calls these; they are plain functions so a different front
//! end could call them the same way.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── catalog.rs  ◄─── Catalog refresh, product search, clients
//! ├── cart.rs     ◄─── Cart manipulation
//! └── sale.rs     ◄─── Payment preview and checkout
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Operator types:  add melox dose                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  shell::parse_command ──► ShellCommand::Add { .. }                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commands::cart::add_to_cart(                                           │
//! │      &catalog,        ◄── only the states it needs                     │
//! │      &session,                                                          │
//! │      "melox", SaleMode::Dose,                                           │
//! │  ) -> Result<CartResponse, ApiError>                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  shell renders the cart, or the error as a notification                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A command that returns `Err` changed nothing.

pub mod cart;
pub mod catalog;
pub mod sale;
