//! Lamport one-time signatures and a key-reuse forgery engine
//!
//! # Features
//!
//! - **lamport**: key generation, signing and verification over SHA-256,
//!   with hex encodings and atomic key files
//! - **forge**: harvests preimages leaked by several signatures under one
//!   key and searches, across worker threads, for a message carrying a
//!   chosen payload that can be signed with them
//!
//! # Example
//!
//! ```rust,no_run
//! use lamport_forge::lamport::{generate_keypair, sign, verify, Message};
//!
//! let (secret_key, public_key) = generate_keypair()?;
//! let message = Message::from_text("hello");
//! let signature = sign(&message, &secret_key);
//! assert!(verify(&message, &public_key, &signature));
//! # Ok::<(), lamport_forge::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod lamport;
pub mod forge;

pub mod error;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
