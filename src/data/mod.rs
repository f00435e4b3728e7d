//! Data layer: channel types, decoding, encoding and range selection.
//!
//! Architecture:
//! ```text
//!  capture file (.ovna, big-endian)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse bytes → Channel (axes + time-domain field)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │   Channel     │  spectrum, frequency/time axes, field
//!   └──────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  frequency-range selection → subset
//!   └──────────┘
//! ```
//!
//! `writer` emits the same layout and exists for fixtures and sample data.

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
