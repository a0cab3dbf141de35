//! Arcfit - Conversational Welding-Equipment Configurator
//!
//! This crate implements a stateful S1→S7 configuration flow that guides a
//! user through selecting a compatible set of welding equipment via
//! conversational AI parameter extraction and graph-backed product search.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
