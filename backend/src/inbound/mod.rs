//! Inbound adapters that translate HTTP and WebSocket traffic into calls on
//! the driving ports.

pub mod http;
pub mod ws;
