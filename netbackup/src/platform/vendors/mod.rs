//! Built-in vendor platform definitions.

pub mod cisco_s300;
pub mod generic;
pub mod mikrotik_routeros;
pub mod ubiquiti_edgeswitch;
