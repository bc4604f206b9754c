#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod config;
pub mod node;
pub mod packet;
pub mod radio;
pub mod sensors;
pub mod status;
pub mod timing;
pub mod transmitter;
