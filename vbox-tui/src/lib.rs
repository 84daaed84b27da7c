//! vbox-tui: terminal front-end for VirtualBox VMs
//!
//! This library wraps `VBoxManage` behind a [`gateway::Gateway`], turns its
//! free-text output into typed records ([`extract`]) and drives a stack of list
//! screens on top of them ([`tui`]).

pub mod error;
pub mod extract;
pub mod gateway;
pub mod tui;

pub use error::{Error, Result};
