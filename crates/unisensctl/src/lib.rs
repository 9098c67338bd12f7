//! Subcommands of the `unisensctl` binary.

pub mod cmd_attrs;
pub mod cmd_data;
pub mod cmd_list;
pub mod cmd_show;
pub mod common;
