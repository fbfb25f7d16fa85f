//! Textual, line-oriented persistence for networks (`.net`) and input
//! sequences (`.seq`). Both formats skip blank lines and `#` comments, and
//! treat a malformed line as recoverable: it is logged and skipped rather
//! than aborting the whole load.

pub mod net_format;
pub mod seq_format;

pub use net_format::{load_net, save_net};
pub use seq_format::{load_seq, save_seq};
