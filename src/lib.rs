//! oplogger - terminal session logger for pentesters.
//!
//! Raw terminal captures (one file per tmux pane or plain shell) are turned
//! into a Markdown session report:
//!
//! 1. [`normalize`] renders control sequences into plain lines
//! 2. [`detect`] classifies lines as prompt commands, continuations or output
//! 3. [`blocks`] groups them into command blocks
//! 4. [`highlight`] flags blocks that run a configured security tool
//! 5. [`report`] merges all sources and renders the two documents
//!
//! [`pipeline`] wires the stages together, [`capture`] and [`session`]
//! produce the captures in the first place.

pub mod blocks;
pub mod capture;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod highlight;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod ui;

pub use blocks::CommandBlock;
pub use config::{Config, ToolSet};
pub use error::{ParseError, Warning};
pub use pipeline::{parse_session, ParseOutcome, SessionParser};
pub use report::SessionReport;
pub use session::SessionManager;
