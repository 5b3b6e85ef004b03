//! **ortotrack** - Orthotypographic checker for `.docx` documents
//!
//! Scans paragraph text with a deterministic rule pipeline, collects
//! categorized correction candidates, and writes the approved ones back into
//! the document as tracked changes (`w:ins` / `w:del`).

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Command handlers behind the CLI subcommands
pub mod cli_ext {
    /// `analyze`, plus the shared engine and approval setup
    pub mod analyze_cmd;

    /// `apply` and `preview`
    pub mod apply_cmd;

    /// `clean`
    pub mod clean_cmd;

    /// Tables, colors and JSON for command output
    pub mod report;
}

/// Core pipeline - rules, aggregation, markup encoding and the document package
pub mod core {
    /// Correction, paragraph, run and revision types
    pub mod model;
    pub use model::{Category, Correction, Paragraph, RevisionKind, RevisionMark, Run, RunFormat};

    /// Built-in lookup tables and their config overrides
    pub mod tables;
    pub use tables::{RuleTables, TableOverrides};

    /// Ordered rule pipeline
    pub mod rules;
    pub use rules::{Rule, RuleEngine, RuleError, RuleOutput};

    /// Candidate collection with dense ids and approval flags
    pub mod aggregate;
    pub use aggregate::{Aggregator, ApprovalError, CandidateSet, ExternalCandidate};

    /// `.docx` package: unpack, read paragraphs, save atomically
    pub mod container;
    pub use container::{ContainerError, DocxPackage, PersistError};

    /// Accept pre-existing tracked changes
    pub mod cleanup;
    pub use cleanup::accept_all_revisions;

    /// Prefix/suffix split and `w:ins` / `w:del` generation
    pub mod encode;
    pub use encode::{EditSplit, EncodeMode, EncodingError, MarkupEncoder, RevisionStamp, split};

    /// Correction composition and apply passes
    pub mod apply;
    pub use apply::{ApplyOptions, ApplyReport, ReplacePolicy, apply_approved, apply_corrections};

    /// Session files shared by `analyze` and `apply`
    pub mod session;
    pub use session::{AnalysisSession, SessionError};
}

/// Infrastructure - Configuration, I/O, XML tree and logging
pub mod infra {
    /// Configuration management with TOML support
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Atomic writes and output path helpers
    pub mod io;
    pub use io::write_atomic;

    /// Owned XML tree over quick-xml
    pub mod xml;

    /// tracing subscriber setup
    pub mod logging;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use infra::{Config, load_config};

// Core types for external consumers
pub use crate::core::{
    Aggregator, CandidateSet, Category, Correction, DocxPackage, RuleEngine, RuleTables,
    accept_all_revisions, apply_approved,
};
