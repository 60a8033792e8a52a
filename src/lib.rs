//! Symbolic reachability, deadlock detection and weighted optimum search for
//! 1-safe Petri nets.
//!
//! ```rust
//! use pn_reach::analysis::analyze;
//! use pn_reach::config::AnalysisConfig;
//! use pn_reach::net::NetBuilder;
//!
//! let mut builder = NetBuilder::new("fork");
//! builder
//!     .add_place("p0", true)
//!     .add_place("p1", false)
//!     .add_place("p2", false)
//!     .add_transition("t0")
//!     .add_arc("p0", "t0")
//!     .add_arc("t0", "p1")
//!     .add_arc("t0", "p2");
//! let report = analyze(&builder.build(), &AnalysisConfig::default()).unwrap();
//! assert_eq!(report.markings.len(), 2);
//! assert!(report.deadlock.has_deadlock);
//! assert_eq!(report.optimum_ilp.value, Some(2));
//! ```

pub mod analysis;
pub mod config;
pub mod detect;
pub mod ilp;
pub mod net;
pub mod options;
pub mod report;
pub mod symbolic;
