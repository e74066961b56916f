//! # xerproj-solver
//!
//! The CPM engine and the schedule-quality analyzer: everything that runs
//! once a [`xerproj_core::Schedule`] has been built by `xerproj-parser`.
//!
//! - [`cpm::run`] performs the forward/backward pass, writing
//!   [`xerproj_core::ComputedFields`] for every task.
//! - [`analysis`] computes the read-only reports (critical path, float
//!   buckets, logic check, resource loading, the DCMA-style panel) that a
//!   CPM-populated schedule supports.
//! - [`dag`] is the adjacency/topological-order machinery both of the above
//!   are built on.
//!
//! ```rust
//! use xerproj_core::CollectingEmitter;
//! use xerproj_parser::parse_bytes;
//!
//! let input = b"ERMHDR\n\
//!     %T\tPROJECT\n%F\tproj_id\n%R\t1000\n\
//!     %T\tTASK\n%F\ttask_id\tproj_id\ttarget_drtn_hr_cnt\n%R\t1\t1000\t40\n\
//!     %E\n";
//! let mut schedule = parse_bytes(input).unwrap();
//!
//! let mut emitter = CollectingEmitter::new();
//! xerproj_solver::cpm::run(&mut schedule, &mut emitter);
//!
//! let report = xerproj_solver::analysis::analyze(&schedule);
//! assert_eq!(report.dcma_panel.total_count, 11);
//! ```

pub mod analysis;
pub mod cpm;
pub mod dag;
