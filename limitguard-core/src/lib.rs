//! Limit checking engine for spacecraft telemetry
//!
//! Watches fields of incoming telemetry messages and, when combinations of
//! limit violations persist, requests pre-defined corrective responses.
//! Designed to run inside a flight software task:
//!
//! - Fixed-size tables, no heap allocation
//! - Bounded work per message and per sample request
//! - `no_std` with optional `log`, `defmt` and `serde` support
//!
//! Two tables drive the engine. *Watchpoints* compare one message field
//! against a limit on every arrival. *Actionpoints* combine watchpoint
//! results with an RPN equation when sampled, count consecutive failures
//! and request a response once a threshold is reached.
//!
//! ```no_run
//! use limitguard_core::{Engine, LcMode, NullSink, NullTransport, SampleRequest};
//!
//! let mut engine = Engine::new();
//! engine.set_mode(LcMode::Passive);
//!
//! // Nothing loaded yet: every actionpoint slot is unused
//! engine
//!     .sample(SampleRequest::all().with_aging(), &mut NullTransport, &mut NullSink)
//!     .unwrap();
//! assert_eq!(engine.snapshot().active_actionpoints, 0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod actionpoint;
pub mod constants;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod events;
pub mod message;
pub mod report;
pub mod rpn;
pub mod time;
pub mod traits;
pub mod validation;
pub mod watchpoint;

// Public API
pub use actionpoint::{
    ActionIndex, ActionResult, Actionpoint, ActionpointDefinition, ActionpointResult, ApState,
};
pub use engine::{Engine, EngineCounters, LcMode, LoadReport, SampleRequest};
pub use errors::{LcError, LcResult, Table, ValidationReason};
pub use events::{Notification, Severity, TableCounts};
pub use message::{Message, MessageId};
pub use report::HousekeepingSnapshot;
pub use traits::{
    CustomPredicate, EventSink, NoCustomPredicate, NullSink, NullTransport, Transport,
    TransportStatus,
};
pub use validation::TableReport;
pub use watchpoint::{
    DataType, Operator, TypedValue, WatchIndex, WatchResult, Watchpoint, WatchpointDefinition,
    WatchpointResult,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
