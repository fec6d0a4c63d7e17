//! Runtime API for executing PrinceXML through its prince(1) CLI.
//!
//! # Architecture
//!
//! - `options`: versioned option registries and option values
//! - `config`: builder state and construction-time overrides
//! - `prince`: the fluent `Prince` builder and argument synthesis
//! - `exec`: child-process execution and outcome classification
//! - `error`: error types
//!
//! # Example
//!
//! ```ignore
//! use prince_core::api::Prince;
//!
//! let mut prince = Prince::new();
//! prince.inputs("report.html").output("report.pdf");
//! prince.flag("javascript")?;
//!
//! match prince.execute().await {
//!     Ok(rendered) => println!("{}", rendered.stderr_lossy()),
//!     Err(err) => eprintln!("prince failed: {}", err.message()),
//! }
//! ```

pub mod config;
pub mod error;
pub mod exec;
pub mod options;
pub mod prince;

pub use config::{OneOrMany, PrinceConfig, PrinceOptions};
pub use error::{ExecuteError, Failure, PrinceError};
pub use exec::Rendered;
pub use options::{OptionRegistry, OptionValue, PRINCE_15, PRINCE_9, RASTER_OUTPUT};
pub use prince::Prince;
