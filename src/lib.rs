//! osinfo-lookup – path queries over a database of operating system metadata.
//!
//! The database holds one record per operating system, keyed by its *short
//! id* (for example `fedora20` or `rhel8.4`). Records are irregular: an OS
//! record nests lists of resource requirements, devices and so on, and the
//! fields present differ from one record kind to the next. Instead of a typed
//! accessor per field, everything is reached through a small path language:
//!
//! * `release_date` – a field of the current record.
//! * `devices.2` – the third element of a list.
//! * `resources.architecture=x86_64|all,scope=minimum` – the first list element
//!   whose fields match; comma is AND, pipe is OR, atoms are string equality.
//!
//! Segments chain with `.`, so
//! `resources.architecture=x86_64|all,scope=minimum.ram` yields the minimum
//! RAM in bytes.
//!
//! ## Modules
//! * [`datatype`] – The [`datatype::Value`] model: scalars, records and lists.
//! * [`persist`] – Record sources; JSON files and directories out of the box.
//! * [`construct`] – The [`construct::Database`] and OS lookups.
//! * [`filter`] – Equality filters used by list segments and property lookups.
//! * [`path`] – Path expressions and the borrowed views they walk.
//! * [`lifecycle`] – Whether an OS is still active given its EOL date.
//! * [`check`] – Minimum memory consistency between templates and the database.
//! * [`template`] – Template documents read from JSON.
//! * [`settings`] – Layered configuration.
//!
//! ## Quick Start
//! ```
//! use osinfo_lookup::construct::Database;
//! use osinfo_lookup::datatype::{Record, Value};
//! let resources = vec![
//!     Record::new().with("architecture", "all").with("scope", "minimum").with("ram", 1073741824i64),
//! ];
//! let fedora = Record::new()
//!     .with("short_id", "fedora20")
//!     .with("resources", Value::from(resources));
//! let db = Database::from_records([fedora]).unwrap();
//! let os = db.lookup_by_short_id("fedora20");
//! let ram = os.get("resources.architecture=x86_64|all,scope=minimum.ram").unwrap();
//! assert_eq!(ram.as_i64(), Some(1073741824));
//! ```
//!
//! The database is built once, explicitly, and is read-only afterwards; it can
//! be shared between threads by reference.

pub mod check;
pub mod construct;
pub mod datatype;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod path;
pub mod persist;
pub mod settings;
pub mod template;

pub use error::{OsinfoError, Result};
