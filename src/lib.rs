//! # h5pio
//!
//! Safe writing of hierarchical HDF5 files: nested groups, typed rectangular
//! datasets and scalar/matrix attributes, with optional MPI-collective
//! parallel I/O.
//!
//! Every native HDF5 handle (file, group, dataset, dataspace, attribute,
//! type, property list) is wrapped in a reference-counted, disposal-tagged
//! handle that releases the underlying resource exactly once, in dependency
//! order, on every exit path — a dataset's handle closes before its
//! dataspace, and the library's own reference counting keeps a file alive
//! until the wrappers created from it are gone.
//!
//! ## Usage
//!
//! ```no_run
//! use h5pio::File;
//!
//! let file = File::create("results.h5").unwrap();
//! let group = file.create_group("simulation").unwrap();
//!
//! group.write_dataset("temperature", &[270.5_f64, 271.0, 272.3]).unwrap();
//! group.write_attr("converged", &true).unwrap();
//!
//! let dataset = group.create_dataset::<f64>("field", &[4, 4]).unwrap();
//! dataset.write_hyperslab(&[1.0, 2.0, 3.0, 4.0], &[1, 1], &[2, 2]).unwrap();
//! ```
//!
//! With the `mpio` feature, a file opened through [`File::create_parallel`]
//! issues every data operation collectively: all ranks of the communicator
//! must make the same calls in the same order, using
//! [`Dataset::write_none`] in rounds where a rank contributes nothing.
//!
//! The crate assumes one logical thread of control per process: the
//! underlying library is not thread-safe, so concurrent use of the same
//! file must be serialized by the caller.

#[macro_use]
extern crate anyhow;

mod handle;

pub mod dataset;
pub mod datatype;
pub mod file;
pub mod group;
pub mod object;

pub use dataset::Dataset;
pub use datatype::{Datatype, Element};
pub use file::File;
pub use group::Group;
pub use object::{AttrValue, Object};
