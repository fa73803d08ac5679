//! # stepsync Transform
//!
//! Edit-operation contract and position mapping for stepsync.
//!
//! This crate provides:
//! - The [`Step`] trait a document engine implements
//! - Position maps ([`StepMap`]) and mapping sequences with mirror
//!   pairing ([`Mapping`])
//! - A [`Transform`] accumulator that applies steps and records their maps
//! - Step neutralization against a common ancestor document
//! - A reference plain-text engine ([`TextDoc`], [`TextStep`])
//!
//! ## Usage
//!
//! ```
//! use stepsync_transform::{Assoc, Mappable, TextDoc, TextStep, Transform};
//!
//! let mut tr = Transform::<TextStep>::new(TextDoc::from("world"));
//! tr.step(TextStep::insert(0, "hello ")).unwrap();
//!
//! assert_eq!(tr.doc().to_string(), "hello world");
//! assert_eq!(tr.mapping().map(0, Assoc::After), 6);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod map;
mod mapping;
mod neutralize;
mod step;
mod text;
mod transform;

pub use error::{TransformError, TransformResult};
pub use map::{Assoc, MapRange, MapResult, Mappable, Recover, StepMap};
pub use mapping::{Mapping, MappingSlice};
pub use neutralize::neutralize_steps;
pub use step::Step;
pub use text::{TextDoc, TextStep};
pub use transform::Transform;
