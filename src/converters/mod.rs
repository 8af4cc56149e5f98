//! Format converters
//!
//! This module contains the readers and writers at both ends of the pipeline:
//! MusicXML in, XES out.

pub mod musicxml;
pub mod xes;
