//! svrefine — base-exact structural variant breakpoint refinement.
//!
//! Takes coarse SV calls carrying a split-read consensus sequence and
//! re-aligns each consensus against a local reference window to recover
//! base-exact breakpoints, microhomology, and consensus quality scores.
//! Calls that cannot be refined (imprecise, too large, no consensus, or an
//! ambiguous alignment) keep a symbolic allele pair instead.
//!
//! The refinement engine in [`refine`] is pure; [`input`], [`output`], and
//! [`pipeline`] wrap it with VCF/FASTA streaming via noodles.

pub mod config;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod refine;
pub mod utils;
