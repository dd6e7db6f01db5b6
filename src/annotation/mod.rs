pub mod codec;
pub mod compare;
mod label;
mod sequence;

pub use codec::{decode, encode, intervals};
pub use compare::{compare, ClosedRange, MatchResult, MatchSummary, MatchedPair};
pub use label::Label;
pub use sequence::{AnnotationSequence, Boundary, Run, RunEnd};
