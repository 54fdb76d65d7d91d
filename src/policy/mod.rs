//! Join policy: the per-beacon decision and join bookkeeping.

pub mod engine;
pub mod decision;

pub use engine::NetjoinPolicy;
pub use decision::Decision;
