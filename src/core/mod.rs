// Core modules implementing scan resolution, value encoding, and row streaming.
pub mod cursor;
pub mod encode;
pub mod error;
pub mod options;
pub mod resolve;
pub mod scan;
pub mod sink;
pub mod writer;
