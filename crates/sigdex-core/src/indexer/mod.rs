pub mod filesystem;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod signatures;
