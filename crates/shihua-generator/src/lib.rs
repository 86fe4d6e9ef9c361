mod generator;
mod static_corpus;

pub use generator::PoemGenerator;
pub use static_corpus::{CLASSIC_CORPUS, StaticCorpusGenerator};
