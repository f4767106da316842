mod builder;
mod fingerprint;
mod highlight;
mod markdown;
pub mod paths;
pub mod post;
mod render;
pub mod source;
mod writer;

pub use builder::{BuildResult, Builder};
pub use fingerprint::SiteFingerprint;
pub use highlight::DEFAULT_THEME as DEFAULT_HIGHLIGHT_THEME;
pub use writer::OutputWriter;
