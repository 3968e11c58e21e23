mod entity;
mod texts;

pub use entity::{Architecture, PackageEntity};
pub use texts::{detect_language, Texts};
