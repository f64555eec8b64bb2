pub mod enums;
pub mod note;
pub mod observation;
pub mod patient;

pub use enums::*;
pub use note::*;
pub use observation::*;
pub use patient::*;
