pub mod element;
pub mod form;
pub mod view;

pub use element::*;
pub use form::*;
pub use view::*;
