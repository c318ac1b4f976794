//! Rendering of result rows into markup, plus the post-render highlight
//! pass and the markdown pipeline for the help/legal pages.

pub mod highlight;
pub mod markdown;
pub mod table;

pub use highlight::apply_highlight;
pub use table::{Cell, Run, TableView, html_escape};
