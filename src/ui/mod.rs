//! UI components for Markview

pub mod focus;
pub mod mark_dialog;
pub mod mark_list;
pub mod viewer;
