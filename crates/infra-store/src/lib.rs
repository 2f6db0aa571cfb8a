// File-backed store adapters for Posterforge

pub mod gallery;
pub mod themes;

pub use gallery::JsonFileGallery;
pub use themes::FileThemeCatalog;
