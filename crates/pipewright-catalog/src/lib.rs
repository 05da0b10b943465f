mod fs_catalog;

pub use fs_catalog::FsScriptCatalog;
