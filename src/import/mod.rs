mod loader;

pub use loader::Importer;
