// Manifest loading and variant selection for library-driven adaptive streaming

pub mod error;
pub mod library;
pub mod loader;

// Re-exports for easier access
pub use error::ManifestError;
pub use library::{HlsLibrary, LoadedManifest, SelectedVariant, VariantSelectionPolicy};
pub use loader::{HttpManifestLoader, ManifestLoader};
