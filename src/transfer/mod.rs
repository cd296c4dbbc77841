//! Whole-graph export and import of a user's tracker data.
//!
//! Export walks the entity registry in topological order, serializes every
//! record the user owns into a versioned JSON document, and packs it together
//! with a manifest and any referenced uploads into a zip archive. Import
//! replays the same document under fresh primary keys, rewriting foreign keys
//! through an in-memory id map and re-verifying bundled file checksums before
//! anything touches the live file store.
//!
//! The archive is untrusted input: [`archive::validate_archive`] runs before
//! any entry is extracted.

pub mod archive;
pub mod descriptors;
pub mod export;
pub mod id_map;
pub mod import;
pub mod manifest;
pub mod progress;
pub mod registry;
pub mod serializer;

pub use archive::{validate_archive, ArchiveStats};
pub use descriptors::default_registry;
pub use export::{build_archive, export_user_data};
pub use id_map::IdMap;
pub use import::{import_user_data, preview_import, run_import, validate_document_shape, BundledFiles};
pub use manifest::{
    ExportDocument, FileManifestEntry, ImportPreview, ImportSummary, TransferManifest, UserStub,
};
pub use progress::{ImportPhase, ImportProgress, ImportProgressTable};
pub use registry::{CreatedRecord, EntityDescriptor, EntityRegistry, Ownership};

/// Archive format version. Import rejects any document that does not carry
/// exactly this version; no cross-version compatibility is attempted.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Key carrying a record's pre-export primary key through the archive.
/// Never a real column; consumed by foreign-key remapping on import.
pub const ORIGINAL_ID_KEY: &str = "__original_id__";

/// Prefix namespacing expanded relationship keys away from column names.
pub const RELATION_KEY_PREFIX: &str = "related_";

/// Registry name of the account type, which import never creates or mutates.
pub const USER_TYPE: &str = "User";
