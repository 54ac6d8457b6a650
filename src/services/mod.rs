// Services module for the linkshelf backend
// Business logic layer for the application

pub mod folder;
pub mod jwt;
pub mod link;
pub mod metadata;
pub mod user;

// Re-export commonly used services
pub use folder::FolderService;
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use link::LinkService;
pub use metadata::{LinkMetadata, MetadataError, MetadataFetcher};
pub use user::{PublicUser, UpdatedUser, UserAccount, UserService};
