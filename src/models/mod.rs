pub mod auth;
pub mod folder;
pub mod link;
pub mod user;

// Re-export common types
pub use auth::SessionClaims;
pub use folder::{
    CollaboratorRole, CreateFolderRequest, Folder, FolderCounts, FolderDetail, FolderListItem,
    ListFoldersQuery, UpdateFolderRequest,
};
pub use link::{CreateLinkRequest, Link, ListLinksQuery, NewLink};
pub use user::{
    CreateUserRequest, LoginRequest, SocialLink, UpdateUserRequest, User, UserProfile,
    UserSummary,
};
