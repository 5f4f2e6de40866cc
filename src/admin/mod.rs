//! Admin surface: sign-in, the question editor and the live dashboard.

pub mod auth;
pub mod dashboard;
pub mod editor;

pub use auth::Auth;
pub use dashboard::Dashboard;
